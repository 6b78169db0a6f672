//! Owned-book commands.

use shelfmark_client::AppServices;
use shelfmark_client::api::InventoryEntry;
use shelfmark_core::{BookmarkId, ProductId};

use super::CliError;

#[allow(clippy::print_stdout)]
pub fn list(
    services: &AppServices,
    search: Option<&str>,
    favorites: bool,
    bookmark: Option<i64>,
) {
    let inventory = services.inventory();
    let mut entries: Vec<InventoryEntry> = match (bookmark, search) {
        (Some(id), _) => inventory.tagged_with(BookmarkId::new(id)),
        (None, Some(query)) => inventory.search(query),
        (None, None) => inventory.entries(),
    };
    if favorites {
        entries.retain(|e| e.is_favorite);
    }

    if entries.is_empty() {
        println!("No books");
        return;
    }
    for entry in &entries {
        let star = if entry.is_favorite { "*" } else { " " };
        let tags: Vec<&str> = entry
            .bookmarks
            .iter()
            .map(|b| b.description.as_str())
            .collect();
        println!(
            "{star} {:>6}  {} - {}  {}",
            entry.product_id,
            entry.title,
            entry.author,
            tags.join(", ")
        );
    }
}

#[allow(clippy::print_stdout)]
pub async fn favorite(services: &AppServices, product_id: i64) -> Result<(), CliError> {
    let favorite = services
        .inventory()
        .toggle_favorite(ProductId::new(product_id))
        .await?;
    if favorite {
        println!("Added {product_id} to favorites");
    } else {
        println!("Removed {product_id} from favorites");
    }
    Ok(())
}
