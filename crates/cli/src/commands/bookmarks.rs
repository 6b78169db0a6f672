//! Bookmark commands.

use shelfmark_client::AppServices;
use shelfmark_client::ClientError;
use shelfmark_client::stores::{DeleteOutcome, diff_assignments};
use shelfmark_core::{BookmarkId, ProductId};

use super::{CliError, confirmer};

#[allow(clippy::print_stdout)]
pub fn list(services: &AppServices) {
    let bookmarks = services.bookmarks().bookmarks();
    if bookmarks.is_empty() {
        println!("No bookmarks");
    }
    for bookmark in bookmarks {
        println!(
            "{:>4}  {}  {}",
            bookmark.id, bookmark.hex_color, bookmark.description
        );
    }
}

pub async fn create(services: &AppServices, description: &str, color: &str) -> Result<(), CliError> {
    services.bookmarks().create(description, color).await?;
    list(services);
    Ok(())
}

pub async fn update(
    services: &AppServices,
    id: i64,
    description: &str,
    color: &str,
) -> Result<(), CliError> {
    services
        .bookmarks()
        .update(BookmarkId::new(id), description, color)
        .await?;
    list(services);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn delete(services: &AppServices, id: i64, yes: bool) -> Result<(), CliError> {
    let confirm = confirmer(yes);
    match services
        .bookmarks()
        .delete(BookmarkId::new(id), confirm.as_ref())
        .await?
    {
        DeleteOutcome::Declined => println!("Cancelled"),
        _ => list(services),
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn delete_many(services: &AppServices, ids: &[i64], yes: bool) -> Result<(), CliError> {
    let ids: Vec<BookmarkId> = ids.iter().copied().map(BookmarkId::new).collect();
    let confirm = confirmer(yes);
    match services
        .bookmarks()
        .delete_many(&ids, confirm.as_ref())
        .await?
    {
        DeleteOutcome::NothingToDelete => println!("Nothing to delete"),
        DeleteOutcome::Declined => println!("Cancelled"),
        DeleteOutcome::Deleted(count) => {
            println!("Deleted {count} bookmark(s)");
            list(services);
        }
    }
    Ok(())
}

/// Make `bookmark_ids` the exact set of bookmarks tagging the book.
#[allow(clippy::print_stdout)]
pub async fn assign(
    services: &AppServices,
    product_id: i64,
    bookmark_ids: &[i64],
) -> Result<(), CliError> {
    let product_id = ProductId::new(product_id);
    let entry = services
        .inventory()
        .get(product_id)
        .ok_or(ClientError::NotOwned(product_id))?;

    let current: Vec<BookmarkId> = entry.bookmarks.iter().map(|b| b.id).collect();
    let desired: Vec<BookmarkId> = bookmark_ids.iter().copied().map(BookmarkId::new).collect();
    let (add, remove) = diff_assignments(&current, &desired);
    if add.is_empty() && remove.is_empty() {
        println!("Nothing to change");
        return Ok(());
    }

    services
        .bookmarks()
        .assign_to_book(product_id, &add, &remove)
        .await?;
    println!("Added {} and removed {} bookmark(s)", add.len(), remove.len());
    Ok(())
}
