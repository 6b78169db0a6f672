//! Cart commands.

use shelfmark_client::AppServices;
use shelfmark_client::stores::{CheckoutOutcome, RemoveOutcome};
use shelfmark_core::ProductId;

use super::{CliError, confirmer, money};

#[allow(clippy::print_stdout)]
pub fn show(services: &AppServices) {
    let Some(cart) = services.cart().cart() else {
        println!("Not signed in");
        return;
    };
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }

    let currency = services.currency();
    for item in &cart.items {
        let mark = if item.selected { "[x]" } else { "[ ]" };
        println!(
            "{mark} {:>6}  {} - {}  {}",
            item.product_id,
            item.title,
            item.author,
            money(item.converted_price, &currency)
        );
    }
    println!("Total: {}", money(cart.total, &currency));
}

pub async fn add(services: &AppServices, product_id: i64) -> Result<(), CliError> {
    services.cart().add_item(ProductId::new(product_id)).await?;
    show(services);
    Ok(())
}

pub async fn toggle(services: &AppServices, product_id: i64) -> Result<(), CliError> {
    services
        .cart()
        .toggle_selection(ProductId::new(product_id))
        .await?;
    show(services);
    Ok(())
}

pub async fn select_all(services: &AppServices) -> Result<(), CliError> {
    services.cart().toggle_select_all().await?;
    show(services);
    Ok(())
}

pub async fn remove(services: &AppServices, product_id: i64) -> Result<(), CliError> {
    services
        .cart()
        .remove_single_item(ProductId::new(product_id))
        .await?;
    show(services);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn remove_selected(services: &AppServices, yes: bool) -> Result<(), CliError> {
    let confirm = confirmer(yes);
    match services.cart().remove_selected(confirm.as_ref()).await? {
        RemoveOutcome::NothingSelected => println!("Nothing selected"),
        RemoveOutcome::Declined => println!("Cancelled"),
        RemoveOutcome::Removed(count) => {
            println!("Removed {count} item(s)");
            show(services);
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn checkout(services: &AppServices) -> Result<(), CliError> {
    match services.cart().finalize_purchase().await? {
        CheckoutOutcome::NothingSelected => println!("Nothing selected to purchase"),
        CheckoutOutcome::Purchased {
            items,
            inventory_synced,
        } => {
            let currency = services.currency();
            for item in &items {
                println!(
                    "Bought {} - {}  {}",
                    item.title,
                    item.author,
                    money(item.converted_price, &currency)
                );
            }
            if !inventory_synced {
                println!("Your library will show the new books once it can be updated");
            }
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn history(services: &AppServices) {
    let purchases = services.cart().purchases();
    if purchases.is_empty() {
        println!("No purchases yet");
    }
    for purchase in purchases {
        println!(
            "{}  {} - {}  {}",
            purchase.purchased_at.format("%Y-%m-%d"),
            purchase.title,
            purchase.author,
            purchase.converted_price.round_dp(2)
        );
    }
}
