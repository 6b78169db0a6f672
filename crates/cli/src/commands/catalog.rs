//! Catalog and review commands.

use shelfmark_client::AppServices;
use shelfmark_core::{GenreId, ProductId};

use super::{CliError, money};

#[allow(clippy::print_stdout)]
pub async fn search(services: &AppServices, query: &str, genre: Option<i64>) -> Result<(), CliError> {
    let books = services
        .search_books(query, genre.map(GenreId::new))
        .await?;
    if books.is_empty() {
        println!("No books found");
    }

    let currency = services.currency();
    for book in &books {
        let price = book
            .price
            .map_or_else(|| "-".to_string(), |p| money(p, &currency));
        let star = if book.is_favorite { "*" } else { " " };
        println!(
            "{star} {:>6}  {} - {}  {price}",
            book.id, book.title, book.author
        );
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn show(services: &AppServices, product_id: i64) -> Result<(), CliError> {
    let book = services.book(ProductId::new(product_id)).await?;
    println!("{} - {}", book.title, book.author);
    if let Some(price) = book.price {
        println!("Price: {}", money(price, &services.currency()));
    }
    println!("Cover: {}", book.image_url);
    for (key, value) in &book.attributes {
        println!("{key}: {value}");
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn genres(services: &AppServices) -> Result<(), CliError> {
    for genre in services.genres().await? {
        println!("{:>4}  {}", genre.id, genre.name);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn reviews(services: &AppServices) -> Result<(), CliError> {
    for review in services.reviews().await? {
        let grade = review
            .grade
            .map_or_else(|| "-".to_string(), |g| format!("{g:.1}"));
        println!(
            "{} on {} ({grade}) - {}",
            review.username, review.book.title, review.title
        );
        if !review.comment.is_empty() {
            println!("    {}", review.comment);
        }
    }
    Ok(())
}
