//! Session commands.

use secrecy::SecretString;
use shelfmark_client::AppServices;
use shelfmark_client::stores::{ProfileUpdate, UpdateMode};
use shelfmark_core::CurrencyCode;

use super::CliError;

#[allow(clippy::print_stdout)]
pub async fn sign_in(services: &AppServices, email: &str, password: String) -> Result<(), CliError> {
    let user = services
        .sign_in(email, &SecretString::from(password))
        .await?;
    println!("Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn sign_up(
    services: &AppServices,
    name: &str,
    email: &str,
    password: String,
    currency: &str,
) -> Result<(), CliError> {
    let currency = CurrencyCode::parse(currency).map_err(shelfmark_client::ClientError::from)?;
    let user = services
        .sign_up(name, email, &SecretString::from(password), currency)
        .await?;
    println!("Welcome, {} <{}>", user.name, user.email);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn sign_out(services: &AppServices) {
    services.sign_out();
    println!("Signed out");
}

#[allow(clippy::print_stdout)]
pub fn whoami(services: &AppServices) {
    match services.session().user() {
        Some(user) => println!(
            "{} <{}> (prices in {})",
            user.name,
            user.email,
            user.currency()
        ),
        None => println!("Not signed in"),
    }
}

#[allow(clippy::print_stdout)]
pub async fn update_profile(
    services: &AppServices,
    name: Option<String>,
    email: Option<String>,
    local: bool,
) -> Result<(), CliError> {
    let mode = if local {
        UpdateMode::VisualOnly
    } else {
        UpdateMode::Remote
    };
    let user = services
        .session()
        .update_profile(ProfileUpdate { name, email }, mode)
        .await?;
    println!("Profile: {} <{}>", user.name, user.email);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn set_currency(services: &AppServices, code: &str) -> Result<(), CliError> {
    let currency = CurrencyCode::parse(code).map_err(shelfmark_client::ClientError::from)?;
    services.set_currency(currency).await?;
    println!("Prices are now shown in {}", services.currency());
    Ok(())
}
