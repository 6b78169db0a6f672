//! Shelfmark CLI - drive the book store client from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the password may also come from SHELFMARK_PASSWORD)
//! shelfmark signin -e ana@example.com -p secret
//!
//! # Browse and buy
//! shelfmark books search dune
//! shelfmark cart add 42
//! shelfmark cart checkout
//!
//! # Organize the library
//! shelfmark bookmarks create "Classics" "#FF0000"
//! shelfmark bookmarks assign 42 1 3
//! ```
//!
//! # Commands
//!
//! - `signin` / `signup` / `signout` / `whoami` / `profile` - Session
//! - `cart` - Cart contents, selection and checkout
//! - `library` - Owned books and favorites
//! - `bookmarks` - Bookmark tags and their assignment to books
//! - `books` / `reviews` - Catalog browsing
//! - `currency` / `notifications` - Preferences
//!
//! Configuration is read from the environment (see `ClientConfig`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shelfmark_client::ClientConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "shelfmark")]
#[command(author, version, about = "Shelfmark book store client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and load your cart, library and bookmarks
    Signin {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SHELFMARK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SHELFMARK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Preferred currency (BRL, USD, EUR)
        #[arg(short, long, default_value = "BRL")]
        currency: String,
    },
    /// Sign out and forget local state
    Signout,
    /// Show the signed-in user
    Whoami,
    /// Change your name or email
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Only change the local copy
        #[arg(long)]
        local: bool,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Browse owned books
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },
    /// Manage bookmarks
    Bookmarks {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// Browse the catalog
    Books {
        #[command(subcommand)]
        action: BookAction,
    },
    /// Show community reviews
    Reviews,
    /// Set your preferred currency
    Currency {
        /// BRL, USD or EUR
        code: String,
    },
    /// Notification preferences
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a book
    Add { product_id: i64 },
    /// Select or deselect a book
    Toggle { product_id: i64 },
    /// Select everything, or deselect if everything is selected
    SelectAll,
    /// Remove one book, keeping everything else
    Remove { product_id: i64 },
    /// Remove the selected books
    RemoveSelected {
        #[arg(short, long)]
        yes: bool,
    },
    /// Buy the selected books
    Checkout,
    /// Show the purchase history
    History,
}

#[derive(Subcommand)]
enum LibraryAction {
    /// List owned books
    List {
        /// Filter by title
        #[arg(short, long)]
        search: Option<String>,

        /// Only favorites
        #[arg(short, long)]
        favorites: bool,

        /// Only books tagged with this bookmark
        #[arg(short, long)]
        bookmark: Option<i64>,
    },
    /// Toggle a book's favorite flag
    Favorite { product_id: i64 },
}

#[derive(Subcommand)]
enum BookmarkAction {
    /// List bookmarks
    List,
    /// Create a bookmark
    Create { description: String, color: String },
    /// Change a bookmark
    Update {
        id: i64,
        description: String,
        color: String,
    },
    /// Delete one bookmark
    Delete {
        id: i64,

        #[arg(short, long)]
        yes: bool,
    },
    /// Delete several bookmarks
    DeleteMany {
        #[arg(required = true)]
        ids: Vec<i64>,

        #[arg(short, long)]
        yes: bool,
    },
    /// Set exactly which bookmarks tag a book
    Assign {
        product_id: i64,
        bookmark_ids: Vec<i64>,
    },
}

#[derive(Subcommand)]
enum BookAction {
    /// Search by title
    Search {
        #[arg(default_value = "")]
        query: String,

        /// Genre tag id
        #[arg(short, long)]
        genre: Option<i64>,
    },
    /// Show one book
    Show { product_id: i64 },
    /// List genre tags
    Genres,
}

#[derive(Subcommand)]
enum NotificationAction {
    /// Show the settings
    Show,
    /// Change one setting
    Set {
        key: String,

        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => return ExitCode::from(fail(&CliError::from(e), 2)),
    };

    // Sentry must be initialized before the tracing subscriber. The guard
    // flushes queued events when `main` returns.
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shelfmark_client=info,shelfmark_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    ExitCode::from(execute(cli, &config).await)
}

/// Run a command and return the process exit code.
async fn execute(cli: Cli, config: &ClientConfig) -> u8 {
    match run(cli, config).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            fail(&e, 1)
        }
    }
}

#[allow(clippy::print_stderr)]
fn fail(error: &CliError, code: u8) -> u8 {
    eprintln!("error: {}", error.user_message());
    code
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CliError> {
    let services = shelfmark_client::AppServices::new(config)?;
    services.bootstrap().await;

    match cli.command {
        Commands::Signin { email, password } => {
            commands::account::sign_in(&services, &email, password).await?;
        }
        Commands::Signup {
            name,
            email,
            password,
            currency,
        } => commands::account::sign_up(&services, &name, &email, password, &currency).await?,
        Commands::Signout => commands::account::sign_out(&services),
        Commands::Whoami => commands::account::whoami(&services),
        Commands::Profile { name, email, local } => {
            commands::account::update_profile(&services, name, email, local).await?;
        }
        Commands::Currency { code } => commands::account::set_currency(&services, &code).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&services),
            CartAction::Add { product_id } => commands::cart::add(&services, product_id).await?,
            CartAction::Toggle { product_id } => {
                commands::cart::toggle(&services, product_id).await?;
            }
            CartAction::SelectAll => commands::cart::select_all(&services).await?,
            CartAction::Remove { product_id } => {
                commands::cart::remove(&services, product_id).await?;
            }
            CartAction::RemoveSelected { yes } => {
                commands::cart::remove_selected(&services, yes).await?;
            }
            CartAction::Checkout => commands::cart::checkout(&services).await?,
            CartAction::History => commands::cart::history(&services),
        },
        Commands::Library { action } => match action {
            LibraryAction::List {
                search,
                favorites,
                bookmark,
            } => commands::library::list(&services, search.as_deref(), favorites, bookmark),
            LibraryAction::Favorite { product_id } => {
                commands::library::favorite(&services, product_id).await?;
            }
        },
        Commands::Bookmarks { action } => match action {
            BookmarkAction::List => commands::bookmarks::list(&services),
            BookmarkAction::Create { description, color } => {
                commands::bookmarks::create(&services, &description, &color).await?;
            }
            BookmarkAction::Update {
                id,
                description,
                color,
            } => commands::bookmarks::update(&services, id, &description, &color).await?,
            BookmarkAction::Delete { id, yes } => {
                commands::bookmarks::delete(&services, id, yes).await?;
            }
            BookmarkAction::DeleteMany { ids, yes } => {
                commands::bookmarks::delete_many(&services, &ids, yes).await?;
            }
            BookmarkAction::Assign {
                product_id,
                bookmark_ids,
            } => commands::bookmarks::assign(&services, product_id, &bookmark_ids).await?,
        },
        Commands::Books { action } => match action {
            BookAction::Search { query, genre } => {
                commands::catalog::search(&services, &query, genre).await?;
            }
            BookAction::Show { product_id } => {
                commands::catalog::show(&services, product_id).await?;
            }
            BookAction::Genres => commands::catalog::genres(&services).await?,
        },
        Commands::Reviews => commands::catalog::reviews(&services).await?,
        Commands::Notifications { action } => match action {
            NotificationAction::Show => commands::settings::show(&services),
            NotificationAction::Set { key, value } => {
                commands::settings::set(&services, &key, value);
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir) -> ClientConfig {
        ClientConfig::for_api_url("http://127.0.0.1:9/", dir.path().to_path_buf()).unwrap()
    }

    #[tokio::test]
    async fn test_failed_command_returns_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["shelfmark", "cart", "add", "1"]);
        assert_eq!(execute(cli, &config(&dir)).await, 1);
    }

    #[tokio::test]
    async fn test_local_command_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["shelfmark", "notifications", "set", "likes", "true"]);
        assert_eq!(execute(cli, &config(&dir)).await, 0);
    }
}
