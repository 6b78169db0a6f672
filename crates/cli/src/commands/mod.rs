//! Subcommand implementations.
//!
//! Each command drives the stores in `AppServices` and prints the state they
//! publish afterwards.

pub mod account;
pub mod bookmarks;
pub mod cart;
pub mod catalog;
pub mod library;
pub mod settings;

use std::io::{self, BufRead, Write};

use rust_decimal::Decimal;
use shelfmark_client::app::SetupError;
use shelfmark_client::config::ConfigError;
use shelfmark_client::stores::{AutoConfirm, Confirm, ConfirmAction};
use shelfmark_client::ClientError;
use shelfmark_core::CurrencyCode;
use thiserror::Error;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Startup error: {0}")]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl CliError {
    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Asks on the terminal.
struct Prompt;

impl Confirm for Prompt {
    #[allow(clippy::print_stderr)]
    fn confirm(&self, action: &ConfirmAction) -> bool {
        eprint!("{action} [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// `--yes` answers every confirmation; otherwise the user is asked.
fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(Prompt)
    }
}

fn money(amount: Decimal, currency: &CurrencyCode) -> String {
    format!("{currency} {:.2}", amount.round_dp(2))
}
