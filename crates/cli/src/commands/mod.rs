//! Command implementations.

pub mod customers;
pub mod gifts;
pub mod redeem;
pub mod session;

use std::io::{self, Write};
use std::sync::Arc;

use honor_loyalty_client::{
    ApiError, ClientConfig, ConfigError, DeskError, FileSessionStore, LoyaltyClient,
    SessionManager, SessionState,
};
use honor_loyalty_core::{Customer, DraftError, Gift};
use thiserror::Error;

/// Errors surfaced by any command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{}", .0.user_message())]
    Desk(#[from] DeskError),

    #[error("{0}")]
    Draft(#[from] DraftError),

    #[error("No password given")]
    MissingPassword,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Everything a command needs.
pub struct Context {
    pub config: ClientConfig,
    pub client: LoyaltyClient,
}

impl Context {
    /// Build the client from the environment and restore the stored session.
    ///
    /// # Errors
    ///
    /// Returns error if configuration is missing or invalid.
    pub fn from_env() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let store = FileSessionStore::new(config.session_path.clone());
        let session = Arc::new(SessionManager::restore(store));
        let client = LoyaltyClient::new(&config, session)?;
        Ok(Self { config, client })
    }

    /// Report it if the backend ends the session while a command runs.
    pub fn watch_session(&self) {
        let mut states = self.client.session().subscribe();
        tokio::spawn(async move {
            while states.changed().await.is_ok() {
                if *states.borrow_and_update() == SessionState::Unauthenticated {
                    tracing::warn!("Session expired. Run `loyalty login` again.");
                }
            }
        });
    }
}

pub fn stdout() -> io::StdoutLock<'static> {
    io::stdout().lock()
}

pub fn write_customer(out: &mut impl Write, c: &Customer) -> io::Result<()> {
    writeln!(
        out,
        "{}  {:<28} {:<14} {:>7} pts  {}",
        c.id,
        c.full_name,
        c.phone_number,
        c.total_points,
        c.email.as_deref().unwrap_or("-")
    )
}

pub fn write_gift(out: &mut impl Write, g: &Gift) -> io::Result<()> {
    writeln!(
        out,
        "{}  {:<28} {:>7} pts  stock {:>4}  {}",
        g.id,
        g.name,
        g.points_required,
        g.stock,
        g.description.as_deref().unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_login_message_carries_backend_detail() {
        let err = CliError::from(ApiError::InvalidCredentials(
            "Incorrect username or password".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Invalid credentials: Incorrect username or password"
        );
    }

    #[test]
    fn test_desk_error_uses_staff_message() {
        let err = CliError::from(DeskError::Api(ApiError::Conflict(
            "Gift is out of stock".to_string(),
        )));
        assert_eq!(err.to_string(), "Gift is out of stock");
    }
}
