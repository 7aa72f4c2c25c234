//! HONOR loyalty staff client.
//!
//! Everything a staff front end needs on top of the loyalty backend's REST
//! API:
//!
//! - [`session`] - the staff session: login state, durable token storage,
//!   and forced logout when the backend rejects the token
//! - [`api`] - typed calls for customers, points, gifts, redemptions and the
//!   dashboard, all sharing one authenticated request pipeline
//! - [`redemption`] - the redemption desk (selection, eligibility, confirm)
//! - [`search`] - debounced customer search
//! - [`lists`] - list state that ignores out-of-order responses
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use honor_loyalty_client::{ClientConfig, FileSessionStore, LoyaltyClient, SessionManager};
//!
//! let config = ClientConfig::from_env()?;
//! let session = Arc::new(SessionManager::restore(FileSessionStore::new(&config.session_path)));
//! let client = LoyaltyClient::new(&config, session)?;
//! client.login("admin", &password).await?;
//! let customers = client.list_customers(Some("lim")).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod lists;
pub mod redemption;
pub mod search;
pub mod session;

pub use api::{Health, LoyaltyClient};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use lists::{FetchTicket, Sequenced};
pub use redemption::{DeskError, GiftOption, RedemptionDesk, RedemptionReceipt};
pub use search::{CustomerSearch, SearchResults};
pub use session::{
    FileSessionStore, MemorySessionStore, PersistedSession, Screen, SessionManager, SessionState,
    SessionStore,
};
