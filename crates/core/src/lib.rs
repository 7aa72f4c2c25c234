//! HONOR Loyalty Core - Shared types library.
//!
//! This crate provides the types used across the loyalty staff tooling:
//! - `client` - Typed API client, session handling, and the redemption desk
//! - `cli` - Command-line front end for staff
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no HTTP
//! clients, no persistence. Every balance or stock change is performed by the
//! loyalty backend; the types here are display copies of server truth.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, customers, gifts, ledger records, staff roles
//! - [`eligibility`] - The point-for-gift redemption rule

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod eligibility;
pub mod types;

pub use eligibility::Eligibility;
pub use types::*;
