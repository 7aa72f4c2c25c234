//! Core types for HONOR Loyalty.
//!
//! This module provides type-safe wrappers for the loyalty domain.

pub mod customer;
pub mod gift;
pub mod id;
pub mod ledger;
pub mod staff;
pub mod stats;

pub use customer::{Customer, CustomerUpdate, DraftError, NewCustomer, PointsAdjustment};
pub use gift::{Gift, GiftUpdate, NewGift};
pub use id::*;
pub use ledger::{PointTransaction, Redemption, RedemptionRequest, TransactionKind};
pub use staff::{StaffIdentity, StaffMember, StaffRole};
pub use stats::DashboardStats;
