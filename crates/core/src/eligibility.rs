//! Point-for-gift redemption rule.
//!
//! A redemption is permitted when a customer and a gift are both selected,
//! the customer's balance covers the gift's price, and at least one unit of
//! the gift is in stock. The predicted balance is shown whenever both are
//! selected, even when it would go negative, so staff can see by how much a
//! customer falls short.
//!
//! The rule is evaluated fresh on every selection change. Balances and stock
//! are server-side truth that other staff may change at any time, so nothing
//! here is cached, and the backend re-validates on submission.

use crate::types::{Customer, Gift};

/// Outcome of evaluating a (customer, gift) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    /// Whether the confirm action may be offered.
    pub eligible: bool,
    /// `total_points - points_required`, present iff both are selected.
    pub balance_after: Option<i64>,
}

impl Eligibility {
    /// Evaluate the redemption rule. Pure: no side effects.
    #[must_use]
    pub fn evaluate(customer: Option<&Customer>, gift: Option<&Gift>) -> Self {
        match (customer, gift) {
            (Some(customer), Some(gift)) => Self {
                eligible: gift.affordable_with(customer.total_points) && gift.in_stock(),
                balance_after: Some(
                    i64::from(customer.total_points) - i64::from(gift.points_required),
                ),
            },
            _ => Self {
                eligible: false,
                balance_after: None,
            },
        }
    }

    /// Both selected, but the balance does not cover the price.
    #[must_use]
    pub fn is_unaffordable(&self) -> bool {
        self.balance_after.is_some_and(|b| b < 0)
    }
}
