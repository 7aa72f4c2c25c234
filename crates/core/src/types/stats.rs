//! Dashboard counters.

use serde::{Deserialize, Serialize};

/// Program-wide totals reported by `/dashboard/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_customers: u64,
    /// Sum of all `earn` transactions ever recorded.
    pub total_points_issued: i64,
    pub total_redemptions: u64,
    /// Gifts with stock remaining.
    pub active_gifts: u64,
}
