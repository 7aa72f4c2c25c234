//! Program-wide statistics.

use honor_loyalty_core::DashboardStats;
use tracing::instrument;

use super::LoyaltyClient;
use crate::error::ApiError;

impl LoyaltyClient {
    /// Totals shown on the dashboard.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the session is rejected.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get("/dashboard/stats").await
    }
}
