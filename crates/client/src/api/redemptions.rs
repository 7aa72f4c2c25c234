//! Point-for-gift redemptions.

use honor_loyalty_core::{CustomerId, GiftId, Redemption, RedemptionRequest};
use tracing::instrument;

use super::LoyaltyClient;
use crate::error::ApiError;

impl LoyaltyClient {
    /// Redeem one unit of a gift for a customer.
    ///
    /// A single atomic call: the backend re-validates stock and balance,
    /// deducts both, and records the redemption and its transaction. No
    /// retry is attempted.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Conflict` when the backend finds the gift out of
    /// stock or the balance insufficient at call time (another staff member
    /// may have acted first), and `ApiError::NotFound` for unknown IDs.
    #[instrument(skip(self), fields(customer_id = %customer_id, gift_id = %gift_id))]
    pub async fn redeem(
        &self,
        customer_id: CustomerId,
        gift_id: GiftId,
    ) -> Result<Redemption, ApiError> {
        let request = RedemptionRequest {
            customer_id,
            gift_id,
        };

        // The backend reports state conflicts on this endpoint as 400
        let redemption: Redemption = self
            .post("/redeem", &request)
            .await
            .map_err(|e| match e {
                ApiError::Validation(msg) => ApiError::Conflict(msg),
                other => other,
            })?;

        tracing::info!(
            redemption_id = %redemption.id,
            points_used = redemption.points_used,
            "Gift redeemed"
        );
        Ok(redemption)
    }

    /// All redemptions, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the session is rejected.
    #[instrument(skip(self))]
    pub async fn list_redemptions(&self) -> Result<Vec<Redemption>, ApiError> {
        self.get("/redemptions").await
    }
}
