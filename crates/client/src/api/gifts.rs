//! Gift catalog management.

use honor_loyalty_core::{Gift, GiftId, GiftUpdate, NewGift};
use tracing::instrument;

use super::LoyaltyClient;
use crate::error::ApiError;

impl LoyaltyClient {
    /// The full gift catalog, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the session is rejected.
    #[instrument(skip(self))]
    pub async fn list_gifts(&self) -> Result<Vec<Gift>, ApiError> {
        self.get("/gifts").await
    }

    /// Add a gift to the catalog.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the gift.
    #[instrument(skip(self, gift), fields(name = %gift.name))]
    pub async fn create_gift(&self, gift: &NewGift) -> Result<Gift, ApiError> {
        let created: Gift = self.post("/gifts", gift).await?;
        tracing::info!(gift_id = %created.id, "Gift added");
        Ok(created)
    }

    /// Update a gift. Unset fields are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for an empty update (without sending
    /// it), or `ApiError::NotFound`.
    #[instrument(skip(self, update), fields(gift_id = %id))]
    pub async fn update_gift(&self, id: GiftId, update: &GiftUpdate) -> Result<Gift, ApiError> {
        update.validate()?;
        self.put(&format!("/gifts/{id}"), update).await
    }

    /// Remove a gift from the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no such gift exists.
    #[instrument(skip(self), fields(gift_id = %id))]
    pub async fn delete_gift(&self, id: GiftId) -> Result<(), ApiError> {
        self.delete(&format!("/gifts/{id}")).await
    }
}
