//! Customer registration, point adjustments, and history.

use honor_loyalty_core::{
    Customer, CustomerId, CustomerUpdate, NewCustomer, PointTransaction, PointsAdjustment,
};
use serde::Serialize;
use tracing::instrument;

use super::LoyaltyClient;
use crate::error::ApiError;

#[derive(Serialize)]
struct SearchQuery<'a> {
    search: &'a str,
}

impl LoyaltyClient {
    /// List customers, newest first.
    ///
    /// `search` is a case-insensitive substring match on name or phone,
    /// evaluated by the backend. A blank search lists everyone.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the session is rejected.
    #[instrument(skip(self))]
    pub async fn list_customers(&self, search: Option<&str>) -> Result<Vec<Customer>, ApiError> {
        match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(search) => {
                self.get_with_query("/customers", &SearchQuery { search })
                    .await
            }
            None => self.get("/customers").await,
        }
    }

    /// Get a single customer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no such customer exists.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, ApiError> {
        self.get(&format!("/customers/{id}")).await
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the phone number is already
    /// registered or the backend rejects the input.
    #[instrument(skip(self, customer), fields(phone = %customer.phone_number))]
    pub async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, ApiError> {
        let created: Customer = self.post("/customers", customer).await?;
        tracing::info!(customer_id = %created.id, "Customer registered");
        Ok(created)
    }

    /// Update a customer's details. Unset fields are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for an empty or malformed update
    /// (without sending it), or `ApiError::NotFound`.
    #[instrument(skip(self, update), fields(customer_id = %id))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        update: &CustomerUpdate,
    ) -> Result<Customer, ApiError> {
        update.validate()?;
        self.put(&format!("/customers/{id}"), update).await
    }

    /// Delete a customer and their history.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no such customer exists.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn delete_customer(&self, id: CustomerId) -> Result<(), ApiError> {
        self.delete(&format!("/customers/{id}")).await?;
        tracing::info!("Customer deleted");
        Ok(())
    }

    /// Award points. The backend records an `earn` transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the session is rejected.
    #[instrument(skip(self, adjustment), fields(customer_id = %id, amount = adjustment.amount()))]
    pub async fn add_points(
        &self,
        id: CustomerId,
        adjustment: &PointsAdjustment,
    ) -> Result<Customer, ApiError> {
        let updated: Customer = self
            .post(&format!("/customers/{id}/add-points"), adjustment)
            .await?;
        tracing::info!(balance = updated.total_points, "Points awarded");
        Ok(updated)
    }

    /// Deduct points. The backend records a `manual_adjust` transaction.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with "Insufficient points" when the
    /// balance does not cover the amount.
    #[instrument(skip(self, adjustment), fields(customer_id = %id, amount = adjustment.amount()))]
    pub async fn deduct_points(
        &self,
        id: CustomerId,
        adjustment: &PointsAdjustment,
    ) -> Result<Customer, ApiError> {
        let updated: Customer = self
            .post(&format!("/customers/{id}/deduct-points"), adjustment)
            .await?;
        tracing::info!(balance = updated.total_points, "Points deducted");
        Ok(updated)
    }

    /// A customer's point history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no such customer exists.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn list_transactions(&self, id: CustomerId) -> Result<Vec<PointTransaction>, ApiError> {
        self.get(&format!("/customers/{id}/transactions")).await
    }
}
