//! The redemption desk: pick a customer, pick a gift, confirm.
//!
//! The desk works on local copies of the customer and gift lists. Eligibility
//! is re-evaluated from the current selections every time it is asked for,
//! and the backend re-checks everything when the redemption is submitted.
//!
//! After a successful redemption the selected customer's balance is reduced
//! locally straight away, then both lists are fetched again and the
//! selections are replaced by their authoritative copies.

use honor_loyalty_core::{Customer, CustomerId, Eligibility, Gift, GiftId, Redemption};
use thiserror::Error;

use crate::api::LoyaltyClient;
use crate::error::ApiError;
use crate::lists::Sequenced;

const REDEMPTION_FAILED: &str = "Redemption failed";

/// Redemption desk errors.
#[derive(Debug, Error)]
pub enum DeskError {
    #[error("No customer selected")]
    NoCustomer,

    #[error("No gift selected")]
    NoGift,

    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// Both selected but the rule does not allow it. No request was sent.
    #[error("Not eligible: balance after redemption would be {balance_after}")]
    NotEligible { balance_after: i64 },

    /// Confirm called again before `reset` or a new customer selection.
    #[error("Redemption already completed")]
    AlreadyCompleted,

    #[error("Customer {0} is not in the loaded list")]
    UnknownCustomer(CustomerId),

    #[error("Gift {0} is not in the loaded list")]
    UnknownGift(GiftId),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl DeskError {
    /// Message for the error toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(REDEMPTION_FAILED),
            other => other.to_string(),
        }
    }
}

/// A gift as offered to the currently selected customer.
#[derive(Debug, Clone, Copy)]
pub struct GiftOption<'a> {
    pub gift: &'a Gift,
    pub in_stock: bool,
    /// `true` when no customer is selected.
    pub affordable: bool,
    pub selected: bool,
}

/// Outcome of a confirmed redemption.
#[derive(Debug, Clone)]
pub struct RedemptionReceipt {
    pub redemption: Redemption,
    pub customer_name: String,
    pub gift_name: String,
    /// Customer balance after the redemption. Optimistic from `submit`,
    /// refreshed by `confirm` unless the refresh failed.
    pub balance: u32,
}

/// Client-side state of one redemption attempt.
#[derive(Debug)]
pub struct RedemptionDesk {
    client: LoyaltyClient,
    customers: Sequenced<Vec<Customer>>,
    gifts: Sequenced<Vec<Gift>>,
    customer: Option<Customer>,
    gift: Option<Gift>,
    completed: bool,
}

impl RedemptionDesk {
    #[must_use]
    pub const fn new(client: LoyaltyClient) -> Self {
        Self {
            client,
            customers: Sequenced::new(Vec::new()),
            gifts: Sequenced::new(Vec::new()),
            customer: None,
            gift: None,
            completed: false,
        }
    }

    /// Fetch customers and gifts.
    ///
    /// Selections are replaced by their refreshed copies. A selection that
    /// no longer appears in the refreshed list is kept as it was. A pending
    /// gift selection whose stock ran out is dropped.
    ///
    /// # Errors
    ///
    /// Returns error if either list fails to load. Whichever list did load
    /// is still applied.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let customer_ticket = self.customers.begin();
        let gift_ticket = self.gifts.begin();

        let (customers, gifts) =
            tokio::join!(self.client.list_customers(None), self.client.list_gifts());

        let mut first_error = None;
        match customers {
            Ok(customers) => {
                self.customers.apply(customer_ticket, customers);
            }
            Err(e) => {
                self.customers.fail(customer_ticket);
                first_error = Some(e);
            }
        }
        match gifts {
            Ok(gifts) => {
                self.gifts.apply(gift_ticket, gifts);
            }
            Err(e) => {
                self.gifts.fail(gift_ticket);
                first_error.get_or_insert(e);
            }
        }

        self.reconcile();
        first_error.map_or(Ok(()), Err)
    }

    fn reconcile(&mut self) {
        if let Some(selected) = self.customer.as_mut()
            && let Some(fresh) = self.customers.get().iter().find(|c| c.id == selected.id)
        {
            selected.clone_from(fresh);
        }
        if let Some(selected) = self.gift.as_mut()
            && let Some(fresh) = self.gifts.get().iter().find(|g| g.id == selected.id)
        {
            selected.clone_from(fresh);
        }
        if !self.completed && self.gift.as_ref().is_some_and(|g| !g.in_stock()) {
            tracing::debug!("Selected gift ran out of stock");
            self.gift = None;
        }
    }

    #[must_use]
    pub fn customers(&self) -> &[Customer] {
        self.customers.get()
    }

    #[must_use]
    pub fn gifts(&self) -> &[Gift] {
        self.gifts.get()
    }

    /// Loaded customers matching `query` by name (case-insensitive) or phone.
    #[must_use]
    pub fn filtered_customers(&self, query: &str) -> Vec<&Customer> {
        let query = query.trim();
        self.customers
            .get()
            .iter()
            .filter(|c| c.matches(query))
            .collect()
    }

    /// Every loaded gift, annotated for the selected customer.
    #[must_use]
    pub fn gift_options(&self) -> Vec<GiftOption<'_>> {
        let points = self.customer.as_ref().map(|c| c.total_points);
        let selected = self.gift.as_ref().map(|g| g.id);
        self.gifts
            .get()
            .iter()
            .map(|gift| GiftOption {
                gift,
                in_stock: gift.in_stock(),
                affordable: points.is_none_or(|p| gift.affordable_with(p)),
                selected: selected == Some(gift.id),
            })
            .collect()
    }

    /// Select a customer. Clears the selected gift and a completed
    /// redemption.
    pub fn select_customer(&mut self, customer: Customer) {
        tracing::debug!(customer_id = %customer.id, "Customer selected");
        self.customer = Some(customer);
        self.gift = None;
        self.completed = false;
    }

    /// Select a customer from the loaded list.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::UnknownCustomer` if the id is not loaded.
    pub fn select_customer_by_id(&mut self, id: CustomerId) -> Result<(), DeskError> {
        let customer = self
            .customers
            .get()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(DeskError::UnknownCustomer(id))?;
        self.select_customer(customer);
        Ok(())
    }

    /// Select a gift.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::OutOfStock` for a gift with no stock; the current
    /// selection is kept.
    pub fn select_gift(&mut self, gift: Gift) -> Result<(), DeskError> {
        if !gift.in_stock() {
            return Err(DeskError::OutOfStock { name: gift.name });
        }
        tracing::debug!(gift_id = %gift.id, "Gift selected");
        self.gift = Some(gift);
        Ok(())
    }

    /// Select a gift from the loaded list.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::UnknownGift` if the id is not loaded, or
    /// `DeskError::OutOfStock`.
    pub fn select_gift_by_id(&mut self, id: GiftId) -> Result<(), DeskError> {
        let gift = self
            .gifts
            .get()
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or(DeskError::UnknownGift(id))?;
        self.select_gift(gift)
    }

    pub fn clear_customer(&mut self) {
        self.customer = None;
    }

    pub fn clear_gift(&mut self) {
        self.gift = None;
    }

    #[must_use]
    pub const fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    #[must_use]
    pub const fn gift(&self) -> Option<&Gift> {
        self.gift.as_ref()
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Evaluate the current selections.
    #[must_use]
    pub fn eligibility(&self) -> Eligibility {
        Eligibility::evaluate(self.customer.as_ref(), self.gift.as_ref())
    }

    /// Submit the redemption and refresh both lists.
    ///
    /// A failed refresh is logged and the optimistic balance stands.
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit`].
    pub async fn confirm(&mut self) -> Result<RedemptionReceipt, DeskError> {
        let mut receipt = self.submit().await?;

        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Refresh after redemption failed");
        }

        if let Some(customer) = self.customer.as_ref() {
            receipt.balance = customer.total_points;
        }
        Ok(receipt)
    }

    /// Submit the redemption without refreshing.
    ///
    /// Nothing is sent unless the current selections are eligible. On a
    /// backend rejection the desk is left exactly as it was. On success the
    /// desk is completed and the selected customer's balance is reduced
    /// locally until the next [`Self::load`].
    ///
    /// # Errors
    ///
    /// Returns `DeskError::NoCustomer`, `NoGift`, `NotEligible` or
    /// `AlreadyCompleted` without contacting the backend, and
    /// `DeskError::Api` when the backend refuses.
    pub async fn submit(&mut self) -> Result<RedemptionReceipt, DeskError> {
        if self.completed {
            return Err(DeskError::AlreadyCompleted);
        }
        let eligibility = self.eligibility();
        let customer = self.customer.as_ref().ok_or(DeskError::NoCustomer)?;
        let gift = self.gift.as_ref().ok_or(DeskError::NoGift)?;
        if !eligibility.eligible {
            return Err(DeskError::NotEligible {
                balance_after: eligibility.balance_after.unwrap_or_default(),
            });
        }

        let customer_id = customer.id;
        let points_required = gift.points_required;
        let customer_name = customer.full_name.clone();
        let gift_name = gift.name.clone();

        let redemption = self
            .client
            .redeem(customer_id, gift.id)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Redemption rejected"))?;

        self.completed = true;
        let mut balance = 0;
        if let Some(selected) = self.customer.as_mut() {
            selected.total_points = selected.total_points.saturating_sub(points_required);
            balance = selected.total_points;
        }

        Ok(RedemptionReceipt {
            redemption,
            customer_name,
            gift_name,
            balance,
        })
    }

    /// Start over: no selections, not completed. Loaded lists are kept.
    pub fn reset(&mut self) {
        self.customer = None;
        self.gift = None;
        self.completed = false;
    }
}
