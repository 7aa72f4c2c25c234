//! Gift catalog entries.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::customer::{DraftError, required};
use super::id::GiftId;

/// A catalog item redeemable for points, with finite stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gift {
    pub id: GiftId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub points_required: u32,
    pub stock: u32,
    pub created_at: NaiveDateTime,
}

impl Gift {
    /// A gift can only be redeemed while at least one unit is left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether a balance covers this gift's price. Stock is not considered.
    #[must_use]
    pub const fn affordable_with(&self, points: u32) -> bool {
        points >= self.points_required
    }
}

/// Catalog entry to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewGift {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub points_required: u32,
    pub stock: u32,
}

impl NewGift {
    /// # Errors
    ///
    /// Returns [`DraftError::Empty`] when the name is blank.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        points_required: u32,
        stock: u32,
    ) -> Result<Self, DraftError> {
        Ok(Self {
            name: required(name.into(), "gift name")?,
            description: description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
            points_required,
            stock,
        })
    }
}

/// Partial update of a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GiftUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_required: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

impl GiftUpdate {
    /// # Errors
    ///
    /// Returns [`DraftError::NoChanges`] for an empty update or
    /// [`DraftError::Empty`] for a blank name.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.is_none()
            && self.description.is_none()
            && self.points_required.is_none()
            && self.stock.is_none()
        {
            return Err(DraftError::NoChanges);
        }
        if let Some(name) = &self.name {
            required(name.clone(), "gift name")?;
        }
        Ok(())
    }
}
