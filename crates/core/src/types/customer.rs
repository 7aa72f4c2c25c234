//! Loyalty-program members and the drafts used to change them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::CustomerId;

/// Errors raised when a draft fails local validation.
///
/// Drafts are checked before any request is sent so obviously malformed
/// input never reaches the backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// A required text field is empty or whitespace.
    #[error("{field} cannot be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The email address is structurally invalid.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    /// Point amounts must be strictly positive.
    #[error("amount must be positive")]
    NonPositiveAmount,
    /// An update draft carries no changes.
    #[error("nothing to update")]
    NoChanges,
}

/// A loyalty-program member as last reported by the backend.
///
/// `total_points` is a display copy. It only changes through server-confirmed
/// operations (award, deduct, redemption) and is refreshed by re-fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    pub total_points: u32,
    pub created_at: NaiveDateTime,
}

impl Customer {
    /// Local search used by the redemption desk: case-insensitive match on
    /// the name, plain substring match on the phone number.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        self.full_name
            .to_lowercase()
            .contains(&query.to_lowercase())
            || self.phone_number.contains(query)
    }
}

/// Registration form for a new customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCustomer {
    pub full_name: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl NewCustomer {
    /// Build and validate a registration draft.
    ///
    /// A blank email is treated as "not provided".
    ///
    /// # Errors
    ///
    /// Returns [`DraftError`] when the name or phone is blank or the email is
    /// malformed.
    pub fn new(
        full_name: impl Into<String>,
        phone_number: impl Into<String>,
        email: Option<String>,
    ) -> Result<Self, DraftError> {
        let full_name = required(full_name.into(), "full name")?;
        let phone_number = required(phone_number.into(), "phone number")?;
        let email = optional_email(email)?;

        Ok(Self {
            full_name,
            phone_number,
            email,
        })
    }
}

/// Partial update of a customer. Unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl CustomerUpdate {
    /// Check the draft before sending it.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::NoChanges`] for an empty update, or a field
    /// error when a provided value is blank or malformed.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.full_name.is_none() && self.phone_number.is_none() && self.email.is_none() {
            return Err(DraftError::NoChanges);
        }
        if let Some(name) = &self.full_name {
            required(name.clone(), "full name")?;
        }
        if let Some(phone) = &self.phone_number {
            required(phone.clone(), "phone number")?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Award or deduction request: a positive amount and a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointsAdjustment {
    amount: u32,
    description: String,
}

impl PointsAdjustment {
    /// # Errors
    ///
    /// Returns [`DraftError::NonPositiveAmount`] for zero, or
    /// [`DraftError::Empty`] for a blank description.
    pub fn new(amount: u32, description: impl Into<String>) -> Result<Self, DraftError> {
        if amount == 0 {
            return Err(DraftError::NonPositiveAmount);
        }
        let description = required(description.into(), "description")?;
        Ok(Self {
            amount,
            description,
        })
    }

    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

pub(crate) fn required(value: String, field: &'static str) -> Result<String, DraftError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DraftError::Empty { field });
    }
    Ok(trimmed.to_owned())
}

fn optional_email(email: Option<String>) -> Result<Option<String>, DraftError> {
    match email.map(|e| e.trim().to_owned()) {
        Some(e) if e.is_empty() => Ok(None),
        Some(e) => {
            validate_email(&e)?;
            Ok(Some(e))
        }
        None => Ok(None),
    }
}

fn validate_email(email: &str) -> Result<(), DraftError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DraftError::InvalidEmail(email.to_owned())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer(name: &str, phone: &str) -> Customer {
        Customer {
            id: CustomerId::random(),
            full_name: name.to_owned(),
            phone_number: phone.to_owned(),
            email: None,
            total_points: 0,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn test_matches_name_case_insensitively() {
        let c = customer("Lim Xiao Ming", "0123456789");
        assert!(c.matches("xiao"));
        assert!(c.matches("LIM"));
        assert!(!c.matches("tan"));
    }

    #[test]
    fn test_matches_phone_substring() {
        let c = customer("Lim Xiao Ming", "0123456789");
        assert!(c.matches("3456"));
        assert!(c.matches(""));
    }

    #[test]
    fn test_deserializes_backend_payload() {
        let json = r#"{
            "id": "8d4f6b0a-1c2e-4f3a-9b8c-7d6e5f4a3b2c",
            "full_name": "Tan Mei Ling",
            "phone_number": "0198765432",
            "email": null,
            "total_points": 1200,
            "created_at": "2025-03-01T09:30:00.123456"
        }"#;
        let c: Customer = serde_json::from_str(json).unwrap();
        assert_eq!(c.full_name, "Tan Mei Ling");
        assert_eq!(c.total_points, 1200);
        assert!(c.email.is_none());
    }

    #[test]
    fn test_new_customer_blank_email_is_dropped() {
        let draft = NewCustomer::new("Ali", "0111", Some("  ".to_owned())).unwrap();
        assert!(draft.email.is_none());
        let json = serde_json::to_value(&draft).unwrap();
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_new_customer_rejects_blank_name() {
        assert_eq!(
            NewCustomer::new("   ", "0111", None),
            Err(DraftError::Empty { field: "full name" })
        );
    }

    #[test]
    fn test_new_customer_rejects_bad_email() {
        assert!(matches!(
            NewCustomer::new("Ali", "0111", Some("ali.example.com".to_owned())),
            Err(DraftError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_empty_update_is_rejected() {
        assert_eq!(
            CustomerUpdate::default().validate(),
            Err(DraftError::NoChanges)
        );
    }

    #[test]
    fn test_update_serializes_only_set_fields() {
        let update = CustomerUpdate {
            phone_number: Some("0222".to_owned()),
            ..CustomerUpdate::default()
        };
        update.validate().unwrap();
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "phone_number": "0222" }));
    }

    #[test]
    fn test_points_adjustment_validation() {
        assert_eq!(
            PointsAdjustment::new(0, "Purchase"),
            Err(DraftError::NonPositiveAmount)
        );
        assert_eq!(
            PointsAdjustment::new(10, " "),
            Err(DraftError::Empty {
                field: "description"
            })
        );

        let ok = PointsAdjustment::new(200, "Purchase RM200").unwrap();
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({ "amount": 200, "description": "Purchase RM200" })
        );
    }
}
