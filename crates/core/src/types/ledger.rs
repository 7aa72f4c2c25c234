//! Point transactions and redemption records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::{CustomerId, GiftId, RedemptionId, StaffId, TransactionId};

/// Why a customer's balance moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Points awarded by staff.
    Earn,
    /// Points spent on a gift.
    Redeem,
    /// Manual deduction by staff.
    ManualAdjust,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Earn => write!(f, "earn"),
            Self::Redeem => write!(f, "redeem"),
            Self::ManualAdjust => write!(f, "manual_adjust"),
        }
    }
}

/// One entry in a customer's point history. `amount` is signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointTransaction {
    pub id: TransactionId,
    pub customer_id: CustomerId,
    pub staff_id: StaffId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: String,
    pub created_at: NaiveDateTime,
}

/// Body of a redemption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub customer_id: CustomerId,
    pub gift_id: GiftId,
}

/// A completed redemption as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub id: RedemptionId,
    pub customer_id: CustomerId,
    pub gift_id: GiftId,
    pub staff_id: StaffId,
    pub points_used: u32,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_kind_uses_type_field() {
        let json = r#"{
            "id": "11111111-1111-4111-8111-111111111111",
            "customer_id": "22222222-2222-4222-8222-222222222222",
            "staff_id": "33333333-3333-4333-8333-333333333333",
            "type": "manual_adjust",
            "amount": -50,
            "description": "Manual adjustment",
            "created_at": "2025-03-01T09:30:00"
        }"#;
        let tx: PointTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.kind, TransactionKind::ManualAdjust);
        assert_eq!(tx.amount, -50);
        assert_eq!(tx.kind.to_string(), "manual_adjust");
    }
}
