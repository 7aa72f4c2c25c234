//! Staff identities and roles.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::StaffId;

/// Staff role with different permission levels.
///
/// Authorization is enforced by the backend; the client only displays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Can manage other staff accounts in addition to everything else.
    Admin,
    /// Day-to-day operator: customers, points, gifts, redemptions.
    Staff,
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Staff => write!(f, "staff"),
        }
    }
}

impl std::str::FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            _ => Err(format!("invalid staff role: {s}")),
        }
    }
}

/// Who is logged in, as decoded from the bearer token's claims.
///
/// Display-only. Never use it for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffIdentity {
    pub username: String,
    pub role: StaffRole,
}

/// Authoritative staff record from `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub username: String,
    pub role: StaffRole,
    pub created_at: NaiveDateTime,
}

impl From<StaffMember> for StaffIdentity {
    fn from(member: StaffMember) -> Self {
        Self {
            username: member.username,
            role: member.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [StaffRole::Admin, StaffRole::Staff] {
            assert_eq!(role.to_string().parse::<StaffRole>(), Ok(role));
        }
        assert!("owner".parse::<StaffRole>().is_err());
    }
}
