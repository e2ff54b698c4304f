//! Authoritative option lists shared by validation and client-facing
//! responses. Every enum a route accepts is defined exactly once here;
//! rule sets reference these slices rather than repeating literals.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Principal role for role-based authorization. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Staff,
}

impl Role {
    pub const VALUES: &'static [&'static str] = &["admin", "manager", "staff"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "staff" => Ok(Role::Staff),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work-order categories.
pub const WORK_ORDER_TYPES: &[&str] =
    &["maintenance", "burial_prep", "grounds", "repair", "other"];

/// Work-order priorities.
pub const WORK_ORDER_PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];

/// Work-order lifecycle states.
pub const WORK_ORDER_STATUSES: &[&str] =
    &["pending", "in_progress", "completed", "cancelled"];

/// Interment types for burial records.
pub const BURIAL_TYPES: &[&str] = &["full", "cremation", "green"];

/// Contract lifecycle states.
pub const CONTRACT_STATUSES: &[&str] = &["draft", "active", "fulfilled", "cancelled"];

/// Grant application states.
pub const GRANT_STATUSES: &[&str] = &["applied", "awarded", "rejected", "closed"];

/// Inventory item categories.
pub const INVENTORY_CATEGORIES: &[&str] =
    &["marker", "vault", "urn", "casket", "supplies", "equipment"];

/// Ledger entry states shared by receivables and payables.
pub const LEDGER_STATUSES: &[&str] = &["open", "partial", "paid", "void"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for value in Role::VALUES {
            let role: Role = value.parse().unwrap();
            assert_eq!(role.as_str(), *value);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"manager\"").unwrap();
        assert_eq!(role, Role::Manager);
    }
}
