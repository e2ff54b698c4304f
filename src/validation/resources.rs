//! Per-resource rule sets.
//!
//! One ordered `&[FieldRule]` per validated operation. Enum membership
//! always references `domain::enums`, the single authoritative location
//! for option lists.

use super::{Check, FieldRule, Kind};
use crate::domain::enums::{
    Role, BURIAL_TYPES, CONTRACT_STATUSES, GRANT_STATUSES, INVENTORY_CATEGORIES,
    LEDGER_STATUSES, WORK_ORDER_PRIORITIES, WORK_ORDER_STATUSES, WORK_ORDER_TYPES,
};

pub static LOGIN: &[FieldRule] = &[
    FieldRule {
        field: "email",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::Lowercase, Check::Email],
    },
    FieldRule {
        field: "password",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1)],
    },
];

pub static REGISTER: &[FieldRule] = &[
    FieldRule {
        field: "email",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::Lowercase, Check::Email],
    },
    FieldRule {
        field: "password",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(8), Check::MaxLen(128)],
    },
    FieldRule {
        field: "name",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(120)],
    },
    FieldRule {
        field: "role",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::OneOf(Role::VALUES)],
    },
];

pub static WORK_ORDER_CREATE: &[FieldRule] = &[
    FieldRule {
        field: "title",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(200)],
    },
    FieldRule {
        field: "description",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(2000)],
    },
    FieldRule {
        field: "type",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::OneOf(WORK_ORDER_TYPES)],
    },
    FieldRule {
        field: "priority",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::OneOf(WORK_ORDER_PRIORITIES)],
    },
    FieldRule {
        field: "status",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::OneOf(WORK_ORDER_STATUSES)],
    },
    FieldRule {
        field: "assignedTo",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::Uuid],
    },
    FieldRule {
        field: "location",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(200)],
    },
    FieldRule {
        field: "dueDate",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::Date],
    },
];

pub static INVENTORY_ITEM: &[FieldRule] = &[
    FieldRule {
        field: "name",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(200)],
    },
    FieldRule {
        field: "category",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::OneOf(INVENTORY_CATEGORIES)],
    },
    FieldRule {
        field: "quantity",
        required: true,
        checks: &[Check::Kind(Kind::Integer), Check::Min(0.0)],
    },
    FieldRule {
        field: "unitCost",
        required: false,
        checks: &[Check::Kind(Kind::Number), Check::Min(0.0)],
    },
    FieldRule {
        field: "reorderLevel",
        required: false,
        checks: &[Check::Kind(Kind::Integer), Check::Min(0.0)],
    },
    FieldRule {
        field: "location",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(200)],
    },
];

pub static BURIAL: &[FieldRule] = &[
    FieldRule {
        field: "deceasedName",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(200)],
    },
    FieldRule {
        field: "type",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::OneOf(BURIAL_TYPES)],
    },
    FieldRule {
        field: "plot",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(50)],
    },
    FieldRule {
        field: "burialDate",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::Date],
    },
    FieldRule {
        field: "customerId",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::Uuid],
    },
    FieldRule {
        field: "funeralHome",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(200)],
    },
    FieldRule {
        field: "notes",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(2000)],
    },
];

pub static CONTRACT: &[FieldRule] = &[
    FieldRule {
        field: "customerId",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::Uuid],
    },
    FieldRule {
        field: "status",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::OneOf(CONTRACT_STATUSES)],
    },
    FieldRule {
        field: "totalAmount",
        required: true,
        checks: &[Check::Kind(Kind::Number), Check::Min(0.0)],
    },
    FieldRule {
        field: "signedDate",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::Date],
    },
    FieldRule {
        field: "items",
        required: false,
        checks: &[Check::Kind(Kind::Array)],
    },
    FieldRule {
        field: "notes",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(2000)],
    },
];

pub static GRANT: &[FieldRule] = &[
    FieldRule {
        field: "name",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(200)],
    },
    FieldRule {
        field: "grantor",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(200)],
    },
    FieldRule {
        field: "amount",
        required: true,
        checks: &[Check::Kind(Kind::Number), Check::Min(0.0)],
    },
    FieldRule {
        field: "status",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::OneOf(GRANT_STATUSES)],
    },
    FieldRule {
        field: "appliedDate",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::Date],
    },
    FieldRule {
        field: "awardedDate",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::Date],
    },
    FieldRule {
        field: "notes",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(2000)],
    },
];

pub static CUSTOMER: &[FieldRule] = &[
    FieldRule {
        field: "name",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(200)],
    },
    FieldRule {
        field: "email",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::Lowercase, Check::Email],
    },
    FieldRule {
        field: "phone",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::Phone],
    },
    FieldRule {
        field: "address",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(500)],
    },
    FieldRule {
        field: "notes",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(2000)],
    },
];

pub static DEPOSIT: &[FieldRule] = &[
    FieldRule {
        field: "depositDate",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::Date],
    },
    FieldRule {
        field: "amount",
        required: true,
        checks: &[Check::Kind(Kind::Number), Check::Min(0.01)],
    },
    FieldRule {
        field: "reference",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(100)],
    },
    FieldRule {
        field: "notes",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::MaxLen(2000)],
    },
];

pub static RECEIVABLE: &[FieldRule] = &[
    FieldRule {
        field: "invoiceNumber",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(50)],
    },
    FieldRule {
        field: "customerId",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::Uuid],
    },
    FieldRule {
        field: "amount",
        required: true,
        checks: &[Check::Kind(Kind::Number), Check::Min(0.01)],
    },
    FieldRule {
        field: "dueDate",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::Date],
    },
    FieldRule {
        field: "status",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::OneOf(LEDGER_STATUSES)],
    },
];

pub static PAYABLE: &[FieldRule] = &[
    FieldRule {
        field: "vendor",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(200)],
    },
    FieldRule {
        field: "invoiceNumber",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(50)],
    },
    FieldRule {
        field: "amount",
        required: true,
        checks: &[Check::Kind(Kind::Number), Check::Min(0.01)],
    },
    FieldRule {
        field: "dueDate",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::Date],
    },
    FieldRule {
        field: "status",
        required: false,
        checks: &[Check::Kind(Kind::String), Check::OneOf(LEDGER_STATUSES)],
    },
];

/// Shape of one line inside `contracts.items`; applied per element.
pub static CONTRACT_ITEM: &[FieldRule] = &[
    FieldRule {
        field: "description",
        required: true,
        checks: &[Check::Kind(Kind::String), Check::MinLen(1), Check::MaxLen(500)],
    },
    FieldRule {
        field: "quantity",
        required: true,
        checks: &[Check::Kind(Kind::Integer), Check::Min(1.0)],
    },
    FieldRule {
        field: "unitPrice",
        required: true,
        checks: &[Check::Kind(Kind::Number), Check::Min(0.0)],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    #[test]
    fn work_order_create_rejects_empty_payload_with_field_list() {
        let mut body = serde_json::json!({});
        let err = validate(WORK_ORDER_CREATE, &mut body).unwrap_err();
        let details = err.details.unwrap();
        let details = details.as_array().unwrap();
        assert!(!details.is_empty());
        assert_eq!(details[0]["field"], "title");
        assert_eq!(details[1]["field"], "type");
    }

    #[test]
    fn work_order_enums_come_from_shared_location() {
        let mut body = serde_json::json!({
            "title": "Mow section B",
            "type": "grounds",
            "priority": "high",
            "status": "pending",
        });
        assert!(validate(WORK_ORDER_CREATE, &mut body).is_ok());

        body["type"] = serde_json::json!("landscaping");
        let err = validate(WORK_ORDER_CREATE, &mut body).unwrap_err();
        let message = err.details.unwrap()[0]["message"].to_string();
        assert!(message.contains("maintenance"));
    }

    #[test]
    fn login_normalizes_email() {
        let mut body = serde_json::json!({"email": " Ada@Example.COM ", "password": "pw"});
        validate(LOGIN, &mut body).unwrap();
        assert_eq!(body["email"], "ada@example.com");
    }

    #[test]
    fn register_enforces_password_length_and_role() {
        let mut body = serde_json::json!({
            "email": "a@b.co",
            "password": "short",
            "name": "Ada",
            "role": "owner",
        });
        let err = validate(REGISTER, &mut body).unwrap_err();
        let details = err.details.unwrap();
        let details = details.as_array().unwrap();
        assert_eq!(details.len(), 2);
    }

    #[test]
    fn burial_requires_plot_and_valid_date() {
        let mut body = serde_json::json!({
            "deceasedName": "John Doe",
            "type": "cremation",
            "burialDate": "2024-13-40",
        });
        let err = validate(BURIAL, &mut body).unwrap_err();
        let fields: Vec<String> = err
            .details
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(fields, vec!["plot", "burialDate"]);
    }
}
