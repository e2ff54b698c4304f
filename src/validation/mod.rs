//! Declarative request validation.
//!
//! Each mutating route declares an ordered rule set (`&[FieldRule]`). Rules
//! are evaluated in declaration order without short-circuiting across
//! fields, so one invalid payload reports every problem at once. Failures
//! aggregate into a single `VALIDATION_ERROR` whose details carry
//! `{field, message, rejectedValue}` per failure.
//!
//! Field paths are camelCase: the normalizer middleware has already
//! rewritten client payloads before any rule runs.

pub mod resources;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::domain::errors::AppError;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("invalid email regex")
});

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ().-]{7,20}$").expect("invalid phone regex"));

/// One field-level rejection; a list of these becomes the `details` of a
/// validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
    pub rejected_value: Value,
}

impl ValidationFailure {
    fn to_json(&self) -> Value {
        json!({
            "field": self.field,
            "message": self.message,
            "rejectedValue": self.rejected_value,
        })
    }
}

/// Expected JSON type for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl Kind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Kind::String => value.is_string(),
            Kind::Number => value.is_number(),
            Kind::Integer => {
                value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            Kind::Boolean => value.is_boolean(),
            Kind::Object => value.is_object(),
            Kind::Array => value.is_array(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Kind::String => "a string",
            Kind::Number => "a number",
            Kind::Integer => "an integer",
            Kind::Boolean => "a boolean",
            Kind::Object => "an object",
            Kind::Array => "an array",
        }
    }
}

/// A single predicate applied to a field value. Checks run in order;
/// a type mismatch stops further checks for that field only.
#[derive(Debug, Clone, Copy)]
pub enum Check {
    Kind(Kind),
    MinLen(usize),
    MaxLen(usize),
    Min(f64),
    Max(f64),
    OneOf(&'static [&'static str]),
    Email,
    Phone,
    Uuid,
    /// Calendar date in `YYYY-MM-DD` form.
    Date,
    /// Normalization, not a predicate: trims and lower-cases the value in
    /// place (used for emails). Never fails.
    Lowercase,
}

/// Declarative rule for one field path (dotted for nested objects).
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub checks: &'static [Check],
}

/// Evaluate a rule set against a (normalized) JSON body, collecting every
/// failure before raising. `Lowercase` checks rewrite the body in place.
pub fn validate(rules: &[FieldRule], body: &mut Value) -> Result<(), AppError> {
    let mut failures: Vec<ValidationFailure> = Vec::new();

    for rule in rules {
        let value = lookup(body, rule.field).cloned();

        // "optional unless truthy": empty strings count as absent.
        let present = match &value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) if s.trim().is_empty() => {
                if rule.required {
                    failures.push(required_failure(rule.field, value.clone().unwrap_or(Value::Null)));
                }
                continue;
            }
            Some(_) => true,
        };

        if !present {
            if rule.required {
                failures.push(required_failure(rule.field, Value::Null));
            }
            continue;
        }

        let mut value = value.unwrap_or(Value::Null);
        apply_checks(rule, &mut value, &mut failures);
        if let Some(slot) = lookup_mut(body, rule.field) {
            *slot = value;
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        let details = Value::Array(failures.iter().map(ValidationFailure::to_json).collect());
        Err(AppError::validation("Validation failed", details))
    }
}

/// Same checks with every field made optional; partial-update routes run
/// the create rule set through this.
pub fn relaxed(rules: &[FieldRule]) -> Vec<FieldRule> {
    rules
        .iter()
        .map(|rule| FieldRule {
            required: false,
            ..*rule
        })
        .collect()
}

fn apply_checks(rule: &FieldRule, value: &mut Value, failures: &mut Vec<ValidationFailure>) {
    for check in rule.checks {
        match check {
            Check::Kind(kind) => {
                if !kind.matches(value) {
                    failures.push(failure(
                        rule.field,
                        format!("{} must be {}", humanize(rule.field), kind.describe()),
                        value.clone(),
                    ));
                    // Remaining checks assume the declared type.
                    return;
                }
                // A whole-number float passed the Integer check; rewrite it
                // so downstream integer deserialization sees an integer.
                if *kind == Kind::Integer && !value.is_i64() && !value.is_u64() {
                    if let Some(n) = value.as_f64() {
                        *value = Value::from(n as i64);
                    }
                }
            }
            Check::MinLen(min) => {
                if value.as_str().is_some_and(|s| s.chars().count() < *min) {
                    failures.push(failure(
                        rule.field,
                        format!(
                            "{} must be at least {min} characters long",
                            humanize(rule.field)
                        ),
                        value.clone(),
                    ));
                }
            }
            Check::MaxLen(max) => {
                if value.as_str().is_some_and(|s| s.chars().count() > *max) {
                    failures.push(failure(
                        rule.field,
                        format!(
                            "{} must be at most {max} characters long",
                            humanize(rule.field)
                        ),
                        value.clone(),
                    ));
                }
            }
            Check::Min(min) => {
                if value.as_f64().is_some_and(|n| n < *min) {
                    failures.push(failure(
                        rule.field,
                        format!("{} must be at least {min}", humanize(rule.field)),
                        value.clone(),
                    ));
                }
            }
            Check::Max(max) => {
                if value.as_f64().is_some_and(|n| n > *max) {
                    failures.push(failure(
                        rule.field,
                        format!("{} must be at most {max}", humanize(rule.field)),
                        value.clone(),
                    ));
                }
            }
            Check::OneOf(allowed) => {
                let ok = value.as_str().is_some_and(|s| allowed.contains(&s));
                if !ok {
                    failures.push(failure(
                        rule.field,
                        format!(
                            "{} must be one of: {}",
                            humanize(rule.field),
                            allowed.join(", ")
                        ),
                        value.clone(),
                    ));
                }
            }
            Check::Email => {
                if value.as_str().is_some_and(|s| !EMAIL_REGEX.is_match(s)) {
                    failures.push(failure(
                        rule.field,
                        format!("{} must be a valid email address", humanize(rule.field)),
                        value.clone(),
                    ));
                }
            }
            Check::Phone => {
                if value.as_str().is_some_and(|s| !PHONE_REGEX.is_match(s)) {
                    failures.push(failure(
                        rule.field,
                        format!("{} must be a valid phone number", humanize(rule.field)),
                        value.clone(),
                    ));
                }
            }
            Check::Uuid => {
                let ok = value
                    .as_str()
                    .is_some_and(|s| uuid::Uuid::parse_str(s).is_ok());
                if !ok {
                    failures.push(failure(
                        rule.field,
                        format!("{} must be a valid UUID", humanize(rule.field)),
                        value.clone(),
                    ));
                }
            }
            Check::Date => {
                let ok = value
                    .as_str()
                    .is_some_and(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok());
                if !ok {
                    failures.push(failure(
                        rule.field,
                        format!("{} must be a date in YYYY-MM-DD format", humanize(rule.field)),
                        value.clone(),
                    ));
                }
            }
            Check::Lowercase => {
                if let Value::String(s) = value {
                    *s = s.trim().to_lowercase();
                }
            }
        }
    }
}

fn required_failure(field: &str, rejected: Value) -> ValidationFailure {
    failure(field, format!("{} is required", humanize(field)), rejected)
}

fn failure(field: &str, message: String, rejected_value: Value) -> ValidationFailure {
    ValidationFailure {
        field: field.to_string(),
        message,
        rejected_value,
    }
}

/// Resolve a dotted camelCase path against a JSON object.
fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = body;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn lookup_mut<'a>(body: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let mut current = body;
    for segment in path.split('.') {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// "dueDate" → "Due date" for human-readable failure messages.
fn humanize(field: &str) -> String {
    let leaf = field.rsplit('.').next().unwrap_or(field);
    let mut out = String::with_capacity(leaf.len() + 4);
    for (i, ch) in leaf.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
