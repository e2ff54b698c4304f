//! # Sexton - Cemetery Operations Management API
//!
//! A relational-database-backed REST API for cemetery operations:
//! work orders, inventory, burials, contracts, grants, customers, and
//! financial ledgers.
//!
//! ## Architecture Layers
//!
//! - **Domain**: shared enums and the application error taxonomy
//! - **Validation**: declarative per-resource field rule sets
//! - **API**: HTTP handlers and the middleware pipeline
//!
//! ## Request pipeline
//!
//! Request context (correlation id) → rate limiter → CSRF token issuance →
//! body normalization (snake_case → camelCase) → per-route auth/validation →
//! handler. Any failure short-circuits to the terminal error formatter,
//! which produces one consistent JSON envelope.

pub mod api;
pub mod config;
pub mod domain;
pub mod validation;

pub use api::create_router;
pub use config::Config;
pub use domain::errors::AppError;
