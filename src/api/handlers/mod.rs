//! HTTP route handlers, one file per domain area.
//!
//! Handlers are thin: they own SQL statements and request→row mapping,
//! and either return success or an `AppError` for the terminal formatter.
//! They never format error responses themselves.

pub mod auth;
pub mod burials;
pub mod contracts;
pub mod customers;
pub mod financial;
pub mod grants;
pub mod health;
pub mod inventory;
pub mod work_orders;
