//! Middleware pipeline stages.
//!
//! Mount order (outermost first): request context, error formatter,
//! CORS, panic catcher, rate limiter, CSRF issuance, CSRF verification,
//! body normalization, then routing with auth and validation on the way
//! to a handler. The formatter is the terminal stage: every failure
//! produced anywhere inside the stack passes through it exactly once.

pub mod auth;
pub mod cors;
pub mod csrf;
pub mod error_formatter;
pub mod normalize;
pub mod rate_limit;
pub mod request_context;
