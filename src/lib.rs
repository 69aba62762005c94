//! # Request Correlation Middleware
//!
//! Establishes a correlation id for every inbound HTTP request so that log
//! lines emitted anywhere in the request's processing can be tied together.
//!
//! ## Modules
//! - `config`: startup configuration (header name, MDC key)
//! - `context`: per-request storage for the active correlation id
//! - `mdc`: ambient logging context (mapped diagnostic context)
//! - `correlation_id`: the request-boundary middleware
//!
//! ## Example
//! ```rust
//! use actix_web::App;
//! use request_correlation::CorrelationIdMiddleware;
//!
//! let app = App::new().wrap(CorrelationIdMiddleware::default());
//! ```

pub mod config;
pub mod context;
pub mod correlation_id;
pub mod mdc;

pub use config::CorrelationConfig;
pub use context::CorrelationContext;
pub use correlation_id::{correlation_id, CorrelationId, CorrelationIdMiddleware};
pub use mdc::{LogContext, Mdc};
