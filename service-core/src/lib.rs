//! Shared HTTP infrastructure for the church services: configuration,
//! the error-to-response mapping, logging, metrics and request middleware.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
