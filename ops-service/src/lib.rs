//! ops-service: operational endpoints under the `services` API namespace.
//!
//! - `GET /services/error/` always fails, to exercise error reporting.
//! - `GET /services/settings/` and `/services/settings/<key>/` expose the
//!   redacted configuration.
//! - `GET /services/status/` runs the configured health probes.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
