//! HTTP handlers for the `services` API namespace.

pub mod error;
pub mod settings;
pub mod status;

pub use error::trigger_error;
pub use settings::{get_setting, list_settings};
pub use status::{get_status, list_status};
