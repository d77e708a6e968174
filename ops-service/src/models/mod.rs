pub mod settings;
pub mod status;

pub use settings::SettingsEntry;
pub use status::{StatusReport, STATUS_PK};
