use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

pub const STATUS_PK: &str = "status";

/// Outcome of one run of the probe set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub cache: bool,
    pub db: bool,
    pub settings: bool,
    pub resource_uri: String,
    #[serde(skip)]
    pub failures: Vec<(&'static str, String)>,
}

impl StatusReport {
    pub fn new(cache: bool, db: bool, settings: bool) -> Self {
        Self {
            cache,
            db,
            settings,
            resource_uri: format!("/services/status/{}/", STATUS_PK),
            failures: Vec::new(),
        }
    }

    /// Check names and outcomes, in the order the probes run.
    pub fn checks(&self) -> [(&'static str, bool); 3] {
        [
            ("cache", self.cache),
            ("db", self.db),
            ("settings", self.settings),
        ]
    }

    pub fn is_healthy(&self) -> bool {
        self.checks().iter().all(|(_, ok)| *ok)
    }

    /// The three outcomes plus a diagnostic per failed probe, used as
    /// `error_data` when the report is unhealthy.
    pub fn error_data(&self) -> Map<String, Value> {
        let mut data: Map<String, Value> = self
            .checks()
            .iter()
            .map(|(name, ok)| (name.to_string(), Value::Bool(*ok)))
            .collect();

        if !self.failures.is_empty() {
            let diagnostics = self
                .failures
                .iter()
                .map(|(name, message)| (name.to_string(), Value::String(message.clone())))
                .collect();
            data.insert("diagnostics".to_string(), Value::Object(diagnostics));
        }

        data
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self
            .checks()
            .iter()
            .map(|(name, ok)| format!("{}: {}", name, ok))
            .collect();
        write!(f, "<Status: {}>", values.join(", "))
    }
}
