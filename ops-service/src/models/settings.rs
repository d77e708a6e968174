use serde::Serialize;

/// One entry of the settings resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsEntry {
    pub key: String,
    pub value: Option<String>,
    pub resource_uri: String,
}

impl SettingsEntry {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        let key = key.into();
        let resource_uri = format!("/services/settings/{}/", key);
        Self {
            key,
            value,
            resource_uri,
        }
    }
}
