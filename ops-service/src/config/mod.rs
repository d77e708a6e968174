use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use service_core::config as core_config;
use service_core::error::AppError;
use std::collections::BTreeMap;

/// Legacy variable naming the probe set, honoured alongside
/// `APP__STATUS_MODULE`.
pub const STATUS_MODULE_ENV: &str = "SERVICES_STATUS_MODULE";

pub const DEFAULT_STATUS_MODULE: &str = "services.services";

#[derive(Debug, Clone, Deserialize)]
pub struct OpsConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_status_module")]
    pub status_module: String,
    /// Client addresses reported as "internal" in error notifications.
    #[serde(default)]
    pub internal_ips: Vec<String>,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub probes: ProbeConfig,
    /// Free-form application settings exposed through the settings resource.
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default = "default_server_email")]
    pub server_email: String,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            server_email: default_server_email(),
            subject_prefix: default_subject_prefix(),
            smtp: SmtpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default = "empty_secret")]
    pub password: Secret<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_smtp_host(),
            port: default_smtp_port(),
            user: String::new(),
            password: empty_secret(),
        }
    }
}

/// Targets for the `services.tcp` probe set.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub cache_addr: Option<String>,
    #[serde(default)]
    pub database_addr: Option<String>,
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            cache_addr: None,
            database_addr: None,
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_status_module() -> String {
    DEFAULT_STATUS_MODULE.to_string()
}

fn default_server_email() -> String {
    "root@localhost".to_string()
}

fn default_subject_prefix() -> String {
    "[ops-service] ".to_string()
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            debug: false,
            status_module: default_status_module(),
            internal_ips: Vec::new(),
            mail: MailConfig::default(),
            probes: ProbeConfig::default(),
            settings: BTreeMap::new(),
        }
    }
}

impl OpsConfig {
    pub fn load() -> Result<Self, AppError> {
        let config = core_config::layered(&["internal_ips", "mail.admins"])
            .set_override_option("status_module", std::env::var(STATUS_MODULE_ENV).ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Every setting under its upper-case name, before redaction. Secrets are
    /// exposed here and masked by the redactor on the way out.
    pub fn raw_settings(&self) -> Map<String, Value> {
        let mut raw = Map::new();

        raw.insert("DEBUG".into(), json!(self.debug));
        raw.insert("PORT".into(), json!(self.common.port));
        raw.insert("LOG_LEVEL".into(), json!(self.common.log_level));
        raw.insert("OTLP_ENDPOINT".into(), json!(self.common.otlp_endpoint));
        raw.insert("SERVICES_STATUS_MODULE".into(), json!(self.status_module));
        raw.insert("INTERNAL_IPS".into(), json!(self.internal_ips));
        raw.insert("ADMINS".into(), json!(self.mail.admins));
        raw.insert("SERVER_EMAIL".into(), json!(self.mail.server_email));
        raw.insert(
            "EMAIL_SUBJECT_PREFIX".into(),
            json!(self.mail.subject_prefix),
        );
        raw.insert("EMAIL_ENABLED".into(), json!(self.mail.smtp.enabled));
        raw.insert("EMAIL_HOST".into(), json!(self.mail.smtp.host));
        raw.insert("EMAIL_PORT".into(), json!(self.mail.smtp.port));
        raw.insert("EMAIL_HOST_USER".into(), json!(self.mail.smtp.user));
        raw.insert(
            "EMAIL_HOST_PASSWORD".into(),
            json!(self.mail.smtp.password.expose_secret()),
        );
        raw.insert("STATUS_CACHE_ADDR".into(), json!(self.probes.cache_addr));
        raw.insert(
            "STATUS_DATABASE_ADDR".into(),
            json!(self.probes.database_addr),
        );
        raw.insert("STATUS_TIMEOUT_MS".into(), json!(self.probes.timeout_ms));

        // Environment sources lower-case keys, settings are named in upper case.
        for (key, value) in &self.settings {
            raw.insert(key.to_uppercase(), value.clone());
        }

        raw
    }
}
