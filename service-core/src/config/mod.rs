use config::{Config as Cfg, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;

/// Settings every service shares. Service configs embed this with
/// `#[serde(flatten)]`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Layered sources shared by all services: `.env`, an optional
/// `configuration.*` file, then `APP__`-prefixed environment variables.
/// Keys in `list_keys` are split on commas when read from the environment.
pub fn layered(list_keys: &[&str]) -> ConfigBuilder<DefaultState> {
    dotenvy::dotenv().ok();

    let mut env = Environment::with_prefix("APP")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true);

    if !list_keys.is_empty() {
        env = env.list_separator(",");
        for key in list_keys {
            env = env.with_list_parse_key(key);
        }
    }

    Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(env)
}
