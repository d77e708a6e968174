#![allow(dead_code)]

use async_trait::async_trait;
use ops_service::config::OpsConfig;
use ops_service::services::{
    MockAdminMailer, ProbeFailure, ProbeRegistry, ProbeResult, StatusProbe,
};
use ops_service::startup::{build_router, AppState, Application};
use serde_json::json;
use std::sync::Arc;

pub const HEALTHY_MODULE: &str = "tests.healthy";
pub const DB_DOWN_MODULE: &str = "tests.db_down";
pub const PANICKING_MODULE: &str = "tests.panicking";

/// Probe set with fixed outcomes.
pub struct FixedProbes {
    pub cache: bool,
    pub db: bool,
}

#[async_trait]
impl StatusProbe for FixedProbes {
    async fn test_cache(&self) -> ProbeResult {
        if self.cache {
            Ok(())
        } else {
            Err(ProbeFailure::new("cache unreachable"))
        }
    }

    async fn test_db(&self) -> ProbeResult {
        if self.db {
            Ok(())
        } else {
            Err(ProbeFailure::new("database unreachable"))
        }
    }
}

/// Status checks whose cache client panics mid-check.
pub struct PanickingChecks;

#[async_trait]
impl StatusProbe for PanickingChecks {
    async fn test_cache(&self) -> ProbeResult {
        panic!("cache client blew up");
    }

    async fn test_db(&self) -> ProbeResult {
        Ok(())
    }
}

pub fn registry() -> ProbeRegistry {
    ProbeRegistry::with_builtin()
        .register(HEALTHY_MODULE, |_| {
            Box::new(FixedProbes {
                cache: true,
                db: true,
            }) as Box<dyn StatusProbe>
        })
        .register(DB_DOWN_MODULE, |_| {
            Box::new(FixedProbes {
                cache: true,
                db: false,
            }) as Box<dyn StatusProbe>
        })
        .register(PANICKING_MODULE, |_| {
            Box::new(PanickingChecks) as Box<dyn StatusProbe>
        })
}

pub fn test_config(status_module: &str, debug: bool) -> OpsConfig {
    let mut config = OpsConfig::default();
    config.common.port = 0;
    config.debug = debug;
    config.status_module = status_module.to_string();
    config.mail.admins = vec!["ops@example.com".to_string()];
    config.mail.smtp.password = secrecy::Secret::new("smtp-hunter2".to_string());
    config
        .settings
        .insert("SECRET_KEY".to_string(), json!("not-for-production-123"));
    config
        .settings
        .insert("TIME_ZONE".to_string(), json!("UTC"));
    config
}

/// Router and mailer for in-process requests.
pub fn router(config: OpsConfig) -> (axum::Router, Arc<MockAdminMailer>) {
    let mailer = Arc::new(MockAdminMailer::new());
    let state =
        AppState::new(config, &registry(), mailer.clone()).expect("Failed to build app state");
    (build_router(state), mailer)
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub mailer: Arc<MockAdminMailer>,
}

impl TestApp {
    pub async fn spawn(config: OpsConfig) -> Self {
        let mailer = Arc::new(MockAdminMailer::new());
        let app = Application::build_with(config, &registry(), mailer.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the settings listing
        let client = reqwest::Client::new();
        let ready_url = format!("{}/services/settings/", address);
        for _ in 0..50 {
            if client.get(&ready_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            mailer,
        }
    }
}
