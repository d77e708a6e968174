//! Pluggable health probes behind the status resource.
//!
//! A deployment picks its probe set by name (`SERVICES_STATUS_MODULE`). The
//! name is resolved once against a [`ProbeRegistry`] at startup and a fresh
//! probe set is built from the factory for every status request.

use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;

use crate::config::{OpsConfig, DEFAULT_STATUS_MODULE};
use crate::models::StatusReport;

pub const TCP_STATUS_MODULE: &str = "services.tcp";

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ProbeFailure(pub String);

impl ProbeFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type ProbeResult = Result<(), ProbeFailure>;

#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Check the connection to the cache.
    async fn test_cache(&self) -> ProbeResult;

    /// Check the connection to the database.
    async fn test_db(&self) -> ProbeResult;

    /// Check application specific settings. Passes by default: serving this
    /// request already required the configuration to load.
    async fn test_settings(&self) -> ProbeResult {
        Ok(())
    }
}

/// Run the probes in their fixed order and record each outcome.
pub async fn run_probes(probe: &dyn StatusProbe) -> StatusReport {
    let cache = probe.test_cache().await;
    let db = probe.test_db().await;
    let settings = probe.test_settings().await;

    let mut report = StatusReport::new(cache.is_ok(), db.is_ok(), settings.is_ok());
    for (name, outcome) in [("cache", cache), ("db", db), ("settings", settings)] {
        if let Err(failure) = outcome {
            tracing::warn!(check = name, reason = %failure, "Status probe failed");
            report.failures.push((name, failure.0));
        }
    }

    report
}

pub type ProbeFactory = Arc<dyn Fn(&OpsConfig) -> Box<dyn StatusProbe> + Send + Sync>;

/// Named probe-set factories.
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    factories: HashMap<String, ProbeFactory>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in probe sets.
    pub fn with_builtin() -> Self {
        Self::new()
            .register(DEFAULT_STATUS_MODULE, |_| {
                Box::new(UnconfiguredProbes) as Box<dyn StatusProbe>
            })
            .register(TCP_STATUS_MODULE, |config| {
                Box::new(TcpProbes::from_config(config)) as Box<dyn StatusProbe>
            })
    }

    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&OpsConfig) -> Box<dyn StatusProbe> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn resolve(&self, name: &str) -> Result<ProbeFactory, AppError> {
        self.factories.get(name).cloned().ok_or_else(|| {
            let mut known: Vec<&str> = self.factories.keys().map(String::as_str).collect();
            known.sort_unstable();
            AppError::ConfigError(anyhow::anyhow!(
                "Unknown status module '{}'. Known modules: {}",
                name,
                known.join(", ")
            ))
        })
    }
}

/// The base probe set. Cache and database checks must be supplied by the
/// deployment, so they fail until another module is configured.
pub struct UnconfiguredProbes;

#[async_trait]
impl StatusProbe for UnconfiguredProbes {
    async fn test_cache(&self) -> ProbeResult {
        Err(ProbeFailure::new("cache check not implemented"))
    }

    async fn test_db(&self) -> ProbeResult {
        Err(ProbeFailure::new("database check not implemented"))
    }
}

/// Reachability checks: a TCP connect to the cache and database addresses.
pub struct TcpProbes {
    cache_addr: Option<String>,
    database_addr: Option<String>,
    timeout: Duration,
}

impl TcpProbes {
    pub fn new(
        cache_addr: Option<String>,
        database_addr: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            cache_addr,
            database_addr,
            timeout,
        }
    }

    pub fn from_config(config: &OpsConfig) -> Self {
        Self::new(
            config.probes.cache_addr.clone(),
            config.probes.database_addr.clone(),
            Duration::from_millis(config.probes.timeout_ms),
        )
    }

    async fn connect(&self, what: &str, addr: Option<&str>) -> ProbeResult {
        let addr =
            addr.ok_or_else(|| ProbeFailure::new(format!("{} address not configured", what)))?;

        match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ProbeFailure::new(format!(
                "{} at {} unreachable: {}",
                what, addr, e
            ))),
            Err(_) => Err(ProbeFailure::new(format!(
                "{} at {} timed out after {}ms",
                what,
                addr,
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl StatusProbe for TcpProbes {
    async fn test_cache(&self) -> ProbeResult {
        self.connect("cache", self.cache_addr.as_deref()).await
    }

    async fn test_db(&self) -> ProbeResult {
        self.connect("database", self.database_addr.as_deref()).await
    }
}
