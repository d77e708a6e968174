//! Application startup and lifecycle management.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{http_trace_layer, request_id_middleware};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;

use crate::config::OpsConfig;
use crate::handlers::{get_setting, get_status, list_settings, list_status, trigger_error};
use crate::services::{
    report_errors, AdminNotifier, ErrorReporter, MockAdminMailer, ProbeFactory, ProbeRegistry,
    SmtpAdminMailer,
};

/// Shared application state. Immutable once built.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<OpsConfig>,
    pub probes: ProbeFactory,
    pub reporter: Arc<ErrorReporter>,
}

impl AppState {
    pub fn new(
        config: OpsConfig,
        registry: &ProbeRegistry,
        notifier: Arc<dyn AdminNotifier>,
    ) -> Result<Self, AppError> {
        let probes = registry.resolve(&config.status_module)?;
        let reporter = Arc::new(ErrorReporter::new(&config, notifier));

        Ok(Self {
            config: Arc::new(config),
            probes,
            reporter,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/services/error/", get(trigger_error))
        .route("/services/settings/", get(list_settings))
        .route("/services/settings/:key/", get(get_setting))
        .route("/services/status/", get(list_status))
        .route("/services/status/:pk/", get(get_status))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(state.reporter.clone(), report_errors))
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// A panicking handler or probe becomes an ordinary internal error, so it is
/// rendered, logged and mailed like any other failure.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let reason = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::InternalError(anyhow::anyhow!("Request handler panicked: {}", reason))
        .into_response()
}

/// SMTP when enabled, otherwise a mailer that only logs.
pub fn admin_notifier(config: &OpsConfig) -> Arc<dyn AdminNotifier> {
    if !config.mail.smtp.enabled {
        tracing::info!("SMTP disabled, using mock admin mailer");
        return Arc::new(MockAdminMailer::new());
    }

    match SmtpAdminMailer::new(&config.mail) {
        Ok(mailer) => {
            tracing::info!(
                admins = config.mail.admins.len(),
                "SMTP admin mailer initialized"
            );
            Arc::new(mailer)
        }
        Err(e) => {
            tracing::warn!("Failed to initialize SMTP admin mailer: {}. Using mock.", e);
            Arc::new(MockAdminMailer::new())
        }
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the built-in probe sets and the configured
    /// admin mailer.
    pub async fn build(config: OpsConfig) -> Result<Self, AppError> {
        let notifier = admin_notifier(&config);
        Self::build_with(config, &ProbeRegistry::with_builtin(), notifier).await
    }

    pub async fn build_with(
        config: OpsConfig,
        registry: &ProbeRegistry,
        notifier: Arc<dyn AdminNotifier>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let status_module = config.status_module.clone();
        let state = AppState::new(config, registry, notifier)?;

        // Port 0 binds a random port for testing
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            status_module = %status_module,
            "Ops service listening"
        );

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(
            self.listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}
