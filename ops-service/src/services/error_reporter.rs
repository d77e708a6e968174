//! Logging and admin notification for failed requests.
//!
//! `AppError` renders the 500 body and attaches a [`FailureReport`] to the
//! response; [`report_errors`] picks it up at the edge of the router. Not-found
//! errors render as a bare 404 without a report, so they are never mailed.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use service_core::error::FailureReport;
use service_core::middleware::request_id;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use super::mailer::AdminNotifier;
use crate::config::OpsConfig;

/// What the reporter needs to know about the failed request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub uri: String,
    pub remote_addr: Option<IpAddr>,
    pub request_id: String,
}

impl RequestContext {
    pub fn from_request(req: &Request) -> Self {
        Self {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            uri: req.uri().to_string(),
            remote_addr: req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip()),
            request_id: request_id(req).to_string(),
        }
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remote = self
            .remote_addr
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        write!(
            f,
            "<Request method={} uri={} remote_addr={} request_id={}>",
            self.method, self.uri, remote, self.request_id
        )
    }
}

pub struct ErrorReporter {
    debug: bool,
    internal_ips: Vec<String>,
    subject_prefix: String,
    notifier: Arc<dyn AdminNotifier>,
}

impl ErrorReporter {
    pub fn new(config: &OpsConfig, notifier: Arc<dyn AdminNotifier>) -> Self {
        Self {
            debug: config.debug,
            internal_ips: config.internal_ips.clone(),
            subject_prefix: config.mail.subject_prefix.clone(),
            notifier,
        }
    }

    /// Admins are only mailed outside debug mode.
    pub fn should_notify(&self) -> bool {
        !self.debug
    }

    fn is_internal(&self, addr: Option<IpAddr>) -> bool {
        addr.map(|ip| {
            let ip = ip.to_string();
            self.internal_ips.iter().any(|known| *known == ip)
        })
        .unwrap_or(false)
    }

    pub fn subject(&self, ctx: &RequestContext) -> String {
        format!(
            "{}Error ({} IP): {}",
            self.subject_prefix,
            if self.is_internal(ctx.remote_addr) {
                "internal"
            } else {
                "EXTERNAL"
            },
            ctx.path
        )
    }

    pub async fn report(&self, ctx: &RequestContext, failure: &FailureReport) {
        tracing::error!(
            path = %ctx.path,
            status_code = 500,
            request_id = %ctx.request_id,
            error_code = %failure.payload.error_code,
            detail = %failure.detail,
            "Internal Server Error: {}",
            ctx.path
        );

        if !self.should_notify() {
            return;
        }

        let subject = self.subject(ctx);
        let message = format!("{}\n\n{}", failure.detail, ctx);

        if let Err(e) = self.notifier.mail_admins(&subject, &message).await {
            tracing::warn!(error = %e, path = %ctx.path, "Failed to notify admins of error");
        }
    }
}

pub async fn report_errors(
    State(reporter): State<Arc<ErrorReporter>>,
    req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&req);
    let response = next.run(req).await;

    if let Some(failure) = response.extensions().get::<Arc<FailureReport>>() {
        reporter.report(&ctx, failure).await;
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mailer::MockAdminMailer;
    use service_core::error::AppError;

    fn context(remote: Option<&str>) -> RequestContext {
        RequestContext {
            method: Method::GET,
            path: "/services/error/".to_string(),
            uri: "/services/error/".to_string(),
            remote_addr: remote.map(|r| r.parse().unwrap()),
            request_id: "req-1".to_string(),
        }
    }

    fn failure() -> FailureReport {
        FailureReport {
            payload: AppError::coded("TestError", "This is a test.").payload(),
            detail: "Coded { code: \"TestError\" }".to_string(),
        }
    }

    fn reporter(debug: bool, mailer: Arc<MockAdminMailer>) -> ErrorReporter {
        let mut config = OpsConfig::default();
        config.debug = debug;
        config.internal_ips = vec!["10.0.0.1".to_string()];
        config.mail.subject_prefix = "[ops] ".to_string();
        ErrorReporter::new(&config, mailer)
    }

    #[tokio::test]
    async fn mails_admins_outside_debug() {
        let mailer = Arc::new(MockAdminMailer::new());
        let reporter = reporter(false, mailer.clone());

        reporter.report(&context(Some("10.0.0.1")), &failure()).await;

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "[ops] Error (internal IP): /services/error/");
        assert!(sent[0].message.contains("TestError"));
        assert!(sent[0].message.contains("request_id=req-1"));
    }

    #[tokio::test]
    async fn never_mails_in_debug() {
        let mailer = Arc::new(MockAdminMailer::new());
        let reporter = reporter(true, mailer.clone());

        reporter.report(&context(None), &failure()).await;

        assert_eq!(mailer.send_count(), 0);
    }

    #[test]
    fn unknown_or_unlisted_addresses_are_external() {
        let reporter = reporter(false, Arc::new(MockAdminMailer::new()));

        assert!(reporter.subject(&context(None)).contains("EXTERNAL IP"));
        assert!(
            reporter
                .subject(&context(Some("192.168.1.9")))
                .contains("EXTERNAL IP")
        );
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let mailer = Arc::new(MockAdminMailer::failing());
        let reporter = reporter(false, mailer.clone());

        reporter.report(&context(None), &failure()).await;

        assert_eq!(mailer.send_count(), 0);
    }
}
