pub mod error_reporter;
pub mod mailer;
pub mod probes;
pub mod redaction;

pub use error_reporter::{report_errors, ErrorReporter, RequestContext};
pub use mailer::{AdminNotifier, MockAdminMailer, NotifyError, SentMail, SmtpAdminMailer};
pub use probes::{
    run_probes, ProbeFactory, ProbeFailure, ProbeRegistry, ProbeResult, StatusProbe, TcpProbes,
    UnconfiguredProbes,
};
pub use redaction::{cleanse_setting, display_value, safe_settings};
