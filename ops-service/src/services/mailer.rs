use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::Mutex;
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Send error: {0}")]
    SendFailed(String),
}

/// Delivers operator notifications to the configured administrators.
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    async fn mail_admins(&self, subject: &str, message: &str) -> Result<(), NotifyError>;
}

pub struct SmtpAdminMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    admins: Vec<Mailbox>,
}

impl SmtpAdminMailer {
    pub fn new(config: &MailConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config.server_email.parse().map_err(|e| {
            NotifyError::Configuration(format!("Invalid server email address: {}", e))
        })?;

        let admins = config
            .admins
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>().map_err(|e| {
                    NotifyError::Configuration(format!("Invalid admin address '{}': {}", addr, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let smtp = &config.smtp;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| {
                NotifyError::Configuration(format!("Failed to create SMTP relay: {}", e))
            })?
            .port(smtp.port);

        if !smtp.user.is_empty() {
            builder = builder.credentials(Credentials::new(
                smtp.user.clone(),
                smtp.password.expose_secret().clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            admins,
        })
    }
}

#[async_trait]
impl AdminNotifier for SmtpAdminMailer {
    async fn mail_admins(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        if self.admins.is_empty() {
            return Ok(());
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for admin in &self.admins {
            builder = builder.to(admin.clone());
        }

        let email = builder
            .body(message.to_string())
            .map_err(|e| NotifyError::SendFailed(format!("Failed to build message: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::SendFailed(format!("Failed to send email: {}", e)))?;

        tracing::info!(
            recipients = self.admins.len(),
            subject = %subject,
            "Admin notification sent"
        );

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub subject: String,
    pub message: String,
}

/// Records notifications instead of sending them. Used when SMTP is
/// disabled and in tests.
#[derive(Default)]
pub struct MockAdminMailer {
    fail: bool,
    sent: Mutex<Vec<SentMail>>,
}

impl MockAdminMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn send_count(&self) -> usize {
        self.sent().len()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AdminNotifier for MockAdminMailer {
    async fn mail_admins(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::SendFailed(
                "Mock admin mailer configured to fail".to_string(),
            ));
        }

        tracing::info!(subject = %subject, "[MOCK] Admin notification would be sent");

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMail {
                subject: subject.to_string(),
                message: message.to_string(),
            });
        }

        Ok(())
    }
}
