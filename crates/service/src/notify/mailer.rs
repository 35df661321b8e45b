use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use configs::{MailConfig, MailMode};
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::auth::errors::AuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AuthError>;
}

/// Logs mail instead of delivering it (development default).
#[derive(Debug, Default, Clone)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AuthError> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.text, "mail_console");
        Ok(())
    }
}

/// Keeps every mail in memory; tests read the OTP back from here.
#[derive(Debug, Default, Clone)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn last_to(&self, to: &str) -> Option<OutgoingMail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AuthError> {
        self.sent
            .lock()
            .map_err(|_| AuthError::Mail("mailbox lock poisoned".into()))?
            .push(mail);
        Ok(())
    }
}

/// SMTP relay delivery via lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    credentials: Option<Credentials>,
    from: String,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> Self {
        let credentials = if cfg.smtp_username.is_empty() {
            None
        } else {
            Some(Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone()))
        };
        Self { host: cfg.smtp_host.clone(), port: cfg.smtp_port, credentials, from: cfg.from.clone() }
    }

    fn build_transport(&self) -> Result<SmtpTransport, AuthError> {
        let mut builder = SmtpTransport::starttls_relay(&self.host)
            .map_err(|e| AuthError::Mail(format!("SMTP relay error: {e}")))?
            .port(self.port);
        if let Some(c) = &self.credentials {
            builder = builder.credentials(c.clone());
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AuthError> {
        let email = Message::builder()
            .from(self.from.parse().map_err(|e| AuthError::Mail(format!("invalid from address: {e}")))?)
            .to(mail.to.parse().map_err(|e| AuthError::Mail(format!("invalid to address: {e}")))?)
            .subject(mail.subject)
            .multipart(MultiPart::alternative_plain_html(mail.text, mail.html))
            .map_err(|e| AuthError::Mail(format!("failed to build email: {e}")))?;

        let transport = self.build_transport()?;
        // lettre 的 SmtpTransport 是阻塞实现，放到 blocking 线程池执行
        tokio::task::spawn_blocking(move || {
            transport
                .send(&email)
                .map_err(|e| AuthError::Mail(format!("failed to send email: {e}")))
        })
        .await
        .map_err(|e| AuthError::Mail(format!("mail task failed: {e}")))?
        .map(|_| ())
    }
}

pub fn build_mailer(cfg: &MailConfig) -> Arc<dyn Mailer> {
    match cfg.mode {
        MailMode::Console => Arc::new(ConsoleMailer),
        MailMode::Smtp => Arc::new(SmtpMailer::new(cfg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_mailer_records_messages() {
        let m = MemoryMailer::default();
        let mail = OutgoingMail { to: "x@y.z".into(), subject: "s".into(), text: "t".into(), html: "<p>t</p>".into() };
        m.send(mail.clone()).await.expect("send");
        assert_eq!(m.last_to("x@y.z"), Some(mail));
        assert!(m.last_to("other@y.z").is_none());
    }
}
