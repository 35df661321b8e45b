//! Outgoing mail: a `Mailer` seam with console, SMTP and in-memory backends,
//! plus the message templates the auth flows send.

pub mod mailer;
pub mod templates;

pub use mailer::{build_mailer, ConsoleMailer, Mailer, MemoryMailer, OutgoingMail, SmtpMailer};
pub use templates::MailSettings;
