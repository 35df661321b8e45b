use configs::MailConfig;

use super::mailer::OutgoingMail;

/// Branding and link settings used when rendering mail.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub site_name: String,
    pub frontend_base_url: String,
}

impl From<&MailConfig> for MailSettings {
    fn from(cfg: &MailConfig) -> Self {
        Self {
            site_name: cfg.site_name.clone(),
            frontend_base_url: cfg.frontend_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for MailSettings {
    fn default() -> Self {
        (&MailConfig::default()).into()
    }
}

pub fn verification_mail(s: &MailSettings, to: &str, first_name: &str, otp: &str, ttl_minutes: i64) -> OutgoingMail {
    let subject = format!("Verify your {} account", s.site_name);
    let text = format!(
        "Hi {first_name},\n\nYour verification code is {otp}. It expires in {ttl_minutes} minutes.\n\n{}",
        s.site_name
    );
    let html = format!(
        "<p>Hi {first_name},</p><p>Your verification code is <strong>{otp}</strong>. \
         It expires in {ttl_minutes} minutes.</p><p>{}</p>",
        s.site_name
    );
    OutgoingMail { to: to.to_string(), subject, text, html }
}

pub fn reset_password_url(s: &MailSettings, email: &str, otp: &str) -> String {
    format!("{}/reset-password?email={}&otp={}", s.frontend_base_url, encode_query(email), otp)
}

pub fn password_reset_mail(s: &MailSettings, to: &str, first_name: &str, otp: &str, ttl_minutes: i64) -> OutgoingMail {
    let url = reset_password_url(s, to, otp);
    let subject = format!("Reset your {} password", s.site_name);
    let text = format!(
        "Hi {first_name},\n\nUse code {otp} or open {url} to choose a new password. \
         The code expires in {ttl_minutes} minutes.\n\nIf you did not ask for this, ignore this mail."
    );
    let html = format!(
        "<p>Hi {first_name},</p><p>Use code <strong>{otp}</strong> or \
         <a href=\"{url}\">reset your password</a>. The code expires in {ttl_minutes} minutes.</p>\
         <p>If you did not ask for this, ignore this mail.</p>"
    );
    OutgoingMail { to: to.to_string(), subject, text, html }
}

fn encode_query(v: &str) -> String {
    let mut out = String::with_capacity(v.len());
    for b in v.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
