use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub reviews: ReviewConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8081, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            run_migrations: true,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }

/// Token and one-time-code lifetimes.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_hours: i64,
    #[serde(default = "default_otp_ttl")]
    pub otp_ttl_minutes: i64,
    /// Mark the auth cookie `Secure` (HTTPS deployments).
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_hours: default_refresh_ttl(),
            otp_ttl_minutes: default_otp_ttl(),
            secure_cookie: false,
        }
    }
}

fn default_access_ttl() -> i64 { 60 }
fn default_refresh_ttl() -> i64 { 24 }
fn default_otp_ttl() -> i64 { 10 }

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MailMode {
    #[default]
    Console,
    Smtp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub mode: MailMode,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_site_name")]
    pub site_name: String,
    #[serde(default = "default_frontend")]
    pub frontend_base_url: String,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            mode: MailMode::Console,
            from: default_from(),
            site_name: default_site_name(),
            frontend_base_url: default_frontend(),
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
        }
    }
}

fn default_from() -> String { "Eventra <no-reply@eventra.local>".into() }
fn default_site_name() -> String { "Eventra".into() }
fn default_frontend() -> String { "http://localhost:5173".into() }
fn default_smtp_port() -> u16 { 587 }

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    #[serde(default = "default_max_reviews")]
    pub max_per_user: u64,
    /// Only buyers with a completed order may review an event.
    #[serde(default)]
    pub require_completed_booking: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self { max_per_user: default_max_reviews(), require_completed_booking: false }
    }
}

fn default_max_reviews() -> u64 { 5 }

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `CONFIG_PATH` (or `config.toml`), falling back to defaults when
    /// the file does not exist, then apply env overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.apply_env_overrides();
        self.server.normalize()?;
        self.database.validate()?;
        self.auth.normalize()?;
        self.mail.validate()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        // 环境变量优先级高于 TOML
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() {
                self.server.host = host;
            }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        self.database.normalize_from_env();
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.trim().is_empty() {
                self.auth.jwt_secret = secret;
            }
        }
        if let Ok(pw) = std::env::var("SMTP_PASSWORD") {
            self.mail.smtp_password = pw;
        }
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // TOML 未提供 URL 时从环境变量填充
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            self.jwt_secret = DEV_JWT_SECRET.to_string();
        }
        if self.jwt_secret != DEV_JWT_SECRET && self.jwt_secret.len() < 16 {
            return Err(anyhow!("auth.jwt_secret must be at least 16 characters"));
        }
        if self.access_ttl_minutes <= 0 || self.refresh_ttl_hours <= 0 || self.otp_ttl_minutes <= 0 {
            return Err(anyhow!("auth ttl values must be positive"));
        }
        Ok(())
    }
}

impl MailConfig {
    fn validate(&self) -> Result<()> {
        if self.mode == MailMode::Smtp && self.smtp_host.trim().is_empty() {
            return Err(anyhow!("mail.smtp_host is required when mail.mode = \"smtp\""));
        }
        if self.from.trim().is_empty() {
            return Err(anyhow!("mail.from must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> AppConfig {
        toml::from_str(s).expect("valid toml")
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg = parse(
            r#"
            [database]
            url = "postgres://u:p@localhost/eventra"
            "#,
        );
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.database.max_connections, 10);
        assert!(cfg.database.run_migrations);
        assert_eq!(cfg.auth.otp_ttl_minutes, 10);
        assert_eq!(cfg.reviews.max_per_user, 5);
        assert_eq!(cfg.mail.mode, MailMode::Console);
    }

    #[test]
    fn rejects_non_postgres_url() {
        let db = DatabaseConfig { url: "mysql://x".into(), ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let db = DatabaseConfig {
            url: "postgres://localhost/x".into(),
            min_connections: 5,
            max_connections: 2,
            ..Default::default()
        };
        assert!(db.validate().is_err());
    }

    #[test]
    fn short_secret_is_rejected_but_blank_falls_back_to_dev() {
        let mut auth = AuthConfig { jwt_secret: "short".into(), ..Default::default() };
        assert!(auth.normalize().is_err());

        let mut auth = AuthConfig::default();
        auth.normalize().expect("blank secret falls back");
        assert_eq!(auth.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn smtp_mode_requires_host() {
        let cfg = parse(
            r#"
            [mail]
            mode = "smtp"
            "#,
        );
        assert!(cfg.mail.validate().is_err());
    }

    #[test]
    fn zero_worker_threads_normalized() {
        let mut s = ServerConfig { worker_threads: Some(0), ..Default::default() };
        s.normalize().expect("normalize");
        assert_eq!(s.worker_threads, Some(4));
    }
}
