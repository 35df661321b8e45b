use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::{Duration, Utc};
use models::user::Role;
use rand::rngs::OsRng;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use super::domain::{
    AuthSession, AuthUser, LoginInput, NewAccount, Otp, RegisterInput, ResetPasswordInput, VerifyOtpInput,
};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::tokens::{TokenIssuer, TokenKind};
use crate::notify::{templates, MailSettings, Mailer};

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub password_algorithm: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub otp_ttl: Duration,
    pub mail: MailSettings,
}

impl AuthConfig {
    pub fn from_app(cfg: &configs::AppConfig) -> Self {
        Self {
            jwt_secret: cfg.auth.jwt_secret.clone(),
            password_algorithm: "argon2".into(),
            access_ttl: Duration::minutes(cfg.auth.access_ttl_minutes),
            refresh_ttl: Duration::hours(cfg.auth.refresh_ttl_hours),
            otp_ttl: Duration::minutes(cfg.auth.otp_ttl_minutes),
            mail: (&cfg.mail).into(),
        }
    }

    /// Defaults with the given secret; used by tests and benches.
    pub fn with_secret(secret: &str) -> Self {
        Self {
            jwt_secret: secret.to_string(),
            password_algorithm: "argon2".into(),
            access_ttl: Duration::minutes(60),
            refresh_ttl: Duration::hours(24),
            otp_ttl: Duration::minutes(10),
            mail: MailSettings::default(),
        }
    }
}

/// Password policy: at least 8 characters and not purely numeric.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < 8 {
        return Err(AuthError::Validation("This password is too short. It must contain at least 8 characters.".into()));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AuthError::Validation("This password is entirely numeric.".into()));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AuthError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(AuthError::Validation("Enter a valid email address.".into()));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

/// Six random decimal digits.
pub fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
    tokens: TokenIssuer,
    mailer: Arc<dyn Mailer>,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenIssuer::new(cfg.jwt_secret.clone(), cfg.access_ttl, cfg.refresh_ttl);
        Self { repo, cfg, tokens, mailer }
    }

    pub fn tokens(&self) -> &TokenIssuer { &self.tokens }

    /// Register a new, unverified account and mail it a verification code.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use service::notify::MemoryMailer;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::with_secret("secret"), Arc::new(MemoryMailer::default()));
    /// let input = RegisterInput {
    ///     email: "user@example.com".into(), first_name: "Ada".into(), last_name: "Lovelace".into(),
    ///     phone_number: "+1555".into(), whatsapp_number: None, location: None, user_type: Some("seller".into()),
    ///     password: "Secret123".into(), confirm_password: "Secret123".into(), accepted_terms: true,
    /// };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// assert!(!user.is_verified);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        validate_email(&input.email)?;
        if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
            return Err(AuthError::Validation("First and last name are required.".into()));
        }
        if input.phone_number.trim().is_empty() {
            return Err(AuthError::Validation("Phone number is required.".into()));
        }
        if input.password != input.confirm_password {
            return Err(AuthError::Validation("Passwords do not match.".into()));
        }
        validate_password(&input.password)?;
        if !input.accepted_terms {
            return Err(AuthError::Validation("You must accept the terms and conditions.".into()));
        }
        let role = match input.user_type.as_deref() {
            None | Some("") => Role::Customer,
            Some(raw) => match Role::parse(raw) {
                Some(Role::Admin) | None => {
                    return Err(AuthError::Validation("user_type must be customer or seller.".into()))
                }
                Some(r) => r,
            },
        };
        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.password)?;
        let user = self
            .repo
            .create_user(
                NewAccount {
                    email: input.email.trim().to_lowercase(),
                    first_name: input.first_name.trim().to_string(),
                    last_name: input.last_name.trim().to_string(),
                    phone_number: input.phone_number.trim().to_string(),
                    whatsapp_number: input.whatsapp_number,
                    location: input.location,
                    role,
                    accepted_terms: input.accepted_terms,
                },
                hash,
                self.cfg.password_algorithm.clone(),
            )
            .await?;

        let otp = self.issue_otp(&user.id).await?;
        let mail = templates::verification_mail(&self.cfg.mail, &user.email, &user.first_name, &otp, self.cfg.otp_ttl.num_minutes());
        self.deliver(mail).await;

        common::metrics::USERS_REGISTERED_TOTAL.inc();
        info!(user_id = %user.id, email = %user.email, role = user.role.as_str(), "user_registered");
        Ok(user)
    }

    /// Authenticate and issue an access/refresh token pair.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::{domain::LoginInput, errors::AuthError};
    /// use service::notify::MemoryMailer;
    /// use std::sync::Arc;
    /// let svc = AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::with_secret("s"), Arc::new(MemoryMailer::default()));
    /// let res = tokio_test::block_on(svc.login(LoginInput { email: "nobody@example.com".into(), password: "x".into() }));
    /// assert!(matches!(res, Err(AuthError::Unauthorized)));
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let result = self.try_login(input).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(AuthError::Forbidden(_)) => "unverified",
            Err(AuthError::Unauthorized) => "invalid",
            Err(_) => "error",
        };
        common::metrics::record_login(outcome);
        result
    }

    async fn try_login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(&user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }
        if !user.is_active {
            return Err(AuthError::Unauthorized);
        }
        if !user.is_verified {
            return Err(AuthError::Forbidden("Account not verified. Please verify your email first.".into()));
        }

        let access = self.tokens.issue(&user, TokenKind::Access)?;
        let refresh = self.tokens.issue(&user, TokenKind::Refresh)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, access, refresh })
    }

    /// Exchange a refresh token for a new access token.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        let user = self.repo
            .find_user_by_id(&claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::Unauthorized)?;
        self.tokens.issue(&user, TokenKind::Access)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn verify_otp(&self, input: VerifyOtpInput) -> Result<AuthUser, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or_else(|| AuthError::Validation("No account found with this email.".into()))?;
        if user.is_verified {
            return Err(AuthError::Validation("Account is already verified.".into()));
        }
        check_otp(&user, &input.otp)?;
        self.repo.mark_verified(&user.id).await?;
        info!(user_id = %user.id, "user_verified");
        Ok(AuthUser { is_verified: true, otp: None, otp_expiry: None, ..user })
    }

    /// Send a fresh verification code. Unknown emails succeed silently.
    #[instrument(skip(self))]
    pub async fn resend_otp(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.repo.find_user_by_email(email).await? else {
            debug!("resend_otp for unknown email");
            return Ok(());
        };
        if user.is_verified {
            return Err(AuthError::Validation("Account is already verified.".into()));
        }
        let otp = self.issue_otp(&user.id).await?;
        let mail = templates::verification_mail(&self.cfg.mail, &user.email, &user.first_name, &otp, self.cfg.otp_ttl.num_minutes());
        self.deliver(mail).await;
        Ok(())
    }

    /// Start a password reset. Always succeeds so callers cannot enumerate
    /// registered emails.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.repo.find_user_by_email(email).await? else {
            debug!("forgot_password for unknown email");
            return Ok(());
        };
        let otp = self.issue_otp(&user.id).await?;
        let mail = templates::password_reset_mail(&self.cfg.mail, &user.email, &user.first_name, &otp, self.cfg.otp_ttl.num_minutes());
        self.deliver(mail).await;
        info!(user_id = %user.id, "password_reset_requested");
        Ok(())
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<(), AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or_else(|| AuthError::Validation("Invalid email or OTP.".into()))?;
        check_otp(&user, &input.otp)?;
        if input.password != input.confirm_password {
            return Err(AuthError::Validation("Passwords do not match.".into()));
        }
        validate_password(&input.password)?;
        let hash = hash_password(&input.password)?;
        self.repo.upsert_password(&user.id, hash, self.cfg.password_algorithm.clone()).await?;
        self.repo.set_otp(&user.id, None).await?;
        info!(user_id = %user.id, "password_reset");
        Ok(())
    }

    async fn issue_otp(&self, user_id: &str) -> Result<String, AuthError> {
        let code = generate_otp();
        let otp = Otp { code: code.clone(), expires_at: Utc::now() + self.cfg.otp_ttl };
        self.repo.set_otp(user_id, Some(otp)).await?;
        Ok(code)
    }

    async fn deliver(&self, mail: crate::notify::OutgoingMail) {
        let to = mail.to.clone();
        if let Err(e) = self.mailer.send(mail).await {
            // 邮件失败不影响主流程
            warn!(%to, error = %e, "mail_send_failed");
        }
    }
}

fn check_otp(user: &AuthUser, submitted: &str) -> Result<(), AuthError> {
    let (Some(code), Some(expiry)) = (&user.otp, user.otp_expiry) else {
        return Err(AuthError::Validation("No OTP found. Please request a new one.".into()));
    };
    if expiry <= Utc::now() {
        return Err(AuthError::Validation("OTP has expired. Please request a new one.".into()));
    }
    if code != submitted.trim() {
        return Err(AuthError::Validation("Invalid OTP.".into()));
    }
    Ok(())
}
