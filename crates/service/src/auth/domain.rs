use chrono::{DateTime, Utc};
use models::user::Role;
use serde::{Deserialize, Serialize};

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// `customer` or `seller` (alias `organizer`)
    #[serde(default)]
    pub user_type: Option<String>,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub accepted_terms: bool,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpInput {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordInput {
    pub email: String,
    pub otp: String,
    pub password: String,
    pub confirm_password: String,
}

/// Fields persisted for a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub whatsapp_number: Option<String>,
    pub location: Option<String>,
    pub role: Role,
    pub accepted_terms: bool,
}

/// Domain user (business view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub slug: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    #[serde(skip)]
    pub otp: Option<String>,
    #[serde(skip)]
    pub otp_expiry: Option<DateTime<Utc>>,
}

impl From<models::user::Model> for AuthUser {
    fn from(u: models::user::Model) -> Self {
        AuthUser {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            slug: u.slug,
            role: u.user_type,
            is_active: u.is_active,
            is_verified: u.is_verified,
            otp: u.otp,
            otp_expiry: u.otp_expiry.map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: String,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access: String,
    pub refresh: String,
}

/// Pending one-time code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}
