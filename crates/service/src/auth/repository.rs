use async_trait::async_trait;

use super::domain::{AuthUser, Credentials, NewAccount, Otp};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<AuthUser>, AuthError>;
    /// Create the account and its password credentials atomically.
    async fn create_user(&self, account: NewAccount, password_hash: String, password_algorithm: String) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: &str) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: &str, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;

    /// Store or clear the pending OTP.
    async fn set_otp(&self, user_id: &str, otp: Option<Otp>) -> Result<(), AuthError>;
    /// Mark the account verified and clear its OTP.
    async fn mark_verified(&self, user_id: &str) -> Result<(), AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>,      // key: user id
        creds: Mutex<HashMap<String, Credentials>>,   // key: user id
    }

    fn poisoned<T>(_: T) -> AuthError {
        AuthError::Repository("mock lock poisoned".into())
    }

    impl MockAuthRepository {
        /// Flip `is_active` for tests of disabled accounts.
        pub fn set_active(&self, user_id: &str, active: bool) {
            if let Ok(mut users) = self.users.lock() {
                if let Some(u) = users.get_mut(user_id) {
                    u.is_active = active;
                }
            }
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().map_err(poisoned)?;
            let needle = email.trim().to_lowercase();
            Ok(users.values().find(|u| u.email == needle).cloned())
        }

        async fn find_user_by_id(&self, id: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().map_err(poisoned)?;
            Ok(users.get(id).cloned())
        }

        async fn create_user(&self, account: NewAccount, password_hash: String, password_algorithm: String) -> Result<AuthUser, AuthError> {
            if password_hash.trim().is_empty() {
                return Err(AuthError::Validation("password hash required".into()));
            }
            let mut users = self.users.lock().map_err(poisoned)?;
            let mut creds = self.creds.lock().map_err(poisoned)?;
            let email = account.email.trim().to_lowercase();
            if users.values().any(|u| u.email == email) {
                return Err(AuthError::Conflict);
            }
            let id = models::ids::random_id(models::ids::USER_ID_LEN);
            let user = AuthUser {
                id: id.clone(),
                email,
                slug: format!("{}-{}", models::user::base_slug(&account.first_name, &account.last_name), users.len() + 1),
                first_name: account.first_name,
                last_name: account.last_name,
                role: account.role,
                is_active: true,
                is_verified: false,
                otp: None,
                otp_expiry: None,
            };
            creds.insert(id.clone(), Credentials { user_id: id.clone(), password_hash, password_algorithm });
            users.insert(id, user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: &str) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().map_err(poisoned)?;
            Ok(creds.get(user_id).cloned())
        }

        async fn upsert_password(&self, user_id: &str, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().map_err(poisoned)?;
            let c = Credentials { user_id: user_id.to_string(), password_hash, password_algorithm };
            creds.insert(user_id.to_string(), c.clone());
            Ok(c)
        }

        async fn set_otp(&self, user_id: &str, otp: Option<Otp>) -> Result<(), AuthError> {
            let mut users = self.users.lock().map_err(poisoned)?;
            let u = users.get_mut(user_id).ok_or(AuthError::NotFound)?;
            u.otp_expiry = otp.as_ref().map(|o| o.expires_at);
            u.otp = otp.map(|o| o.code);
            Ok(())
        }

        async fn mark_verified(&self, user_id: &str) -> Result<(), AuthError> {
            let mut users = self.users.lock().map_err(poisoned)?;
            let u = users.get_mut(user_id).ok_or(AuthError::NotFound)?;
            u.is_verified = true;
            u.otp = None;
            u.otp_expiry = None;
            Ok(())
        }
    }
}
