use chrono::Utc;
use models::user::NewUser;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};

use crate::auth::domain::{AuthUser, Credentials, NewAccount, Otp};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    async fn load(&self, user_id: &str) -> Result<models::user::Model, AuthError> {
        models::user::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?
            .ok_or(AuthError::NotFound)
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::find_by_email(&self.db, email).await?;
        Ok(res.map(AuthUser::from))
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(AuthUser::from))
    }

    async fn create_user(&self, account: NewAccount, password_hash: String, password_algorithm: String) -> Result<AuthUser, AuthError> {
        let txn = self.db.begin().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        if models::user::find_by_email(&txn, &account.email).await?.is_some() {
            return Err(AuthError::Conflict);
        }
        let created = models::user::create(
            &txn,
            NewUser {
                email: account.email,
                first_name: account.first_name,
                last_name: account.last_name,
                phone_number: Some(account.phone_number),
                whatsapp_number: account.whatsapp_number,
                location: account.location,
                user_type: account.role,
                accepted_terms: account.accepted_terms,
                is_verified: false,
            },
        )
        .await?;
        models::user_credentials::upsert_password(&txn, &created.id, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(created.into())
    }

    async fn get_credentials(&self, user_id: &str) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn upsert_password(&self, user_id: &str, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm })
    }

    async fn set_otp(&self, user_id: &str, otp: Option<Otp>) -> Result<(), AuthError> {
        let mut am: models::user::ActiveModel = self.load(user_id).await?.into();
        am.otp_expiry = Set(otp.as_ref().map(|o| o.expires_at.into()));
        am.otp = Set(otp.map(|o| o.code));
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await.map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(())
    }

    async fn mark_verified(&self, user_id: &str) -> Result<(), AuthError> {
        let mut am: models::user::ActiveModel = self.load(user_id).await?.into();
        am.is_verified = Set(true);
        am.otp = Set(None);
        am.otp_expiry = Set(None);
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await.map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(())
    }
}
