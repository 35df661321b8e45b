//! User profiles, WhatsApp click counters and the seller dashboard.

use chrono::{NaiveDate, Utc};
use models::{event, user, user_credentials};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::auth::service::{hash_password, validate_password};
use crate::dashboard::{event_dashboards, EventDashboard};
use crate::errors::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub slug: String,
    pub user_type: user::Role,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub whatsapp_click_count: i64,
    pub whatsapp_daily_click_count: i64,
    pub whatsapp_daily_click_date: Option<NaiveDate>,
    pub is_verified: bool,
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_created_events: Option<Vec<EventDashboard>>,
}

impl From<&user::Model> for UserView {
    fn from(u: &user::Model) -> Self {
        UserView {
            id: u.id.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            full_name: u.full_name(),
            slug: u.slug.clone(),
            user_type: u.user_type,
            profile_image: u.profile_image.clone(),
            location: u.location.clone(),
            phone_number: u.phone_number.clone(),
            whatsapp_number: u.whatsapp_number.clone(),
            whatsapp_click_count: u.whatsapp_click_count,
            whatsapp_daily_click_count: u.whatsapp_daily_click_count,
            whatsapp_daily_click_date: u.whatsapp_daily_click_date,
            is_verified: u.is_verified,
            created_at: u.created_at,
            seller_created_events: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdated {
    pub user: UserView,
    pub profile_url: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct WhatsappClicks {
    pub whatsapp_click_count: i64,
    pub whatsapp_daily_click_count: i64,
}

pub fn profile_url(slug: &str) -> String {
    format!("/users/profile/{slug}")
}

async fn find_user(db: &DatabaseConnection, slug: &str) -> ServiceResult<user::Model> {
    user::find_by_slug(db, slug).await?.ok_or_else(|| ServiceError::not_found("user"))
}

async fn owned_events(db: &DatabaseConnection, seller_id: &str, active_only: bool) -> ServiceResult<Vec<event::Model>> {
    let mut q = event::Entity::find().filter(event::Column::SellerId.eq(seller_id));
    if active_only {
        q = q.filter(event::Column::IsActive.eq(true));
    }
    Ok(q.order_by_desc(event::Column::CreatedAt).all(db).await?)
}

async fn with_events(db: &DatabaseConnection, u: &user::Model) -> ServiceResult<UserView> {
    let mut view = UserView::from(u);
    if u.is_seller() {
        let events = owned_events(db, &u.id, true).await?;
        view.seller_created_events = Some(event_dashboards(db, events).await?);
    }
    Ok(view)
}

pub async fn get_profile(db: &DatabaseConnection, slug: &str) -> ServiceResult<UserView> {
    let u = find_user(db, slug).await?;
    with_events(db, &u).await
}

/// Profile of the authenticated caller.
pub async fn me(db: &DatabaseConnection, current: &user::Model) -> ServiceResult<UserView> {
    with_events(db, current).await
}

/// Count a click on the user's WhatsApp link.
#[instrument(skip(db))]
pub async fn bump_whatsapp_click(db: &DatabaseConnection, slug: &str) -> ServiceResult<WhatsappClicks> {
    let txn = db.begin().await?;
    let u = user::Entity::find()
        .filter(user::Column::Slug.eq(slug))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    let (total, daily, day) = user::next_whatsapp_counts(
        u.whatsapp_click_count,
        u.whatsapp_daily_click_count,
        u.whatsapp_daily_click_date,
        Utc::now().date_naive(),
    );
    let mut am: user::ActiveModel = u.into();
    am.whatsapp_click_count = Set(total);
    am.whatsapp_daily_click_count = Set(daily);
    am.whatsapp_daily_click_date = Set(Some(day));
    am.update(&txn).await?;
    txn.commit().await?;
    Ok(WhatsappClicks { whatsapp_click_count: total, whatsapp_daily_click_count: daily })
}

fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Owner-only profile edit. The slug follows name changes.
#[instrument(skip(db, actor, input), fields(actor_id = %actor.id))]
pub async fn update_profile(
    db: &DatabaseConnection,
    actor: &user::Model,
    slug: &str,
    input: UpdateProfileInput,
) -> ServiceResult<ProfileUpdated> {
    if actor.slug != slug {
        return Err(ServiceError::not_found("user"));
    }
    let u = find_user(db, slug).await?;

    let new_hash = match input.password.as_deref().filter(|p| !p.is_empty()) {
        Some(pw) => {
            if input.confirm_password.as_deref() != Some(pw) {
                return Err(ServiceError::validation("Passwords do not match."));
            }
            validate_password(pw)?;
            Some(hash_password(pw)?)
        }
        None => None,
    };

    let first_name = clean(input.first_name).unwrap_or_else(|| u.first_name.clone());
    let last_name = clean(input.last_name).unwrap_or_else(|| u.last_name.clone());
    let renamed = first_name != u.first_name || last_name != u.last_name;

    let txn = db.begin().await?;
    let id = u.id.clone();
    let mut am: user::ActiveModel = u.into();
    if renamed {
        am.slug = Set(user::unique_slug(&txn, &first_name, &last_name, Some(&id)).await?);
    }
    am.first_name = Set(first_name);
    am.last_name = Set(last_name);
    if let Some(v) = input.profile_image {
        am.profile_image = Set(clean(Some(v)));
    }
    if let Some(v) = input.location {
        am.location = Set(clean(Some(v)));
    }
    if let Some(v) = input.phone_number {
        am.phone_number = Set(clean(Some(v)));
    }
    if let Some(v) = input.whatsapp_number {
        am.whatsapp_number = Set(clean(Some(v)));
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await?;
    if let Some(hash) = new_hash {
        user_credentials::upsert_password(&txn, &id, hash, "argon2").await?;
    }
    txn.commit().await?;
    info!(user_id = %updated.id, slug = %updated.slug, "profile_updated");

    Ok(ProfileUpdated { profile_url: profile_url(&updated.slug), user: with_events(db, &updated).await? })
}

/// Every event the seller owns, with today's views and review stats.
pub async fn seller_dashboard(db: &DatabaseConnection, slug: &str) -> ServiceResult<Vec<EventDashboard>> {
    let u = find_user(db, slug).await?;
    if !u.is_seller() {
        return Err(ServiceError::forbidden("Only sellers have an event dashboard."));
    }
    let events = owned_events(db, &u.id, false).await?;
    event_dashboards(db, events).await
}
