//! Event reviews and their stats.

use chrono::Utc;
use common::metrics::REVIEWS_CREATED_TOTAL;
use configs::ReviewConfig;
use models::ids::{self, REVIEW_ID_LEN};
use models::service_order::{self, OrderStatus};
use models::{event, review, user};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::errors::{ServiceError, ServiceResult};
use crate::events::service::{find_event, users_by_id};

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub id: String,
    pub user: String,
    pub user_full_name: String,
    pub user_profile_image: Option<String>,
    pub event: String,
    pub event_brand_name: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub can_edit: bool,
}

impl ReviewView {
    fn build(r: review::Model, author: Option<&user::Model>, ev: &event::Model, viewer: Option<&user::Model>) -> Self {
        ReviewView {
            can_edit: viewer.is_some_and(|v| v.id == r.user_id),
            user_full_name: author.map(user::Model::full_name).unwrap_or_default(),
            user_profile_image: author.and_then(|u| u.profile_image.clone()),
            event_brand_name: ev.brand_name.clone(),
            id: r.id,
            user: r.user_id,
            event: r.event_id,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Query string of the review list. Bounds that fail to parse are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewFilter {
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
}

impl ReviewFilter {
    fn bounds(&self) -> (Option<f64>, Option<f64>) {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        (parse(&self.min_rating), parse(&self.max_rating))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

/// Reviews of an event, newest first.
pub async fn list_reviews(
    db: &DatabaseConnection,
    event_slug: &str,
    filter: &ReviewFilter,
    viewer: Option<&user::Model>,
) -> ServiceResult<Vec<ReviewView>> {
    let ev = find_event(db, event_slug).await?;
    let (min, max) = filter.bounds();
    let mut q = review::Entity::find().filter(review::Column::EventId.eq(ev.id.as_str()));
    if let Some(min) = min {
        q = q.filter(review::Column::Rating.gte(min.ceil() as i16));
    }
    if let Some(max) = max {
        q = q.filter(review::Column::Rating.lte(max.floor() as i16));
    }
    let rows = q.order_by_desc(review::Column::CreatedAt).all(db).await?;
    let authors = users_by_id(db, rows.iter().map(|r| r.user_id.clone()).collect()).await?;
    Ok(rows
        .into_iter()
        .map(|r| {
            let author = authors.get(&r.user_id);
            ReviewView::build(r, author, &ev, viewer)
        })
        .collect())
}

#[instrument(skip(db, cfg, actor, input), fields(actor_id = %actor.id))]
pub async fn create_review(
    db: &DatabaseConnection,
    cfg: &ReviewConfig,
    actor: &user::Model,
    event_slug: &str,
    input: ReviewInput,
) -> ServiceResult<ReviewView> {
    let ev = find_event(db, event_slug).await?;
    review::validate_rating(input.rating)?;
    if actor.is_seller() && ev.seller_id == actor.id {
        return Err(ServiceError::forbidden("Sellers cannot review their own events."));
    }
    let existing = review::Entity::find()
        .filter(review::Column::UserId.eq(actor.id.as_str()))
        .filter(review::Column::EventId.eq(ev.id.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::conflict(
            "You can only submit one review per event. Please edit your existing review instead.",
        ));
    }
    let written = review::Entity::find()
        .filter(review::Column::UserId.eq(actor.id.as_str()))
        .count(db)
        .await?;
    if written >= cfg.max_per_user {
        return Err(ServiceError::forbidden(format!(
            "You have reached the maximum limit of {} reviews.",
            cfg.max_per_user
        )));
    }
    if cfg.require_completed_booking {
        let booked = service_order::Entity::find()
            .filter(service_order::Column::BuyerId.eq(actor.id.as_str()))
            .filter(service_order::Column::EventId.eq(ev.id.as_str()))
            .filter(service_order::Column::Status.eq(OrderStatus::Completed))
            .count(db)
            .await?;
        if booked == 0 {
            return Err(ServiceError::forbidden("Only customers with a completed booking can review this event."));
        }
    }

    let now = Utc::now().into();
    let created = review::ActiveModel {
        id: Set(ids::unique_id::<review::Entity, _>(db, REVIEW_ID_LEN).await?),
        user_id: Set(actor.id.clone()),
        event_id: Set(ev.id.clone()),
        rating: Set(input.rating),
        comment: Set(input.comment.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    REVIEWS_CREATED_TOTAL.inc();
    info!(review_id = %created.id, event_id = %ev.id, rating = created.rating, "review_created");
    Ok(ReviewView::build(created, Some(actor), &ev, Some(actor)))
}

async fn own_review(
    db: &DatabaseConnection,
    actor: &user::Model,
    event_slug: &str,
    id: &str,
) -> ServiceResult<(event::Model, review::Model)> {
    let ev = find_event(db, event_slug).await?;
    let r = review::Entity::find_by_id(id.to_string())
        .filter(review::Column::UserId.eq(actor.id.as_str()))
        .filter(review::Column::EventId.eq(ev.id.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("review"))?;
    Ok((ev, r))
}

pub async fn update_review(
    db: &DatabaseConnection,
    actor: &user::Model,
    event_slug: &str,
    id: &str,
    patch: ReviewPatch,
) -> ServiceResult<ReviewView> {
    let (ev, r) = own_review(db, actor, event_slug, id).await?;
    let mut am: review::ActiveModel = r.into();
    if let Some(rating) = patch.rating {
        review::validate_rating(rating)?;
        am.rating = Set(rating);
    }
    if let Some(c) = patch.comment {
        am.comment = Set(c.trim().to_string());
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    Ok(ReviewView::build(updated, Some(actor), &ev, Some(actor)))
}

pub async fn delete_review(db: &DatabaseConnection, actor: &user::Model, event_slug: &str, id: &str) -> ServiceResult<()> {
    let (_, r) = own_review(db, actor, event_slug, id).await?;
    r.delete(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::payload::CreateEventInput;
    use crate::events::service::{create_event, delete_event};
    use crate::test_support::{get_db, make_user};
    use models::user::Role;

    #[test]
    fn filter_bounds_ignore_garbage() {
        let f = ReviewFilter { min_rating: Some("3".into()), max_rating: Some("lots".into()) };
        assert_eq!(f.bounds(), (Some(3.0), None));
    }

    async fn seeded_event(db: &DatabaseConnection, seller: &user::Model) -> anyhow::Result<String> {
        let tag = ids::random_id(6);
        let ev = create_event(
            db,
            seller,
            CreateEventInput {
                title: format!("Reviewed {tag}"),
                brand_name: format!("Reviewed Brand {tag}"),
                description: String::new(),
                logo: None,
                is_active: None,
                daily_booking_capacity: None,
                service_details: Vec::new(),
                gallery_images: Vec::new(),
            },
        )
        .await?;
        Ok(ev.slug)
    }

    #[tokio::test]
    async fn review_rules() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let cfg = ReviewConfig::default();
        let seller = make_user(&db, Role::Seller).await?;
        let buyer = make_user(&db, Role::Customer).await?;
        let other = make_user(&db, Role::Customer).await?;
        let slug = seeded_event(&db, &seller).await?;

        let own = create_review(&db, &cfg, &seller, &slug, ReviewInput { rating: 5, comment: "mine".into() }).await;
        assert!(matches!(own, Err(ServiceError::Forbidden(_))));
        let bad = create_review(&db, &cfg, &buyer, &slug, ReviewInput { rating: 6, comment: String::new() }).await;
        assert!(matches!(bad, Err(ServiceError::Model(_))));

        let r = create_review(&db, &cfg, &buyer, &slug, ReviewInput { rating: 4, comment: " great ".into() }).await?;
        assert_eq!(r.comment, "great");
        assert!(r.can_edit);
        let dup = create_review(&db, &cfg, &buyer, &slug, ReviewInput { rating: 3, comment: String::new() }).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        create_review(&db, &cfg, &other, &slug, ReviewInput { rating: 2, comment: String::new() }).await?;
        let listed = list_reviews(&db, &slug, &ReviewFilter { min_rating: Some("3".into()), max_rating: None }, Some(&other)).await?;
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].can_edit);

        let stranger_edit = update_review(&db, &other, &slug, &r.id, ReviewPatch { rating: Some(1), comment: None }).await;
        assert!(matches!(stranger_edit, Err(ServiceError::NotFound(_))));
        let edited = update_review(&db, &buyer, &slug, &r.id, ReviewPatch { rating: Some(5), comment: None }).await?;
        assert_eq!(edited.rating, 5);
        delete_review(&db, &buyer, &slug, &r.id).await?;

        delete_event(&db, &seller, &slug).await?;
        Ok(())
    }

    #[tokio::test]
    async fn per_user_limit_and_booking_requirement() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let seller = make_user(&db, Role::Seller).await?;
        let buyer = make_user(&db, Role::Customer).await?;
        let slug = seeded_event(&db, &seller).await?;

        let strict = ReviewConfig { require_completed_booking: true, ..ReviewConfig::default() };
        let denied = create_review(&db, &strict, &buyer, &slug, ReviewInput { rating: 4, comment: String::new() }).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));

        let capped = ReviewConfig { max_per_user: 0, ..ReviewConfig::default() };
        let denied = create_review(&db, &capped, &buyer, &slug, ReviewInput { rating: 4, comment: String::new() }).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));

        delete_event(&db, &seller, &slug).await?;
        Ok(())
    }
}
