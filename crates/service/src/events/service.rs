use std::collections::HashMap;

use chrono::Utc;
use common::metrics::{EVENTS_CREATED_TOTAL, EVENT_VIEWS_TOTAL};
use models::event_gallery::MAX_GALLERY_IMAGES;
use models::ids::{self, EVENT_ID_LEN};
use models::service_type::ServiceType;
use models::{event, event_gallery, event_service_detail, review, user};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::listing::{build_suggestions, ListFilter, ListQuery, Suggestions};
use super::payload::{
    resolve_services, validate_event_text, validate_gallery, CreateEventInput, GalleryImageInput,
    ResolvedService, UpdateEventInput,
};
use super::views::{
    EventDetail, EventListing, GalleryImageView, ReviewSummary, SellerInfo, SellerSummary, ServiceDetailView,
};
use crate::errors::{ServiceError, ServiceResult};
use crate::pagination::Pagination;
use crate::stats::{self, daily_series, review_stats, ReviewPoint};

/// Reviews embedded in the event detail view.
pub const RECENT_REVIEWS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct EventList {
    pub count: u64,
    pub page: u64,
    pub per_page: u64,
    pub results: Vec<EventListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Suggestions>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceTypeView {
    pub code: &'static str,
    pub label: &'static str,
}

/// Catalog of bookable service types.
pub fn list_service_types() -> Vec<ServiceTypeView> {
    ServiceType::ALL
        .into_iter()
        .map(|t| ServiceTypeView { code: t.code(), label: t.label() })
        .collect()
}

pub(crate) async fn find_event<C: ConnectionTrait>(db: &C, slug: &str) -> ServiceResult<event::Model> {
    event::find_by_slug(db, slug).await?.ok_or_else(|| ServiceError::not_found("event"))
}

async fn ensure_unique_names<C: ConnectionTrait>(
    db: &C,
    title: &str,
    brand_name: &str,
    own_id: Option<&str>,
) -> ServiceResult<()> {
    let mut q = event::Entity::find().filter(event::Column::Title.eq(title));
    if let Some(id) = own_id {
        q = q.filter(event::Column::Id.ne(id));
    }
    if q.one(db).await?.is_some() {
        return Err(ServiceError::conflict("event with this title already exists"));
    }
    let mut q = event::Entity::find().filter(event::Column::BrandName.eq(brand_name));
    if let Some(id) = own_id {
        q = q.filter(event::Column::Id.ne(id));
    }
    if q.one(db).await?.is_some() {
        return Err(ServiceError::conflict("event with this brand name already exists"));
    }
    Ok(())
}

/// Upsert service details by type; types not in `items` are kept.
async fn apply_services<C: ConnectionTrait>(db: &C, event_id: &str, items: &[ResolvedService]) -> ServiceResult<()> {
    for item in items {
        let existing = event_service_detail::Entity::find()
            .filter(event_service_detail::Column::EventId.eq(event_id))
            .filter(event_service_detail::Column::ServiceType.eq(item.service_type))
            .one(db)
            .await?;
        match existing {
            Some(row) => {
                let mut am: event_service_detail::ActiveModel = row.into();
                if let Some(d) = &item.short_description {
                    am.short_description = Set(d.clone());
                }
                if let Some(p) = item.price {
                    am.price = Set(p);
                }
                if let Some(a) = item.is_available {
                    am.is_available = Set(a);
                }
                am.update(db).await?;
            }
            None => {
                event_service_detail::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    event_id: Set(event_id.to_string()),
                    service_type: Set(item.service_type),
                    short_description: Set(item.short_description.clone().unwrap_or_default()),
                    price: Set(item.price.unwrap_or(0)),
                    is_available: Set(item.is_available.unwrap_or(true)),
                    created_at: Set(Utc::now().into()),
                }
                .insert(db)
                .await?;
            }
        }
    }
    Ok(())
}

/// Upsert gallery images by position, keep a single primary and enforce the
/// stored image cap.
async fn apply_gallery<C: ConnectionTrait>(db: &C, event_id: &str, items: &[GalleryImageInput]) -> ServiceResult<()> {
    for item in items {
        let existing = event_gallery::Entity::find()
            .filter(event_gallery::Column::EventId.eq(event_id))
            .filter(event_gallery::Column::Position.eq(item.position))
            .one(db)
            .await?;
        match existing {
            Some(row) => {
                let mut am: event_gallery::ActiveModel = row.into();
                am.image = Set(item.image.trim().to_string());
                am.is_primary = Set(item.is_primary);
                am.update(db).await?;
            }
            None => {
                event_gallery::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    event_id: Set(event_id.to_string()),
                    image: Set(item.image.trim().to_string()),
                    is_primary: Set(item.is_primary),
                    position: Set(item.position),
                    uploaded_at: Set(Utc::now().into()),
                }
                .insert(db)
                .await?;
            }
        }
    }
    if let Some(primary) = items.iter().find(|i| i.is_primary) {
        event_gallery::Entity::update_many()
            .col_expr(event_gallery::Column::IsPrimary, Expr::value(false))
            .filter(event_gallery::Column::EventId.eq(event_id))
            .filter(event_gallery::Column::Position.ne(primary.position))
            .exec(db)
            .await?;
    }
    let total = event_gallery::Entity::find()
        .filter(event_gallery::Column::EventId.eq(event_id))
        .count(db)
        .await?;
    if total > MAX_GALLERY_IMAGES {
        return Err(ServiceError::validation(format!(
            "Maximum {MAX_GALLERY_IMAGES} images are allowed."
        )));
    }
    Ok(())
}

/// Create the seller's event with its service details and gallery.
#[instrument(skip(db, seller, input), fields(seller_id = %seller.id))]
pub async fn create_event(
    db: &DatabaseConnection,
    seller: &user::Model,
    input: CreateEventInput,
) -> ServiceResult<EventDetail> {
    if !seller.is_seller() {
        return Err(ServiceError::forbidden("Only sellers can create events."));
    }
    let title = input.title.trim().to_string();
    let brand_name = input.brand_name.trim().to_string();
    validate_event_text(&title, &brand_name)?;
    let services = resolve_services(&input.service_details)?;
    validate_gallery(&input.gallery_images)?;

    let owned = event::Entity::find()
        .filter(event::Column::SellerId.eq(seller.id.as_str()))
        .one(db)
        .await?;
    if owned.is_some() {
        return Err(ServiceError::conflict("A seller can only have one event."));
    }
    ensure_unique_names(db, &title, &brand_name, None).await?;

    let txn = db.begin().await?;
    let id = ids::unique_id::<event::Entity, _>(&txn, EVENT_ID_LEN).await?;
    let slug = event::unique_slug(&txn, &brand_name, &id).await?;
    let now = Utc::now().into();
    let created = event::ActiveModel {
        id: Set(id.clone()),
        seller_id: Set(seller.id.clone()),
        title: Set(title),
        description: Set(input.description),
        logo: Set(input.logo.filter(|l| !l.trim().is_empty())),
        brand_name: Set(brand_name),
        slug: Set(slug),
        is_active: Set(input.is_active.unwrap_or(true)),
        daily_booking_capacity: Set(input.daily_booking_capacity.filter(|c| *c > 0)),
        total_views: Set(0),
        daily_views: Set(serde_json::json!({})),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    apply_services(&txn, &id, &services).await?;
    apply_gallery(&txn, &id, &input.gallery_images).await?;
    txn.commit().await?;

    EVENTS_CREATED_TOTAL.inc();
    info!(event_id = %created.id, slug = %created.slug, "event_created");
    event_detail(db, created).await
}

/// Fetch an event by slug, recording one view.
#[instrument(skip(db))]
pub async fn get_event(db: &DatabaseConnection, slug: &str) -> ServiceResult<EventDetail> {
    let txn = db.begin().await?;
    let ev = event::Entity::find()
        .filter(event::Column::Slug.eq(slug))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("event"))?;
    let today = Utc::now().date_naive();
    let total = ev.total_views + 1;
    let daily = event::bump_daily_views(&ev.daily_views, today);
    let mut am: event::ActiveModel = ev.into();
    am.total_views = Set(total);
    am.daily_views = Set(daily);
    let ev = am.update(&txn).await?;
    txn.commit().await?;
    EVENT_VIEWS_TOTAL.inc();
    event_detail(db, ev).await
}

/// Assemble the detail view without touching counters.
pub async fn event_detail<C: ConnectionTrait>(db: &C, ev: event::Model) -> ServiceResult<EventDetail> {
    let seller = user::Entity::find_by_id(ev.seller_id.clone())
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("seller"))?;
    let details = event_service_detail::Entity::find()
        .filter(event_service_detail::Column::EventId.eq(ev.id.as_str()))
        .order_by_asc(event_service_detail::Column::ServiceType)
        .all(db)
        .await?;
    let mut gallery = event_gallery::Entity::find()
        .filter(event_gallery::Column::EventId.eq(ev.id.as_str()))
        .all(db)
        .await?;
    event_gallery::sort_images(&mut gallery);
    let reviews = review::Entity::find()
        .filter(review::Column::EventId.eq(ev.id.as_str()))
        .order_by_desc(review::Column::CreatedAt)
        .all(db)
        .await?;
    let authors = users_by_id(db, reviews.iter().map(|r| r.user_id.clone()).collect()).await?;

    let now = Utc::now();
    let points: Vec<ReviewPoint> = reviews
        .iter()
        .map(|r| ReviewPoint { rating: r.rating, created_at: r.created_at.with_timezone(&Utc) })
        .collect();
    let summary = review_stats(&points, now.date_naive());
    let (daily_reviews, daily_ratings) = daily_series(&points, now);
    let daily_views = event::recent_daily_views(&ev.daily_views, now.date_naive())
        .into_iter()
        .map(|(d, n)| (d.format("%Y-%m-%d").to_string(), n))
        .collect();

    let recent = reviews
        .iter()
        .take(RECENT_REVIEWS)
        .map(|r| {
            let author = authors.get(&r.user_id);
            ReviewSummary {
                id: r.id.clone(),
                user_full_name: author.map(|u| u.full_name()).unwrap_or_default(),
                user_profile_image: author.and_then(|u| u.profile_image.clone()),
                rating: r.rating,
                comment: r.comment.clone(),
                created_at: r.created_at,
            }
        })
        .collect();

    Ok(EventDetail {
        id: ev.id,
        seller: seller.id.clone(),
        seller_info: SellerInfo::from(&seller),
        title: ev.title,
        slug: ev.slug,
        description: ev.description,
        logo: ev.logo,
        brand_name: ev.brand_name,
        is_active: ev.is_active,
        daily_booking_capacity: ev.daily_booking_capacity,
        total_views: ev.total_views,
        total_reviews: summary.total_reviews,
        average_rating: summary.average_rating,
        daily_views,
        daily_reviews,
        daily_ratings,
        created_at: ev.created_at,
        updated_at: ev.updated_at,
        service_details: details.iter().map(ServiceDetailView::from).collect(),
        gallery_images: gallery.iter().map(GalleryImageView::from).collect(),
        reviews: recent,
    })
}

pub(crate) async fn users_by_id<C: ConnectionTrait>(
    db: &C,
    ids: Vec<String>,
) -> ServiceResult<HashMap<String, user::Model>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = user::Entity::find().filter(user::Column::Id.is_in(ids)).all(db).await?;
    Ok(rows.into_iter().map(|u| (u.id.clone(), u)).collect())
}

/// Listing rows for `events`, with seller, services, gallery and review
/// aggregates loaded in bulk.
pub async fn load_listings<C: ConnectionTrait>(db: &C, events: Vec<event::Model>) -> ServiceResult<Vec<EventListing>> {
    let ids: Vec<String> = events.iter().map(|e| e.id.clone()).collect();
    let sellers = users_by_id(db, events.iter().map(|e| e.seller_id.clone()).collect()).await?;
    let mut details: HashMap<String, Vec<event_service_detail::Model>> = HashMap::new();
    let mut gallery: HashMap<String, Vec<event_gallery::Model>> = HashMap::new();
    if !ids.is_empty() {
        for d in event_service_detail::Entity::find()
            .filter(event_service_detail::Column::EventId.is_in(ids.iter().cloned()))
            .all(db)
            .await?
        {
            details.entry(d.event_id.clone()).or_default().push(d);
        }
        for g in event_gallery::Entity::find()
            .filter(event_gallery::Column::EventId.is_in(ids.iter().cloned()))
            .all(db)
            .await?
        {
            gallery.entry(g.event_id.clone()).or_default().push(g);
        }
    }
    let points = stats::load_points(db, &ids).await?;
    let today = Utc::now().date_naive();

    let mut out = Vec::with_capacity(events.len());
    for ev in events {
        let Some(seller) = sellers.get(&ev.seller_id) else { continue };
        let available: Vec<&event_service_detail::Model> = details
            .get(&ev.id)
            .map(|v| v.iter().filter(|d| d.is_available).collect())
            .unwrap_or_default();
        let mut service_types: Vec<ServiceType> = available.iter().map(|d| d.service_type).collect();
        service_types.sort();
        let starting_price = available.iter().map(|d| d.price).min();
        let primary_image = gallery.get_mut(&ev.id).and_then(|imgs| {
            event_gallery::sort_images(imgs);
            imgs.iter().find(|i| i.is_primary).or_else(|| imgs.first()).map(|i| i.image.clone())
        });
        let summary = review_stats(points.get(&ev.id).map(Vec::as_slice).unwrap_or(&[]), today);
        out.push(EventListing {
            id: ev.id,
            slug: ev.slug,
            title: ev.title,
            brand_name: ev.brand_name,
            description: ev.description,
            logo: ev.logo,
            seller_info: SellerSummary::from(seller),
            service_types,
            starting_price,
            primary_image,
            total_views: ev.total_views,
            total_reviews: summary.total_reviews,
            average_rating: summary.average_rating,
            created_at: ev.created_at,
        });
    }
    Ok(out)
}

/// Active events filtered, ordered and paginated.
#[instrument(skip(db, query))]
pub async fn list_events(db: &DatabaseConnection, query: &ListQuery) -> ServiceResult<EventList> {
    let events = event::Entity::find()
        .filter(event::Column::IsActive.eq(true))
        .all(db)
        .await?;
    let listings = load_listings(db, events).await?;
    let filtered = ListFilter::from(query).apply(listings);
    let page = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }
    .apply(filtered);
    let suggestions = match query.search.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => suggestions(db, q).await?,
        _ => None,
    };
    Ok(EventList {
        count: page.count,
        page: page.page,
        per_page: page.per_page,
        results: page.results,
        suggestions,
    })
}

/// Autocomplete candidates for a search box; `None` when `q` is blank.
pub async fn suggestions(db: &DatabaseConnection, q: &str) -> ServiceResult<Option<Suggestions>> {
    if q.trim().is_empty() {
        return Ok(None);
    }
    let brands: Vec<String> = event::Entity::find()
        .select_only()
        .column(event::Column::BrandName)
        .filter(event::Column::IsActive.eq(true))
        .order_by_asc(event::Column::BrandName)
        .into_tuple()
        .all(db)
        .await?;
    let sellers: Vec<String> = user::Entity::find()
        .filter(user::Column::UserType.eq(user::Role::Seller))
        .order_by_asc(user::Column::FirstName)
        .all(db)
        .await?
        .iter()
        .map(user::Model::full_name)
        .collect();
    Ok(build_suggestions(q, &brands, &sellers))
}

/// Partial update by the event owner.
#[instrument(skip(db, actor, patch), fields(actor_id = %actor.id))]
pub async fn update_event(
    db: &DatabaseConnection,
    actor: &user::Model,
    slug: &str,
    patch: UpdateEventInput,
) -> ServiceResult<EventDetail> {
    let ev = find_event(db, slug).await?;
    if ev.seller_id != actor.id {
        return Err(ServiceError::forbidden("You do not have permission to update this event."));
    }
    let title = patch.title.as_deref().map(str::trim).unwrap_or(&ev.title).to_string();
    let brand_name = patch.brand_name.as_deref().map(str::trim).unwrap_or(&ev.brand_name).to_string();
    validate_event_text(&title, &brand_name)?;
    let services = match &patch.service_details {
        Some(items) => resolve_services(items)?,
        None => Vec::new(),
    };
    if let Some(images) = &patch.gallery_images {
        validate_gallery(images)?;
    }
    ensure_unique_names(db, &title, &brand_name, Some(&ev.id)).await?;

    let txn = db.begin().await?;
    let refresh_slug = event::slug_outdated(&ev.slug, &brand_name);
    let id = ev.id.clone();
    let mut am: event::ActiveModel = ev.into();
    if refresh_slug {
        am.slug = Set(event::unique_slug(&txn, &brand_name, &id).await?);
    }
    am.title = Set(title);
    am.brand_name = Set(brand_name);
    if let Some(d) = patch.description {
        am.description = Set(d);
    }
    if let Some(l) = patch.logo {
        am.logo = Set(Some(l).filter(|l| !l.trim().is_empty()));
    }
    if let Some(a) = patch.is_active {
        am.is_active = Set(a);
    }
    if let Some(c) = patch.daily_booking_capacity {
        am.daily_booking_capacity = Set(Some(c).filter(|c| *c > 0));
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await?;
    apply_services(&txn, &id, &services).await?;
    if let Some(images) = &patch.gallery_images {
        if let Err(e) = apply_gallery(&txn, &id, images).await {
            txn.rollback().await?;
            return Err(e);
        }
    }
    txn.commit().await?;
    info!(event_id = %updated.id, "event_updated");
    event_detail(db, updated).await
}

/// Delete an event; owner or admin.
#[instrument(skip(db, actor), fields(actor_id = %actor.id))]
pub async fn delete_event(db: &DatabaseConnection, actor: &user::Model, slug: &str) -> ServiceResult<()> {
    let ev = find_event(db, slug).await?;
    if ev.seller_id != actor.id && !actor.is_admin() {
        return Err(ServiceError::forbidden("You do not have permission to delete this event."));
    }
    event::Entity::delete_by_id(ev.id.clone()).exec(db).await?;
    info!(event_id = %ev.id, "event_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::payload::ServiceDetailInput;
    use crate::test_support::{get_db, make_user};
    use models::user::Role;

    #[test]
    fn catalog_lists_every_type() {
        let types = list_service_types();
        assert_eq!(types.len(), 7);
        assert_eq!(types[2].code, "hall_booking");
        assert_eq!(types[3].label, "Sound System (DJ)");
    }

    fn create_input(tag: &str) -> CreateEventInput {
        CreateEventInput {
            title: format!("Title {tag}"),
            brand_name: format!("Brand {tag}"),
            description: "All-in-one".into(),
            logo: None,
            is_active: None,
            daily_booking_capacity: Some(2),
            service_details: vec![ServiceDetailInput {
                service: "photography".into(),
                short_description: Some("Full day".into()),
                price: Some(50_000),
                is_available: None,
            }],
            gallery_images: vec![GalleryImageInput {
                image: "https://cdn.example.com/1.jpg".into(),
                position: 1,
                is_primary: true,
            }],
        }
    }

    #[tokio::test]
    async fn event_lifecycle() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let seller = make_user(&db, Role::Seller).await?;
        let buyer = make_user(&db, Role::Customer).await?;
        let tag = ids::random_id(6);

        assert!(matches!(
            create_event(&db, &buyer, create_input(&tag)).await,
            Err(ServiceError::Forbidden(_))
        ));

        let created = create_event(&db, &seller, create_input(&tag)).await?;
        assert_eq!(created.service_details.len(), 1);
        assert_eq!(created.total_views, 0);
        assert!(matches!(
            create_event(&db, &seller, create_input(&tag)).await,
            Err(ServiceError::Conflict(_))
        ));

        let viewed = get_event(&db, &created.slug).await?;
        assert_eq!(viewed.total_views, 1);
        assert_eq!(viewed.daily_views.values().sum::<i64>(), 1);

        let patch = UpdateEventInput {
            gallery_images: Some(vec![GalleryImageInput {
                image: "https://cdn.example.com/2.jpg".into(),
                position: 2,
                is_primary: true,
            }]),
            ..Default::default()
        };
        let updated = update_event(&db, &seller, &created.slug, patch).await?;
        assert_eq!(updated.gallery_images.len(), 2);
        assert_eq!(updated.gallery_images.iter().filter(|g| g.is_primary).count(), 1);
        assert!(updated.gallery_images[1].is_primary);

        assert!(matches!(
            update_event(&db, &buyer, &created.slug, UpdateEventInput::default()).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            delete_event(&db, &buyer, &created.slug).await,
            Err(ServiceError::Forbidden(_))
        ));
        delete_event(&db, &seller, &created.slug).await?;
        assert!(matches!(get_event(&db, &created.slug).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn brand_rename_keeps_slug_while_prefix_matches() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let seller = make_user(&db, Role::Seller).await?;
        let tag = ids::random_id(8);
        let input = CreateEventInput { brand_name: format!("{tag} Studio"), ..create_input(&tag) };
        let created = create_event(&db, &seller, input).await?;
        assert_eq!(created.slug, format!("{}-studio", tag.to_lowercase()));

        let shorter = UpdateEventInput { brand_name: Some(tag.clone()), ..Default::default() };
        let kept = update_event(&db, &seller, &created.slug, shorter).await?;
        assert_eq!(kept.slug, created.slug);
        assert_eq!(kept.brand_name, tag);

        let renamed = UpdateEventInput { brand_name: Some(format!("Other {tag}")), ..Default::default() };
        let moved = update_event(&db, &seller, &kept.slug, renamed).await?;
        assert_eq!(moved.slug, format!("other-{}", tag.to_lowercase()));
        delete_event(&db, &seller, &moved.slug).await?;
        Ok(())
    }

    #[tokio::test]
    async fn gallery_overflow_rolls_back_update() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let seller = make_user(&db, Role::Seller).await?;
        let created = create_event(&db, &seller, create_input(&ids::random_id(6))).await?;

        let first: Vec<_> = (2..=10)
            .map(|p| GalleryImageInput { image: format!("https://cdn.example.com/{p}.jpg"), position: p, is_primary: false })
            .collect();
        update_event(&db, &seller, &created.slug, UpdateEventInput { gallery_images: Some(first), ..Default::default() }).await?;

        let overflow = UpdateEventInput {
            title: Some(format!("Renamed {}", ids::random_id(6))),
            gallery_images: Some(vec![GalleryImageInput {
                image: "https://cdn.example.com/11.jpg".into(),
                position: 11,
                is_primary: false,
            }]),
            ..Default::default()
        };
        assert!(matches!(
            update_event(&db, &seller, &created.slug, overflow).await,
            Err(ServiceError::Validation(_))
        ));
        let after = event_detail(&db, find_event(&db, &created.slug).await?).await?;
        assert_eq!(after.gallery_images.len(), 10);
        assert_eq!(after.title, created.title);
        delete_event(&db, &seller, &created.slug).await?;
        Ok(())
    }
}
