//! User reports against events and their admin moderation.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use common::metrics::REPORTS_CREATED_TOTAL;
use models::event_gallery::validate_image_url;
use models::ids::{self, REPORT_ID_LEN};
use models::report::{self, ReportStatus};
use models::report_image::{self, MAX_REPORT_IMAGES};
use models::user;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{ServiceError, ServiceResult};
use crate::events::service::{find_event, users_by_id};
use crate::pagination::{Page, Pagination};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReportInput {
    pub description: String,
    pub user_full_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdateInput {
    pub status: Option<String>,
    pub admin_notes: Option<String>,
}

/// Query string of the admin report list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminReportQuery {
    #[serde(default)]
    pub status: Vec<String>,
    pub brand_name: Option<String>,
    pub seller_full_name: Option<String>,
    pub user_full_name: Option<String>,
    pub created_after: Option<NaiveDate>,
    pub created_before: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportImageView {
    pub id: Uuid,
    pub image: String,
    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub id: String,
    pub event: String,
    pub description: String,
    pub user_full_name: String,
    pub phone_number: String,
    pub brand_name: String,
    pub seller_full_name: String,
    pub seller: String,
    pub reporter: String,
    pub status: ReportStatus,
    pub status_changed_at: Option<DateTimeWithTimeZone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_changed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_changed_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub images_list: Vec<ReportImageView>,
}

impl ReportView {
    fn build(r: report::Model, images: Vec<report_image::Model>, changed_by: Option<&user::Model>, admin: bool) -> Self {
        let (status_changed_by, status_changed_by_name, admin_notes) = if admin {
            (r.status_changed_by, changed_by.map(user::Model::full_name), r.admin_notes)
        } else {
            (None, None, None)
        };
        ReportView {
            id: r.id,
            event: r.event_id,
            description: r.description,
            user_full_name: r.user_full_name,
            phone_number: r.phone_number,
            brand_name: r.brand_name,
            seller_full_name: r.seller_full_name,
            seller: r.seller_id,
            reporter: r.reporter_id,
            status: r.status,
            status_changed_at: r.status_changed_at,
            status_changed_by,
            status_changed_by_name,
            admin_notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
            images_list: images
                .into_iter()
                .map(|i| ReportImageView { id: i.id, image: i.image, uploaded_at: i.uploaded_at })
                .collect(),
        }
    }
}

async fn views<C: ConnectionTrait>(db: &C, rows: Vec<report::Model>, admin: bool) -> ServiceResult<Vec<ReportView>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut images: HashMap<String, Vec<report_image::Model>> = HashMap::new();
    if !ids.is_empty() {
        for img in report_image::Entity::find()
            .filter(report_image::Column::ReportId.is_in(ids))
            .order_by_asc(report_image::Column::UploadedAt)
            .all(db)
            .await?
        {
            images.entry(img.report_id.clone()).or_default().push(img);
        }
    }
    let admins = if admin {
        users_by_id(db, rows.iter().filter_map(|r| r.status_changed_by.clone()).collect()).await?
    } else {
        HashMap::new()
    };
    Ok(rows
        .into_iter()
        .map(|r| {
            let imgs = images.remove(&r.id).unwrap_or_default();
            let by = r.status_changed_by.as_ref().and_then(|id| admins.get(id));
            ReportView::build(r, imgs, by, admin)
        })
        .collect())
}

/// File a report against an event.
#[instrument(skip(db, actor, input), fields(actor_id = %actor.id))]
pub async fn create_report(
    db: &DatabaseConnection,
    actor: &user::Model,
    event_slug: &str,
    input: CreateReportInput,
) -> ServiceResult<ReportView> {
    let ev = find_event(db, event_slug).await?;
    if input.description.trim().is_empty() {
        return Err(ServiceError::validation("description is required"));
    }
    if input.user_full_name.trim().is_empty() {
        return Err(ServiceError::validation("user_full_name is required"));
    }
    if input.phone_number.trim().is_empty() {
        return Err(ServiceError::validation("phone_number is required"));
    }
    if input.images.len() > MAX_REPORT_IMAGES {
        return Err(ServiceError::validation(format!("Max {MAX_REPORT_IMAGES} images are allowed.")));
    }
    for url in &input.images {
        validate_image_url(url)?;
    }
    let seller = user::Entity::find_by_id(ev.seller_id.clone())
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("seller"))?;

    let txn = db.begin().await?;
    let now = Utc::now().into();
    let created = report::ActiveModel {
        id: Set(ids::unique_id::<report::Entity, _>(&txn, REPORT_ID_LEN).await?),
        reporter_id: Set(actor.id.clone()),
        event_id: Set(ev.id.clone()),
        seller_id: Set(seller.id.clone()),
        brand_name: Set(ev.brand_name.clone()),
        seller_full_name: Set(seller.full_name()),
        description: Set(input.description.trim().to_string()),
        user_full_name: Set(input.user_full_name.trim().to_string()),
        phone_number: Set(input.phone_number.trim().to_string()),
        status: Set(ReportStatus::Pending),
        status_changed_at: Set(None),
        status_changed_by: Set(None),
        admin_notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    for url in &input.images {
        report_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            report_id: Set(created.id.clone()),
            image: Set(url.trim().to_string()),
            uploaded_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;

    REPORTS_CREATED_TOTAL.inc();
    info!(report_id = %created.id, event_id = %ev.id, "report_created");
    let mut out = views(db, vec![created], actor.is_admin()).await?;
    out.pop().ok_or_else(|| ServiceError::not_found("report"))
}

/// Reports on an event: all of them for admins, the caller's own otherwise.
pub async fn list_event_reports(db: &DatabaseConnection, actor: &user::Model, event_slug: &str) -> ServiceResult<Vec<ReportView>> {
    let ev = find_event(db, event_slug).await?;
    let mut q = report::Entity::find().filter(report::Column::EventId.eq(ev.id));
    if !actor.is_admin() {
        q = q.filter(report::Column::ReporterId.eq(actor.id.as_str()));
    }
    let rows = q.order_by_desc(report::Column::CreatedAt).all(db).await?;
    views(db, rows, actor.is_admin()).await
}

/// Reports filed by a user; unknown status filters are ignored.
pub async fn list_user_reports(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_slug: &str,
    status: Option<&str>,
) -> ServiceResult<Vec<ReportView>> {
    let target = user::find_by_slug(db, user_slug).await?.ok_or_else(|| ServiceError::not_found("user"))?;
    if !(actor.is_admin() || actor.id == target.id) {
        return Err(ServiceError::forbidden("You cannot view another user's reports."));
    }
    let mut q = report::Entity::find().filter(report::Column::ReporterId.eq(target.id));
    if let Some(s) = status.and_then(ReportStatus::parse) {
        q = q.filter(report::Column::Status.eq(s));
    }
    let rows = q.order_by_desc(report::Column::CreatedAt).all(db).await?;
    views(db, rows, actor.is_admin()).await
}

/// One report, visible to its reporter and to admins.
pub async fn get_report(db: &DatabaseConnection, actor: &user::Model, id: &str) -> ServiceResult<ReportView> {
    let mut q = report::Entity::find_by_id(id.to_string());
    if !actor.is_admin() {
        q = q.filter(report::Column::ReporterId.eq(actor.id.as_str()));
    }
    let row = q.one(db).await?.ok_or_else(|| ServiceError::not_found("report"))?;
    let mut out = views(db, vec![row], actor.is_admin()).await?;
    out.pop().ok_or_else(|| ServiceError::not_found("report"))
}

fn icontains(hay: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => hay.to_lowercase().contains(&n.to_lowercase()),
        None => true,
    }
}

fn parse_statuses(raw: &[String]) -> ServiceResult<Vec<ReportStatus>> {
    raw.iter()
        .map(|s| {
            ReportStatus::parse(s)
                .ok_or_else(|| ServiceError::validation(format!("Select a valid choice. {s} is not one of the available choices.")))
        })
        .collect()
}

/// Exclusive upper bound for an inclusive `created_before` date.
fn end_of_day(day: NaiveDate) -> ServiceResult<DateTimeWithTimeZone> {
    let next = day.succ_opt().ok_or_else(|| ServiceError::validation("created_before is out of range"))?;
    Ok(next.and_time(chrono::NaiveTime::MIN).and_utc().into())
}

/// Filtered report list for moderators, newest first.
pub async fn admin_list_reports(
    db: &DatabaseConnection,
    actor: &user::Model,
    query: &AdminReportQuery,
) -> ServiceResult<Page<ReportView>> {
    if !actor.is_admin() {
        return Err(ServiceError::forbidden("Admin access required."));
    }
    let mut q = report::Entity::find();
    let statuses = parse_statuses(&query.status)?;
    if !statuses.is_empty() {
        q = q.filter(report::Column::Status.is_in(statuses));
    }
    if let Some(after) = query.created_after {
        let start: DateTimeWithTimeZone = after.and_time(chrono::NaiveTime::MIN).and_utc().into();
        q = q.filter(report::Column::CreatedAt.gte(start));
    }
    if let Some(before) = query.created_before {
        q = q.filter(report::Column::CreatedAt.lt(end_of_day(before)?));
    }
    let rows: Vec<report::Model> = q
        .order_by_desc(report::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .filter(|r| {
            icontains(&r.brand_name, &query.brand_name)
                && icontains(&r.seller_full_name, &query.seller_full_name)
                && icontains(&r.user_full_name, &query.user_full_name)
        })
        .collect();
    let page = Pagination { page: query.page.unwrap_or(1), per_page: query.per_page.unwrap_or(20) }.apply(rows);
    Ok(Page {
        count: page.count,
        page: page.page,
        per_page: page.per_page,
        results: views(db, page.results, true).await?,
    })
}

/// Moderator status change and notes.
#[instrument(skip(db, admin, input), fields(admin_id = %admin.id))]
pub async fn admin_update_report(
    db: &DatabaseConnection,
    admin: &user::Model,
    id: &str,
    input: AdminUpdateInput,
) -> ServiceResult<ReportView> {
    if !admin.is_admin() {
        return Err(ServiceError::forbidden("Admin access required."));
    }
    let row = report::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("report"))?;
    let new_status = match input.status.as_deref() {
        Some(s) => Some(ReportStatus::parse(s).ok_or_else(|| ServiceError::validation(format!("invalid status: {s}")))?),
        None => None,
    };
    let now = Utc::now().into();
    let previous = row.status;
    let mut am: report::ActiveModel = row.into();
    if let Some(s) = new_status {
        if s != previous {
            am.status = Set(s);
            am.status_changed_at = Set(Some(now));
        }
    }
    if let Some(notes) = input.admin_notes {
        am.admin_notes = Set(Some(notes));
    }
    am.status_changed_by = Set(Some(admin.id.clone()));
    am.updated_at = Set(now);
    let updated = am.update(db).await?;
    info!(report_id = %updated.id, status = ?updated.status, "report_moderated");
    let mut out = views(db, vec![updated], true).await?;
    out.pop().ok_or_else(|| ServiceError::not_found("report"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::payload::CreateEventInput;
    use crate::events::service::{create_event, delete_event};
    use crate::test_support::{get_db, make_user};
    use models::user::Role;

    #[test]
    fn unknown_admin_status_is_rejected() {
        let ok = parse_statuses(&["pending".into(), "resolved".into()]).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(matches!(parse_statuses(&["bogus".into()]), Err(ServiceError::Validation(_))));
        assert!(matches!(parse_statuses(&["pending".into(), "nope".into()]), Err(ServiceError::Validation(_))));
        assert!(parse_statuses(&[]).unwrap().is_empty());
    }

    #[test]
    fn created_before_at_date_limit_is_a_validation_error() {
        assert!(matches!(end_of_day(NaiveDate::MAX), Err(ServiceError::Validation(_))));
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let end = end_of_day(day).unwrap();
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn icontains_treats_blank_as_match() {
        assert!(icontains("Golden Lens", &None));
        assert!(icontains("Golden Lens", &Some("  ".into())));
        assert!(icontains("Golden Lens", &Some("lens".into())));
        assert!(!icontains("Golden Lens", &Some("beat".into())));
    }

    fn input(images: usize) -> CreateReportInput {
        CreateReportInput {
            description: "No-show on the day".into(),
            user_full_name: "Rita Reporter".into(),
            phone_number: "+15550100".into(),
            images: (0..images).map(|i| format!("https://cdn.example.com/r{i}.jpg")).collect(),
        }
    }

    #[tokio::test]
    async fn report_visibility_and_moderation() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let seller = make_user(&db, Role::Seller).await?;
        let reporter = make_user(&db, Role::Customer).await?;
        let other = make_user(&db, Role::Customer).await?;
        let admin = make_user(&db, Role::Admin).await?;
        let tag = ids::random_id(6);
        let ev = create_event(
            &db,
            &seller,
            CreateEventInput {
                title: format!("Reported {tag}"),
                brand_name: format!("Reported Brand {tag}"),
                description: String::new(),
                logo: None,
                is_active: None,
                daily_booking_capacity: None,
                service_details: Vec::new(),
                gallery_images: Vec::new(),
            },
        )
        .await?;

        assert!(matches!(
            create_report(&db, &reporter, &ev.slug, input(4)).await,
            Err(ServiceError::Validation(_))
        ));
        let r = create_report(&db, &reporter, &ev.slug, input(2)).await?;
        assert_eq!(r.images_list.len(), 2);
        assert_eq!(r.brand_name, ev.brand_name);
        assert_eq!(r.status, ReportStatus::Pending);

        assert!(list_event_reports(&db, &other, &ev.slug).await?.is_empty());
        assert_eq!(list_event_reports(&db, &admin, &ev.slug).await?.len(), 1);
        assert!(matches!(get_report(&db, &other, &r.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            list_user_reports(&db, &other, &reporter.slug, None).await,
            Err(ServiceError::Forbidden(_))
        ));

        let moderated = admin_update_report(
            &db,
            &admin,
            &r.id,
            AdminUpdateInput { status: Some("under_review".into()), admin_notes: Some("calling seller".into()) },
        )
        .await?;
        assert_eq!(moderated.status, ReportStatus::UnderReview);
        assert!(moderated.status_changed_at.is_some());
        assert_eq!(moderated.admin_notes.as_deref(), Some("calling seller"));

        let seen = get_report(&db, &reporter, &r.id).await?;
        assert!(seen.admin_notes.is_none());
        assert!(seen.status_changed_by.is_none());

        let mine = list_user_reports(&db, &reporter, &reporter.slug, Some("resolved")).await?;
        assert!(mine.is_empty());

        let q = AdminReportQuery { status: vec!["under_review".into()], brand_name: Some(tag.clone()), ..Default::default() };
        let page = admin_list_reports(&db, &admin, &q).await?;
        assert_eq!(page.count, 1);
        assert!(matches!(admin_list_reports(&db, &reporter, &q).await, Err(ServiceError::Forbidden(_))));

        delete_event(&db, &seller, &ev.slug).await?;
        Ok(())
    }
}
