//! Public view and review aggregates for active events.

use chrono::Utc;
use models::event;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::errors::{ServiceError, ServiceResult};
use crate::stats::{self, review_stats, RatingBucket, ReviewPoint};

#[derive(Debug, Clone, Serialize)]
pub struct EventDashboard {
    pub id: String,
    pub slug: String,
    pub brand_name: String,
    pub title: String,
    pub total_views: i64,
    pub today_views: i64,
    pub total_reviews: u64,
    pub average_rating: f64,
    pub daily_comment_count: u64,
    pub daily_average_rating: f64,
    pub rating_distribution: Vec<RatingBucket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalDashboard {
    pub total_events: u64,
    pub total_views: i64,
    pub today_views: i64,
    pub total_reviews: u64,
    pub average_rating: f64,
    pub daily_comment_count: u64,
    pub daily_average_rating: f64,
    pub rating_distribution: Vec<RatingBucket>,
}

pub fn event_dashboard_from(ev: &event::Model, points: &[ReviewPoint]) -> EventDashboard {
    let today = Utc::now().date_naive();
    let s = review_stats(points, today);
    EventDashboard {
        id: ev.id.clone(),
        slug: ev.slug.clone(),
        brand_name: ev.brand_name.clone(),
        title: ev.title.clone(),
        total_views: ev.total_views,
        today_views: event::views_on(&ev.daily_views, today),
        total_reviews: s.total_reviews,
        average_rating: s.average_rating,
        daily_comment_count: s.daily_comment_count,
        daily_average_rating: s.daily_average_rating,
        rating_distribution: s.rating_distribution,
    }
}

/// Dashboard for one active event.
pub async fn event_dashboard(db: &DatabaseConnection, slug: &str) -> ServiceResult<EventDashboard> {
    let ev = event::Entity::find()
        .filter(event::Column::Slug.eq(slug))
        .filter(event::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("event"))?;
    let points = stats::load_points(db, std::slice::from_ref(&ev.id)).await?;
    Ok(event_dashboard_from(&ev, points.get(&ev.id).map(Vec::as_slice).unwrap_or(&[])))
}

/// Dashboards for a list of events, newest first.
pub async fn event_dashboards(db: &DatabaseConnection, events: Vec<event::Model>) -> ServiceResult<Vec<EventDashboard>> {
    let ids: Vec<String> = events.iter().map(|e| e.id.clone()).collect();
    let points = stats::load_points(db, &ids).await?;
    Ok(events
        .iter()
        .map(|ev| event_dashboard_from(ev, points.get(&ev.id).map(Vec::as_slice).unwrap_or(&[])))
        .collect())
}

/// Platform-wide totals over active events and all reviews.
pub async fn global_dashboard(db: &DatabaseConnection) -> ServiceResult<GlobalDashboard> {
    let events = event::Entity::find()
        .filter(event::Column::IsActive.eq(true))
        .order_by_desc(event::Column::CreatedAt)
        .all(db)
        .await?;
    let today = Utc::now().date_naive();
    let points = stats::load_all_points(db).await?;
    Ok(summarize(&events, &points, today))
}

fn summarize(events: &[event::Model], points: &[ReviewPoint], today: chrono::NaiveDate) -> GlobalDashboard {
    let s = review_stats(points, today);
    GlobalDashboard {
        total_events: events.len() as u64,
        total_views: events.iter().map(|e| e.total_views).sum(),
        today_views: events.iter().map(|e| event::views_on(&e.daily_views, today)).sum(),
        total_reviews: s.total_reviews,
        average_rating: s.average_rating,
        daily_comment_count: s.daily_comment_count,
        daily_average_rating: s.daily_average_rating,
        rating_distribution: s.rating_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    fn ev(id: &str, views: i64, daily: serde_json::Value) -> event::Model {
        let now = Utc::now().into();
        event::Model {
            id: id.into(),
            seller_id: "s".into(),
            title: format!("t-{id}"),
            description: String::new(),
            logo: None,
            brand_name: format!("b-{id}"),
            slug: id.to_lowercase(),
            is_active: true,
            daily_booking_capacity: None,
            total_views: views,
            daily_views: daily,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn global_summary_adds_views_and_reviews() {
        let today = NaiveDate::from_ymd_opt(2024, 7, 1).expect("date");
        let events = [ev("A", 10, json!({ "2024-07-01": 3 })), ev("B", 5, json!({ "2024-06-30": 2 }))];
        let at = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).single().expect("time");
        let points = [ReviewPoint { rating: 5, created_at: at }, ReviewPoint { rating: 2, created_at: at }];
        let g = summarize(&events, &points, today);
        assert_eq!(g.total_events, 2);
        assert_eq!(g.total_views, 15);
        assert_eq!(g.today_views, 3);
        assert_eq!(g.total_reviews, 2);
        assert_eq!(g.average_rating, 3.5);
        assert_eq!(g.daily_comment_count, 2);
    }
}
