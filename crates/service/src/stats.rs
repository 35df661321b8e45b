//! Review aggregates shared by event views, listings and dashboards.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use models::review;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;

use crate::errors::ServiceResult;

/// Window for per-day review series.
pub const SERIES_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewPoint {
    pub rating: i16,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
    pub average_rating: f64,
    pub total_reviews: u64,
    pub daily_comment_count: u64,
    pub daily_average_rating: f64,
    /// Every rating 1..=5 is present, zero when unused.
    pub rating_distribution: Vec<RatingBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingBucket {
    pub rating: i16,
    pub count: u64,
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn average(ratings: impl Iterator<Item = i16>) -> f64 {
    let (sum, n) = ratings.fold((0i64, 0u64), |(s, n), r| (s + r as i64, n + 1));
    if n == 0 { 0.0 } else { round2(sum as f64 / n as f64) }
}

pub fn review_stats(points: &[ReviewPoint], today: NaiveDate) -> ReviewStats {
    let mut distribution: BTreeMap<i16, u64> = (1..=5).map(|r| (r, 0)).collect();
    for p in points {
        *distribution.entry(p.rating).or_insert(0) += 1;
    }
    let today_points: Vec<i16> = points
        .iter()
        .filter(|p| p.created_at.date_naive() == today)
        .map(|p| p.rating)
        .collect();
    ReviewStats {
        average_rating: average(points.iter().map(|p| p.rating)),
        total_reviews: points.len() as u64,
        daily_comment_count: today_points.len() as u64,
        daily_average_rating: average(today_points.into_iter()),
        rating_distribution: distribution
            .into_iter()
            .filter(|(rating, _)| (1..=5).contains(rating))
            .map(|(rating, count)| RatingBucket { rating, count })
            .collect(),
    }
}

/// Per-day review counts and average ratings for the last 30 days, keyed by
/// ISO date. Days without reviews are omitted.
pub fn daily_series(points: &[ReviewPoint], now: DateTime<Utc>) -> (BTreeMap<String, u64>, BTreeMap<String, f64>) {
    let cutoff = now - Duration::days(SERIES_DAYS);
    let mut by_day: BTreeMap<NaiveDate, Vec<i16>> = BTreeMap::new();
    for p in points.iter().filter(|p| p.created_at >= cutoff) {
        by_day.entry(p.created_at.date_naive()).or_default().push(p.rating);
    }
    let counts = by_day
        .iter()
        .map(|(d, r)| (d.format("%Y-%m-%d").to_string(), r.len() as u64))
        .collect();
    let avgs = by_day
        .into_iter()
        .map(|(d, r)| (d.format("%Y-%m-%d").to_string(), average(r.into_iter())))
        .collect();
    (counts, avgs)
}

/// Rating points grouped by event id.
pub async fn load_points<C: ConnectionTrait>(
    db: &C,
    event_ids: &[String],
) -> ServiceResult<HashMap<String, Vec<ReviewPoint>>> {
    let mut out: HashMap<String, Vec<ReviewPoint>> = HashMap::new();
    if event_ids.is_empty() {
        return Ok(out);
    }
    let rows: Vec<(String, i16, DateTimeWithTimeZone)> = review::Entity::find()
        .select_only()
        .column(review::Column::EventId)
        .column(review::Column::Rating)
        .column(review::Column::CreatedAt)
        .filter(review::Column::EventId.is_in(event_ids.iter().cloned()))
        .into_tuple()
        .all(db)
        .await?;
    for (event_id, rating, created_at) in rows {
        out.entry(event_id)
            .or_default()
            .push(ReviewPoint { rating, created_at: created_at.with_timezone(&Utc) });
    }
    Ok(out)
}

/// Every rating point on the platform.
pub async fn load_all_points<C: ConnectionTrait>(db: &C) -> ServiceResult<Vec<ReviewPoint>> {
    let rows: Vec<(i16, DateTimeWithTimeZone)> = review::Entity::find()
        .select_only()
        .column(review::Column::Rating)
        .column(review::Column::CreatedAt)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(rating, created_at)| ReviewPoint { rating, created_at: created_at.with_timezone(&Utc) })
        .collect())
}
