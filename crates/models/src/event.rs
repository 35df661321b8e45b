use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ModelError;
use crate::ids::slugify;
use crate::user;

/// Days of per-day view history kept on the row.
pub const VIEW_HISTORY_DAYS: i64 = 30;

/// Path segments under `/events` that an event slug must not shadow.
pub const RESERVED_SLUGS: &[&str] = &["create", "dashboard", "suggestions", "reports", "services"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub seller_id: String,
    #[sea_orm(unique)]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub logo: Option<String>,
    #[sea_orm(unique)]
    pub brand_name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub is_active: bool,
    pub daily_booking_capacity: Option<i32>,
    pub total_views: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub daily_views: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Seller,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Seller => Entity::belongs_to(user::Entity)
                .from(Column::SellerId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Parse the stored `{"YYYY-MM-DD": n}` object; malformed entries are dropped.
pub fn parse_daily_views(value: &Value) -> BTreeMap<NaiveDate, i64> {
    let mut out = BTreeMap::new();
    if let Value::Object(map) = value {
        for (k, v) in map {
            if let (Ok(day), Some(n)) = (NaiveDate::parse_from_str(k, "%Y-%m-%d"), v.as_i64()) {
                out.insert(day, n);
            }
        }
    }
    out
}

fn encode_daily_views(map: &BTreeMap<NaiveDate, i64>) -> Value {
    let obj = map
        .iter()
        .map(|(d, n)| (d.format("%Y-%m-%d").to_string(), Value::from(*n)))
        .collect::<serde_json::Map<_, _>>();
    Value::Object(obj)
}

/// Record one view on `today` and drop buckets older than the history window.
pub fn bump_daily_views(value: &Value, today: NaiveDate) -> Value {
    let mut map = parse_daily_views(value);
    *map.entry(today).or_insert(0) += 1;
    let cutoff = today - Duration::days(VIEW_HISTORY_DAYS);
    map.retain(|d, _| *d >= cutoff);
    encode_daily_views(&map)
}

pub fn views_on(value: &Value, day: NaiveDate) -> i64 {
    parse_daily_views(value).get(&day).copied().unwrap_or(0)
}

/// Buckets within the last 30 days, oldest first.
pub fn recent_daily_views(value: &Value, today: NaiveDate) -> BTreeMap<NaiveDate, i64> {
    let cutoff = today - Duration::days(VIEW_HISTORY_DAYS);
    parse_daily_views(value)
        .into_iter()
        .filter(|(d, _)| *d >= cutoff && *d <= today)
        .collect()
}

/// Base slug for a brand name; `event` when nothing usable remains.
pub fn base_slug(brand_name: &str) -> String {
    let s = slugify(brand_name);
    if s.is_empty() { "event".to_string() } else { s }
}

/// Slug candidates in the order they are tried: the bare brand slug (unless
/// reserved), then `-<id prefix>`, then `-<id prefix>-<n>`.
pub fn slug_candidates(brand_name: &str, event_id: &str) -> impl Iterator<Item = String> {
    let base = base_slug(brand_name);
    let prefix: String = event_id.chars().take(4).collect::<String>().to_lowercase();
    let bare = if RESERVED_SLUGS.contains(&base.as_str()) { None } else { Some(base.clone()) };
    let suffixed = format!("{base}-{prefix}");
    bare.into_iter()
        .chain(std::iter::once(suffixed.clone()))
        .chain((1..).map(move |i| format!("{suffixed}-{i}")))
}

/// A slug survives a brand rename while it still starts with the new base slug.
pub fn slug_outdated(current: &str, brand_name: &str) -> bool {
    !current.starts_with(&base_slug(brand_name))
}

/// First free slug for the event, ignoring the event's own row.
pub async fn unique_slug<C: ConnectionTrait>(
    db: &C,
    brand_name: &str,
    event_id: &str,
) -> Result<String, ModelError> {
    for candidate in slug_candidates(brand_name, event_id) {
        let taken = Entity::find()
            .filter(Column::Slug.eq(candidate.as_str()))
            .filter(Column::Id.ne(event_id))
            .one(db)
            .await?;
        if taken.is_none() {
            return Ok(candidate);
        }
    }
    Err(ModelError::Db("slug candidates exhausted".into()))
}

pub async fn find_by_slug<C: ConnectionTrait>(db: &C, slug: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Slug.eq(slug)).one(db).await?)
}
