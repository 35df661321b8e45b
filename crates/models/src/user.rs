use chrono::{NaiveDate, Utc};
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::ids::{self, slugify, USER_ID_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "seller")]
    Seller,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }

    /// Parse a role name; `organizer` is accepted for sellers.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "buyer" => Some(Role::Customer),
            "seller" | "organizer" => Some(Role::Seller),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub user_type: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub accepted_terms: bool,
    #[serde(skip_serializing)]
    pub otp: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expiry: Option<DateTimeWithTimeZone>,
    pub whatsapp_click_count: i64,
    pub whatsapp_daily_click_count: i64,
    pub whatsapp_daily_click_date: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn is_seller(&self) -> bool {
        self.user_type == Role::Seller
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == Role::Admin
    }
}

/// Fields needed to insert a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub location: Option<String>,
    pub user_type: Role,
    pub accepted_terms: bool,
    pub is_verified: bool,
}

/// Base profile slug for a name pair, e.g. `ada-lovelace`.
pub fn base_slug(first_name: &str, last_name: &str) -> String {
    let joined = format!("{}-{}", slugify(first_name), slugify(last_name));
    let trimmed = joined.trim_matches('-').to_string();
    if trimmed.is_empty() { "user".to_string() } else { trimmed }
}

/// First free slug derived from the names, appending `-2`, `-3`, ... on
/// collision. `exclude_id` lets a user keep their own slug.
pub async fn unique_slug<C: ConnectionTrait>(
    db: &C,
    first_name: &str,
    last_name: &str,
    exclude_id: Option<&str>,
) -> Result<String, ModelError> {
    let base = base_slug(first_name, last_name);
    let mut candidate = base.clone();
    let mut n = 2;
    loop {
        let taken = Entity::find()
            .filter(Column::Slug.eq(candidate.as_str()))
            .one(db)
            .await?;
        match taken {
            None => return Ok(candidate),
            Some(u) if Some(u.id.as_str()) == exclude_id => return Ok(candidate),
            Some(_) => {
                candidate = format!("{base}-{n}");
                n += 1;
            }
        }
    }
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?)
}

pub async fn find_by_slug<C: ConnectionTrait>(db: &C, slug: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Slug.eq(slug)).one(db).await?)
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewUser) -> Result<Model, ModelError> {
    let email = input.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ModelError::Validation("invalid email".into()));
    }
    if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
        return Err(ModelError::Validation("first and last name are required".into()));
    }
    let id = ids::unique_id::<Entity, _>(db, USER_ID_LEN).await?;
    let slug = unique_slug(db, &input.first_name, &input.last_name, None).await?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(id),
        email: Set(email),
        first_name: Set(input.first_name.trim().to_string()),
        last_name: Set(input.last_name.trim().to_string()),
        slug: Set(slug),
        profile_image: Set(None),
        location: Set(input.location),
        phone_number: Set(input.phone_number),
        whatsapp_number: Set(input.whatsapp_number),
        user_type: Set(input.user_type),
        is_active: Set(true),
        is_verified: Set(input.is_verified),
        accepted_terms: Set(input.accepted_terms),
        otp: Set(None),
        otp_expiry: Set(None),
        whatsapp_click_count: Set(0),
        whatsapp_daily_click_count: Set(0),
        whatsapp_daily_click_date: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

/// New `(total, daily, day)` WhatsApp counters after one click on `today`.
/// The daily counter restarts when the stored day is not today.
pub fn next_whatsapp_counts(
    total: i64,
    daily: i64,
    day: Option<NaiveDate>,
    today: NaiveDate,
) -> (i64, i64, NaiveDate) {
    let daily = if day == Some(today) { daily + 1 } else { 1 };
    (total + 1, daily, today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_accepts_organizer_alias() {
        assert_eq!(Role::parse("Organizer"), Some(Role::Seller));
        assert_eq!(Role::parse("seller"), Some(Role::Seller));
        assert_eq!(Role::parse(" customer "), Some(Role::Customer));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn base_slug_joins_names() {
        assert_eq!(base_slug("Ada", "Love Lace"), "ada-love-lace");
        assert_eq!(base_slug("", "!!"), "user");
    }

    #[test]
    fn whatsapp_daily_counter_resets_on_new_day() {
        let d1 = NaiveDate::from_ymd_opt(2024, 5, 1).expect("date");
        let d2 = NaiveDate::from_ymd_opt(2024, 5, 2).expect("date");
        assert_eq!(next_whatsapp_counts(10, 3, Some(d1), d1), (11, 4, d1));
        assert_eq!(next_whatsapp_counts(10, 3, Some(d1), d2), (11, 1, d2));
        assert_eq!(next_whatsapp_counts(0, 0, None, d2), (1, 1, d2));
    }
}
