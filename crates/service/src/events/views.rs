//! Serialized shapes returned by event endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use models::service_type::ServiceType;
use models::{event_gallery, event_service_detail, user};
use serde::Serialize;

/// Public seller card embedded in event payloads.
#[derive(Debug, Clone, Serialize)]
pub struct SellerInfo {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub profile_image: Option<String>,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub whatsapp_click_count: i64,
    pub whatsapp_daily_click_count: i64,
    pub profile_slug: String,
    pub is_verified: bool,
}

impl From<&user::Model> for SellerInfo {
    fn from(u: &user::Model) -> Self {
        SellerInfo {
            id: u.id.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            full_name: u.full_name(),
            profile_image: u.profile_image.clone(),
            phone_number: u.phone_number.clone(),
            whatsapp_number: u.whatsapp_number.clone(),
            whatsapp_click_count: u.whatsapp_click_count,
            whatsapp_daily_click_count: u.whatsapp_daily_click_count,
            profile_slug: u.slug.clone(),
            is_verified: u.is_verified,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceDetailView {
    pub service: ServiceType,
    pub label: &'static str,
    pub short_description: String,
    pub price: i64,
    pub is_available: bool,
}

impl From<&event_service_detail::Model> for ServiceDetailView {
    fn from(d: &event_service_detail::Model) -> Self {
        ServiceDetailView {
            service: d.service_type,
            label: d.service_type.label(),
            short_description: d.short_description.clone(),
            price: d.price,
            is_available: d.is_available,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryImageView {
    pub image: String,
    pub position: i32,
    pub is_primary: bool,
}

impl From<&event_gallery::Model> for GalleryImageView {
    fn from(g: &event_gallery::Model) -> Self {
        GalleryImageView { image: g.image.clone(), position: g.position, is_primary: g.is_primary }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    pub id: String,
    pub user_full_name: String,
    pub user_profile_image: Option<String>,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Full event representation for the detail endpoint and write responses.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    pub id: String,
    pub seller: String,
    pub seller_info: SellerInfo,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub logo: Option<String>,
    pub brand_name: String,
    pub is_active: bool,
    pub daily_booking_capacity: Option<i32>,
    pub total_views: i64,
    pub total_reviews: u64,
    pub average_rating: f64,
    pub daily_views: BTreeMap<String, i64>,
    pub daily_reviews: BTreeMap<String, u64>,
    pub daily_ratings: BTreeMap<String, f64>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub service_details: Vec<ServiceDetailView>,
    pub gallery_images: Vec<GalleryImageView>,
    pub reviews: Vec<ReviewSummary>,
}

/// Compact seller reference used in listings.
#[derive(Debug, Clone, Serialize)]
pub struct SellerSummary {
    pub id: String,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub profile_image: Option<String>,
}

impl From<&user::Model> for SellerSummary {
    fn from(u: &user::Model) -> Self {
        SellerSummary {
            id: u.id.clone(),
            slug: u.slug.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            full_name: u.full_name(),
            profile_image: u.profile_image.clone(),
        }
    }
}

/// One row of `GET /events`.
#[derive(Debug, Clone, Serialize)]
pub struct EventListing {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub brand_name: String,
    pub description: String,
    pub logo: Option<String>,
    pub seller_info: SellerSummary,
    pub service_types: Vec<ServiceType>,
    pub starting_price: Option<i64>,
    pub primary_image: Option<String>,
    pub total_views: i64,
    pub total_reviews: u64,
    pub average_rating: f64,
    pub created_at: DateTime<FixedOffset>,
}
