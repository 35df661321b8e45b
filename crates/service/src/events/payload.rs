//! Write payloads for events and their nested service details and gallery.

use std::collections::HashSet;

use models::event_gallery::{self, MAX_GALLERY_IMAGES};
use models::event_service_detail;
use models::service_type::ServiceType;
use serde::Deserialize;

use crate::errors::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDetailInput {
    /// Service code or label, e.g. `hall_booking` or `Hall Booking`.
    pub service: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryImageInput {
    pub image: String,
    pub position: i32,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventInput {
    pub title: String,
    pub brand_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub daily_booking_capacity: Option<i32>,
    #[serde(default)]
    pub service_details: Vec<ServiceDetailInput>,
    #[serde(default)]
    pub gallery_images: Vec<GalleryImageInput>,
}

/// Partial update; absent fields are left untouched. A
/// `daily_booking_capacity` of zero or less removes the cap.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventInput {
    pub title: Option<String>,
    pub brand_name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub is_active: Option<bool>,
    pub daily_booking_capacity: Option<i32>,
    pub service_details: Option<Vec<ServiceDetailInput>>,
    pub gallery_images: Option<Vec<GalleryImageInput>>,
}

/// A service detail entry with its type resolved. `None` fields keep the
/// stored value on update and take defaults on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedService {
    pub service_type: ServiceType,
    pub short_description: Option<String>,
    pub price: Option<i64>,
    pub is_available: Option<bool>,
}

pub fn resolve_services(items: &[ServiceDetailInput]) -> ServiceResult<Vec<ResolvedService>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let service_type = ServiceType::parse(&item.service).ok_or_else(|| {
            ServiceError::validation(format!("Service with type '{}' does not exist.", item.service))
        })?;
        if !seen.insert(service_type) {
            return Err(ServiceError::validation(format!(
                "Service '{}' is listed more than once.",
                service_type.code()
            )));
        }
        event_service_detail::validate(
            item.short_description.as_deref().unwrap_or_default(),
            item.price.unwrap_or(0),
        )?;
        out.push(ResolvedService {
            service_type,
            short_description: item.short_description.clone(),
            price: item.price,
            is_available: item.is_available,
        });
    }
    Ok(out)
}

/// Payload-level gallery checks; the stored total is checked after upsert.
pub fn validate_gallery(items: &[GalleryImageInput]) -> ServiceResult<()> {
    if items.len() as u64 > MAX_GALLERY_IMAGES {
        return Err(ServiceError::validation(format!(
            "Maximum {MAX_GALLERY_IMAGES} images are allowed."
        )));
    }
    let mut positions = HashSet::new();
    for img in items {
        if img.position < 1 {
            return Err(ServiceError::validation("Gallery positions start at 1."));
        }
        if !positions.insert(img.position) {
            return Err(ServiceError::validation("Duplicate positions in payload are not allowed."));
        }
        event_gallery::validate_image_url(&img.image)?;
    }
    if items.iter().filter(|i| i.is_primary).count() > 1 {
        return Err(ServiceError::validation("Only one gallery image can be primary."));
    }
    Ok(())
}

pub fn validate_event_text(title: &str, brand_name: &str) -> ServiceResult<()> {
    if title.trim().is_empty() {
        return Err(ServiceError::validation("title is required"));
    }
    if brand_name.trim().is_empty() {
        return Err(ServiceError::validation("brand_name is required"));
    }
    if title.chars().count() > 255 || brand_name.chars().count() > 255 {
        return Err(ServiceError::validation("title and brand_name must be at most 255 characters"));
    }
    Ok(())
}
