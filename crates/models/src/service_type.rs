use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog of bookable services an event may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    #[sea_orm(string_value = "photography")]
    Photography,
    #[sea_orm(string_value = "videography")]
    Videography,
    #[sea_orm(string_value = "hall_booking")]
    HallBooking,
    #[sea_orm(string_value = "sound_system")]
    SoundSystem,
    #[sea_orm(string_value = "lighting")]
    Lighting,
    #[sea_orm(string_value = "chef_booking")]
    ChefBooking,
    #[sea_orm(string_value = "catering")]
    Catering,
}

impl ServiceType {
    pub const ALL: [ServiceType; 7] = [
        ServiceType::Photography,
        ServiceType::Videography,
        ServiceType::HallBooking,
        ServiceType::SoundSystem,
        ServiceType::Lighting,
        ServiceType::ChefBooking,
        ServiceType::Catering,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ServiceType::Photography => "photography",
            ServiceType::Videography => "videography",
            ServiceType::HallBooking => "hall_booking",
            ServiceType::SoundSystem => "sound_system",
            ServiceType::Lighting => "lighting",
            ServiceType::ChefBooking => "chef_booking",
            ServiceType::Catering => "catering",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Photography => "Photography",
            ServiceType::Videography => "Videography",
            ServiceType::HallBooking => "Hall Booking",
            ServiceType::SoundSystem => "Sound System (DJ)",
            ServiceType::Lighting => "Lighting",
            ServiceType::ChefBooking => "Chef Booking",
            ServiceType::Catering => "Catering",
        }
    }

    /// Resolve a code (`hall_booking`), a label (`Hall Booking`) or a spaced
    /// code (`hall booking`), ignoring case.
    pub fn parse(input: &str) -> Option<ServiceType> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let as_code = needle.replace(' ', "_");
        Self::ALL.into_iter().find(|t| {
            t.code() == needle || t.code() == as_code || t.label().to_lowercase() == needle
        })
    }

    /// Types whose code or label contains `query` (case-insensitive).
    pub fn matching(query: &str) -> Vec<ServiceType> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        Self::ALL
            .into_iter()
            .filter(|t| t.code().contains(&q) || t.label().to_lowercase().contains(&q))
            .collect()
    }
}
