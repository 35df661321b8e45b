//! In-memory filtering, ordering and search suggestions for event listings.

use std::cmp::Ordering;

use models::service_type::ServiceType;
use serde::{Deserialize, Serialize};

use super::views::EventListing;

/// Query string of `GET /events`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub service_type: Vec<String>,
    pub search: Option<String>,
    pub brand_name: Option<String>,
    pub seller_name: Option<String>,
    pub title: Option<String>,
    pub min_rating: Option<String>,
    pub order_by: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    AverageRating,
    TotalViews,
    BrandName,
}

/// `order_by` value, `-` prefix for descending. Unknown values fall back to
/// newest first.
pub fn parse_order(raw: Option<&str>) -> (SortKey, bool) {
    let raw = raw.map(str::trim).unwrap_or("-created_at");
    let (desc, field) = match raw.strip_prefix('-') {
        Some(f) => (true, f),
        None => (false, raw),
    };
    let key = match field {
        "created_at" => SortKey::CreatedAt,
        "average_rating" => SortKey::AverageRating,
        "total_views" => SortKey::TotalViews,
        "brand_name" => SortKey::BrandName,
        _ => return (SortKey::CreatedAt, true),
    };
    (key, desc)
}

/// Normalized filter derived from a [`ListQuery`].
#[derive(Debug, Clone)]
pub struct ListFilter {
    /// `None` means no service filter; an empty list matches nothing.
    pub service_types: Option<Vec<ServiceType>>,
    pub search: Option<String>,
    pub brand_name: Option<String>,
    pub seller_name: Option<String>,
    pub title: Option<String>,
    pub min_rating: Option<f64>,
    pub order: (SortKey, bool),
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase)
}

impl From<&ListQuery> for ListFilter {
    fn from(q: &ListQuery) -> Self {
        let requested: Vec<&String> = q.service_type.iter().filter(|s| !s.trim().is_empty()).collect();
        let service_types = if requested.is_empty() {
            None
        } else {
            Some(requested.into_iter().filter_map(|s| ServiceType::parse(s)).collect())
        };
        ListFilter {
            service_types,
            search: non_blank(&q.search),
            brand_name: non_blank(&q.brand_name),
            seller_name: non_blank(&q.seller_name),
            title: non_blank(&q.title),
            min_rating: q.min_rating.as_deref().and_then(|r| r.trim().parse::<f64>().ok()),
            order: parse_order(q.order_by.as_deref()),
        }
    }
}

fn contains(hay: &str, needle: &str) -> bool {
    hay.to_lowercase().contains(needle)
}

impl ListFilter {
    pub fn matches(&self, e: &EventListing) -> bool {
        if let Some(types) = &self.service_types {
            if !types.iter().any(|t| e.service_types.contains(t)) {
                return false;
            }
        }
        if let Some(q) = &self.search {
            let hit = contains(&e.title, q)
                || contains(&e.brand_name, q)
                || contains(&e.seller_info.first_name, q)
                || contains(&e.seller_info.last_name, q);
            if !hit {
                return false;
            }
        }
        if let Some(b) = &self.brand_name {
            if !contains(&e.brand_name, b) {
                return false;
            }
        }
        if let Some(name) = &self.seller_name {
            let parts: Vec<&str> = name.split_whitespace().collect();
            let (first, last) = if parts.len() >= 2 {
                (parts[0], parts[parts.len() - 1])
            } else {
                (name.as_str(), name.as_str())
            };
            if !(contains(&e.seller_info.first_name, first) || contains(&e.seller_info.last_name, last)) {
                return false;
            }
        }
        if let Some(t) = &self.title {
            if !contains(&e.title, t) {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if e.average_rating < min {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, items: Vec<EventListing>) -> Vec<EventListing> {
        let mut out: Vec<EventListing> = items.into_iter().filter(|e| self.matches(e)).collect();
        let (key, desc) = self.order;
        out.sort_by(|a, b| {
            let ord = match key {
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                SortKey::AverageRating => a.average_rating.partial_cmp(&b.average_rating).unwrap_or(Ordering::Equal),
                SortKey::TotalViews => a.total_views.cmp(&b.total_views),
                SortKey::BrandName => a.brand_name.to_lowercase().cmp(&b.brand_name.to_lowercase()),
            };
            let ord = if desc { ord.reverse() } else { ord };
            ord.then_with(|| a.id.cmp(&b.id))
        });
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Suggestions {
    pub brand_names: Vec<String>,
    pub seller_names: Vec<String>,
    pub service_types: Vec<String>,
    pub popular_searches: Vec<String>,
}

const SUGGESTION_LIMIT: usize = 5;

/// Canned searches keyed by the query's first letter.
pub fn popular_searches(query: &str) -> Vec<String> {
    let terms: &[&str] = match query.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('w') => &["wedding", "wedding photography", "wedding catering"],
        Some('p') => &["photography", "portrait photography", "product photography"],
        Some('c') => &["catering", "corporate events", "chef booking"],
        Some('v') => &["videography", "video production", "video editing"],
        Some('d') => &["dj services", "sound system", "lighting"],
        Some('h') => &["hall booking", "hotel venues", "hall decoration"],
        _ => &[],
    };
    terms.iter().take(3).map(|s| s.to_string()).collect()
}

/// Build suggestions from candidate brand and seller names.
/// `None` for a blank query.
pub fn build_suggestions(query: &str, brands: &[String], sellers: &[String]) -> Option<Suggestions> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return None;
    }
    let mut brand_names: Vec<String> = Vec::new();
    for b in brands.iter().filter(|b| b.to_lowercase().contains(&q)) {
        if !brand_names.contains(b) {
            brand_names.push(b.clone());
        }
        if brand_names.len() == SUGGESTION_LIMIT {
            break;
        }
    }
    let mut seller_names: Vec<String> = Vec::new();
    for s in sellers.iter().filter(|s| s.to_lowercase().contains(&q)) {
        if !seller_names.contains(s) {
            seller_names.push(s.clone());
        }
        if seller_names.len() == SUGGESTION_LIMIT {
            break;
        }
    }
    Some(Suggestions {
        brand_names,
        seller_names,
        service_types: ServiceType::matching(&q)
            .into_iter()
            .take(SUGGESTION_LIMIT)
            .map(|t| t.label().to_string())
            .collect(),
        popular_searches: popular_searches(&q),
    })
}
