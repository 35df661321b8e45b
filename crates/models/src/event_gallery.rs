use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::errors::ModelError;
use crate::event;

pub const MAX_GALLERY_IMAGES: u64 = 10;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_gallery")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: String,
    pub image: String,
    pub is_primary: bool,
    pub position: i32,
    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Event }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Event => Entity::belongs_to(event::Entity)
                .from(Column::EventId)
                .to(event::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Accept only absolute http(s) URLs with a host. Stored as given, so
/// whitespace is rejected rather than percent-encoded.
pub fn validate_image_url(raw: &str) -> Result<(), ModelError> {
    let u = raw.trim();
    let invalid = || ModelError::Validation(format!("image must be an http(s) URL: {u}"));
    if u.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let parsed = Url::parse(u).map_err(|_| invalid())?;
    let has_host = parsed.host_str().is_some_and(|h| !h.is_empty());
    match parsed.scheme() {
        "http" | "https" if has_host => Ok(()),
        _ => Err(invalid()),
    }
}

/// Gallery ordering: position, primary first on ties, then upload time.
pub fn sort_images(images: &mut [Model]) {
    images.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then(b.is_primary.cmp(&a.is_primary))
            .then(a.uploaded_at.cmp(&b.uploaded_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_must_be_http() {
        assert!(validate_image_url("https://cdn.example.com/a.jpg").is_ok());
        assert!(validate_image_url("http://x.io/b.png").is_ok());
        assert!(validate_image_url("ftp://x.io/b.png").is_err());
        assert!(validate_image_url("https://").is_err());
        assert!(validate_image_url("https://x.io/a b.png").is_err());
        assert!(validate_image_url("https://:::").is_err());
        assert!(validate_image_url("https://exa mple.com").is_err());
        assert!(validate_image_url("mailto:someone@x.io").is_err());
        assert!(validate_image_url("https://cdn.example.com:8443/i/1.webp?w=400").is_ok());
    }
}
