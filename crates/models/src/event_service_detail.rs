use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::event;
use crate::service_type::ServiceType;

pub const MAX_SHORT_DESCRIPTION: usize = 500;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_service_detail")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: String,
    pub service_type: ServiceType,
    pub short_description: String,
    /// Minor currency units.
    pub price: i64,
    pub is_available: bool,
    pub created_at: DateTimeWithTimeZone,
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

pub fn validate(short_description: &str, price: i64) -> Result<(), ModelError> {
    if short_description.chars().count() > MAX_SHORT_DESCRIPTION {
        return Err(ModelError::Validation(format!(
            "short_description must be at most {MAX_SHORT_DESCRIPTION} characters"
        )));
    }
    if price < 0 {
        return Err(ModelError::Validation("price must be >= 0".into()));
    }
    Ok(())
}
