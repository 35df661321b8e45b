use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::report;

pub const MAX_REPORT_IMAGES: usize = 3;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_image")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub report_id: String,
    pub image: String,
    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Report }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Report => Entity::belongs_to(report::Entity)
                .from(Column::ReportId)
                .to(report::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
