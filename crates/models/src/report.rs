use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{event, user};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "under_review")]
    UnderReview,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "needs_more_info")]
    NeedsMoreInfo,
}

impl ReportStatus {
    pub fn parse(s: &str) -> Option<ReportStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(ReportStatus::Pending),
            "under_review" => Some(ReportStatus::UnderReview),
            "resolved" => Some(ReportStatus::Resolved),
            "rejected" => Some(ReportStatus::Rejected),
            "needs_more_info" => Some(ReportStatus::NeedsMoreInfo),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub reporter_id: String,
    pub event_id: String,
    pub seller_id: String,
    pub brand_name: String,
    pub seller_full_name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub user_full_name: String,
    pub phone_number: String,
    pub status: ReportStatus,
    pub status_changed_at: Option<DateTimeWithTimeZone>,
    pub status_changed_by: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Reporter,
    Event,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Reporter => Entity::belongs_to(user::Entity)
                .from(Column::ReporterId)
                .to(user::Column::Id)
                .into(),
            Relation::Event => Entity::belongs_to(event::Entity)
                .from(Column::EventId)
                .to(event::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_roundtrips_known_values() {
        assert_eq!(ReportStatus::parse("under_review"), Some(ReportStatus::UnderReview));
        assert_eq!(ReportStatus::parse("NEEDS_MORE_INFO"), Some(ReportStatus::NeedsMoreInfo));
        assert_eq!(ReportStatus::parse("closed"), None);
    }
}
