use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{event, user};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "accepted" => Some(OrderStatus::Accepted),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" | "canceled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Buyers may still cancel or complete the order.
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Accepted)
    }
}

/// Snapshot of a booked service, stored as JSON on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedService {
    pub service_type: String,
    pub name: String,
    pub price: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub seller_id: String,
    pub buyer_id: String,
    pub event_id: String,
    pub buyer_name: String,
    pub event_date: Date,
    pub event_time: Time,
    pub location: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub selected_services: Json,
    pub seller_agreed: bool,
    pub status: OrderStatus,
    pub total_amount: i64,
    pub discount_price: i64,
    pub advance_paid: i64,
    pub is_fully_paid: bool,
    pub full_payment_date: Option<Date>,
    pub invoice_file: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Seller,
    Buyer,
    Event,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Seller => Entity::belongs_to(user::Entity)
                .from(Column::SellerId)
                .to(user::Column::Id)
                .into(),
            Relation::Buyer => Entity::belongs_to(user::Entity)
                .from(Column::BuyerId)
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

impl Model {
    pub fn payment(&self) -> Payment {
        Payment {
            total: self.total_amount,
            discount: self.discount_price,
            advance: self.advance_paid,
            is_fully_paid: self.is_fully_paid,
            full_payment_date: self.full_payment_date,
        }
    }

    pub fn selected(&self) -> Vec<SelectedService> {
        serde_json::from_value(self.selected_services.clone()).unwrap_or_default()
    }
}

/// Money state of an order, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    pub total: i64,
    pub discount: i64,
    pub advance: i64,
    pub is_fully_paid: bool,
    pub full_payment_date: Option<NaiveDate>,
}

impl Payment {
    pub fn net_total(&self) -> i64 {
        self.total - self.discount
    }

    pub fn remaining(&self) -> i64 {
        (self.total - self.discount - self.advance).max(0)
    }

    /// Normalize amounts after a seller edit and derive the paid flag.
    ///
    /// Negative amounts clamp to zero and the discount never exceeds the
    /// total. The order is fully paid when the advance covers a positive net
    /// total, or when nothing is owed at all; the payment date is stamped
    /// the first time that happens.
    pub fn recompute(mut self, today: NaiveDate) -> Payment {
        self.total = self.total.max(0);
        self.discount = self.discount.max(0).min(self.total);
        self.advance = self.advance.max(0);
        let net = self.net_total();
        if (self.advance >= net && net > 0) || net == 0 {
            self.is_fully_paid = true;
            if self.full_payment_date.is_none() {
                self.full_payment_date = Some(today);
            }
        } else {
            self.is_fully_paid = false;
        }
        self
    }

    /// Buyer marked the order completed: settled when nothing remains owed.
    pub fn settle_on_completion(mut self, today: NaiveDate) -> Payment {
        let net = self.net_total();
        if net <= 0 || self.advance >= net {
            self.is_fully_paid = true;
            if self.full_payment_date.is_none() {
                self.full_payment_date = Some(today);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("date")
    }

    fn p(total: i64, discount: i64, advance: i64) -> Payment {
        Payment { total, discount, advance, is_fully_paid: false, full_payment_date: None }
    }

    #[test]
    fn advance_covering_net_marks_paid() {
        let r = p(10_000, 2_000, 8_000).recompute(today());
        assert!(r.is_fully_paid);
        assert_eq!(r.full_payment_date, Some(today()));
        assert_eq!(r.remaining(), 0);
        assert_eq!(r.net_total(), 8_000);
    }

    #[test]
    fn partial_advance_is_not_paid() {
        let r = p(10_000, 0, 4_000).recompute(today());
        assert!(!r.is_fully_paid);
        assert_eq!(r.full_payment_date, None);
        assert_eq!(r.remaining(), 6_000);
    }

    #[test]
    fn discount_capped_at_total_means_nothing_owed() {
        let r = p(5_000, 9_000, 0).recompute(today());
        assert_eq!(r.discount, 5_000);
        assert_eq!(r.net_total(), 0);
        assert!(r.is_fully_paid);
    }

    #[test]
    fn negatives_clamp_to_zero() {
        let r = p(1_000, -50, -10).recompute(today());
        assert_eq!((r.discount, r.advance), (0, 0));
        assert!(!r.is_fully_paid);
    }

    #[test]
    fn existing_payment_date_is_kept() {
        let earlier = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let mut start = p(100, 0, 100);
        start.full_payment_date = Some(earlier);
        assert_eq!(start.recompute(today()).full_payment_date, Some(earlier));
    }

    #[test]
    fn completion_settles_only_when_covered() {
        assert!(p(100, 0, 100).settle_on_completion(today()).is_fully_paid);
        assert!(p(100, 100, 0).settle_on_completion(today()).is_fully_paid);
        assert!(!p(100, 0, 20).settle_on_completion(today()).is_fully_paid);
    }

    #[test]
    fn status_parse_accepts_us_spelling() {
        assert_eq!(OrderStatus::parse("canceled"), Some(OrderStatus::Cancelled));
        assert!(OrderStatus::Accepted.is_open());
        assert!(!OrderStatus::Completed.is_open());
    }
}
