//! Service orders: customers book an event's services for a date; the seller
//! accepts and settles payment.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, Utc};
use common::metrics::ORDERS_CREATED_TOTAL;
use models::ids::{self, ORDER_ID_LEN};
use models::service_order::{self, OrderStatus, SelectedService};
use models::service_type::ServiceType;
use models::user::Role;
use models::{event, event_service_detail, user};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::errors::{ServiceError, ServiceResult};
use crate::events::service::users_by_id;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub event_id: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub location: String,
    /// Service codes or labels.
    pub selected_services: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuyerUpdateInput {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SellerUpdateInput {
    pub discount_price: Option<i64>,
    pub advance_paid: Option<i64>,
    pub invoice_file: Option<String>,
    pub full_payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: String,
    pub seller: String,
    pub buyer: String,
    pub seller_slug: Option<String>,
    pub buyer_slug: Option<String>,
    pub event: String,
    pub event_title: Option<String>,
    pub event_brand_name: Option<String>,
    pub event_logo: Option<String>,
    pub seller_name: Option<String>,
    pub buyer_name: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub location: String,
    pub selected_services: Vec<SelectedService>,
    pub seller_agreed: bool,
    pub status: OrderStatus,
    pub total_amount: i64,
    pub discount_price: i64,
    pub net_total: i64,
    pub advance_paid: i64,
    pub remaining_amount: i64,
    pub is_fully_paid: bool,
    pub full_payment_date: Option<NaiveDate>,
    pub invoice_file: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl OrderView {
    fn build(o: service_order::Model, ev: Option<&event::Model>, seller: Option<&user::Model>, buyer: Option<&user::Model>) -> Self {
        let payment = o.payment();
        let selected = o.selected();
        OrderView {
            seller_slug: seller.map(|u| u.slug.clone()),
            buyer_slug: buyer.map(|u| u.slug.clone()),
            event_title: ev.map(|e| e.title.clone()),
            event_brand_name: ev.map(|e| e.brand_name.clone()),
            event_logo: ev.and_then(|e| e.logo.clone()),
            seller_name: seller.map(user::Model::full_name),
            net_total: payment.net_total(),
            remaining_amount: payment.remaining(),
            selected_services: selected,
            id: o.id,
            seller: o.seller_id,
            buyer: o.buyer_id,
            event: o.event_id,
            buyer_name: o.buyer_name,
            event_date: o.event_date,
            event_time: o.event_time,
            location: o.location,
            seller_agreed: o.seller_agreed,
            status: o.status,
            total_amount: o.total_amount,
            discount_price: o.discount_price,
            advance_paid: o.advance_paid,
            is_fully_paid: o.is_fully_paid,
            full_payment_date: o.full_payment_date,
            invoice_file: o.invoice_file,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

/// Attach event and party details to a batch of orders.
async fn views<C: ConnectionTrait>(db: &C, orders: Vec<service_order::Model>) -> ServiceResult<Vec<OrderView>> {
    let event_ids: Vec<String> = orders.iter().map(|o| o.event_id.clone()).collect();
    let events: HashMap<String, event::Model> = if event_ids.is_empty() {
        HashMap::new()
    } else {
        event::Entity::find()
            .filter(event::Column::Id.is_in(event_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect()
    };
    let users = users_by_id(
        db,
        orders.iter().flat_map(|o| [o.seller_id.clone(), o.buyer_id.clone()]).collect(),
    )
    .await?;
    Ok(orders
        .into_iter()
        .map(|o| {
            let ev = events.get(&o.event_id);
            let seller = users.get(&o.seller_id);
            let buyer = users.get(&o.buyer_id);
            OrderView::build(o, ev, seller, buyer)
        })
        .collect())
}

async fn view<C: ConnectionTrait>(db: &C, order: service_order::Model) -> ServiceResult<OrderView> {
    views(db, vec![order])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("order"))
}

/// User by slug with the given role, else 404.
async fn user_with_role(db: &DatabaseConnection, slug: &str, role: Role) -> ServiceResult<user::Model> {
    match user::find_by_slug(db, slug).await? {
        Some(u) if u.user_type == role => Ok(u),
        _ => Err(ServiceError::not_found("user")),
    }
}

/// Resolve requested service codes against the event's available details.
/// Unknown and unavailable services are skipped.
pub fn select_services(requested: &[String], available: &[event_service_detail::Model]) -> Vec<SelectedService> {
    let mut out: Vec<SelectedService> = Vec::new();
    for raw in requested {
        let Some(kind) = ServiceType::parse(raw) else { continue };
        if out.iter().any(|s| s.service_type == kind.code()) {
            continue;
        }
        if let Some(d) = available.iter().find(|d| d.service_type == kind && d.is_available) {
            out.push(SelectedService { service_type: kind.code().to_string(), name: kind.label().to_string(), price: d.price });
        }
    }
    out
}

/// Book services of an event on behalf of the calling customer.
#[instrument(skip(db, actor, input), fields(actor_id = %actor.id))]
pub async fn create_order(
    db: &DatabaseConnection,
    actor: &user::Model,
    buyer_slug: &str,
    input: CreateOrderInput,
) -> ServiceResult<OrderView> {
    let buyer = user_with_role(db, buyer_slug, Role::Customer).await?;
    if buyer.id != actor.id {
        return Err(ServiceError::forbidden("Only customer can create and order forms."));
    }
    let ev = event::Entity::find_by_id(input.event_id.clone())
        .filter(event::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("event"))?;
    if input.event_date < Utc::now().date_naive() {
        return Err(ServiceError::validation("event_date cannot be in the past."));
    }
    if input.location.trim().is_empty() {
        return Err(ServiceError::validation("location is required"));
    }

    let details = event_service_detail::Entity::find()
        .filter(event_service_detail::Column::EventId.eq(ev.id.as_str()))
        .filter(event_service_detail::Column::IsAvailable.eq(true))
        .all(db)
        .await?;
    let selected = select_services(&input.selected_services, &details);
    if selected.is_empty() {
        return Err(ServiceError::validation("None of the selected services are available for this event."));
    }

    // Row lock on the event serializes bookings for it until commit.
    let txn = db.begin().await?;
    let ev = event::Entity::find_by_id(ev.id.clone())
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("event"))?;
    if let Some(cap) = ev.daily_booking_capacity {
        let booked = service_order::Entity::find()
            .filter(service_order::Column::EventId.eq(ev.id.as_str()))
            .filter(service_order::Column::EventDate.eq(input.event_date))
            .filter(service_order::Column::Status.ne(OrderStatus::Cancelled))
            .count(&txn)
            .await?;
        if booked >= cap as u64 {
            return Err(ServiceError::conflict("This event is fully booked for the selected date."));
        }
    }

    let total: i64 = selected.iter().map(|s| s.price).sum();
    let now = Utc::now().into();
    let order = service_order::ActiveModel {
        id: Set(ids::unique_id::<service_order::Entity, _>(&txn, ORDER_ID_LEN).await?),
        seller_id: Set(ev.seller_id.clone()),
        buyer_id: Set(buyer.id.clone()),
        event_id: Set(ev.id.clone()),
        buyer_name: Set(buyer.full_name()),
        event_date: Set(input.event_date),
        event_time: Set(input.event_time),
        location: Set(input.location.trim().to_string()),
        selected_services: Set(serde_json::to_value(&selected).map_err(|e| ServiceError::Db(e.to_string()))?),
        seller_agreed: Set(false),
        status: Set(OrderStatus::Pending),
        total_amount: Set(total),
        discount_price: Set(0),
        advance_paid: Set(0),
        is_fully_paid: Set(false),
        full_payment_date: Set(None),
        invoice_file: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    ORDERS_CREATED_TOTAL.inc();
    info!(order_id = %order.id, event_id = %order.event_id, total, "order_created");
    view(db, order).await
}

async fn buyer_order(db: &DatabaseConnection, buyer_slug: &str, id: &str) -> ServiceResult<service_order::Model> {
    let buyer = user_with_role(db, buyer_slug, Role::Customer).await?;
    service_order::Entity::find_by_id(id.to_string())
        .filter(service_order::Column::BuyerId.eq(buyer.id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("order"))
}

async fn seller_order(db: &DatabaseConnection, seller_slug: &str, id: &str) -> ServiceResult<service_order::Model> {
    let seller = user_with_role(db, seller_slug, Role::Seller).await?;
    service_order::Entity::find_by_id(id.to_string())
        .filter(service_order::Column::SellerId.eq(seller.id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("order"))
}

/// Buyer cancels or completes an open order.
#[instrument(skip(db, actor, input), fields(actor_id = %actor.id))]
pub async fn buyer_update(
    db: &DatabaseConnection,
    actor: &user::Model,
    buyer_slug: &str,
    id: &str,
    input: BuyerUpdateInput,
) -> ServiceResult<OrderView> {
    let order = buyer_order(db, buyer_slug, id).await?;
    if order.buyer_id != actor.id {
        return Err(ServiceError::forbidden("Only buyer can update this order."));
    }
    if !order.status.is_open() {
        return Err(ServiceError::forbidden("Order cannot be updated after completion or cancellation."));
    }
    let status = match OrderStatus::parse(&input.status) {
        Some(s @ (OrderStatus::Cancelled | OrderStatus::Completed)) => s,
        _ => return Err(ServiceError::validation("Buyer can only set status to 'cancelled' or 'completed'.")),
    };
    let payment = order.payment();
    let mut am: service_order::ActiveModel = order.into();
    am.status = Set(status);
    if status == OrderStatus::Completed {
        let settled = payment.settle_on_completion(Utc::now().date_naive());
        am.is_fully_paid = Set(settled.is_fully_paid);
        am.full_payment_date = Set(settled.full_payment_date);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(order_id = %updated.id, status = ?updated.status, "order_status_changed");
    view(db, updated).await
}

/// Outcome of a delete request on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRemoval {
    Cancelled,
    Deleted,
}

/// The buyer cancels a pending order; the seller removes it outright.
#[instrument(skip(db, actor), fields(actor_id = %actor.id))]
pub async fn delete_order(
    db: &DatabaseConnection,
    actor: &user::Model,
    buyer_slug: &str,
    id: &str,
) -> ServiceResult<OrderRemoval> {
    let order = buyer_order(db, buyer_slug, id).await?;
    if order.buyer_id != actor.id && order.seller_id != actor.id {
        return Err(ServiceError::forbidden("Not allowed to access this order."));
    }
    if order.buyer_id == actor.id && order.status == OrderStatus::Pending {
        let mut am: service_order::ActiveModel = order.into();
        am.status = Set(OrderStatus::Cancelled);
        am.updated_at = Set(Utc::now().into());
        am.update(db).await?;
        return Ok(OrderRemoval::Cancelled);
    }
    if order.seller_id == actor.id {
        let order_id = order.id.clone();
        order.delete(db).await?;
        info!(order_id = %order_id, "order_deleted");
        return Ok(OrderRemoval::Deleted);
    }
    Err(ServiceError::forbidden("You cannot delete this order."))
}

fn ensure_self_or_admin(actor: &user::Model, target: &user::Model) -> ServiceResult<()> {
    if actor.id == target.id || actor.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::forbidden("You can only view your own orders."))
    }
}

/// Orders placed by a customer, newest first.
pub async fn list_buyer_orders(db: &DatabaseConnection, actor: &user::Model, slug: &str) -> ServiceResult<Vec<OrderView>> {
    let buyer = user_with_role(db, slug, Role::Customer).await?;
    ensure_self_or_admin(actor, &buyer)?;
    let orders = service_order::Entity::find()
        .filter(service_order::Column::BuyerId.eq(buyer.id))
        .order_by_desc(service_order::Column::CreatedAt)
        .all(db)
        .await?;
    views(db, orders).await
}

/// Orders received by a seller, newest first.
pub async fn list_seller_orders(db: &DatabaseConnection, actor: &user::Model, slug: &str) -> ServiceResult<Vec<OrderView>> {
    let seller = user_with_role(db, slug, Role::Seller).await?;
    ensure_self_or_admin(actor, &seller)?;
    let orders = service_order::Entity::find()
        .filter(service_order::Column::SellerId.eq(seller.id))
        .order_by_desc(service_order::Column::CreatedAt)
        .all(db)
        .await?;
    views(db, orders).await
}

/// Seller accepts a pending order.
#[instrument(skip(db, actor), fields(actor_id = %actor.id))]
pub async fn accept_order(db: &DatabaseConnection, actor: &user::Model, seller_slug: &str, id: &str) -> ServiceResult<OrderView> {
    let order = seller_order(db, seller_slug, id).await?;
    if order.seller_id != actor.id {
        return Err(ServiceError::forbidden("Only the seller can accept this order"));
    }
    if order.status != OrderStatus::Pending {
        return Err(ServiceError::validation("Only pending orders can be accepted."));
    }
    let mut am: service_order::ActiveModel = order.into();
    am.seller_agreed = Set(true);
    am.status = Set(OrderStatus::Accepted);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(order_id = %updated.id, "order_accepted");
    view(db, updated).await
}

/// Seller edits discount, advance, invoice and payment date.
#[instrument(skip(db, actor, input), fields(actor_id = %actor.id))]
pub async fn seller_update(
    db: &DatabaseConnection,
    actor: &user::Model,
    seller_slug: &str,
    id: &str,
    input: SellerUpdateInput,
) -> ServiceResult<OrderView> {
    let order = seller_order(db, seller_slug, id).await?;
    if order.seller_id != actor.id {
        return Err(ServiceError::forbidden("Only seller can update this order."));
    }
    if order.status == OrderStatus::Cancelled {
        return Err(ServiceError::forbidden("Cannot update a cancelled order."));
    }
    if input.discount_price.is_some_and(|d| d < 0) || input.advance_paid.is_some_and(|a| a < 0) {
        return Err(ServiceError::validation("Amounts must be >= 0."));
    }
    let mut payment = order.payment();
    if let Some(d) = input.discount_price {
        payment.discount = d;
    }
    if let Some(a) = input.advance_paid {
        payment.advance = a;
    }
    if payment.discount > payment.total {
        return Err(ServiceError::validation("Discount cannot exceed total order amount."));
    }
    if input.full_payment_date.is_some() {
        payment.full_payment_date = input.full_payment_date;
    }
    let payment = payment.recompute(Utc::now().date_naive());

    let mut am: service_order::ActiveModel = order.into();
    if let Some(f) = input.invoice_file {
        am.invoice_file = Set(Some(f));
    }
    am.discount_price = Set(payment.discount);
    am.advance_paid = Set(payment.advance);
    am.is_fully_paid = Set(payment.is_fully_paid);
    am.full_payment_date = Set(payment.full_payment_date);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    view(db, updated).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::payload::{CreateEventInput, ServiceDetailInput};
    use crate::events::service::{create_event, delete_event};
    use crate::test_support::{get_db, make_user};
    use chrono::Duration;
    use uuid::Uuid;

    fn detail(kind: ServiceType, price: i64, available: bool) -> event_service_detail::Model {
        event_service_detail::Model {
            id: Uuid::new_v4(),
            event_id: "E1".into(),
            service_type: kind,
            short_description: String::new(),
            price,
            is_available: available,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn select_services_skips_unknown_unavailable_and_repeats() {
        let available = [
            detail(ServiceType::Photography, 30_000, true),
            detail(ServiceType::Catering, 90_000, false),
            detail(ServiceType::Lighting, 5_000, true),
        ];
        let picked = select_services(
            &["photography".into(), "catering".into(), "fireworks".into(), "Lighting".into(), "photography".into()],
            &available,
        );
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].name, "Photography");
        assert_eq!(picked[1].price, 5_000);
    }

    fn event_input(tag: &str, capacity: Option<i32>) -> CreateEventInput {
        CreateEventInput {
            title: format!("Orders {tag}"),
            brand_name: format!("Orders Brand {tag}"),
            description: String::new(),
            logo: None,
            is_active: None,
            daily_booking_capacity: capacity,
            service_details: vec![
                ServiceDetailInput { service: "photography".into(), short_description: None, price: Some(40_000), is_available: None },
                ServiceDetailInput { service: "lighting".into(), short_description: None, price: Some(10_000), is_available: None },
            ],
            gallery_images: Vec::new(),
        }
    }

    fn order_input(event_id: &str, date: NaiveDate) -> CreateOrderInput {
        CreateOrderInput {
            event_id: event_id.into(),
            event_date: date,
            event_time: NaiveTime::from_hms_opt(18, 0, 0).expect("time"),
            location: "Town hall".into(),
            selected_services: vec!["photography".into(), "lighting".into()],
        }
    }

    #[tokio::test]
    async fn booking_and_payment_flow() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let seller = make_user(&db, Role::Seller).await?;
        let buyer = make_user(&db, Role::Customer).await?;
        let ev = create_event(&db, &seller, event_input(&ids::random_id(6), Some(1))).await?;
        let date = Utc::now().date_naive() + Duration::days(7);

        let past = create_order(&db, &buyer, &buyer.slug, order_input(&ev.id, date - Duration::days(30))).await;
        assert!(matches!(past, Err(ServiceError::Validation(_))));

        let order = create_order(&db, &buyer, &buyer.slug, order_input(&ev.id, date)).await?;
        assert_eq!(order.total_amount, 50_000);
        assert_eq!(order.status, OrderStatus::Pending);

        let full = create_order(&db, &buyer, &buyer.slug, order_input(&ev.id, date)).await;
        assert!(matches!(full, Err(ServiceError::Conflict(_))));

        let accepted = accept_order(&db, &seller, &seller.slug, &order.id).await?;
        assert!(accepted.seller_agreed);

        let too_much = SellerUpdateInput { discount_price: Some(60_000), ..Default::default() };
        assert!(matches!(
            seller_update(&db, &seller, &seller.slug, &order.id, too_much).await,
            Err(ServiceError::Validation(_))
        ));
        let paid = SellerUpdateInput { discount_price: Some(10_000), advance_paid: Some(40_000), ..Default::default() };
        let updated = seller_update(&db, &seller, &seller.slug, &order.id, paid).await?;
        assert!(updated.is_fully_paid);
        assert_eq!(updated.net_total, 40_000);
        assert_eq!(updated.remaining_amount, 0);
        assert!(updated.full_payment_date.is_some());

        let listed = list_seller_orders(&db, &seller, &seller.slug).await?;
        assert_eq!(listed.len(), 1);
        assert!(matches!(list_buyer_orders(&db, &seller, &buyer.slug).await, Err(ServiceError::Forbidden(_))));

        let done = buyer_update(&db, &buyer, &buyer.slug, &order.id, BuyerUpdateInput { status: "completed".into() }).await?;
        assert_eq!(done.status, OrderStatus::Completed);
        let again = buyer_update(&db, &buyer, &buyer.slug, &order.id, BuyerUpdateInput { status: "cancelled".into() }).await;
        assert!(matches!(again, Err(ServiceError::Forbidden(_))));

        assert_eq!(delete_order(&db, &seller, &buyer.slug, &order.id).await?, OrderRemoval::Deleted);
        delete_event(&db, &seller, &ev.slug).await?;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_respect_daily_capacity() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let seller = make_user(&db, Role::Seller).await?;
        let buyer = make_user(&db, Role::Customer).await?;
        let ev = create_event(&db, &seller, event_input(&ids::random_id(6), Some(1))).await?;
        let date = Utc::now().date_naive() + Duration::days(5);

        let barrier = std::sync::Arc::new(tokio::sync::Barrier::new(12));
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..12 {
            let (db, buyer, barrier, input) = (db.clone(), buyer.clone(), barrier.clone(), order_input(&ev.id, date));
            tasks.spawn(async move {
                barrier.wait().await;
                create_order(&db, &buyer, &buyer.slug, input).await
            });
        }
        let mut booked = 0;
        while let Some(res) = tasks.join_next().await {
            match res? {
                Ok(_) => booked += 1,
                Err(ServiceError::Conflict(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        assert_eq!(booked, 1);
        let stored = service_order::Entity::find()
            .filter(service_order::Column::EventId.eq(ev.id.as_str()))
            .filter(service_order::Column::EventDate.eq(date))
            .count(&db)
            .await?;
        assert_eq!(stored, 1);
        delete_event(&db, &seller, &ev.slug).await?;
        Ok(())
    }

    #[tokio::test]
    async fn buyer_cancels_pending_order_on_delete() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let seller = make_user(&db, Role::Seller).await?;
        let buyer = make_user(&db, Role::Customer).await?;
        let stranger = make_user(&db, Role::Customer).await?;
        let ev = create_event(&db, &seller, event_input(&ids::random_id(6), None)).await?;
        let date = Utc::now().date_naive() + Duration::days(3);
        let order = create_order(&db, &buyer, &buyer.slug, order_input(&ev.id, date)).await?;

        assert!(matches!(
            create_order(&db, &stranger, &buyer.slug, order_input(&ev.id, date)).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            delete_order(&db, &stranger, &buyer.slug, &order.id).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert_eq!(delete_order(&db, &buyer, &buyer.slug, &order.id).await?, OrderRemoval::Cancelled);
        let orders = list_buyer_orders(&db, &buyer, &buyer.slug).await?;
        assert_eq!(orders[0].status, OrderStatus::Cancelled);
        delete_event(&db, &seller, &ev.slug).await?;
        Ok(())
    }
}
