use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use common::types::Message;
use service::orders::{self, BuyerUpdateInput, CreateOrderInput, OrderRemoval, OrderView, SellerUpdateInput};

use super::auth::ServerState;
use crate::auth::CurrentUser;
use crate::errors::ApiError;

#[utoipa::path(post, path = "/users/{slug}/orders/create", tag = "orders", params(("slug" = String, Path,)), request_body = crate::openapi::CreateOrderRequest, responses((status = 201, description = "Order placed"), (status = 400, description = "Bad Request"), (status = 409, description = "Fully booked")))]
pub async fn create(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(input): Json<CreateOrderInput>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let order = orders::create_order(&state.db, &user, &slug, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(patch, path = "/users/{slug}/orders/{id}/update", tag = "orders", params(("slug" = String, Path,), ("id" = String, Path,)), request_body = crate::openapi::BuyerUpdateRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Bad status"), (status = 403, description = "Forbidden")))]
pub async fn buyer_update(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path((slug, id)): Path<(String, String)>,
    Json(input): Json<BuyerUpdateInput>,
) -> Result<Json<OrderView>, ApiError> {
    Ok(Json(orders::buyer_update(&state.db, &user, &slug, &id, input).await?))
}

#[utoipa::path(delete, path = "/users/{slug}/orders/{id}/delete", tag = "orders", params(("slug" = String, Path,), ("id" = String, Path,)), responses((status = 200, description = "Cancelled or deleted"), (status = 403, description = "Forbidden")))]
pub async fn delete(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<Message>, ApiError> {
    let msg = match orders::delete_order(&state.db, &user, &slug, &id).await? {
        OrderRemoval::Cancelled => "Order cancelled successfully.",
        OrderRemoval::Deleted => "Order deleted successfully.",
    };
    Ok(Json(Message::new(msg)))
}

#[utoipa::path(get, path = "/users/{slug}/orders", tag = "orders", params(("slug" = String, Path,)), responses((status = 200, description = "Orders placed by the user"), (status = 403, description = "Forbidden")))]
pub async fn list_buyer(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(orders::list_buyer_orders(&state.db, &user, &slug).await?))
}

#[utoipa::path(get, path = "/users/{slug}/orders/seller", tag = "orders", params(("slug" = String, Path,)), responses((status = 200, description = "Orders received by the seller"), (status = 403, description = "Forbidden")))]
pub async fn list_seller(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(orders::list_seller_orders(&state.db, &user, &slug).await?))
}

#[utoipa::path(patch, path = "/users/{slug}/orders/{id}/accept", tag = "orders", params(("slug" = String, Path,), ("id" = String, Path,)), responses((status = 200, description = "Accepted"), (status = 400, description = "Not pending"), (status = 403, description = "Forbidden")))]
pub async fn accept(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<OrderView>, ApiError> {
    Ok(Json(orders::accept_order(&state.db, &user, &slug, &id).await?))
}

#[utoipa::path(patch, path = "/users/{slug}/orders/{id}/seller-update", tag = "orders", params(("slug" = String, Path,), ("id" = String, Path,)), request_body = crate::openapi::SellerUpdateRequest, responses((status = 200, description = "Payment recomputed"), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden")))]
pub async fn seller_update(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path((slug, id)): Path<(String, String)>,
    Json(input): Json<SellerUpdateInput>,
) -> Result<Json<OrderView>, ApiError> {
    Ok(Json(orders::seller_update(&state.db, &user, &slug, &id, input).await?))
}
