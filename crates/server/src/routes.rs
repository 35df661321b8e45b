pub mod auth;
pub mod events;
pub mod orders;
pub mod reports;
pub mod reviews;
pub mod users;

use axum::{
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::events::{list_service_types, service::ServiceTypeView};

use crate::openapi::ApiDoc;
use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> impl IntoResponse {
    common::metrics::encode_metrics()
}

#[utoipa::path(get, path = "/services", tag = "events", responses((status = 200, description = "Bookable service types", body = [crate::openapi::ServiceTypeDoc])))]
pub async fn service_types() -> Json<Vec<ServiceTypeView>> {
    Json(list_service_types())
}

fn user_routes() -> Router<ServerState> {
    Router::new()
        .route("/users/register", post(auth::register))
        .route("/users/login", post(auth::login))
        .route("/users/token/refresh", post(auth::refresh))
        .route("/users/logout", post(auth::logout))
        .route("/users/verify-otp", post(auth::verify_otp))
        .route("/users/resend-otp", post(auth::resend_otp))
        .route("/users/forgot-password", post(auth::forgot_password))
        .route("/users/reset-password", post(auth::reset_password))
        .route("/users/me", get(auth::me))
        .route("/users/profile/:slug", get(users::get_profile).post(users::whatsapp_click))
        .route("/users/profile/:slug/edit", patch(users::update_profile).put(users::update_profile))
        .route("/users/profile/:slug/dashboard", get(users::seller_dashboard))
        .route("/users/:slug/orders", get(orders::list_buyer))
        .route("/users/:slug/orders/seller", get(orders::list_seller))
        .route("/users/:slug/orders/create", post(orders::create))
        .route("/users/:slug/orders/:id/update", patch(orders::buyer_update))
        .route("/users/:slug/orders/:id/delete", delete(orders::delete))
        .route("/users/:slug/orders/:id/accept", patch(orders::accept))
        .route("/users/:slug/orders/:id/seller-update", patch(orders::seller_update))
}

fn event_routes() -> Router<ServerState> {
    Router::new()
        .route("/events", get(events::list))
        .route("/events/suggestions", get(events::suggestions))
        .route("/events/dashboard", get(events::global_dashboard))
        .route("/events/create", post(events::create))
        .route("/events/reports", get(reports::admin_list))
        .route("/events/reports/:id", get(reports::get))
        .route("/events/reports/:id/admin", patch(reports::admin_update))
        .route("/events/:slug", get(events::get))
        .route("/events/:slug/update", patch(events::update))
        .route("/events/:slug/delete", delete(events::delete))
        .route("/events/:slug/dashboard", get(events::event_dashboard))
        .route("/events/:slug/reviews", get(reviews::list))
        .route("/events/:slug/reviews/create", post(reviews::create))
        .route("/events/:slug/reviews/:id/edit", patch(reviews::update).put(reviews::update))
        .route("/events/:slug/reviews/:id/delete", delete(reviews::delete))
        .route("/events/:slug/reports", get(reports::list_for_event).post(reports::create))
        .route("/events/:slug/reports/all", get(reports::list_for_user))
}

/// Build the full application router: public endpoints, API docs and the marketplace API.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/services", get(service_types));

    let docs = SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi());

    public
        .merge(user_routes())
        .merge(event_routes())
        .merge(docs)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
