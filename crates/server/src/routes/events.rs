use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Query;
use serde::Deserialize;

use common::types::Message;
use service::dashboard::{self, EventDashboard, GlobalDashboard};
use service::events::{self, CreateEventInput, EventDetail, EventList, ListQuery, UpdateEventInput};

use super::auth::ServerState;
use crate::auth::CurrentUser;
use crate::errors::ApiError;

#[derive(Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub q: String,
}

/// `GET /events`: active events, filtered, ordered and paginated.
#[utoipa::path(get, path = "/events", tag = "events", params(crate::openapi::EventListParams), responses((status = 200, description = "Paginated event listings")))]
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<EventList>, ApiError> {
    Ok(Json(events::list_events(&state.db, &query).await?))
}

#[utoipa::path(get, path = "/events/suggestions", tag = "events", params(("q" = Option<String>, Query,)), responses((status = 200, description = "Search suggestions")))]
pub async fn suggestions(
    State(state): State<ServerState>,
    Query(query): Query<SuggestionQuery>,
) -> Result<Response, ApiError> {
    Ok(match events::suggestions(&state.db, &query.q).await? {
        Some(found) => Json(found).into_response(),
        None => Json(serde_json::Map::new()).into_response(),
    })
}

#[utoipa::path(get, path = "/events/dashboard", tag = "dashboard", responses((status = 200, description = "Marketplace totals")))]
pub async fn global_dashboard(State(state): State<ServerState>) -> Result<Json<GlobalDashboard>, ApiError> {
    Ok(Json(dashboard::global_dashboard(&state.db).await?))
}

#[utoipa::path(post, path = "/events/create", tag = "events", request_body = crate::openapi::CreateEventRequest, responses((status = 201, description = "Created"), (status = 403, description = "Not a seller"), (status = 409, description = "Conflict")))]
pub async fn create(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateEventInput>,
) -> Result<(StatusCode, Json<EventDetail>), ApiError> {
    let detail = events::create_event(&state.db, &user, input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Detail view; every call counts as a view.
#[utoipa::path(get, path = "/events/{slug}", tag = "events", params(("slug" = String, Path,)), responses((status = 200, description = "Event detail"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<EventDetail>, ApiError> {
    Ok(Json(events::get_event(&state.db, &slug).await?))
}

#[utoipa::path(patch, path = "/events/{slug}/update", tag = "events", params(("slug" = String, Path,)), request_body = crate::openapi::UpdateEventRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Bad Request"), (status = 403, description = "Not the owner")))]
pub async fn update(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(patch): Json<UpdateEventInput>,
) -> Result<Json<EventDetail>, ApiError> {
    Ok(Json(events::update_event(&state.db, &user, &slug, patch).await?))
}

#[utoipa::path(delete, path = "/events/{slug}/delete", tag = "events", params(("slug" = String, Path,)), responses((status = 200, description = "Deleted"), (status = 403, description = "Forbidden")))]
pub async fn delete(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<Message>, ApiError> {
    events::delete_event(&state.db, &user, &slug).await?;
    Ok(Json(Message::new("Event deleted successfully.")))
}

#[utoipa::path(get, path = "/events/{slug}/dashboard", tag = "dashboard", params(("slug" = String, Path,)), responses((status = 200, description = "Event stats"), (status = 404, description = "Not Found")))]
pub async fn event_dashboard(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<EventDashboard>, ApiError> {
    Ok(Json(dashboard::event_dashboard(&state.db, &slug).await?))
}
