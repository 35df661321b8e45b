use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use common::types::Message;
use service::reviews::{self, ReviewFilter, ReviewInput, ReviewPatch, ReviewView};

use super::auth::ServerState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::errors::ApiError;

#[utoipa::path(get, path = "/events/{slug}/reviews", tag = "reviews", params(("slug" = String, Path,), ("min_rating" = Option<String>, Query,), ("max_rating" = Option<String>, Query,)), responses((status = 200, description = "Reviews, newest first"), (status = 404, description = "Not Found")))]
pub async fn list(
    State(state): State<ServerState>,
    MaybeUser(viewer): MaybeUser,
    Path(slug): Path<String>,
    Query(filter): Query<ReviewFilter>,
) -> Result<Json<Vec<ReviewView>>, ApiError> {
    Ok(Json(reviews::list_reviews(&state.db, &slug, &filter, viewer.as_ref()).await?))
}

#[utoipa::path(post, path = "/events/{slug}/reviews/create", tag = "reviews", params(("slug" = String, Path,)), request_body = crate::openapi::ReviewRequest, responses((status = 201, description = "Created"), (status = 403, description = "Forbidden"), (status = 409, description = "Already reviewed")))]
pub async fn create(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(input): Json<ReviewInput>,
) -> Result<(StatusCode, Json<ReviewView>), ApiError> {
    let review = reviews::create_review(&state.db, &state.config.reviews, &user, &slug, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[utoipa::path(patch, path = "/events/{slug}/reviews/{id}/edit", tag = "reviews", params(("slug" = String, Path,), ("id" = String, Path,)), request_body = crate::openapi::ReviewPatchRequest, responses((status = 200, description = "Updated"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path((slug, id)): Path<(String, String)>,
    Json(patch): Json<ReviewPatch>,
) -> Result<Json<ReviewView>, ApiError> {
    Ok(Json(reviews::update_review(&state.db, &user, &slug, &id, patch).await?))
}

#[utoipa::path(delete, path = "/events/{slug}/reviews/{id}/delete", tag = "reviews", params(("slug" = String, Path,), ("id" = String, Path,)), responses((status = 200, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<Message>, ApiError> {
    reviews::delete_review(&state.db, &user, &slug, &id).await?;
    Ok(Json(Message::new("Review deleted successfully.")))
}
