use axum::{
    extract::{Path, State},
    Json,
};

use service::dashboard::EventDashboard;
use service::profile::{self, ProfileUpdated, UpdateProfileInput, UserView, WhatsappClicks};

use super::auth::ServerState;
use crate::auth::CurrentUser;
use crate::errors::ApiError;

#[utoipa::path(get, path = "/users/profile/{slug}", tag = "users", params(("slug" = String, Path,)), responses((status = 200, description = "Profile"), (status = 404, description = "Not Found")))]
pub async fn get_profile(
    State(state): State<ServerState>,
    CurrentUser(_user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(profile::get_profile(&state.db, &slug).await?))
}

/// Counts a click on the seller's WhatsApp button.
#[utoipa::path(post, path = "/users/profile/{slug}", tag = "users", params(("slug" = String, Path,)), responses((status = 200, description = "Click counted"), (status = 404, description = "Not Found")))]
pub async fn whatsapp_click(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<WhatsappClicks>, ApiError> {
    Ok(Json(profile::bump_whatsapp_click(&state.db, &slug).await?))
}

#[utoipa::path(patch, path = "/users/profile/{slug}/edit", tag = "users", params(("slug" = String, Path,)), request_body = crate::openapi::UpdateProfileRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Bad Request"), (status = 404, description = "Not Found")))]
pub async fn update_profile(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(input): Json<UpdateProfileInput>,
) -> Result<Json<ProfileUpdated>, ApiError> {
    Ok(Json(profile::update_profile(&state.db, &user, &slug, input).await?))
}

#[utoipa::path(get, path = "/users/profile/{slug}/dashboard", tag = "users", params(("slug" = String, Path,)), responses((status = 200, description = "Per-event stats of the seller"), (status = 403, description = "Not a seller")))]
pub async fn seller_dashboard(
    State(state): State<ServerState>,
    CurrentUser(_user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<Vec<EventDashboard>>, ApiError> {
    Ok(Json(profile::seller_dashboard(&state.db, &slug).await?))
}
