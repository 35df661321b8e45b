use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use service::pagination::Page;
use service::reports::{self, AdminReportQuery, AdminUpdateInput, CreateReportInput, ReportView};

use super::auth::ServerState;
use crate::auth::{CurrentUser, RequireAdmin};
use crate::errors::ApiError;

#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[utoipa::path(get, path = "/events/{slug}/reports", tag = "reports", params(("slug" = String, Path,)), responses((status = 200, description = "Reports on the event visible to the caller")))]
pub async fn list_for_event(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ReportView>>, ApiError> {
    Ok(Json(reports::list_event_reports(&state.db, &user, &slug).await?))
}

#[utoipa::path(post, path = "/events/{slug}/reports", tag = "reports", params(("slug" = String, Path,)), request_body = crate::openapi::CreateReportRequest, responses((status = 201, description = "Filed"), (status = 400, description = "Bad Request")))]
pub async fn create(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(input): Json<CreateReportInput>,
) -> Result<(StatusCode, Json<ReportView>), ApiError> {
    let report = reports::create_report(&state.db, &user, &slug, input).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Reports filed by a user; the path segment carries the user's slug.
#[utoipa::path(get, path = "/events/{slug}/reports/all", tag = "reports", params(("slug" = String, Path, description = "user slug"), ("status" = Option<String>, Query,)), responses((status = 200, description = "Reports filed by the user"), (status = 403, description = "Forbidden")))]
pub async fn list_for_user(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<ReportView>>, ApiError> {
    Ok(Json(reports::list_user_reports(&state.db, &user, &slug, query.status.as_deref()).await?))
}

#[utoipa::path(get, path = "/events/reports/{id}", tag = "reports", params(("id" = String, Path,)), responses((status = 200, description = "Report"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ReportView>, ApiError> {
    Ok(Json(reports::get_report(&state.db, &user, &id).await?))
}

#[utoipa::path(get, path = "/events/reports", tag = "admin", params(crate::openapi::AdminReportParams), responses((status = 200, description = "Paginated reports"), (status = 403, description = "Admins only")))]
pub async fn admin_list(
    State(state): State<ServerState>,
    RequireAdmin(admin): RequireAdmin,
    axum_extra::extract::Query(query): axum_extra::extract::Query<AdminReportQuery>,
) -> Result<Json<Page<ReportView>>, ApiError> {
    Ok(Json(reports::admin_list_reports(&state.db, &admin, &query).await?))
}

#[utoipa::path(patch, path = "/events/reports/{id}/admin", tag = "admin", params(("id" = String, Path,)), request_body = crate::openapi::AdminUpdateReportRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Bad status"), (status = 403, description = "Admins only")))]
pub async fn admin_update(
    State(state): State<ServerState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(input): Json<AdminUpdateInput>,
) -> Result<Json<ReportView>, ApiError> {
    Ok(Json(reports::admin_update_report(&state.db, &admin, &id, input).await?))
}
