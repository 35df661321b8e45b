use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use configs::AppConfig;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use common::types::Message;
use service::auth::domain::{AuthUser, LoginInput, RegisterInput, ResetPasswordInput, VerifyOtpInput};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::AuthService;
use service::profile::{self, UserView};

use crate::auth::{CurrentUser, AUTH_COOKIE};
use crate::errors::ApiError;

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
}

#[derive(Serialize)]
pub struct RegisterOutput {
    pub message: String,
    pub user: AuthUser,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub access: String,
    pub refresh: String,
    pub user: AuthUser,
}

#[derive(Deserialize)]
pub struct RefreshInput {
    pub refresh: String,
}

#[derive(Serialize)]
pub struct RefreshOutput {
    pub access: String,
}

#[derive(Deserialize)]
pub struct EmailInput {
    pub email: String,
}

#[utoipa::path(post, path = "/users/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered, OTP sent"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<RegisterOutput>), ApiError> {
    let user = state.auth.register(input).await?;
    let out = RegisterOutput {
        message: "Registration successful. Please verify your email with the OTP sent.".into(),
        user,
    };
    Ok((StatusCode::CREATED, Json(out)))
}

#[utoipa::path(post, path = "/users/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized"), (status = 403, description = "Not verified")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<LoginOutput>), ApiError> {
    let session = state.auth.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.access.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(state.config.auth.secure_cookie);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(LoginOutput { access: session.access, refresh: session.refresh, user: session.user })))
}

#[utoipa::path(post, path = "/users/token/refresh", tag = "auth", request_body = crate::openapi::RefreshRequest, responses((status = 200, description = "New access token"), (status = 401, description = "Invalid refresh token")))]
pub async fn refresh(
    State(state): State<ServerState>,
    Json(input): Json<RefreshInput>,
) -> Result<Json<RefreshOutput>, ApiError> {
    let access = state
        .auth
        .refresh(&input.refresh)
        .await
        .map_err(|_| ApiError::unauthorized("Token is invalid or expired."))?;
    Ok(Json(RefreshOutput { access }))
}

#[utoipa::path(post, path = "/users/logout", tag = "auth", responses((status = 200, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Message>) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    let jar = jar.remove(cookie);
    (jar, Json(Message::new("Logged out successfully.")))
}

#[utoipa::path(post, path = "/users/verify-otp", tag = "auth", request_body = crate::openapi::VerifyOtpRequest, responses((status = 200, description = "Verified"), (status = 400, description = "Invalid or expired OTP")))]
pub async fn verify_otp(
    State(state): State<ServerState>,
    Json(input): Json<VerifyOtpInput>,
) -> Result<Json<Message>, ApiError> {
    state.auth.verify_otp(input).await?;
    Ok(Json(Message::new("Account verified successfully.")))
}

#[utoipa::path(post, path = "/users/resend-otp", tag = "auth", request_body = crate::openapi::EmailRequest, responses((status = 200, description = "OTP sent if the account exists")))]
pub async fn resend_otp(
    State(state): State<ServerState>,
    Json(input): Json<EmailInput>,
) -> Result<Json<Message>, ApiError> {
    state.auth.resend_otp(&input.email).await?;
    Ok(Json(Message::new("If an account exists for this email, a new OTP has been sent.")))
}

#[utoipa::path(post, path = "/users/forgot-password", tag = "auth", request_body = crate::openapi::EmailRequest, responses((status = 200, description = "Reset mail sent if the account exists")))]
pub async fn forgot_password(
    State(state): State<ServerState>,
    Json(input): Json<EmailInput>,
) -> Result<Json<Message>, ApiError> {
    state.auth.forgot_password(&input.email).await?;
    Ok(Json(Message::new("If an account exists for this email, a password reset link has been sent.")))
}

#[utoipa::path(post, path = "/users/reset-password", tag = "auth", request_body = crate::openapi::ResetPasswordRequest, responses((status = 200, description = "Password reset"), (status = 400, description = "Invalid email or OTP")))]
pub async fn reset_password(
    State(state): State<ServerState>,
    Json(input): Json<ResetPasswordInput>,
) -> Result<Json<Message>, ApiError> {
    state.auth.reset_password(input).await?;
    Ok(Json(Message::new("Password has been reset successfully.")))
}

#[utoipa::path(get, path = "/users/me", tag = "users", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, CurrentUser(user): CurrentUser) -> Result<Json<UserView>, ApiError> {
    Ok(Json(profile::me(&state.db, &user).await?))
}
