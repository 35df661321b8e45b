use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set};
use serde_json::{json, Value};
use tower::Service;

use configs::AppConfig;
use server::routes::{self, auth::ServerState};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::notify::MemoryMailer;

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "api-flow-test-secret-0123456789".into();
    cfg.database.url = models::db::DATABASE_URL.clone();
    cfg
}

fn app_with(db: DatabaseConnection, cfg: AppConfig) -> Router {
    let repo = Arc::new(SeaOrmAuthRepository::new(db.clone()));
    let auth = Arc::new(AuthService::new(repo, AuthConfig::from_app(&cfg), Arc::new(MemoryMailer::default())));
    let state = ServerState { db, config: Arc::new(cfg), auth };
    routes::build_router(state, cors())
}

/// Router over a disconnected database; only routes that never reach it are usable.
fn offline_app() -> Router {
    app_with(DatabaseConnection::default(), test_config())
}

async fn send(app: &mut Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = app.call(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, body))
}

fn json_req(method: &str, uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    Ok(b.body(Body::from(serde_json::to_vec(&body)?))?)
}

fn get_req(uri: &str, token: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    Ok(b.body(Body::empty())?)
}

#[tokio::test]
async fn health_and_service_catalog() -> anyhow::Result<()> {
    let mut app = offline_app();
    let (status, body) = send(&mut app, get_req("/health", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&mut app, get_req("/services", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body.as_array().map(|a| a.iter().filter_map(|s| s["code"].as_str()).collect()).unwrap_or_default();
    assert_eq!(codes.len(), 7);
    assert!(codes.contains(&"hall_booking"));
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> anyhow::Result<()> {
    let mut app = offline_app();
    let (status, body) = send(&mut app, get_req("/users/me", None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(&mut app, get_req("/events/reports", Some("not-a-jwt"))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("GET")
        .uri("/users/me")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())?;
    let (status, _) = send(&mut app, req).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> anyhow::Result<()> {
    let mut app = offline_app();
    let (status, body) = send(&mut app, get_req("/api-docs/openapi.json", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/events/{slug}"].is_object());

    let resp = app.call(get_req("/metrics", None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn blank_suggestion_query_is_an_empty_object() -> anyhow::Result<()> {
    let mut app = offline_app();
    for uri in ["/events/suggestions", "/events/suggestions?q=%20%20"] {
        let (status, body) = send(&mut app, get_req(uri, None)?).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }
    Ok(())
}

/// Registers, verifies (OTP read back from the database) and logs in; returns (token, slug).
async fn signup(app: &mut Router, db: &DatabaseConnection, email: &str, first: &str, user_type: &str) -> anyhow::Result<(String, String)> {
    let (status, body) = send(app, json_req("POST", "/users/register", None, json!({
        "email": email, "first_name": first, "last_name": "Flow", "phone_number": "+15550123",
        "user_type": user_type, "password": "FlowPass123", "confirm_password": "FlowPass123", "accepted_terms": true
    }))?).await?;
    assert_eq!(status, StatusCode::CREATED, "register: {body}");
    assert_eq!(body["user"]["is_verified"], false);

    let (status, _) = send(app, json_req("POST", "/users/login", None, json!({"email": email, "password": "FlowPass123"}))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let otp = models::user::find_by_email(db, email).await?.and_then(|u| u.otp).ok_or_else(|| anyhow::anyhow!("otp missing"))?;
    let (status, _) = send(app, json_req("POST", "/users/verify-otp", None, json!({"email": email, "otp": otp}))?).await?;
    assert_eq!(status, StatusCode::OK);

    let resp = app.call(json_req("POST", "/users/login", None, json!({"email": email, "password": "FlowPass123"}))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(cookie.starts_with("auth_token="));
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    let token = body["access"].as_str().unwrap_or_default().to_string();
    let slug = body["user"]["slug"].as_str().unwrap_or_default().to_string();
    Ok((token, slug))
}

#[tokio::test]
async fn marketplace_flow() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let cfg = test_config();
    let state = match server::startup::build_state(cfg.clone()).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("database unavailable, skipping: {e}");
            return Ok(());
        }
    };
    let db = state.db.clone();
    let mut app = app_with(db.clone(), cfg);
    let tag = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();

    let (seller_token, seller_slug) = signup(&mut app, &db, &format!("seller_{tag}@example.com"), "Sella", "seller").await?;
    let (buyer_token, buyer_slug) = signup(&mut app, &db, &format!("buyer_{tag}@example.com"), "Bayo", "customer").await?;

    // cookie auth works as well as bearer
    let req = Request::builder()
        .method("GET")
        .uri("/users/me")
        .header(header::COOKIE, format!("auth_token={buyer_token}"))
        .body(Body::empty())?;
    let (status, me) = send(&mut app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["slug"], buyer_slug.as_str());

    // customers cannot open a storefront
    let event_body = json!({
        "title": format!("Flow Gala {tag}"),
        "brand_name": format!("Flow Brand {tag}"),
        "description": "Weddings and parties",
        "service_details": [
            {"service": "photography", "price": 50000},
            {"service": "Hall Booking", "price": 120000, "short_description": "200 seats"}
        ],
        "gallery_images": [{"image": "https://img.example.com/a.jpg", "position": 1, "is_primary": true}]
    });
    let (status, _) = send(&mut app, json_req("POST", "/events/create", Some(&buyer_token), event_body.clone())?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, event) = send(&mut app, json_req("POST", "/events/create", Some(&seller_token), event_body)?).await?;
    assert_eq!(status, StatusCode::CREATED, "create event: {event}");
    let event_slug = event["slug"].as_str().unwrap_or_default().to_string();
    let event_id = event["id"].as_str().unwrap_or_default().to_string();

    let (status, detail) = send(&mut app, get_req(&format!("/events/{event_slug}"), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["total_views"], 1);

    let (status, listing) = send(&mut app, get_req(&format!("/events?service_type=photography&search=Flow%20Brand%20{tag}"), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 1);
    assert!(listing["suggestions"].is_object());

    // booking lifecycle
    let date = (chrono::Utc::now().date_naive() + chrono::Duration::days(14)).to_string();
    let (status, order) = send(&mut app, json_req("POST", &format!("/users/{buyer_slug}/orders/create"), Some(&buyer_token), json!({
        "event_id": event_id, "event_date": date, "event_time": "18:30:00", "location": "Harbour hall",
        "selected_services": ["photography", "hall_booking", "catering"]
    }))?).await?;
    assert_eq!(status, StatusCode::CREATED, "create order: {order}");
    assert_eq!(order["total_amount"], 170000);
    let order_id = order["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = send(&mut app, json_req("PATCH", &format!("/users/{buyer_slug}/orders/{order_id}/accept"), Some(&buyer_token), json!({}))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, accepted) = send(&mut app, json_req("PATCH", &format!("/users/{seller_slug}/orders/{order_id}/accept"), Some(&seller_token), json!({}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "accepted");

    let (status, paid) = send(&mut app, json_req("PATCH", &format!("/users/{seller_slug}/orders/{order_id}/seller-update"), Some(&seller_token), json!({
        "discount_price": 20000, "advance_paid": 150000
    }))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["net_total"], 150000);
    assert_eq!(paid["is_fully_paid"], true);

    let (status, done) = send(&mut app, json_req("PATCH", &format!("/users/{buyer_slug}/orders/{order_id}/update"), Some(&buyer_token), json!({"status": "completed"}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");

    let (status, mine) = send(&mut app, get_req(&format!("/users/{buyer_slug}/orders"), Some(&buyer_token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
    let (status, _) = send(&mut app, get_req(&format!("/users/{seller_slug}/orders/seller"), Some(&buyer_token))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // reviews
    let (status, _) = send(&mut app, json_req("POST", &format!("/events/{event_slug}/reviews/create"), Some(&seller_token), json!({"rating": 5}))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, review) = send(&mut app, json_req("POST", &format!("/events/{event_slug}/reviews/create"), Some(&buyer_token), json!({"rating": 4, "comment": "Lovely"}))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&mut app, json_req("POST", &format!("/events/{event_slug}/reviews/create"), Some(&buyer_token), json!({"rating": 3}))?).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, reviews) = send(&mut app, get_req(&format!("/events/{event_slug}/reviews"), Some(&buyer_token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews[0]["can_edit"], true);
    let review_id = review["id"].as_str().unwrap_or_default().to_string();
    let (status, _) = send(&mut app, json_req("PATCH", &format!("/events/{event_slug}/reviews/{review_id}/edit"), Some(&seller_token), json!({"rating": 1}))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, dash) = send(&mut app, get_req(&format!("/events/{event_slug}/dashboard"), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["total_reviews"], 1);

    // reports and moderation
    let (status, report) = send(&mut app, json_req("POST", &format!("/events/{event_slug}/reports"), Some(&buyer_token), json!({
        "description": "Late arrival", "user_full_name": "Bayo Flow", "phone_number": "+15550123"
    }))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert!(report.get("admin_notes").is_none());
    let report_id = report["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = send(&mut app, get_req(&format!("/events/reports/{report_id}"), Some(&seller_token))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&mut app, get_req("/events/reports", Some(&buyer_token))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (admin_token, _) = signup(&mut app, &db, &format!("admin_{tag}@example.com"), "Ada", "customer").await?;
    if let Some(admin) = models::user::find_by_email(&db, &format!("admin_{tag}@example.com")).await? {
        let mut am = admin.into_active_model();
        am.user_type = Set(models::user::Role::Admin);
        am.update(&db).await?;
    }
    let (status, updated) = send(&mut app, json_req("PATCH", &format!("/events/reports/{report_id}/admin"), Some(&admin_token), json!({
        "status": "under_review", "admin_notes": "Contacted seller"
    }))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "under_review");
    assert_eq!(updated["admin_notes"], "Contacted seller");

    let (status, page) = send(&mut app, get_req(&format!("/events/reports?status=under_review&brand_name=Flow%20Brand%20{tag}"), Some(&admin_token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 1);

    let (status, own) = send(&mut app, get_req(&format!("/events/{buyer_slug}/reports/all"), Some(&buyer_token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(own[0].get("admin_notes").is_none());

    // profile and whatsapp counter
    let (status, clicks) = send(&mut app, json_req("POST", &format!("/users/profile/{seller_slug}"), None, json!({}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clicks["whatsapp_click_count"], 1);
    let (status, _) = send(&mut app, json_req("PATCH", &format!("/users/profile/{seller_slug}/edit"), Some(&buyer_token), json!({"first_name": "Mallory"}))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, stats) = send(&mut app, get_req(&format!("/users/profile/{seller_slug}/dashboard"), Some(&buyer_token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&mut app, json_req("DELETE", &format!("/events/{event_slug}/delete"), Some(&buyer_token), json!({}))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&mut app, json_req("DELETE", &format!("/events/{event_slug}/delete"), Some(&seller_token), json!({}))?).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
