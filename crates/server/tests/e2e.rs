use std::net::SocketAddr;

use axum::Router;
use migration::MigratorTrait;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::OnceCell;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::routes;

// Tests in this binary run concurrently; migrate once up front.
static MIGRATED: OnceCell<()> = OnceCell::const_new();

fn cors() -> CorsLayer { CorsLayer::very_permissive() }

struct TestApp {
    base_url: String,
    db: sea_orm::DatabaseConnection,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let mut cfg = configs::AppConfig::default();
    cfg.auth.jwt_secret = "e2e-test-secret-0123456789abcdef".into();
    cfg.database.url = models::db::DATABASE_URL.clone();
    cfg.database.run_migrations = false;

    MIGRATED
        .get_or_try_init(|| async {
            let db = models::db::connect().await?;
            migration::Migrator::up(&db, None).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    let state = server::startup::build_state(cfg).await?;
    let db = state.db.clone();
    let app: Router = routes::build_router(state, cors());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url, db })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("reqwest client")
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_register_verify_login_uses_cookie() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();
    let email = format!("user_{}@example.com", Uuid::new_v4().simple());
    let password = "S3curePass!";

    let res = c.post(format!("{}/users/register", app.base_url))
        .json(&json!({
            "email": email, "first_name": "Eve", "last_name": "Tester", "phone_number": "+15550199",
            "password": password, "confirm_password": password, "accepted_terms": true
        }))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);

    let otp = models::user::find_by_email(&app.db, &email)
        .await?
        .and_then(|u| u.otp)
        .ok_or_else(|| anyhow::anyhow!("otp missing"))?;
    let res = c.post(format!("{}/users/verify-otp", app.base_url))
        .json(&json!({"email": email, "otp": "000000x"}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let res = c.post(format!("{}/users/verify-otp", app.base_url))
        .json(&json!({"email": email, "otp": otp}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    // Login -> set-cookie, then the cookie alone authenticates
    let res = c.post(format!("{}/users/login", app.base_url))
        .json(&json!({"email": email, "password": password}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(res.headers().get("set-cookie").is_some());
    let tokens = res.json::<serde_json::Value>().await?;

    let res = c.get(format!("{}/users/me", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let me = res.json::<serde_json::Value>().await?;
    assert_eq!(me["email"], email.as_str());

    let res = c.post(format!("{}/users/token/refresh", app.base_url))
        .json(&json!({"refresh": tokens["refresh"]}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    // an access token is not accepted as a refresh token
    let res = c.post(format!("{}/users/token/refresh", app.base_url))
        .json(&json!({"refresh": tokens["access"]}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    let res = c.post(format!("{}/users/logout", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let res = c.get(format!("{}/users/me", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn e2e_forgot_password_does_not_leak_accounts() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let res = reqwest::Client::new()
        .post(format!("{}/users/forgot-password", app.base_url))
        .json(&json!({"email": format!("ghost_{}@example.com", Uuid::new_v4().simple())}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_unknown_event_is_not_found() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let res = reqwest::Client::new()
        .get(format!("{}/events/no-such-event-{}", app.base_url, Uuid::new_v4().simple()))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Not Found");
    Ok(())
}
