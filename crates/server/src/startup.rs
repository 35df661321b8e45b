use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::notify::build_mailer;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Connect, migrate and assemble the shared handler state.
pub async fn build_state(cfg: AppConfig) -> Result<ServerState, StartupError> {
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    if cfg.database.run_migrations {
        migration::Migrator::up(&db, None)
            .await
            .map_err(|e| StartupError::Database(format!("migrations: {e}")))?;
        info!("migrations applied");
    }

    let repo = Arc::new(SeaOrmAuthRepository::new(db.clone()));
    let mailer = build_mailer(&cfg.mail);
    let auth = Arc::new(AuthService::new(repo, AuthConfig::from_app(&cfg), mailer));
    Ok(ServerState { db, config: Arc::new(cfg), auth })
}

/// Public entry: build the app and run the HTTP server. Logging is set up by the caller.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let addr = bind_addr(&cfg)?;
    let state = build_state(cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    info!(%addr, "starting eventra server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
