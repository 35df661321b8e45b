#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use configs::DatabaseConfig;
use models::db::{connect_with_config, DATABASE_URL};
use models::ids;
use models::user::{self, NewUser, Role};

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

fn test_config(max_connections: u32) -> DatabaseConfig {
    let mut cfg = DatabaseConfig { url: DATABASE_URL.clone(), ..DatabaseConfig::default() };
    cfg.max_connections = cfg.max_connections.max(max_connections);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.acquire_timeout_secs = 10;
    cfg
}

/// Connection for a DB-backed test, or `None` when `SKIP_DB_TESTS` is set or
/// no database is reachable.
pub async fn get_db() -> Result<Option<DatabaseConnection>, anyhow::Error> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(None);
    }
    let db = match connect_with_config(&test_config(20)).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {e}");
            return Ok(None);
        }
    };
    // Run migrations exactly once per test process
    MIGRATED
        .get_or_try_init(|| async {
            migration::Migrator::up(&db, None).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;
    Ok(Some(db))
}

/// Verified user with a random surname, so slugs do not collide across runs.
pub async fn make_user(db: &DatabaseConnection, role: Role) -> Result<user::Model, anyhow::Error> {
    let tag = ids::random_id(8).to_lowercase();
    let created = user::create(
        db,
        NewUser {
            email: format!("{tag}@example.com"),
            first_name: "Test".into(),
            last_name: format!("User{tag}"),
            phone_number: Some("+15550100".into()),
            whatsapp_number: Some("+15550101".into()),
            location: None,
            user_type: role,
            accepted_terms: true,
            is_verified: true,
        },
    )
    .await?;
    Ok(created)
}
