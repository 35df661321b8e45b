//! Database-backed model tests; skipped when `SKIP_DB_TESTS` is set or no
//! database is reachable.

use anyhow::Result;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::db::connect;
use crate::user::{self, NewUser, Role};
use crate::{event, ids, user_credentials};

async fn test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let db = match connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {e}");
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {e}");
        return None;
    }
    Some(db)
}

fn new_user(first: &str, last: &str) -> NewUser {
    NewUser {
        email: format!("{}@example.com", Uuid::new_v4()),
        first_name: first.to_string(),
        last_name: last.to_string(),
        phone_number: Some("+15550000".into()),
        whatsapp_number: None,
        location: None,
        user_type: Role::Seller,
        accepted_terms: true,
        is_verified: true,
    }
}

#[tokio::test]
async fn user_slug_gets_numeric_suffix_on_collision() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };
    let tag = ids::random_id(6).to_lowercase();

    let a = user::create(&db, new_user("Slug", &tag)).await?;
    let b = user::create(&db, new_user("Slug", &tag)).await?;
    assert_eq!(a.slug, format!("slug-{tag}"));
    assert_eq!(b.slug, format!("slug-{tag}-2"));

    // own slug is not treated as taken
    let same = user::unique_slug(&db, "Slug", &tag, Some(&a.id)).await?;
    assert_eq!(same, a.slug);

    user::Entity::delete_by_id(a.id).exec(&db).await?;
    user::Entity::delete_by_id(b.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn create_user_rejects_bad_email() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };
    let mut input = new_user("No", "Email");
    input.email = "not-an-email".into();
    assert!(user::create(&db, input).await.is_err());
    Ok(())
}

#[tokio::test]
async fn credentials_upsert_replaces_hash() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };
    let u = user::create(&db, new_user("Cred", "Holder")).await?;

    let first = user_credentials::upsert_password(&db, &u.id, "hash-1".into(), "argon2").await?;
    let second = user_credentials::upsert_password(&db, &u.id, "hash-2".into(), "argon2").await?;
    assert_eq!(first.id, second.id);
    assert_eq!(second.password_hash, "hash-2");
    assert!(user_credentials::upsert_password(&db, &u.id, " ".into(), "argon2").await.is_err());

    user::Entity::delete_by_id(u.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn event_slug_avoids_existing_rows() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };
    let seller = user::create(&db, new_user("Event", "Owner")).await?;
    let brand = format!("Brand {}", ids::random_id(8));

    let id = ids::unique_id::<event::Entity, _>(&db, ids::EVENT_ID_LEN).await?;
    let slug = event::unique_slug(&db, &brand, &id).await?;
    let now = chrono::Utc::now().into();
    event::ActiveModel {
        id: Set(id.clone()),
        seller_id: Set(seller.id.clone()),
        title: Set(format!("Title {}", Uuid::new_v4())),
        description: Set(String::new()),
        logo: Set(None),
        brand_name: Set(brand.clone()),
        slug: Set(slug.clone()),
        is_active: Set(true),
        daily_booking_capacity: Set(None),
        total_views: Set(0),
        daily_views: Set(serde_json::json!({})),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await?;

    // The same row keeps its slug; a different event gets a suffixed one.
    assert_eq!(event::unique_slug(&db, &brand, &id).await?, slug);
    let other = event::unique_slug(&db, &brand, "ZZZZ0000").await?;
    assert_eq!(other, format!("{slug}-zzzz"));

    user::Entity::delete_by_id(seller.id).exec(&db).await?;
    assert!(event::Entity::find_by_id(id).one(&db).await?.is_none());
    Ok(())
}
