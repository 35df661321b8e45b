//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240501_000001_create_user;
mod m20240501_000002_create_user_credentials;
mod m20240501_000003_create_event;
mod m20240501_000004_create_event_service_detail;
mod m20240501_000005_create_event_gallery;
mod m20240501_000006_create_service_order;
mod m20240501_000007_create_review;
mod m20240501_000008_create_report;
mod m20240501_000009_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240501_000001_create_user::Migration),
            Box::new(m20240501_000002_create_user_credentials::Migration),
            Box::new(m20240501_000003_create_event::Migration),
            Box::new(m20240501_000004_create_event_service_detail::Migration),
            Box::new(m20240501_000005_create_event_gallery::Migration),
            Box::new(m20240501_000006_create_service_order::Migration),
            Box::new(m20240501_000007_create_review::Migration),
            Box::new(m20240501_000008_create_report::Migration),
            // Indexes should always be applied last
            Box::new(m20240501_000009_add_indexes::Migration),
        ]
    }
}
