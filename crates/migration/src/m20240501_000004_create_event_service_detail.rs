//! Create `event_service_detail`: per-event pricing for each offered service type.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventServiceDetail::Table)
                    .if_not_exists()
                    .col(uuid(EventServiceDetail::Id).primary_key())
                    .col(string_len(EventServiceDetail::EventId, 8).not_null())
                    .col(string_len(EventServiceDetail::ServiceType, 32).not_null())
                    .col(string_len(EventServiceDetail::ShortDescription, 500).default(""))
                    .col(big_integer(EventServiceDetail::Price).default(0))
                    .col(boolean(EventServiceDetail::IsAvailable).default(true))
                    .col(timestamp_with_time_zone(EventServiceDetail::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_service_detail_event")
                            .from(EventServiceDetail::Table, EventServiceDetail::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventServiceDetail::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EventServiceDetail {
    Table,
    Id,
    EventId,
    ServiceType,
    ShortDescription,
    Price,
    IsAvailable,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Event { Table, Id }
