//! Create `event_gallery` holding ordered image URLs for an event.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventGallery::Table)
                    .if_not_exists()
                    .col(uuid(EventGallery::Id).primary_key())
                    .col(string_len(EventGallery::EventId, 8).not_null())
                    .col(string_len(EventGallery::Image, 500).not_null())
                    .col(boolean(EventGallery::IsPrimary).default(false))
                    .col(integer(EventGallery::Position).not_null())
                    .col(timestamp_with_time_zone(EventGallery::UploadedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_gallery_event")
                            .from(EventGallery::Table, EventGallery::EventId)
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
            .drop_table(Table::drop().table(EventGallery::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EventGallery {
    Table,
    Id,
    EventId,
    Image,
    IsPrimary,
    Position,
    UploadedAt,
}

#[derive(DeriveIden)]
enum Event { Table, Id }
