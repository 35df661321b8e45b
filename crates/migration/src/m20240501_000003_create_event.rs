//! Create `event` table owned by a seller.
//!
//! `daily_views` is a JSON object keyed by ISO date.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(string_len(Event::Id, 8).primary_key())
                    .col(string_len(Event::SellerId, 12).not_null())
                    .col(string_len(Event::Title, 255).unique_key().not_null())
                    .col(text(Event::Description))
                    .col(string_len_null(Event::Logo, 500))
                    .col(string_len(Event::BrandName, 255).unique_key().not_null())
                    .col(string_len(Event::Slug, 280).unique_key().not_null())
                    .col(boolean(Event::IsActive).default(true))
                    .col(integer_null(Event::DailyBookingCapacity))
                    .col(big_integer(Event::TotalViews).default(0))
                    .col(json_binary(Event::DailyViews))
                    .col(timestamp_with_time_zone(Event::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Event::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_seller")
                            .from(Event::Table, Event::SellerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Event::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Event {
    Table,
    Id,
    SellerId,
    Title,
    Description,
    Logo,
    BrandName,
    Slug,
    IsActive,
    DailyBookingCapacity,
    TotalViews,
    DailyViews,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
