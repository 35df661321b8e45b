use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: &[&str] = &[
    "uniq_service_detail_event_type",
    "uniq_gallery_event_position",
    "uniq_review_user_event",
    "idx_event_seller",
    "idx_review_event",
    "idx_order_buyer",
    "idx_order_seller",
    "idx_order_event_date",
    "idx_report_event",
    "idx_report_reporter",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // EventServiceDetail: one row per (event, service_type)
        manager
            .create_index(
                Index::create()
                    .name("uniq_service_detail_event_type")
                    .table(EventServiceDetail::Table)
                    .col(EventServiceDetail::EventId)
                    .col(EventServiceDetail::ServiceType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // EventGallery: positions unique per event
        manager
            .create_index(
                Index::create()
                    .name("uniq_gallery_event_position")
                    .table(EventGallery::Table)
                    .col(EventGallery::EventId)
                    .col(EventGallery::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Review: one per (user, event)
        manager
            .create_index(
                Index::create()
                    .name("uniq_review_user_event")
                    .table(Review::Table)
                    .col(Review::UserId)
                    .col(Review::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_seller")
                    .table(Event::Table)
                    .col(Event::SellerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_review_event")
                    .table(Review::Table)
                    .col(Review::EventId)
                    .to_owned(),
            )
            .await?;

        // ServiceOrder: buyer / seller listings and per-day capacity checks
        manager
            .create_index(
                Index::create()
                    .name("idx_order_buyer")
                    .table(ServiceOrder::Table)
                    .col(ServiceOrder::BuyerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_order_seller")
                    .table(ServiceOrder::Table)
                    .col(ServiceOrder::SellerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_order_event_date")
                    .table(ServiceOrder::Table)
                    .col(ServiceOrder::EventId)
                    .col(ServiceOrder::EventDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_event")
                    .table(Report::Table)
                    .col(Report::EventId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_report_reporter")
                    .table(Report::Table)
                    .col(Report::ReporterId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in INDEXES {
            manager.drop_index(Index::drop().name(*name).to_owned()).await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum EventServiceDetail { Table, EventId, ServiceType }

#[derive(DeriveIden)]
enum EventGallery { Table, EventId, Position }

#[derive(DeriveIden)]
enum Review { Table, UserId, EventId }

#[derive(DeriveIden)]
enum Event { Table, SellerId }

#[derive(DeriveIden)]
enum ServiceOrder { Table, BuyerId, SellerId, EventId, EventDate }

#[derive(DeriveIden)]
enum Report { Table, EventId, ReporterId }
