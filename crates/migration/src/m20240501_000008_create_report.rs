//! Create `report` and `report_image`.
//!
//! Seller and brand names are copied from the event at filing time so the
//! report keeps its context if the event is later renamed.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(string_len(Report::Id, 10).primary_key())
                    .col(string_len(Report::ReporterId, 12).not_null())
                    .col(string_len(Report::EventId, 8).not_null())
                    .col(string_len(Report::SellerId, 12).not_null())
                    .col(string_len(Report::BrandName, 255).not_null())
                    .col(string_len(Report::SellerFullName, 255).not_null())
                    .col(text(Report::Description))
                    .col(string_len(Report::UserFullName, 255).not_null())
                    .col(string_len(Report::PhoneNumber, 32).not_null())
                    .col(string_len(Report::Status, 20).not_null())
                    .col(timestamp_with_time_zone_null(Report::StatusChangedAt))
                    .col(string_len_null(Report::StatusChangedBy, 12))
                    .col(text_null(Report::AdminNotes))
                    .col(timestamp_with_time_zone(Report::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Report::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_reporter")
                            .from(Report::Table, Report::ReporterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_event")
                            .from(Report::Table, Report::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_seller")
                            .from(Report::Table, Report::SellerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_status_changed_by")
                            .from(Report::Table, Report::StatusChangedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReportImage::Table)
                    .if_not_exists()
                    .col(uuid(ReportImage::Id).primary_key())
                    .col(string_len(ReportImage::ReportId, 10).not_null())
                    .col(string_len(ReportImage::Image, 500).not_null())
                    .col(timestamp_with_time_zone(ReportImage::UploadedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_image_report")
                            .from(ReportImage::Table, ReportImage::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportImage::Table).to_owned())
            .await?;
        manager.drop_table(Table::drop().table(Report::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Report {
    Table,
    Id,
    ReporterId,
    EventId,
    SellerId,
    BrandName,
    SellerFullName,
    Description,
    UserFullName,
    PhoneNumber,
    Status,
    StatusChangedAt,
    StatusChangedBy,
    AdminNotes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ReportImage { Table, Id, ReportId, Image, UploadedAt }

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Event { Table, Id }
