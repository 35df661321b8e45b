//! Create `service_order`: a buyer's booking of an event's services.
//!
//! Amounts are stored in minor currency units.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceOrder::Table)
                    .if_not_exists()
                    .col(string_len(ServiceOrder::Id, 8).primary_key())
                    .col(string_len(ServiceOrder::SellerId, 12).not_null())
                    .col(string_len(ServiceOrder::BuyerId, 12).not_null())
                    .col(string_len(ServiceOrder::EventId, 8).not_null())
                    .col(string_len(ServiceOrder::BuyerName, 200).not_null())
                    .col(date(ServiceOrder::EventDate).not_null())
                    .col(time(ServiceOrder::EventTime).not_null())
                    .col(string_len(ServiceOrder::Location, 255).not_null())
                    .col(json_binary(ServiceOrder::SelectedServices))
                    .col(boolean(ServiceOrder::SellerAgreed).default(false))
                    .col(string_len(ServiceOrder::Status, 16).not_null())
                    .col(big_integer(ServiceOrder::TotalAmount).default(0))
                    .col(big_integer(ServiceOrder::DiscountPrice).default(0))
                    .col(big_integer(ServiceOrder::AdvancePaid).default(0))
                    .col(boolean(ServiceOrder::IsFullyPaid).default(false))
                    .col(date_null(ServiceOrder::FullPaymentDate))
                    .col(string_len_null(ServiceOrder::InvoiceFile, 500))
                    .col(timestamp_with_time_zone(ServiceOrder::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ServiceOrder::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_order_seller")
                            .from(ServiceOrder::Table, ServiceOrder::SellerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_order_buyer")
                            .from(ServiceOrder::Table, ServiceOrder::BuyerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_order_event")
                            .from(ServiceOrder::Table, ServiceOrder::EventId)
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
            .drop_table(Table::drop().table(ServiceOrder::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceOrder {
    Table,
    Id,
    SellerId,
    BuyerId,
    EventId,
    BuyerName,
    EventDate,
    EventTime,
    Location,
    SelectedServices,
    SellerAgreed,
    Status,
    TotalAmount,
    DiscountPrice,
    AdvancePaid,
    IsFullyPaid,
    FullPaymentDate,
    InvoiceFile,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Event { Table, Id }
