//! Create `user` table.
//!
//! Holds profile data, role, verification state, the pending OTP and
//! WhatsApp click counters. Password hashes live in `user_credentials`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(string_len(User::Id, 12).primary_key())
                    .col(string_len(User::Email, 255).unique_key().not_null())
                    .col(string_len(User::FirstName, 100).not_null())
                    .col(string_len(User::LastName, 100).not_null())
                    .col(string_len(User::Slug, 220).unique_key().not_null())
                    .col(string_len_null(User::ProfileImage, 500))
                    .col(string_len_null(User::Location, 255))
                    .col(string_len_null(User::PhoneNumber, 32))
                    .col(string_len_null(User::WhatsappNumber, 32))
                    .col(string_len(User::UserType, 16).not_null())
                    .col(boolean(User::IsActive).default(true))
                    .col(boolean(User::IsVerified).default(false))
                    .col(boolean(User::AcceptedTerms).default(false))
                    .col(string_len_null(User::Otp, 6))
                    .col(timestamp_with_time_zone_null(User::OtpExpiry))
                    .col(big_integer(User::WhatsappClickCount).default(0))
                    .col(big_integer(User::WhatsappDailyClickCount).default(0))
                    .col(date_null(User::WhatsappDailyClickDate))
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(User::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Email,
    FirstName,
    LastName,
    Slug,
    ProfileImage,
    Location,
    PhoneNumber,
    WhatsappNumber,
    UserType,
    IsActive,
    IsVerified,
    AcceptedTerms,
    Otp,
    OtpExpiry,
    WhatsappClickCount,
    WhatsappDailyClickCount,
    WhatsappDailyClickDate,
    CreatedAt,
    UpdatedAt,
}
