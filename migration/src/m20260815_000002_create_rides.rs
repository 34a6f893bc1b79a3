use sea_orm_migration::{prelude::*, schema::*};

use super::m20260815_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ride::Table)
                    .if_not_exists()
                    .col(uuid(Ride::Id).primary_key())
                    // A ride must outlive the identities it references:
                    // deleting a rider or driver nulls the reference.
                    .col(uuid_null(Ride::RiderId))
                    .col(uuid_null(Ride::DriverId))
                    .col(string_len(Ride::Status, 2).not_null())
                    .col(double(Ride::PickupLat).not_null())
                    .col(double(Ride::PickupLng).not_null())
                    .col(double(Ride::DropoffLat).not_null())
                    .col(double(Ride::DropoffLng).not_null())
                    .col(timestamp_with_time_zone(Ride::PickupTime).not_null())
                    .col(
                        timestamp_with_time_zone(Ride::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_rider")
                            .from(Ride::Table, Ride::RiderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_driver")
                            .from(Ride::Table, Ride::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ride::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Ride {
    Table,
    Id,
    RiderId,
    DriverId,
    Status,
    PickupLat,
    PickupLng,
    DropoffLat,
    DropoffLng,
    PickupTime,
    CreatedAt,
}
