use sea_orm_migration::{prelude::*, schema::*};

use super::m20260815_000002_create_rides::Ride;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RideEvent::Table)
                    .if_not_exists()
                    .col(uuid(RideEvent::Id).primary_key())
                    .col(uuid(RideEvent::RideId).not_null())
                    .col(string_len(RideEvent::Description, 255).not_null())
                    .col(
                        timestamp_with_time_zone(RideEvent::Created)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // Events are owned by their ride: deleting a ride
                    // deletes its whole history.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_event_ride")
                            .from(RideEvent::Table, RideEvent::RideId)
                            .to(Ride::Table, Ride::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RideEvent::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum RideEvent {
    Table,
    Id,
    RideId,
    Description,
    Created,
}
