//! Create `delivery_order` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeliveryOrder::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DeliveryOrder::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(DeliveryOrder::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(DeliveryOrder::RiderId).string_len(32))
                    .col(
                        ColumnDef::new(DeliveryOrder::Status)
                            .string_len(16)
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(DeliveryOrder::DeliveryNote)
                            .string_len(64)
                            .not_null()
                            .default("Looking for a delivery partner"),
                    )
                    .col(ColumnDef::new(DeliveryOrder::Items).json_binary().not_null())
                    .col(ColumnDef::new(DeliveryOrder::DeliveryAddress).text())
                    .col(ColumnDef::new(DeliveryOrder::DeliveryLat).double())
                    .col(ColumnDef::new(DeliveryOrder::DeliveryLng).double())
                    .col(
                        ColumnDef::new(DeliveryOrder::OrderTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(DeliveryOrder::ExpectedDeliveryAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_delivery_order_rider")
                            .from(DeliveryOrder::Table, DeliveryOrder::RiderId)
                            .to(Subject::Table, Subject::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: order_time (newest first listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_delivery_order_order_time")
                    .table(DeliveryOrder::Table)
                    .col(DeliveryOrder::OrderTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeliveryOrder::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DeliveryOrder {
    Table,
    Id,
    UserId,
    RiderId,
    Status,
    DeliveryNote,
    Items,
    DeliveryAddress,
    DeliveryLat,
    DeliveryLng,
    OrderTime,
    ExpectedDeliveryAt,
}

#[derive(Iden)]
enum Subject {
    Table,
    Id,
}
