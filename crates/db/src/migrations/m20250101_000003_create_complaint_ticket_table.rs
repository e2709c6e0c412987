//! Create `complaint_ticket` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ComplaintTicket::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComplaintTicket::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ComplaintTicket::ComplainantId).string_len(32).not_null())
                    .col(ColumnDef::new(ComplaintTicket::AccusedId).string_len(32).not_null())
                    .col(ColumnDef::new(ComplaintTicket::Category).string_len(16).not_null())
                    .col(ColumnDef::new(ComplaintTicket::Narrative).text().not_null())
                    .col(ColumnDef::new(ComplaintTicket::ServiceObservation).text().not_null())
                    .col(ColumnDef::new(ComplaintTicket::ProofReference).string_len(1024))
                    .col(
                        ColumnDef::new(ComplaintTicket::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ComplaintTicket::Verdict).string_len(16))
                    .col(ColumnDef::new(ComplaintTicket::AdminResponse).text())
                    .col(ColumnDef::new(ComplaintTicket::ResolvedBy).string_len(128))
                    .col(
                        ColumnDef::new(ComplaintTicket::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ComplaintTicket::ResolvedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: (category, status) for the complaint tabs
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_ticket_category_status")
                    .table(ComplaintTicket::Table)
                    .col(ComplaintTicket::Category)
                    .col(ComplaintTicket::Status)
                    .to_owned(),
            )
            .await?;

        // Index: accused_id
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_ticket_accused_id")
                    .table(ComplaintTicket::Table)
                    .col(ComplaintTicket::AccusedId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ComplaintTicket::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ComplaintTicket {
    Table,
    Id,
    ComplainantId,
    AccusedId,
    Category,
    Narrative,
    ServiceObservation,
    ProofReference,
    Status,
    Verdict,
    AdminResponse,
    ResolvedBy,
    CreatedAt,
    ResolvedAt,
}
