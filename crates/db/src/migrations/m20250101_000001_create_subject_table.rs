//! Create subject table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subject::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Subject::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Subject::Role).string_len(16).not_null())
                    .col(ColumnDef::new(Subject::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Subject::Username).string_len(128))
                    .col(ColumnDef::new(Subject::LifecycleState).string_len(16))
                    .col(ColumnDef::new(Subject::IsVerified).boolean().not_null().default(false))
                    .col(ColumnDef::new(Subject::IsActive).boolean().not_null().default(false))
                    .col(ColumnDef::new(Subject::RejectionReason).text())
                    .col(ColumnDef::new(Subject::SuspensionReason).text())
                    .col(ColumnDef::new(Subject::SuspensionUntil).timestamp_with_time_zone())
                    .col(ColumnDef::new(Subject::BanReason).text())
                    .col(ColumnDef::new(Subject::Documents).json_binary())
                    .col(ColumnDef::new(Subject::LocationLat).double())
                    .col(ColumnDef::new(Subject::LocationLng).double())
                    .col(
                        ColumnDef::new(Subject::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Subject::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: (role, lifecycle_state) for the per-role tabs
        manager
            .create_index(
                Index::create()
                    .name("idx_subject_role_lifecycle_state")
                    .table(Subject::Table)
                    .col(Subject::Role)
                    .col(Subject::LifecycleState)
                    .to_owned(),
            )
            .await?;

        // Index: suspension_until (expiry sweeps)
        manager
            .create_index(
                Index::create()
                    .name("idx_subject_suspension_until")
                    .table(Subject::Table)
                    .col(Subject::SuspensionUntil)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subject::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Subject {
    Table,
    Id,
    Role,
    Name,
    Username,
    LifecycleState,
    IsVerified,
    IsActive,
    RejectionReason,
    SuspensionReason,
    SuspensionUntil,
    BanReason,
    Documents,
    LocationLat,
    LocationLng,
    CreatedAt,
    UpdatedAt,
}
