//! Create `audit_record` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditRecord::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuditRecord::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(AuditRecord::SubjectId).string_len(32).not_null())
                    .col(ColumnDef::new(AuditRecord::Role).string_len(16).not_null())
                    .col(ColumnDef::new(AuditRecord::Action).string_len(64).not_null())
                    .col(ColumnDef::new(AuditRecord::Reason).text().not_null().default(""))
                    .col(ColumnDef::new(AuditRecord::DurationDays).integer())
                    .col(ColumnDef::new(AuditRecord::Actor).string_len(128))
                    .col(
                        ColumnDef::new(AuditRecord::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (subject_id, timestamp) for per-subject history
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_record_subject_id_timestamp")
                    .table(AuditRecord::Table)
                    .col(AuditRecord::SubjectId)
                    .col(AuditRecord::Timestamp)
                    .to_owned(),
            )
            .await?;

        // Index: (role, timestamp) for the admin history tab
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_record_role_timestamp")
                    .table(AuditRecord::Table)
                    .col(AuditRecord::Role)
                    .col(AuditRecord::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditRecord::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AuditRecord {
    Table,
    Id,
    SubjectId,
    Role,
    Action,
    Reason,
    DurationDays,
    Actor,
    Timestamp,
}
