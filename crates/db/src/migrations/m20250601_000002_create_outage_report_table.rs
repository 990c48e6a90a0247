//! Create outage report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OutageReport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OutageReport::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OutageReport::ReporterId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OutageReport::Title).string_len(256).not_null())
                    .col(ColumnDef::new(OutageReport::Description).text())
                    .col(ColumnDef::new(OutageReport::Region).string_len(128))
                    .col(ColumnDef::new(OutageReport::ManualLocation).string_len(512))
                    .col(ColumnDef::new(OutageReport::Latitude).double())
                    .col(ColumnDef::new(OutageReport::Longitude).double())
                    .col(ColumnDef::new(OutageReport::LocationName).string_len(512))
                    .col(ColumnDef::new(OutageReport::MediaUrl).string_len(512))
                    .col(
                        ColumnDef::new(OutageReport::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutageReport::ReportedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(OutageReport::ResolvedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_outage_report_reporter")
                            .from(OutageReport::Table, OutageReport::ReporterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: reporter_id (for per-user listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_outage_report_reporter_id")
                    .table(OutageReport::Table)
                    .col(OutageReport::ReporterId)
                    .to_owned(),
            )
            .await?;

        // Index: reported_at (for ordering and date-range export queries)
        manager
            .create_index(
                Index::create()
                    .name("idx_outage_report_reported_at")
                    .table(OutageReport::Table)
                    .col(OutageReport::ReportedAt)
                    .to_owned(),
            )
            .await?;

        // Index: status (for summary counts)
        manager
            .create_index(
                Index::create()
                    .name("idx_outage_report_status")
                    .table(OutageReport::Table)
                    .col(OutageReport::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OutageReport::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OutageReport {
    Table,
    Id,
    ReporterId,
    Title,
    Description,
    Region,
    ManualLocation,
    Latitude,
    Longitude,
    LocationName,
    MediaUrl,
    Status,
    ReportedAt,
    ResolvedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
