//! Create waste report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WasteReport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WasteReport::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WasteReport::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(WasteReport::Description).text().not_null())
                    .col(ColumnDef::new(WasteReport::WasteType).string_len(32).not_null())
                    .col(ColumnDef::new(WasteReport::Lat).double().not_null())
                    .col(ColumnDef::new(WasteReport::Lng).double().not_null())
                    .col(ColumnDef::new(WasteReport::ImageKey).string_len(1024).not_null())
                    .col(ColumnDef::new(WasteReport::ImageUrl).string_len(1024).not_null())
                    .col(
                        ColumnDef::new(WasteReport::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(WasteReport::PointsAwarded)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(WasteReport::ReviewedBy).string_len(32))
                    .col(ColumnDef::new(WasteReport::ReviewedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(WasteReport::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(WasteReport::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_waste_report_user")
                            .from(WasteReport::Table, WasteReport::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_waste_report_reviewer")
                            .from(WasteReport::Table, WasteReport::ReviewedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: owner lookups (dashboard)
        manager
            .create_index(
                Index::create()
                    .name("idx_waste_report_user_id")
                    .table(WasteReport::Table)
                    .col(WasteReport::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: admin review queue filtering
        manager
            .create_index(
                Index::create()
                    .name("idx_waste_report_status")
                    .table(WasteReport::Table)
                    .col(WasteReport::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_waste_report_created_at")
                    .table(WasteReport::Table)
                    .col(WasteReport::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WasteReport::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum WasteReport {
    Table,
    Id,
    UserId,
    Description,
    WasteType,
    Lat,
    Lng,
    ImageKey,
    ImageUrl,
    Status,
    PointsAwarded,
    ReviewedBy,
    ReviewedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
