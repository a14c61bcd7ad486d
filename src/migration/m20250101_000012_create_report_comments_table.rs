use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ReportComments {
    Table,
    Id,
    ReportId,
    UserId,
    Comment,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Reports {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportComments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReportComments::ReportId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportComments::UserId).integer().not_null())
                    .col(ColumnDef::new(ReportComments::Comment).text().not_null())
                    .col(
                        ColumnDef::new(ReportComments::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_comments_report_id")
                            .from(ReportComments::Table, ReportComments::ReportId)
                            .to(Reports::Table, Reports::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_comments_user_id")
                            .from(ReportComments::Table, ReportComments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_comments_report")
                    .table(ReportComments::Table)
                    .col(ReportComments::ReportId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportComments::Table).to_owned())
            .await
    }
}
