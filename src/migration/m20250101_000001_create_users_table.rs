use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    Bio,
    Location,
    BirthDate,
    Timezone,
    AvatarUrl,
    Role,
    SuspendedAt,
    EmailVerified,
    EmailVerificationToken,
    EmailVerificationExpires,
    PasswordResetToken,
    PasswordResetExpires,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(30)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string_len(80).null())
                    .col(ColumnDef::new(Users::LastName).string_len(80).null())
                    .col(ColumnDef::new(Users::Bio).string_len(200).null())
                    .col(ColumnDef::new(Users::Location).string_len(80).null())
                    .col(ColumnDef::new(Users::BirthDate).date().null())
                    .col(
                        ColumnDef::new(Users::Timezone)
                            .string_len(50)
                            .not_null()
                            .default("UTC"),
                    )
                    .col(ColumnDef::new(Users::AvatarUrl).string().null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(20)
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(Users::SuspendedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Users::EmailVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::EmailVerificationToken)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::EmailVerificationExpires)
                            .timestamp()
                            .null(),
                    )
                    .col(ColumnDef::new(Users::PasswordResetToken).string().null())
                    .col(
                        ColumnDef::new(Users::PasswordResetExpires)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_suspended_at")
                    .table(Users::Table)
                    .col(Users::SuspendedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
