use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Workouts {
    Table,
    Id,
    UserId,
    SportId,
    Title,
    WorkoutDate,
    DurationSeconds,
    PausesSeconds,
    MovingSeconds,
    DistanceKm,
    MinAlt,
    MaxAlt,
    Ascent,
    Descent,
    MaxSpeed,
    AveSpeed,
    GpxPath,
    MapId,
    MapPath,
    Bounds,
    Notes,
    WorkoutVisibility,
    MapVisibility,
    SuspendedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Sports {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Workouts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Workouts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Workouts::UserId).integer().not_null())
                    .col(ColumnDef::new(Workouts::SportId).integer().not_null())
                    .col(ColumnDef::new(Workouts::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Workouts::WorkoutDate).timestamp().not_null())
                    .col(
                        ColumnDef::new(Workouts::DurationSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Workouts::PausesSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Workouts::MovingSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Workouts::DistanceKm)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Workouts::MinAlt).double().null())
                    .col(ColumnDef::new(Workouts::MaxAlt).double().null())
                    .col(ColumnDef::new(Workouts::Ascent).double().null())
                    .col(ColumnDef::new(Workouts::Descent).double().null())
                    .col(ColumnDef::new(Workouts::MaxSpeed).double().null())
                    .col(ColumnDef::new(Workouts::AveSpeed).double().null())
                    .col(ColumnDef::new(Workouts::GpxPath).string().null())
                    .col(ColumnDef::new(Workouts::MapId).string_len(50).null())
                    .col(ColumnDef::new(Workouts::MapPath).string().null())
                    .col(ColumnDef::new(Workouts::Bounds).json().null())
                    .col(ColumnDef::new(Workouts::Notes).text().null())
                    .col(
                        ColumnDef::new(Workouts::WorkoutVisibility)
                            .string_len(20)
                            .not_null()
                            .default("private"),
                    )
                    .col(
                        ColumnDef::new(Workouts::MapVisibility)
                            .string_len(20)
                            .not_null()
                            .default("private"),
                    )
                    .col(ColumnDef::new(Workouts::SuspendedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Workouts::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Workouts::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workouts_user_id")
                            .from(Workouts::Table, Workouts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workouts_sport_id")
                            .from(Workouts::Table, Workouts::SportId)
                            .to(Sports::Table, Sports::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workouts_user_date")
                    .table(Workouts::Table)
                    .col(Workouts::UserId)
                    .col(Workouts::WorkoutDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workouts_map_id")
                    .table(Workouts::Table)
                    .col(Workouts::MapId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Workouts::Table).to_owned())
            .await
    }
}
