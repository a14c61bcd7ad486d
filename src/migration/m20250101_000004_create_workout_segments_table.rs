use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS workout_segments (
                id SERIAL PRIMARY KEY,
                workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
                segment_index INTEGER NOT NULL,
                duration_seconds INTEGER NOT NULL DEFAULT 0,
                pauses_seconds INTEGER NOT NULL DEFAULT 0,
                moving_seconds INTEGER NOT NULL DEFAULT 0,
                distance_km DOUBLE PRECISION NOT NULL DEFAULT 0,
                min_alt DOUBLE PRECISION,
                max_alt DOUBLE PRECISION,
                ascent DOUBLE PRECISION,
                descent DOUBLE PRECISION,
                max_speed DOUBLE PRECISION,
                ave_speed DOUBLE PRECISION,
                UNIQUE (workout_id, segment_index)
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_workout_segments_workout ON workout_segments(workout_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS workout_segments")
            .await?;
        Ok(())
    }
}
