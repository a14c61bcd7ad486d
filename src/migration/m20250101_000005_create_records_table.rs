use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS records (
                id SERIAL PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                sport_id INTEGER NOT NULL REFERENCES sports(id),
                workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
                record_type VARCHAR(2) NOT NULL,
                value DOUBLE PRECISION NOT NULL,
                workout_date TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                CHECK (record_type IN ('AS', 'FD', 'LD', 'MS'))
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_records_user_sport_type
                ON records(user_id, sport_id, record_type)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS records")
            .await?;
        Ok(())
    }
}
