use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Exactly one reported-object column must be set, matching object_type.
        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS reports (
                id SERIAL PRIMARY KEY,
                reported_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                object_type VARCHAR(20) NOT NULL,
                reported_comment_id INTEGER REFERENCES comments(id) ON DELETE CASCADE,
                reported_user_id INTEGER REFERENCES users(id) ON DELETE CASCADE,
                reported_workout_id INTEGER REFERENCES workouts(id) ON DELETE CASCADE,
                note TEXT NOT NULL,
                resolved BOOLEAN NOT NULL DEFAULT FALSE,
                resolved_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
                resolved_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP,
                CHECK (object_type IN ('comment', 'user', 'workout')),
                CHECK (
                    (reported_comment_id IS NOT NULL)::int +
                    (reported_user_id IS NOT NULL)::int +
                    (reported_workout_id IS NOT NULL)::int = 1
                ),
                CHECK (
                    (object_type = 'comment' AND reported_comment_id IS NOT NULL) OR
                    (object_type = 'user' AND reported_user_id IS NOT NULL) OR
                    (object_type = 'workout' AND reported_workout_id IS NOT NULL)
                )
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_reports_reported_by ON reports(reported_by)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_reports_resolved ON reports(resolved)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_reports_object_type ON reports(object_type)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS reports")
            .await?;
        Ok(())
    }
}
