use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS sports (
                id SERIAL PRIMARY KEY,
                label VARCHAR(50) NOT NULL UNIQUE,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                stopped_speed_threshold DOUBLE PRECISION NOT NULL DEFAULT 1.0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .await?;

        // Default sport catalogue
        db.execute_unprepared(
            "INSERT INTO sports (label, stopped_speed_threshold) VALUES
                ('Cycling (Sport)', 1.0),
                ('Cycling (Transport)', 1.0),
                ('Hiking', 0.1),
                ('Mountain Biking', 1.0),
                ('Running', 0.1),
                ('Walking', 0.1)
            ON CONFLICT (label) DO NOTHING",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS sports").await?;
        Ok(())
    }
}
