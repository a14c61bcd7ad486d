use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_sports_table;
mod m20250101_000003_create_workouts_table;
mod m20250101_000004_create_workout_segments_table;
mod m20250101_000005_create_records_table;
mod m20250101_000006_create_follows_table;
mod m20250101_000007_create_comments_table;
mod m20250101_000008_create_mentions_table;
mod m20250101_000009_create_likes_table;
mod m20250101_000010_create_notifications_table;
mod m20250101_000011_create_reports_table;
mod m20250101_000012_create_report_comments_table;
mod m20250101_000013_create_admin_actions_table;
mod m20250101_000014_create_appeals_table;
mod m20250101_000015_create_refresh_tokens;
mod m20250101_000016_add_performance_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_sports_table::Migration),
            Box::new(m20250101_000003_create_workouts_table::Migration),
            Box::new(m20250101_000004_create_workout_segments_table::Migration),
            Box::new(m20250101_000005_create_records_table::Migration),
            Box::new(m20250101_000006_create_follows_table::Migration),
            Box::new(m20250101_000007_create_comments_table::Migration),
            Box::new(m20250101_000008_create_mentions_table::Migration),
            Box::new(m20250101_000009_create_likes_table::Migration),
            Box::new(m20250101_000010_create_notifications_table::Migration),
            Box::new(m20250101_000011_create_reports_table::Migration),
            Box::new(m20250101_000012_create_report_comments_table::Migration),
            Box::new(m20250101_000013_create_admin_actions_table::Migration),
            Box::new(m20250101_000014_create_appeals_table::Migration),
            Box::new(m20250101_000015_create_refresh_tokens::Migration),
            Box::new(m20250101_000016_add_performance_indexes::Migration),
        ]
    }
}
