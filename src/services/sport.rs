use crate::{
    error::{AppError, AppResult},
    models::{sport, Sport, SportModel},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder};

pub struct SportService {
    db: DatabaseConnection,
}

impl SportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<SportModel>> {
        let sports = Sport::find()
            .order_by_asc(sport::Column::Label)
            .all(&self.db)
            .await?;
        Ok(sports)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<SportModel> {
        Sport::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_active_by_id(&self, id: i32) -> AppResult<SportModel> {
        let sport = self.get_by_id(id).await?;
        if !sport.is_active {
            return Err(AppError::Validation(format!(
                "Sport '{}' is inactive",
                sport.label
            )));
        }
        Ok(sport)
    }

    /// Admin: toggle availability or tune the moving-time threshold.
    pub async fn update(
        &self,
        id: i32,
        is_active: Option<bool>,
        stopped_speed_threshold: Option<f64>,
    ) -> AppResult<SportModel> {
        if let Some(threshold) = stopped_speed_threshold {
            if threshold < 0.0 {
                return Err(AppError::Validation(
                    "stopped_speed_threshold must be >= 0".to_string(),
                ));
            }
        }

        let existing = self.get_by_id(id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: sport::ActiveModel = existing.into();
        if let Some(is_active) = is_active {
            active.is_active = sea_orm::ActiveValue::Set(is_active);
        }
        if let Some(threshold) = stopped_speed_threshold {
            active.stopped_speed_threshold = sea_orm::ActiveValue::Set(threshold);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }
}
