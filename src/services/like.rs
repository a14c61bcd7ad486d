use crate::{
    error::{AppError, AppResult},
    models::{like, Like, User},
    services::{notification::NotificationService, visibility::VisibilityService},
    websocket::hub::NotificationHub,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

pub struct LikeService {
    db: DatabaseConnection,
    hub: NotificationHub,
}

impl LikeService {
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Toggle a like on a workout or comment the user can see.
    /// Returns true if now liked, false if unliked.
    pub async fn toggle(
        &self,
        user_id: i32,
        target_type: &str,
        target_id: i32,
    ) -> AppResult<bool> {
        let owner_id = self.check_target(user_id, target_type, target_id).await?;

        let existing = Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TargetType.eq(target_type))
            .filter(like::Column::TargetId.eq(target_id))
            .one(&self.db)
            .await?;

        if let Some(existing) = existing {
            Like::delete_by_id(existing.id).exec(&self.db).await?;
            Ok(false)
        } else {
            let now = chrono::Utc::now().naive_utc();
            let model = like::ActiveModel {
                user_id: sea_orm::ActiveValue::Set(user_id),
                target_type: sea_orm::ActiveValue::Set(target_type.to_string()),
                target_id: sea_orm::ActiveValue::Set(target_id),
                created_at: sea_orm::ActiveValue::Set(now),
                ..Default::default()
            };
            model.insert(&self.db).await?;

            let actor = User::find_by_id(user_id)
                .one(&self.db)
                .await?
                .ok_or(AppError::Unauthorized)?;
            let event_type = match target_type {
                "workout" => "workout_like",
                _ => "comment_like",
            };
            let message = match target_type {
                "workout" => format!("{} liked your workout", actor.username),
                _ => format!("{} liked your comment", actor.username),
            };
            NotificationService::new(self.db.clone(), self.hub.clone())
                .notify(
                    owner_id,
                    Some(user_id),
                    event_type,
                    Some(target_type),
                    Some(target_id),
                    &message,
                )
                .await?;

            Ok(true)
        }
    }

    pub async fn count(&self, target_type: &str, target_id: i32) -> AppResult<u64> {
        let count = Like::find()
            .filter(like::Column::TargetType.eq(target_type))
            .filter(like::Column::TargetId.eq(target_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn has_liked(
        &self,
        user_id: i32,
        target_type: &str,
        target_id: i32,
    ) -> AppResult<bool> {
        let count = Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TargetType.eq(target_type))
            .filter(like::Column::TargetId.eq(target_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Validate the target exists and is visible to the user; returns the
    /// target owner's id.
    async fn check_target(
        &self,
        user_id: i32,
        target_type: &str,
        target_id: i32,
    ) -> AppResult<i32> {
        let visibility = VisibilityService::new(self.db.clone());
        match target_type {
            "workout" => {
                let workout = crate::services::workout::WorkoutService::new(self.db.clone())
                    .get_by_id(target_id)
                    .await?;
                if !visibility
                    .can_view_workout(
                        user_id,
                        workout.user_id,
                        &workout.workout_visibility,
                        workout.is_suspended(),
                    )
                    .await?
                {
                    return Err(AppError::NotFound);
                }
                Ok(workout.user_id)
            }
            "comment" => {
                let comment = crate::services::comment::CommentService::new(
                    self.db.clone(),
                    self.hub.clone(),
                )
                .get_by_id(target_id)
                .await?;
                if !visibility.can_view_comment(user_id, &comment).await? {
                    return Err(AppError::NotFound);
                }
                Ok(comment.user_id)
            }
            _ => Err(AppError::Validation(
                "target_type must be 'workout' or 'comment'".to_string(),
            )),
        }
    }
}
