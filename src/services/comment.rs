use crate::{
    error::{AppError, AppResult},
    models::{comment, mention, user, Comment, CommentModel, Mention, User},
    services::{notification::NotificationService, visibility::VisibilityService},
    utils::extract_mentions,
    websocket::hub::NotificationHub,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use std::collections::HashSet;

pub struct CommentService {
    db: DatabaseConnection,
    hub: NotificationHub,
}

impl CommentService {
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Create a comment on a workout the author can see.
    /// Mentioned users, the replied-to author and the workout owner are
    /// notified, each at most once.
    pub async fn create(
        &self,
        user_id: i32,
        workout_id: i32,
        text: &str,
        text_visibility: &str,
        reply_to: Option<i32>,
    ) -> AppResult<CommentModel> {
        crate::services::visibility::validate_visibility(text_visibility)?;

        let workout = crate::services::workout::WorkoutService::new(self.db.clone())
            .get_by_id(workout_id)
            .await?;

        let visibility = VisibilityService::new(self.db.clone());
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

        let mut reply_author: Option<i32> = None;
        if let Some(reply_id) = reply_to {
            let parent = Comment::find_by_id(reply_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::Validation("Comment to reply to not found".to_string()))?;
            if parent.workout_id != workout_id {
                return Err(AppError::Validation(
                    "Comment to reply to belongs to a different workout".to_string(),
                ));
            }
            reply_author = Some(parent.user_id);
        }

        let now = chrono::Utc::now().naive_utc();
        let model = comment::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            workout_id: sea_orm::ActiveValue::Set(workout_id),
            text: sea_orm::ActiveValue::Set(text.to_string()),
            text_visibility: sea_orm::ActiveValue::Set(text_visibility.to_string()),
            reply_to: sea_orm::ActiveValue::Set(reply_to),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        let saved = model.insert(&self.db).await?;

        let mentioned = self.create_mentions(&saved, text).await?;

        let author = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let notifications = NotificationService::new(self.db.clone(), self.hub.clone());

        for mentioned_id in &mentioned {
            notifications
                .notify(
                    *mentioned_id,
                    Some(user_id),
                    "mention",
                    Some("comment"),
                    Some(saved.id),
                    &format!("{} mentioned you in a comment", author.username),
                )
                .await?;
        }

        if let Some(reply_author) = reply_author {
            if !mentioned.contains(&reply_author) {
                notifications
                    .notify(
                        reply_author,
                        Some(user_id),
                        "comment_reply",
                        Some("comment"),
                        Some(saved.id),
                        &format!("{} replied to your comment", author.username),
                    )
                    .await?;
            }
        }

        if !mentioned.contains(&workout.user_id) && reply_author != Some(workout.user_id) {
            notifications
                .notify(
                    workout.user_id,
                    Some(user_id),
                    "workout_comment",
                    Some("comment"),
                    Some(saved.id),
                    &format!("{} commented on your workout", author.username),
                )
                .await?;
        }

        Ok(saved)
    }

    /// Comments on a workout, filtered to what the viewer may see.
    /// Suspended comments are only returned to their author.
    pub async fn list_for_workout(
        &self,
        workout_id: i32,
        viewer_id: i32,
    ) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::WorkoutId.eq(workout_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let visibility = VisibilityService::new(self.db.clone());
        let mut visible = Vec::new();
        for comment in comments {
            if visibility.can_view_comment(viewer_id, &comment).await? {
                visible.push(comment);
            }
        }
        Ok(visible)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CommentModel> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Update comment text (author only). Mentions are re-extracted; only
    /// newly mentioned users are notified.
    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        text: &str,
        text_visibility: Option<&str>,
    ) -> AppResult<CommentModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        if let Some(visibility) = text_visibility {
            crate::services::visibility::validate_visibility(visibility)?;
        }

        let previously_mentioned: HashSet<i32> = Mention::find()
            .filter(mention::Column::CommentId.eq(id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.user_id)
            .collect();

        let now = chrono::Utc::now().naive_utc();
        let mut active: comment::ActiveModel = existing.into();
        active.text = sea_orm::ActiveValue::Set(text.to_string());
        if let Some(visibility) = text_visibility {
            active.text_visibility = sea_orm::ActiveValue::Set(visibility.to_string());
        }
        active.updated_at = sea_orm::ActiveValue::Set(Some(now));
        let updated = active.update(&self.db).await?;

        Mention::delete_many()
            .filter(mention::Column::CommentId.eq(id))
            .exec(&self.db)
            .await?;
        let mentioned = self.create_mentions(&updated, text).await?;

        let author = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let notifications = NotificationService::new(self.db.clone(), self.hub.clone());
        for mentioned_id in mentioned.difference(&previously_mentioned) {
            notifications
                .notify(
                    *mentioned_id,
                    Some(user_id),
                    "mention",
                    Some("comment"),
                    Some(updated.id),
                    &format!("{} mentioned you in a comment", author.username),
                )
                .await?;
        }

        Ok(updated)
    }

    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        Comment::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn create_mentions(
        &self,
        comment: &CommentModel,
        text: &str,
    ) -> AppResult<HashSet<i32>> {
        let usernames = extract_mentions(text);
        if usernames.is_empty() {
            return Ok(HashSet::new());
        }

        let users = User::find()
            .filter(user::Column::Username.is_in(usernames))
            .all(&self.db)
            .await?;

        let now = chrono::Utc::now().naive_utc();
        let mut mentioned = HashSet::new();
        for user in users {
            let model = mention::ActiveModel {
                comment_id: sea_orm::ActiveValue::Set(comment.id),
                user_id: sea_orm::ActiveValue::Set(user.id),
                created_at: sea_orm::ActiveValue::Set(now),
                ..Default::default()
            };
            model.insert(&self.db).await?;
            mentioned.insert(user.id);
        }
        Ok(mentioned)
    }
}
