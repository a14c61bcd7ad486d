use crate::{
    error::{AppError, AppResult},
    models::{follow, mention, Follow, Mention},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

pub const VISIBILITY_LEVELS: &[&str] = &["private", "followers_only", "public"];

pub fn validate_visibility(value: &str) -> AppResult<()> {
    if !VISIBILITY_LEVELS.contains(&value) {
        return Err(AppError::Validation(format!(
            "visibility must be one of: {}",
            VISIBILITY_LEVELS.join(", ")
        )));
    }
    Ok(())
}

/// Audience check shared by workouts and comments.
pub fn audience_allows(visibility: &str, is_owner: bool, is_follower: bool) -> bool {
    if is_owner {
        return true;
    }
    match visibility {
        "public" => true,
        "followers_only" => is_follower,
        _ => false,
    }
}

pub struct VisibilityService {
    db: DatabaseConnection,
}

impl VisibilityService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn is_following(&self, follower_id: i32, following_id: i32) -> AppResult<bool> {
        if follower_id == following_id {
            return Ok(true);
        }
        let count = Follow::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Whether `viewer_id` may see a workout owned by `owner_id`.
    /// Suspended workouts are only shown to their owner.
    pub async fn can_view_workout(
        &self,
        viewer_id: i32,
        owner_id: i32,
        visibility: &str,
        suspended: bool,
    ) -> AppResult<bool> {
        if viewer_id == owner_id {
            return Ok(true);
        }
        if suspended {
            return Ok(false);
        }
        let is_follower = match visibility {
            "followers_only" => self.is_following(viewer_id, owner_id).await?,
            _ => false,
        };
        Ok(audience_allows(visibility, false, is_follower))
    }

    /// Whether `viewer_id` may see a comment. Mentioned users always see
    /// the comment that mentions them.
    pub async fn can_view_comment(
        &self,
        viewer_id: i32,
        comment: &crate::models::CommentModel,
    ) -> AppResult<bool> {
        if viewer_id == comment.user_id {
            return Ok(true);
        }
        if comment.is_suspended() {
            return Ok(false);
        }

        let mentioned = Mention::find()
            .filter(mention::Column::CommentId.eq(comment.id))
            .filter(mention::Column::UserId.eq(viewer_id))
            .count(&self.db)
            .await?
            > 0;
        if mentioned {
            return Ok(true);
        }

        let is_follower = match comment.text_visibility.as_str() {
            "followers_only" => self.is_following(viewer_id, comment.user_id).await?,
            _ => false,
        };
        Ok(audience_allows(&comment.text_visibility, false, is_follower))
    }
}
