use crate::{
    error::{AppError, AppResult},
    models::{follow, user, workout, Follow, User, UserModel, Workout},
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub timezone: Option<String>,
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<UserModel> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Follower / following / workout counts for profile serialization.
    pub async fn profile_counts(&self, user_id: i32) -> AppResult<(u64, u64, u64)> {
        let followers = Follow::find()
            .filter(follow::Column::FollowingId.eq(user_id))
            .count(&self.db)
            .await?;
        let following = Follow::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .count(&self.db)
            .await?;
        let workouts = Workout::find()
            .filter(workout::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok((followers, following, workouts))
    }

    pub async fn update_profile(&self, user_id: i32, update: ProfileUpdate) -> AppResult<UserModel> {
        let user = self.get_by_id(user_id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: user::ActiveModel = user.into();
        if let Some(first_name) = update.first_name {
            active.first_name = sea_orm::ActiveValue::Set(none_if_empty(first_name));
        }
        if let Some(last_name) = update.last_name {
            active.last_name = sea_orm::ActiveValue::Set(none_if_empty(last_name));
        }
        if let Some(bio) = update.bio {
            active.bio = sea_orm::ActiveValue::Set(none_if_empty(bio));
        }
        if let Some(location) = update.location {
            active.location = sea_orm::ActiveValue::Set(none_if_empty(location));
        }
        if let Some(birth_date) = update.birth_date {
            active.birth_date = sea_orm::ActiveValue::Set(Some(birth_date));
        }
        if let Some(timezone) = update.timezone {
            active.timezone = sea_orm::ActiveValue::Set(timezone);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn update_avatar_url(&self, user_id: i32, url: &str) -> AppResult<()> {
        let user = self.get_by_id(user_id).await?;
        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.avatar_url = sea_orm::ActiveValue::Set(Some(url.to_string()));
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;
        Ok(())
    }

    /// Admin: paginated user list, optionally filtered by username substring.
    pub async fn list_users(
        &self,
        q: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<UserModel>, u64)> {
        let mut query = User::find();
        if let Some(q) = q {
            query = query.filter(user::Column::Username.contains(q));
        }

        let paginator = query
            .order_by_asc(user::Column::Username)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }

    /// Admin: grant or revoke admin role.
    pub async fn update_role(&self, user_id: i32, role: &str) -> AppResult<UserModel> {
        if role != "user" && role != "admin" {
            return Err(AppError::Validation(
                "role must be 'user' or 'admin'".to_string(),
            ));
        }

        let user = self.get_by_id(user_id).await?;
        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.role = sea_orm::ActiveValue::Set(role.to_string());
        // Granting admin rights implies an activated account.
        if role == "admin" {
            active.email_verified = sea_orm::ActiveValue::Set(true);
            active.email_verification_token = sea_orm::ActiveValue::Set(None);
            active.email_verification_expires = sea_orm::ActiveValue::Set(None);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Admin: force-activate an account that never verified its email.
    pub async fn activate_user(&self, user_id: i32) -> AppResult<UserModel> {
        let user = self.get_by_id(user_id).await?;
        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.email_verified = sea_orm::ActiveValue::Set(true);
        active.email_verification_token = sea_orm::ActiveValue::Set(None);
        active.email_verification_expires = sea_orm::ActiveValue::Set(None);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let updated = active.update(&self.db).await?;
        Ok(updated)
    }
}

fn none_if_empty(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
