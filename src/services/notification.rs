use crate::{
    error::AppResult,
    models::{notification, user, Notification, NotificationModel, User},
    websocket::hub::NotificationHub,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

pub struct NotificationService {
    db: DatabaseConnection,
    hub: NotificationHub,
}

impl NotificationService {
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    pub async fn notify(
        &self,
        user_id: i32,
        actor_id: Option<i32>,
        event_type: &str,
        object_type: Option<&str>,
        object_id: Option<i32>,
        message: &str,
    ) -> AppResult<()> {
        // Don't notify yourself
        if actor_id == Some(user_id) {
            return Ok(());
        }

        let now = chrono::Utc::now().naive_utc();
        let model = notification::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            actor_id: sea_orm::ActiveValue::Set(actor_id),
            event_type: sea_orm::ActiveValue::Set(event_type.to_string()),
            object_type: sea_orm::ActiveValue::Set(object_type.map(|s| s.to_string())),
            object_id: sea_orm::ActiveValue::Set(object_id),
            message: sea_orm::ActiveValue::Set(message.to_string()),
            is_read: sea_orm::ActiveValue::Set(false),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;

        // Push via WebSocket
        let json = serde_json::json!({
            "type": "notification",
            "data": {
                "id": saved.id,
                "event_type": &saved.event_type,
                "message": &saved.message,
                "object_type": &saved.object_type,
                "object_id": saved.object_id,
                "created_at": saved.created_at.to_string(),
            }
        });
        self.hub.send_to_user(user_id, &json.to_string());

        Ok(())
    }

    /// Fan out an event to every active admin (verified, not suspended),
    /// skipping the acting user.
    pub async fn notify_admins(
        &self,
        actor_id: Option<i32>,
        event_type: &str,
        object_type: Option<&str>,
        object_id: Option<i32>,
        message: &str,
    ) -> AppResult<()> {
        let admins = User::find()
            .filter(user::Column::Role.eq("admin"))
            .filter(user::Column::EmailVerified.eq(true))
            .filter(user::Column::SuspendedAt.is_null())
            .all(&self.db)
            .await?;

        for admin in admins {
            if actor_id == Some(admin.id) {
                continue;
            }
            self.notify(admin.id, actor_id, event_type, object_type, object_id, message)
                .await?;
        }
        Ok(())
    }

    pub async fn list_for_user(
        &self,
        user_id: i32,
        read_status: Option<bool>,
        event_type: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<NotificationModel>, u64)> {
        let mut query = Notification::find().filter(notification::Column::UserId.eq(user_id));

        if let Some(read) = read_status {
            query = query.filter(notification::Column::IsRead.eq(read));
        }
        if let Some(event_type) = event_type {
            query = query.filter(notification::Column::EventType.eq(event_type));
        }

        let paginator = query
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn unread_count(&self, user_id: i32) -> AppResult<u64> {
        let count = Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = Notification::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(crate::error::AppError::NotFound)?;

        if existing.user_id != user_id {
            return Err(crate::error::AppError::Forbidden);
        }

        let mut active: notification::ActiveModel = existing.into();
        active.is_read = sea_orm::ActiveValue::Set(true);
        active.update(&self.db).await?;
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: i32) -> AppResult<u64> {
        use sea_orm::sea_query::Expr;
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    fn should_notify(user_id: i32, actor_id: Option<i32>) -> bool {
        actor_id != Some(user_id)
    }

    #[test]
    fn no_self_notification() {
        assert!(!should_notify(1, Some(1)));
    }

    #[test]
    fn notifies_other_user() {
        assert!(should_notify(1, Some(2)));
    }

    #[test]
    fn system_events_always_notify() {
        assert!(should_notify(1, None));
    }
}
