use crate::{
    error::{AppError, AppResult},
    models::{
        admin_action, appeal, comment, user, workout, AdminAction, AdminActionModel, Appeal,
        AppealModel, Comment, Report, User, UserModel, Workout,
    },
    models::admin_action::ACTION_TYPES,
    services::{email::EmailService, notification::NotificationService},
    websocket::hub::NotificationHub,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

pub struct ModerationService {
    db: DatabaseConnection,
    hub: NotificationHub,
    email: EmailService,
}

impl ModerationService {
    pub fn new(db: DatabaseConnection, hub: NotificationHub, email: EmailService) -> Self {
        Self { db, hub, email }
    }

    /// Take a moderation action on a report's target: suspend/unsuspend the
    /// user, workout or comment, or issue/lift a warning. The affected user
    /// is notified and emailed.
    pub async fn create_action(
        &self,
        admin_id: i32,
        report_id: i32,
        action_type: &str,
        reason: Option<&str>,
    ) -> AppResult<AdminActionModel> {
        if !ACTION_TYPES.contains(&action_type)
            || action_type == "report_resolution"
            || action_type == "report_reopening"
        {
            return Err(AppError::Validation(format!(
                "invalid action type '{}'",
                action_type
            )));
        }

        let report = Report::find_by_id(report_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        // Resolve the affected user and content from the report.
        let (user_id, workout_id, comment_id) = match action_type {
            "workout_suspension" | "workout_unsuspension" => {
                let workout_id = report.reported_workout_id.ok_or_else(|| {
                    AppError::Validation("report does not target a workout".to_string())
                })?;
                let workout = Workout::find_by_id(workout_id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::NotFound)?;
                (workout.user_id, Some(workout_id), None)
            }
            "comment_suspension" | "comment_unsuspension" => {
                let comment_id = report.reported_comment_id.ok_or_else(|| {
                    AppError::Validation("report does not target a comment".to_string())
                })?;
                let comment = Comment::find_by_id(comment_id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::NotFound)?;
                (comment.user_id, None, Some(comment_id))
            }
            _ => {
                // user_* actions apply to the reported object's owner
                let user_id = match report.object_type.as_str() {
                    "user" => report.reported_user_id,
                    "workout" => {
                        let workout_id = report.reported_workout_id.ok_or(AppError::NotFound)?;
                        Workout::find_by_id(workout_id)
                            .one(&self.db)
                            .await?
                            .map(|w| w.user_id)
                    }
                    _ => {
                        let comment_id = report.reported_comment_id.ok_or(AppError::NotFound)?;
                        Comment::find_by_id(comment_id)
                            .one(&self.db)
                            .await?
                            .map(|c| c.user_id)
                    }
                }
                .ok_or(AppError::NotFound)?;
                (user_id, None, None)
            }
        };

        self.create_action_raw(
            admin_id,
            Some(report_id),
            action_type,
            reason,
            user_id,
            workout_id,
            comment_id,
        )
        .await
    }

    /// Latest account suspension action for a user, with its appeal if any.
    pub async fn latest_account_suspension(
        &self,
        user_id: i32,
    ) -> AppResult<(AdminActionModel, Option<AppealModel>)> {
        let action = AdminAction::find()
            .filter(admin_action::Column::UserId.eq(user_id))
            .filter(admin_action::Column::ActionType.eq("user_suspension"))
            .order_by_desc(admin_action::Column::CreatedAt)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let appeal = Appeal::find()
            .filter(appeal::Column::ActionId.eq(action.id))
            .one(&self.db)
            .await?;

        Ok((action, appeal))
    }

    /// Appeal the latest account suspension.
    pub async fn appeal_account_suspension(
        &self,
        user_id: i32,
        text: &str,
    ) -> AppResult<AppealModel> {
        let user = self.get_user(user_id).await?;
        if !user.is_suspended() {
            return Err(AppError::Validation(
                "account is not suspended".to_string(),
            ));
        }

        let (action, _) = self.latest_account_suspension(user_id).await?;
        self.appeal(user_id, action.id, text).await
    }

    /// Appeal a suspension or warning. One appeal per action.
    pub async fn appeal(&self, user_id: i32, action_id: i32, text: &str) -> AppResult<AppealModel> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("text is required".to_string()));
        }

        let action = AdminAction::find_by_id(action_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if action.user_id != Some(user_id) {
            return Err(AppError::Forbidden);
        }
        if !action.is_appealable() {
            return Err(AppError::Validation(
                "this action cannot be appealed".to_string(),
            ));
        }

        let existing = Appeal::find()
            .filter(appeal::Column::ActionId.eq(action_id))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "An appeal already exists for this action".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let model = appeal::ActiveModel {
            action_id: sea_orm::ActiveValue::Set(action_id),
            user_id: sea_orm::ActiveValue::Set(user_id),
            text: sea_orm::ActiveValue::Set(text.to_string()),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        let saved = model.insert(&self.db).await?;

        let user = self.get_user(user_id).await?;
        let event_type = if action.action_type == "user_warning" {
            "user_warning_appeal"
        } else {
            "suspension_appeal"
        };
        NotificationService::new(self.db.clone(), self.hub.clone())
            .notify_admins(
                Some(user_id),
                event_type,
                Some("appeal"),
                Some(saved.id),
                &format!("{} appealed a moderation action", user.username),
            )
            .await?;

        Ok(saved)
    }

    pub async fn list_appeals(
        &self,
        pending_only: bool,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<AppealModel>, u64)> {
        let mut query = Appeal::find();
        if pending_only {
            query = query.filter(appeal::Column::Approved.is_null());
        }

        let paginator = query
            .order_by_desc(appeal::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let appeals = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((appeals, total))
    }

    /// Process a pending appeal. Approval lifts the sanction through the
    /// inverse moderation action.
    pub async fn process_appeal(
        &self,
        appeal_id: i32,
        admin_id: i32,
        approved: bool,
        reason: Option<&str>,
    ) -> AppResult<AppealModel> {
        let appeal = Appeal::find_by_id(appeal_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if appeal.approved.is_some() {
            return Err(AppError::Validation(
                "Appeal has already been processed".to_string(),
            ));
        }

        let action = AdminAction::find_by_id(appeal.action_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();
        let mut active: appeal::ActiveModel = appeal.clone().into();
        active.approved = sea_orm::ActiveValue::Set(Some(approved));
        active.reason = sea_orm::ActiveValue::Set(reason.map(|s| s.to_string()));
        active.updated_at = sea_orm::ActiveValue::Set(Some(now));
        let updated = active.update(&self.db).await?;

        if approved {
            let inverse = match action.action_type.as_str() {
                "user_suspension" => "user_unsuspension",
                "user_warning" => "user_warning_lifting",
                "workout_suspension" => "workout_unsuspension",
                "comment_suspension" => "comment_unsuspension",
                _ => return Err(AppError::Validation("action cannot be lifted".to_string())),
            };
            self.create_action_raw(
                admin_id,
                action.report_id,
                inverse,
                reason,
                appeal.user_id,
                action.workout_id,
                action.comment_id,
            )
            .await?;
        }

        Ok(updated)
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_action_raw(
        &self,
        admin_id: i32,
        report_id: Option<i32>,
        action_type: &str,
        reason: Option<&str>,
        user_id: i32,
        workout_id: Option<i32>,
        comment_id: Option<i32>,
    ) -> AppResult<AdminActionModel> {
        let affected = self.get_user(user_id).await?;
        self.apply_effect(action_type, &affected, workout_id, comment_id, report_id)
            .await?;

        let now = chrono::Utc::now().naive_utc();
        let model = admin_action::ActiveModel {
            report_id: sea_orm::ActiveValue::Set(report_id),
            admin_id: sea_orm::ActiveValue::Set(admin_id),
            user_id: sea_orm::ActiveValue::Set(Some(user_id)),
            workout_id: sea_orm::ActiveValue::Set(workout_id),
            comment_id: sea_orm::ActiveValue::Set(comment_id),
            action_type: sea_orm::ActiveValue::Set(action_type.to_string()),
            reason: sea_orm::ActiveValue::Set(reason.map(|s| s.to_string())),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        let saved = model.insert(&self.db).await?;

        // The affected user is notified without revealing the moderator.
        NotificationService::new(self.db.clone(), self.hub.clone())
            .notify(
                user_id,
                None,
                action_type,
                saved.workout_id.map(|_| "workout").or(saved
                    .comment_id
                    .map(|_| "comment")),
                saved.workout_id.or(saved.comment_id),
                &moderation_message(action_type),
            )
            .await?;

        if let Err(e) = self
            .email
            .send_moderation_email(&affected.email, &affected.username, action_type, reason)
            .await
        {
            tracing::warn!("Failed to send moderation email: {e}");
        }

        Ok(saved)
    }

    async fn apply_effect(
        &self,
        action_type: &str,
        affected: &UserModel,
        workout_id: Option<i32>,
        comment_id: Option<i32>,
        report_id: Option<i32>,
    ) -> AppResult<()> {
        let now = chrono::Utc::now().naive_utc();

        match action_type {
            "user_suspension" => {
                if affected.is_admin() {
                    return Err(AppError::Validation(
                        "admin accounts cannot be suspended".to_string(),
                    ));
                }
                if affected.is_suspended() {
                    return Err(AppError::Validation(
                        "user account is already suspended".to_string(),
                    ));
                }
                let mut active: user::ActiveModel = affected.clone().into();
                active.suspended_at = sea_orm::ActiveValue::Set(Some(now));
                active.updated_at = sea_orm::ActiveValue::Set(now);
                active.update(&self.db).await?;
            }
            "user_unsuspension" => {
                if !affected.is_suspended() {
                    return Err(AppError::Validation(
                        "user account is not suspended".to_string(),
                    ));
                }
                let mut active: user::ActiveModel = affected.clone().into();
                active.suspended_at = sea_orm::ActiveValue::Set(None);
                active.updated_at = sea_orm::ActiveValue::Set(now);
                active.update(&self.db).await?;
            }
            "user_warning" => {
                // A warning has no state change, but is only issued once
                // per report and user.
                if let Some(report_id) = report_id {
                    let existing = AdminAction::find()
                        .filter(admin_action::Column::ReportId.eq(report_id))
                        .filter(admin_action::Column::UserId.eq(affected.id))
                        .filter(admin_action::Column::ActionType.eq("user_warning"))
                        .count(&self.db)
                        .await?;
                    if existing > 0 {
                        return Err(AppError::Conflict(
                            "A warning already exists for this report".to_string(),
                        ));
                    }
                }
            }
            "user_warning_lifting" => {}
            "workout_suspension" | "workout_unsuspension" => {
                let workout_id = workout_id.ok_or(AppError::NotFound)?;
                let workout = Workout::find_by_id(workout_id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::NotFound)?;
                let suspend = action_type == "workout_suspension";
                if suspend == workout.is_suspended() {
                    return Err(AppError::Validation(if suspend {
                        "workout is already suspended".to_string()
                    } else {
                        "workout is not suspended".to_string()
                    }));
                }
                let mut active: workout::ActiveModel = workout.into();
                active.suspended_at =
                    sea_orm::ActiveValue::Set(if suspend { Some(now) } else { None });
                active.updated_at = sea_orm::ActiveValue::Set(Some(now));
                active.update(&self.db).await?;
            }
            "comment_suspension" | "comment_unsuspension" => {
                let comment_id = comment_id.ok_or(AppError::NotFound)?;
                let comment = Comment::find_by_id(comment_id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::NotFound)?;
                let suspend = action_type == "comment_suspension";
                if suspend == comment.is_suspended() {
                    return Err(AppError::Validation(if suspend {
                        "comment is already suspended".to_string()
                    } else {
                        "comment is not suspended".to_string()
                    }));
                }
                let mut active: comment::ActiveModel = comment.into();
                active.suspended_at =
                    sea_orm::ActiveValue::Set(if suspend { Some(now) } else { None });
                active.updated_at = sea_orm::ActiveValue::Set(Some(now));
                active.update(&self.db).await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn get_user(&self, user_id: i32) -> AppResult<UserModel> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}

fn moderation_message(action_type: &str) -> String {
    match action_type {
        "user_suspension" => "Your account has been suspended",
        "user_unsuspension" => "Your account has been reactivated",
        "user_warning" => "You have received a warning",
        "user_warning_lifting" => "Your warning has been lifted",
        "workout_suspension" => "One of your workouts has been suspended",
        "workout_unsuspension" => "Your workout has been reinstated",
        "comment_suspension" => "One of your comments has been suspended",
        "comment_unsuspension" => "Your comment has been reinstated",
        _ => "A moderation action has been taken",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_messages_cover_sanctions() {
        assert!(moderation_message("user_suspension").contains("suspended"));
        assert!(moderation_message("user_unsuspension").contains("reactivated"));
        assert!(moderation_message("user_warning").contains("warning"));
        assert!(moderation_message("workout_suspension").contains("workout"));
        assert!(moderation_message("comment_suspension").contains("comment"));
    }
}
