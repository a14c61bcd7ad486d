use crate::{
    error::{AppError, AppResult},
    models::{
        admin_action, report, report_comment, AdminAction, AdminActionModel, Report, ReportComment,
        ReportCommentModel, ReportModel, User,
    },
    models::report::REPORT_OBJECT_TYPES,
    services::{notification::NotificationService, visibility::VisibilityService},
    websocket::hub::NotificationHub,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

pub struct ReportService {
    db: DatabaseConnection,
    hub: NotificationHub,
}

impl ReportService {
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Raise a report against a comment, a user or a workout.
    /// All active admins (except the reporter) are notified.
    pub async fn create(
        &self,
        reporter_id: i32,
        object_type: &str,
        object_id: i32,
        note: &str,
    ) -> AppResult<ReportModel> {
        if !REPORT_OBJECT_TYPES.contains(&object_type) {
            return Err(AppError::Validation(format!(
                "object_type must be one of: {}",
                REPORT_OBJECT_TYPES.join(", ")
            )));
        }
        if note.trim().is_empty() {
            return Err(AppError::Validation("note is required".to_string()));
        }

        // The reported object must exist and be visible to the reporter.
        let visibility = VisibilityService::new(self.db.clone());
        let (comment_id, user_id, workout_id) = match object_type {
            "comment" => {
                let comment = crate::services::comment::CommentService::new(
                    self.db.clone(),
                    self.hub.clone(),
                )
                .get_by_id(object_id)
                .await?;
                if !visibility.can_view_comment(reporter_id, &comment).await? {
                    return Err(AppError::NotFound);
                }
                (Some(comment.id), None, None)
            }
            "user" => {
                let user = User::find_by_id(object_id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::NotFound)?;
                if user.id == reporter_id {
                    return Err(AppError::Validation(
                        "Users cannot report their own account".to_string(),
                    ));
                }
                (None, Some(user.id), None)
            }
            "workout" => {
                let workout = crate::services::workout::WorkoutService::new(self.db.clone())
                    .get_by_id(object_id)
                    .await?;
                if !visibility
                    .can_view_workout(
                        reporter_id,
                        workout.user_id,
                        &workout.workout_visibility,
                        workout.is_suspended(),
                    )
                    .await?
                {
                    return Err(AppError::NotFound);
                }
                (None, None, Some(workout.id))
            }
            _ => unreachable!(),
        };

        // One open report per reporter and object.
        let duplicate = self
            .find_unresolved(reporter_id, object_type, object_id)
            .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict(
                "A report already exists for this object".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let model = report::ActiveModel {
            reported_by: sea_orm::ActiveValue::Set(reporter_id),
            object_type: sea_orm::ActiveValue::Set(object_type.to_string()),
            reported_comment_id: sea_orm::ActiveValue::Set(comment_id),
            reported_user_id: sea_orm::ActiveValue::Set(user_id),
            reported_workout_id: sea_orm::ActiveValue::Set(workout_id),
            note: sea_orm::ActiveValue::Set(note.to_string()),
            resolved: sea_orm::ActiveValue::Set(false),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        let saved = model.insert(&self.db).await?;

        NotificationService::new(self.db.clone(), self.hub.clone())
            .notify_admins(
                Some(reporter_id),
                "report",
                Some("report"),
                Some(saved.id),
                &format!("A new {} report has been created", object_type),
            )
            .await?;

        Ok(saved)
    }

    pub async fn list_for_admin(
        &self,
        object_type: Option<&str>,
        resolved: Option<bool>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReportModel>, u64)> {
        let mut query = Report::find();

        if let Some(object_type) = object_type {
            query = query.filter(report::Column::ObjectType.eq(object_type));
        }
        if let Some(resolved) = resolved {
            query = query.filter(report::Column::Resolved.eq(resolved));
        }

        let paginator = query
            .order_by_desc(report::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let reports = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((reports, total))
    }

    /// Reports raised by the given user (non-admin view).
    pub async fn list_for_reporter(
        &self,
        reporter_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReportModel>, u64)> {
        let paginator = Report::find()
            .filter(report::Column::ReportedBy.eq(reporter_id))
            .order_by_desc(report::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let reports = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((reports, total))
    }

    /// Only admins and the reporter may read a report.
    pub async fn get_for_user(
        &self,
        report_id: i32,
        user_id: i32,
        is_admin: bool,
    ) -> AppResult<ReportModel> {
        let report = Report::find_by_id(report_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if !is_admin && report.reported_by != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(report)
    }

    /// Admin-only discussion thread, oldest first.
    pub async fn comments_for(&self, report_id: i32) -> AppResult<Vec<ReportCommentModel>> {
        let comments = ReportComment::find()
            .filter(report_comment::Column::ReportId.eq(report_id))
            .order_by_asc(report_comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    /// Moderation actions tied to a report, oldest first.
    pub async fn actions_for(&self, report_id: i32) -> AppResult<Vec<AdminActionModel>> {
        let actions = AdminAction::find()
            .filter(admin_action::Column::ReportId.eq(report_id))
            .order_by_asc(admin_action::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(actions)
    }

    /// Admin update: append a comment to the thread and/or flip the
    /// resolution state. Resolution transitions are logged as admin actions.
    pub async fn update(
        &self,
        report_id: i32,
        admin_id: i32,
        comment: Option<&str>,
        resolved: Option<bool>,
    ) -> AppResult<ReportModel> {
        let report = Report::find_by_id(report_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if comment.is_none() && resolved.is_none() {
            return Err(AppError::Validation(
                "comment or resolved is required".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();

        if let Some(comment) = comment {
            if comment.trim().is_empty() {
                return Err(AppError::Validation("comment cannot be empty".to_string()));
            }
            let model = report_comment::ActiveModel {
                report_id: sea_orm::ActiveValue::Set(report.id),
                user_id: sea_orm::ActiveValue::Set(admin_id),
                comment: sea_orm::ActiveValue::Set(comment.to_string()),
                created_at: sea_orm::ActiveValue::Set(now),
                ..Default::default()
            };
            model.insert(&self.db).await?;
        }

        let mut active: report::ActiveModel = report.clone().into();
        if let Some(new_resolved) = resolved {
            if new_resolved != report.resolved {
                let action_type = if new_resolved {
                    "report_resolution"
                } else {
                    "report_reopening"
                };
                let action = admin_action::ActiveModel {
                    report_id: sea_orm::ActiveValue::Set(Some(report.id)),
                    admin_id: sea_orm::ActiveValue::Set(admin_id),
                    action_type: sea_orm::ActiveValue::Set(action_type.to_string()),
                    created_at: sea_orm::ActiveValue::Set(now),
                    ..Default::default()
                };
                action.insert(&self.db).await?;

                if new_resolved {
                    active.resolved = sea_orm::ActiveValue::Set(true);
                    active.resolved_by = sea_orm::ActiveValue::Set(Some(admin_id));
                    active.resolved_at = sea_orm::ActiveValue::Set(Some(now));
                } else {
                    active.resolved = sea_orm::ActiveValue::Set(false);
                    active.resolved_by = sea_orm::ActiveValue::Set(None);
                    active.resolved_at = sea_orm::ActiveValue::Set(None);
                }
            }
        }
        active.updated_at = sea_orm::ActiveValue::Set(Some(now));
        let updated = active.update(&self.db).await?;

        Ok(updated)
    }

    async fn find_unresolved(
        &self,
        reporter_id: i32,
        object_type: &str,
        object_id: i32,
    ) -> AppResult<Option<ReportModel>> {
        let mut query = Report::find()
            .filter(report::Column::ReportedBy.eq(reporter_id))
            .filter(report::Column::ObjectType.eq(object_type))
            .filter(report::Column::Resolved.eq(false));

        query = match object_type {
            "comment" => query.filter(report::Column::ReportedCommentId.eq(object_id)),
            "user" => query.filter(report::Column::ReportedUserId.eq(object_id)),
            _ => query.filter(report::Column::ReportedWorkoutId.eq(object_id)),
        };

        Ok(query.one(&self.db).await?)
    }
}
