use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const ACTION_TYPES: &[&str] = &[
    "report_resolution",
    "report_reopening",
    "user_suspension",
    "user_unsuspension",
    "user_warning",
    "user_warning_lifting",
    "workout_suspension",
    "workout_unsuspension",
    "comment_suspension",
    "comment_unsuspension",
];

/// Ordered log of moderation decisions, usually tied to a report.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "admin_actions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub report_id: Option<i32>,
    pub admin_id: i32,
    /// User affected by the action (suspension, warning).
    pub user_id: Option<i32>,
    pub workout_id: Option<i32>,
    pub comment_id: Option<i32>,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub action_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub reason: Option<String>,
    pub created_at: DateTime,
}

impl Model {
    /// Suspensions and warnings can be appealed by the affected user.
    pub fn is_appealable(&self) -> bool {
        matches!(
            self.action_type.as_str(),
            "user_suspension" | "user_warning" | "workout_suspension" | "comment_suspension"
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report::Entity",
        from = "Column::ReportId",
        to = "super::report::Column::Id"
    )]
    Report,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AdminId",
        to = "super::user::Column::Id"
    )]
    Admin,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl ActiveModelBehavior for ActiveModel {}
