use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const REPORT_OBJECT_TYPES: &[&str] = &["comment", "user", "workout"];

/// A moderation flag raised against a comment, a user or a workout.
///
/// Exactly one of the three reported-object columns is set, matching
/// `object_type`. Enforced in `ReportService` and by a table CHECK.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub reported_by: i32,
    #[sea_orm(column_type = "String(StringLen::N(20))")]
    pub object_type: String,
    pub reported_comment_id: Option<i32>,
    pub reported_user_id: Option<i32>,
    pub reported_workout_id: Option<i32>,
    #[sea_orm(column_type = "Text")]
    pub note: String,
    pub resolved: bool,
    pub resolved_by: Option<i32>,
    pub resolved_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: Option<DateTime>,
}

impl Model {
    pub fn reported_object_id(&self) -> Option<i32> {
        self.reported_comment_id
            .or(self.reported_user_id)
            .or(self.reported_workout_id)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReportedBy",
        to = "super::user::Column::Id"
    )]
    Reporter,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ResolvedBy",
        to = "super::user::Column::Id"
    )]
    Resolver,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReportedUserId",
        to = "super::user::Column::Id"
    )]
    ReportedUser,
    #[sea_orm(
        belongs_to = "super::comment::Entity",
        from = "Column::ReportedCommentId",
        to = "super::comment::Column::Id"
    )]
    ReportedComment,
    #[sea_orm(
        belongs_to = "super::workout::Entity",
        from = "Column::ReportedWorkoutId",
        to = "super::workout::Column::Id"
    )]
    ReportedWorkout,
}

impl ActiveModelBehavior for ActiveModel {}
