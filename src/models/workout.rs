use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "workouts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub sport_id: i32,
    pub title: String,
    pub workout_date: DateTime,
    pub duration_seconds: i32,
    pub pauses_seconds: i32,
    pub moving_seconds: i32,
    #[sea_orm(column_type = "Double")]
    pub distance_km: f64,
    #[sea_orm(column_type = "Double", nullable)]
    pub min_alt: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub max_alt: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub ascent: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub descent: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub max_speed: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub ave_speed: Option<f64>,
    pub gpx_path: Option<String>,
    pub map_id: Option<String>,
    pub map_path: Option<String>,
    #[sea_orm(nullable)]
    pub bounds: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(20))")]
    pub workout_visibility: String,
    #[sea_orm(column_type = "String(StringLen::N(20))")]
    pub map_visibility: String,
    pub suspended_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: Option<DateTime>,
}

impl Model {
    pub fn has_gpx(&self) -> bool {
        self.gpx_path.as_deref().is_some_and(|p| !p.is_empty())
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::sport::Entity",
        from = "Column::SportId",
        to = "super::sport::Column::Id"
    )]
    Sport,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::sport::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sport.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
