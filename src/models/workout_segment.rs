use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "workout_segments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub workout_id: i32,
    pub segment_index: i32,
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
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workout::Entity",
        from = "Column::WorkoutId",
        to = "super::workout::Column::Id"
    )]
    Workout,
}

impl Related<super::workout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workout.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
