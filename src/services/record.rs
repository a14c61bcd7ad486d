use crate::{
    error::AppResult,
    models::{record, workout, Record, RecordModel, Workout, WorkoutModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

pub const RECORD_TYPES: &[&str] = &["AS", "FD", "LD", "MS"];

pub struct RecordService {
    db: DatabaseConnection,
}

impl RecordService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recompute every record for a user and sport from its workouts.
    /// Called after each workout create/update/delete.
    pub async fn update_records(&self, user_id: i32, sport_id: i32) -> AppResult<()> {
        let workouts = Workout::find()
            .filter(workout::Column::UserId.eq(user_id))
            .filter(workout::Column::SportId.eq(sport_id))
            .order_by_asc(workout::Column::WorkoutDate)
            .all(&self.db)
            .await?;

        for record_type in RECORD_TYPES {
            let best = pick_best(
                workouts
                    .iter()
                    .enumerate()
                    .filter_map(|(i, w)| record_value(w, record_type).map(|v| (i, v))),
            );

            match best {
                Some((idx, value)) => {
                    let workout = &workouts[idx];
                    self.upsert(user_id, sport_id, record_type, workout, value)
                        .await?;
                }
                None => {
                    Record::delete_many()
                        .filter(record::Column::UserId.eq(user_id))
                        .filter(record::Column::SportId.eq(sport_id))
                        .filter(record::Column::RecordType.eq(*record_type))
                        .exec(&self.db)
                        .await?;
                }
            }
        }

        Ok(())
    }

    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<RecordModel>> {
        let records = Record::find()
            .filter(record::Column::UserId.eq(user_id))
            .order_by_asc(record::Column::SportId)
            .order_by_asc(record::Column::RecordType)
            .all(&self.db)
            .await?;
        Ok(records)
    }

    async fn upsert(
        &self,
        user_id: i32,
        sport_id: i32,
        record_type: &str,
        workout: &WorkoutModel,
        value: f64,
    ) -> AppResult<()> {
        let existing = Record::find()
            .filter(record::Column::UserId.eq(user_id))
            .filter(record::Column::SportId.eq(sport_id))
            .filter(record::Column::RecordType.eq(record_type))
            .one(&self.db)
            .await?;

        let now = chrono::Utc::now().naive_utc();
        match existing {
            Some(existing) => {
                if existing.workout_id == workout.id && existing.value == value {
                    return Ok(());
                }
                let mut active: record::ActiveModel = existing.into();
                active.workout_id = sea_orm::ActiveValue::Set(workout.id);
                active.value = sea_orm::ActiveValue::Set(value);
                active.workout_date = sea_orm::ActiveValue::Set(workout.workout_date);
                active.update(&self.db).await?;
            }
            None => {
                let model = record::ActiveModel {
                    user_id: sea_orm::ActiveValue::Set(user_id),
                    sport_id: sea_orm::ActiveValue::Set(sport_id),
                    workout_id: sea_orm::ActiveValue::Set(workout.id),
                    record_type: sea_orm::ActiveValue::Set(record_type.to_string()),
                    value: sea_orm::ActiveValue::Set(value),
                    workout_date: sea_orm::ActiveValue::Set(workout.workout_date),
                    created_at: sea_orm::ActiveValue::Set(now),
                    ..Default::default()
                };
                model.insert(&self.db).await?;
            }
        }
        Ok(())
    }
}

fn record_value(workout: &WorkoutModel, record_type: &str) -> Option<f64> {
    match record_type {
        "AS" => workout.ave_speed,
        "FD" => Some(workout.distance_km),
        "LD" => Some(workout.moving_seconds as f64),
        "MS" => workout.max_speed,
        _ => None,
    }
    .filter(|v| *v > 0.0)
}

/// Pick the best candidate; on equal values the earlier workout keeps
/// the record (candidates are iterated in workout date order).
fn pick_best(candidates: impl Iterator<Item = (usize, f64)>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, value) in candidates {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((idx, value)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_max_value() {
        let best = pick_best(vec![(0, 10.0), (1, 12.5), (2, 8.0)].into_iter());
        assert_eq!(best, Some((1, 12.5)));
    }

    #[test]
    fn tie_keeps_earlier_candidate() {
        let best = pick_best(vec![(0, 12.5), (1, 12.5)].into_iter());
        assert_eq!(best, Some((0, 12.5)));
    }

    #[test]
    fn empty_has_no_best() {
        assert_eq!(pick_best(std::iter::empty()), None);
    }

    fn workout_with(ave: Option<f64>, distance: f64, moving: i32, max: Option<f64>) -> WorkoutModel {
        WorkoutModel {
            id: 1,
            user_id: 1,
            sport_id: 1,
            title: "test".to_string(),
            workout_date: chrono::Utc::now().naive_utc(),
            duration_seconds: moving,
            pauses_seconds: 0,
            moving_seconds: moving,
            distance_km: distance,
            min_alt: None,
            max_alt: None,
            ascent: None,
            descent: None,
            max_speed: max,
            ave_speed: ave,
            gpx_path: None,
            map_id: None,
            map_path: None,
            bounds: None,
            notes: None,
            workout_visibility: "private".to_string(),
            map_visibility: "private".to_string(),
            suspended_at: None,
            created_at: chrono::Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn record_values_per_type() {
        let w = workout_with(Some(10.0), 12.0, 3600, Some(25.0));
        assert_eq!(record_value(&w, "AS"), Some(10.0));
        assert_eq!(record_value(&w, "FD"), Some(12.0));
        assert_eq!(record_value(&w, "LD"), Some(3600.0));
        assert_eq!(record_value(&w, "MS"), Some(25.0));
    }

    #[test]
    fn missing_speed_yields_no_candidate() {
        let w = workout_with(None, 0.0, 0, None);
        assert_eq!(record_value(&w, "AS"), None);
        assert_eq!(record_value(&w, "FD"), None);
        assert_eq!(record_value(&w, "LD"), None);
        assert_eq!(record_value(&w, "MS"), None);
    }
}
