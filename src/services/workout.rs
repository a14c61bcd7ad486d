use crate::{
    error::{AppError, AppResult},
    models::{
        workout, workout_segment, Workout, WorkoutModel, WorkoutSegment, WorkoutSegmentModel,
    },
    services::{
        gpx::{round2, round3, GpxData},
        record::RecordService,
        sport::SportService,
    },
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

#[derive(Debug, Default)]
pub struct WorkoutFilters {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub distance_from: Option<f64>,
    pub distance_to: Option<f64>,
    pub duration_from: Option<i64>,
    pub duration_to: Option<i64>,
    pub ave_speed_from: Option<f64>,
    pub ave_speed_to: Option<f64>,
    pub max_speed_from: Option<f64>,
    pub max_speed_to: Option<f64>,
    pub sport_id: Option<i32>,
    pub ascending: bool,
}

#[derive(Debug)]
pub struct NewGpxWorkout {
    pub sport_id: i32,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub workout_visibility: Option<String>,
    pub map_visibility: Option<String>,
}

#[derive(Debug)]
pub struct NewWorkoutWithoutGpx {
    pub sport_id: i32,
    pub workout_date: NaiveDateTime,
    pub distance_km: f64,
    pub duration_seconds: i32,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub workout_visibility: Option<String>,
    pub map_visibility: Option<String>,
}

#[derive(Debug, Default)]
pub struct WorkoutUpdate {
    pub sport_id: Option<i32>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub workout_visibility: Option<String>,
    pub map_visibility: Option<String>,
    // Only honored for workouts without a GPX file
    pub workout_date: Option<NaiveDateTime>,
    pub distance_km: Option<f64>,
    pub duration_seconds: Option<i32>,
}

pub struct WorkoutService {
    db: DatabaseConnection,
}

impl WorkoutService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a workout from an already-saved GPX file.
    /// `gpx_data` comes from `gpx::process_gpx` with the sport's threshold.
    pub async fn create_with_gpx(
        &self,
        user_id: i32,
        payload: NewGpxWorkout,
        gpx_data: GpxData,
        gpx_relative_path: String,
    ) -> AppResult<WorkoutModel> {
        let sport = SportService::new(self.db.clone())
            .get_active_by_id(payload.sport_id)
            .await?;

        let now = chrono::Utc::now().naive_utc();
        let workout_date = gpx_data.start_time.unwrap_or(now);
        let title = payload
            .title
            .or(gpx_data.name)
            .unwrap_or_else(|| default_title(&sport.label, &workout_date));

        let stats = &gpx_data.stats;
        let map_id = uuid::Uuid::new_v4().simple().to_string();

        let model = workout::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            sport_id: sea_orm::ActiveValue::Set(sport.id),
            title: sea_orm::ActiveValue::Set(title),
            workout_date: sea_orm::ActiveValue::Set(workout_date),
            duration_seconds: sea_orm::ActiveValue::Set(stats.duration_seconds as i32),
            pauses_seconds: sea_orm::ActiveValue::Set(stats.pauses_seconds as i32),
            moving_seconds: sea_orm::ActiveValue::Set(stats.moving_seconds as i32),
            distance_km: sea_orm::ActiveValue::Set(round3(stats.distance_km)),
            min_alt: sea_orm::ActiveValue::Set(stats.min_alt.map(round2)),
            max_alt: sea_orm::ActiveValue::Set(stats.max_alt.map(round2)),
            ascent: sea_orm::ActiveValue::Set(stats.ascent.map(round2)),
            descent: sea_orm::ActiveValue::Set(stats.descent.map(round2)),
            max_speed: sea_orm::ActiveValue::Set(stats.max_speed.map(round2)),
            ave_speed: sea_orm::ActiveValue::Set(stats.ave_speed.map(round2)),
            gpx_path: sea_orm::ActiveValue::Set(Some(gpx_relative_path)),
            map_id: sea_orm::ActiveValue::Set(Some(map_id)),
            bounds: sea_orm::ActiveValue::Set(
                gpx_data.bounds.map(|b| serde_json::json!(b.to_vec())),
            ),
            notes: sea_orm::ActiveValue::Set(payload.notes),
            workout_visibility: sea_orm::ActiveValue::Set(
                payload
                    .workout_visibility
                    .unwrap_or_else(|| "private".to_string()),
            ),
            map_visibility: sea_orm::ActiveValue::Set(
                payload.map_visibility.unwrap_or_else(|| "private".to_string()),
            ),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;

        for (index, segment) in gpx_data.segments.iter().enumerate() {
            let segment_model = workout_segment::ActiveModel {
                workout_id: sea_orm::ActiveValue::Set(saved.id),
                segment_index: sea_orm::ActiveValue::Set(index as i32),
                duration_seconds: sea_orm::ActiveValue::Set(segment.duration_seconds as i32),
                pauses_seconds: sea_orm::ActiveValue::Set(segment.pauses_seconds as i32),
                moving_seconds: sea_orm::ActiveValue::Set(segment.moving_seconds as i32),
                distance_km: sea_orm::ActiveValue::Set(round3(segment.distance_km)),
                min_alt: sea_orm::ActiveValue::Set(segment.min_alt.map(round2)),
                max_alt: sea_orm::ActiveValue::Set(segment.max_alt.map(round2)),
                ascent: sea_orm::ActiveValue::Set(segment.ascent.map(round2)),
                descent: sea_orm::ActiveValue::Set(segment.descent.map(round2)),
                max_speed: sea_orm::ActiveValue::Set(segment.max_speed.map(round2)),
                ave_speed: sea_orm::ActiveValue::Set(segment.ave_speed.map(round2)),
                ..Default::default()
            };
            segment_model.insert(&self.db).await?;
        }

        RecordService::new(self.db.clone())
            .update_records(user_id, sport.id)
            .await?;

        Ok(saved)
    }

    /// Create a workout without a GPX file: the whole duration counts as
    /// moving time.
    pub async fn create_without_gpx(
        &self,
        user_id: i32,
        payload: NewWorkoutWithoutGpx,
    ) -> AppResult<WorkoutModel> {
        let sport = SportService::new(self.db.clone())
            .get_active_by_id(payload.sport_id)
            .await?;

        if payload.distance_km <= 0.0 {
            return Err(AppError::Validation("distance must be > 0".to_string()));
        }
        if payload.duration_seconds <= 0 {
            return Err(AppError::Validation("duration must be > 0".to_string()));
        }

        let now = chrono::Utc::now().naive_utc();
        let ave_speed = payload.distance_km / (payload.duration_seconds as f64 / 3600.0);
        let title = payload
            .title
            .unwrap_or_else(|| default_title(&sport.label, &payload.workout_date));

        let model = workout::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            sport_id: sea_orm::ActiveValue::Set(sport.id),
            title: sea_orm::ActiveValue::Set(title),
            workout_date: sea_orm::ActiveValue::Set(payload.workout_date),
            duration_seconds: sea_orm::ActiveValue::Set(payload.duration_seconds),
            pauses_seconds: sea_orm::ActiveValue::Set(0),
            moving_seconds: sea_orm::ActiveValue::Set(payload.duration_seconds),
            distance_km: sea_orm::ActiveValue::Set(round3(payload.distance_km)),
            max_speed: sea_orm::ActiveValue::Set(Some(round2(ave_speed))),
            ave_speed: sea_orm::ActiveValue::Set(Some(round2(ave_speed))),
            notes: sea_orm::ActiveValue::Set(payload.notes),
            workout_visibility: sea_orm::ActiveValue::Set(
                payload
                    .workout_visibility
                    .unwrap_or_else(|| "private".to_string()),
            ),
            map_visibility: sea_orm::ActiveValue::Set(
                payload.map_visibility.unwrap_or_else(|| "private".to_string()),
            ),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;

        RecordService::new(self.db.clone())
            .update_records(user_id, sport.id)
            .await?;

        Ok(saved)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<WorkoutModel> {
        Workout::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_by_map_id(&self, map_id: &str) -> AppResult<WorkoutModel> {
        Workout::find()
            .filter(workout::Column::MapId.eq(map_id))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn segments_for(&self, workout_id: i32) -> AppResult<Vec<WorkoutSegmentModel>> {
        let segments = WorkoutSegment::find()
            .filter(workout_segment::Column::WorkoutId.eq(workout_id))
            .order_by_asc(workout_segment::Column::SegmentIndex)
            .all(&self.db)
            .await?;
        Ok(segments)
    }

    /// Previous / next workout ids for the same user, ordered by date.
    pub async fn neighbors(&self, current: &WorkoutModel) -> AppResult<(Option<i32>, Option<i32>)> {
        let previous = Workout::find()
            .filter(workout::Column::UserId.eq(current.user_id))
            .filter(workout::Column::WorkoutDate.lt(current.workout_date))
            .order_by_desc(workout::Column::WorkoutDate)
            .limit(1)
            .one(&self.db)
            .await?
            .map(|w| w.id);

        let next = Workout::find()
            .filter(workout::Column::UserId.eq(current.user_id))
            .filter(workout::Column::WorkoutDate.gt(current.workout_date))
            .order_by_asc(workout::Column::WorkoutDate)
            .limit(1)
            .one(&self.db)
            .await?
            .map(|w| w.id);

        Ok((previous, next))
    }

    pub async fn list(
        &self,
        user_id: i32,
        filters: &WorkoutFilters,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<WorkoutModel>, u64)> {
        let mut query = Workout::find().filter(workout::Column::UserId.eq(user_id));

        if let Some(sport_id) = filters.sport_id {
            query = query.filter(workout::Column::SportId.eq(sport_id));
        }
        if let Some(from) = filters.from {
            query = query
                .filter(workout::Column::WorkoutDate.gte(from.and_hms_opt(0, 0, 0).unwrap()));
        }
        if let Some(to) = filters.to {
            query = query
                .filter(workout::Column::WorkoutDate.lte(to.and_hms_opt(23, 59, 59).unwrap()));
        }
        if let Some(distance_from) = filters.distance_from {
            query = query.filter(workout::Column::DistanceKm.gte(distance_from));
        }
        if let Some(distance_to) = filters.distance_to {
            query = query.filter(workout::Column::DistanceKm.lte(distance_to));
        }
        if let Some(duration_from) = filters.duration_from {
            query = query.filter(workout::Column::MovingSeconds.gte(duration_from));
        }
        if let Some(duration_to) = filters.duration_to {
            query = query.filter(workout::Column::MovingSeconds.lte(duration_to));
        }
        if let Some(speed_from) = filters.ave_speed_from {
            query = query.filter(workout::Column::AveSpeed.gte(speed_from));
        }
        if let Some(speed_to) = filters.ave_speed_to {
            query = query.filter(workout::Column::AveSpeed.lte(speed_to));
        }
        if let Some(speed_from) = filters.max_speed_from {
            query = query.filter(workout::Column::MaxSpeed.gte(speed_from));
        }
        if let Some(speed_to) = filters.max_speed_to {
            query = query.filter(workout::Column::MaxSpeed.lte(speed_to));
        }

        query = if filters.ascending {
            query.order_by_asc(workout::Column::WorkoutDate)
        } else {
            query.order_by_desc(workout::Column::WorkoutDate)
        };

        let paginator = query.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let workouts = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((workouts, total))
    }

    /// Own workouts plus visible workouts of followed users, newest first.
    pub async fn timeline(
        &self,
        user_id: i32,
        following_ids: Vec<i32>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<WorkoutModel>, u64)> {
        let mut condition = Condition::any().add(workout::Column::UserId.eq(user_id));

        if !following_ids.is_empty() {
            condition = condition.add(
                Condition::all()
                    .add(workout::Column::UserId.is_in(following_ids))
                    .add(
                        workout::Column::WorkoutVisibility
                            .is_in(vec!["public", "followers_only"]),
                    )
                    .add(workout::Column::SuspendedAt.is_null()),
            );
        }

        let paginator = Workout::find()
            .filter(condition)
            .order_by_desc(workout::Column::WorkoutDate)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let workouts = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((workouts, total))
    }

    /// Update a workout. `gpx_content` is only provided when the sport
    /// changed on a GPX workout, to recompute stats with the new
    /// stopped-speed threshold.
    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        update: WorkoutUpdate,
        gpx_content: Option<&str>,
    ) -> AppResult<WorkoutModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        let old_sport_id = existing.sport_id;
        let has_gpx = existing.has_gpx();
        let now = chrono::Utc::now().naive_utc();

        let mut active: workout::ActiveModel = existing.into();

        if let Some(title) = update.title {
            active.title = sea_orm::ActiveValue::Set(title);
        }
        if let Some(notes) = update.notes {
            active.notes = sea_orm::ActiveValue::Set(if notes.trim().is_empty() {
                None
            } else {
                Some(notes)
            });
        }
        if let Some(visibility) = update.workout_visibility {
            active.workout_visibility = sea_orm::ActiveValue::Set(visibility);
        }
        if let Some(visibility) = update.map_visibility {
            active.map_visibility = sea_orm::ActiveValue::Set(visibility);
        }

        let mut new_sport_id = old_sport_id;
        if let Some(sport_id) = update.sport_id {
            let sport = SportService::new(self.db.clone())
                .get_active_by_id(sport_id)
                .await?;
            new_sport_id = sport.id;
            active.sport_id = sea_orm::ActiveValue::Set(sport.id);

            if has_gpx && sport.id != old_sport_id {
                if let Some(content) = gpx_content {
                    let gpx_data =
                        crate::services::gpx::process_gpx(content, sport.stopped_speed_threshold)?;
                    let stats = gpx_data.stats;
                    active.moving_seconds =
                        sea_orm::ActiveValue::Set(stats.moving_seconds as i32);
                    active.pauses_seconds =
                        sea_orm::ActiveValue::Set(stats.pauses_seconds as i32);
                    active.ave_speed = sea_orm::ActiveValue::Set(stats.ave_speed.map(round2));
                }
            }
        }

        if !has_gpx {
            if let Some(date) = update.workout_date {
                active.workout_date = sea_orm::ActiveValue::Set(date);
            }

            let distance = update.distance_km;
            let duration = update.duration_seconds;
            if distance.is_some() || duration.is_some() {
                let current_distance = match &active.distance_km {
                    sea_orm::ActiveValue::Set(v) | sea_orm::ActiveValue::Unchanged(v) => *v,
                    _ => 0.0,
                };
                let current_duration = match &active.duration_seconds {
                    sea_orm::ActiveValue::Set(v) | sea_orm::ActiveValue::Unchanged(v) => *v,
                    _ => 0,
                };
                let new_distance = distance.unwrap_or(current_distance);
                let new_duration = duration.unwrap_or(current_duration);
                if new_distance <= 0.0 || new_duration <= 0 {
                    return Err(AppError::Validation(
                        "distance and duration must be > 0".to_string(),
                    ));
                }
                let ave_speed = new_distance / (new_duration as f64 / 3600.0);
                active.distance_km = sea_orm::ActiveValue::Set(round3(new_distance));
                active.duration_seconds = sea_orm::ActiveValue::Set(new_duration);
                active.moving_seconds = sea_orm::ActiveValue::Set(new_duration);
                active.ave_speed = sea_orm::ActiveValue::Set(Some(round2(ave_speed)));
                active.max_speed = sea_orm::ActiveValue::Set(Some(round2(ave_speed)));
            }
        }

        active.updated_at = sea_orm::ActiveValue::Set(Some(now));
        let updated = active.update(&self.db).await?;

        let records = RecordService::new(self.db.clone());
        records.update_records(user_id, new_sport_id).await?;
        if new_sport_id != old_sport_id {
            records.update_records(user_id, old_sport_id).await?;
        }

        Ok(updated)
    }

    /// Delete a workout and recompute records. Returns the deleted model so
    /// the caller can remove stored files.
    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<WorkoutModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        Workout::delete_by_id(id).exec(&self.db).await?;

        RecordService::new(self.db.clone())
            .update_records(user_id, existing.sport_id)
            .await?;

        Ok(existing)
    }
}

fn default_title(sport_label: &str, workout_date: &NaiveDateTime) -> String {
    format!("{} - {}", sport_label, workout_date.format("%Y-%m-%d %H:%M:%S"))
}
