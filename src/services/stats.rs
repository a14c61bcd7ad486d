use crate::{
    error::{AppError, AppResult},
    models::{workout, Workout, WorkoutModel},
    services::cache::CacheService,
};
use chrono::{Datelike, Duration, NaiveDate};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const STATS_CACHE_TTL: u64 = 300; // 5 minutes

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFrame {
    Week,
    Month,
    Year,
}

impl TimeFrame {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(AppError::Validation(
                "time must be one of: week, month, year".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct SportAggregate {
    pub nb_workouts: u64,
    pub total_distance: f64,
    /// Moving time in seconds.
    pub total_duration: i64,
    pub total_ascent: f64,
    pub total_descent: f64,
}

impl SportAggregate {
    fn add(&mut self, workout: &WorkoutModel) {
        self.nb_workouts += 1;
        self.total_distance += workout.distance_km;
        self.total_duration += workout.moving_seconds as i64;
        self.total_ascent += workout.ascent.unwrap_or(0.0);
        self.total_descent += workout.descent.unwrap_or(0.0);
    }
}

/// Bucket key for a workout date in the given time frame:
/// `2018` (year), `2018-01` (month), `2018-01-01` (Monday of the week).
pub fn time_bucket(date: NaiveDate, frame: TimeFrame) -> String {
    match frame {
        TimeFrame::Year => format!("{}", date.year()),
        TimeFrame::Month => format!("{}-{:02}", date.year(), date.month()),
        TimeFrame::Week => {
            let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            monday.format("%Y-%m-%d").to_string()
        }
    }
}

pub struct StatsService {
    db: DatabaseConnection,
    cache: Option<CacheService>,
}

impl StatsService {
    pub fn new(db: DatabaseConnection, cache: Option<CacheService>) -> Self {
        Self { db, cache }
    }

    /// Totals per sport over all of a user's workouts.
    pub async fn by_sport(&self, user_id: i32) -> AppResult<BTreeMap<i32, SportAggregate>> {
        let cache_key = CacheService::user_stats_key(user_id, "by_sport", "all");
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<BTreeMap<i32, SportAggregate>>(&cache_key).await {
                return Ok(cached);
            }
        }

        let workouts = Workout::find()
            .filter(workout::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        let mut stats: BTreeMap<i32, SportAggregate> = BTreeMap::new();
        for workout in &workouts {
            stats.entry(workout.sport_id).or_default().add(workout);
        }

        if let Some(cache) = &self.cache {
            cache.set(&cache_key, &stats, STATS_CACHE_TTL).await;
        }

        Ok(stats)
    }

    /// Totals per time bucket and sport between `from` and `to`.
    pub async fn by_time(
        &self,
        user_id: i32,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        frame: TimeFrame,
    ) -> AppResult<BTreeMap<String, BTreeMap<i32, SportAggregate>>> {
        let suffix = format!(
            "{}:{}:{}",
            match frame {
                TimeFrame::Week => "week",
                TimeFrame::Month => "month",
                TimeFrame::Year => "year",
            },
            from.map(|d| d.to_string()).unwrap_or_default(),
            to.map(|d| d.to_string()).unwrap_or_default(),
        );
        let cache_key = CacheService::user_stats_key(user_id, "by_time", &suffix);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache
                .get::<BTreeMap<String, BTreeMap<i32, SportAggregate>>>(&cache_key)
                .await
            {
                return Ok(cached);
            }
        }

        let mut query = Workout::find().filter(workout::Column::UserId.eq(user_id));
        if let Some(from) = from {
            query =
                query.filter(workout::Column::WorkoutDate.gte(from.and_hms_opt(0, 0, 0).unwrap()));
        }
        if let Some(to) = to {
            query =
                query.filter(workout::Column::WorkoutDate.lte(to.and_hms_opt(23, 59, 59).unwrap()));
        }
        let workouts = query.all(&self.db).await?;

        let mut stats: BTreeMap<String, BTreeMap<i32, SportAggregate>> = BTreeMap::new();
        for workout in &workouts {
            let bucket = time_bucket(workout.workout_date.date(), frame);
            stats
                .entry(bucket)
                .or_default()
                .entry(workout.sport_id)
                .or_default()
                .add(workout);
        }

        if let Some(cache) = &self.cache {
            cache.set(&cache_key, &stats, STATS_CACHE_TTL).await;
        }

        Ok(stats)
    }
}
