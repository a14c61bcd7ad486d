use std::env;

pub const DEFAULT_MAX_GPX_SIZE: usize = 1024 * 1024; // 1 MiB

#[derive(Debug, Clone, Copy)]
pub struct WorkoutFilesConfig {
    pub max_gpx_size: usize,
}

impl WorkoutFilesConfig {
    pub fn from_env() -> Self {
        let max_gpx_size = env::var("WORKOUT_MAX_FILE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_GPX_SIZE);

        Self { max_gpx_size }
    }
}
