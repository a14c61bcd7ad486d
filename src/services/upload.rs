use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

#[derive(Clone)]
pub struct UploadConfig {
    pub upload_dir: String,
}

const MAX_AVATAR_SIZE: usize = 5 * 1024 * 1024; // 5 MB
const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Validate file magic bytes match the declared content type.
fn validate_magic_bytes(data: &[u8], content_type: &str) -> bool {
    match content_type {
        "image/jpeg" => data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF],
        "image/png" => data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47],
        "image/gif" => data.len() >= 4 && data[..4] == [0x47, 0x49, 0x46, 0x38],
        "image/webp" => {
            data.len() >= 12
                && data[..4] == [0x52, 0x49, 0x46, 0x46]
                && data[8..12] == [0x57, 0x45, 0x42, 0x50]
        }
        _ => false,
    }
}

pub struct UploadService;

impl UploadService {
    /// Save an uploaded avatar image to disk.
    /// Returns the public URL path (e.g., `/uploads/avatars/uuid.jpg`).
    pub async fn save_avatar(
        config: &UploadConfig,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<String> {
        // Validate size
        if data.len() > MAX_AVATAR_SIZE {
            return Err(AppError::FileTooLarge);
        }

        // Validate content type
        if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
            return Err(AppError::Validation(format!(
                "Unsupported file type: {}. Allowed: jpeg, png, gif, webp",
                content_type
            )));
        }

        // Validate magic bytes match content type
        if !validate_magic_bytes(data, content_type) {
            return Err(AppError::Validation(
                "File content does not match declared content type".to_string(),
            ));
        }

        let ext = match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => return Err(AppError::Validation("Unsupported file type".to_string())),
        };

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = Path::new(&config.upload_dir).join("avatars");

        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Validation(format!("Failed to create upload directory: {}", e))
        })?;

        let file_path = dir.join(&filename);
        fs::write(&file_path, data)
            .await
            .map_err(|e| AppError::Validation(format!("Failed to write file: {}", e)))?;

        Ok(format!("/uploads/avatars/{}", filename))
    }

    /// Save an uploaded GPX file under `workouts/{user_id}/`.
    /// Returns the path relative to the upload directory.
    pub async fn save_gpx(
        config: &UploadConfig,
        user_id: i32,
        filename: Option<&str>,
        data: &[u8],
        max_size: usize,
    ) -> AppResult<String> {
        if data.len() > max_size {
            return Err(AppError::FileTooLarge);
        }

        if let Some(name) = filename {
            if !name.to_ascii_lowercase().ends_with(".gpx") {
                return Err(AppError::Validation(
                    "File extension not allowed, only .gpx files are supported".to_string(),
                ));
            }
        }

        let relative = format!("workouts/{}/{}.gpx", user_id, Uuid::new_v4());
        let file_path = Path::new(&config.upload_dir).join(&relative);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Validation(format!("Failed to create upload directory: {}", e))
            })?;
        }

        fs::write(&file_path, data)
            .await
            .map_err(|e| AppError::Validation(format!("Failed to write file: {}", e)))?;

        Ok(relative)
    }

    pub fn absolute_path(config: &UploadConfig, relative: &str) -> PathBuf {
        Path::new(&config.upload_dir).join(relative)
    }

    pub async fn read_file(config: &UploadConfig, relative: &str) -> AppResult<Vec<u8>> {
        let path = Self::absolute_path(config, relative);
        fs::read(&path)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to read {}: {}", relative, e)))
    }

    /// Best-effort removal of a stored file. Missing files are not an error.
    pub async fn delete_file(config: &UploadConfig, relative: &str) {
        let path = Self::absolute_path(config, relative);
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to delete file {}: {}", relative, e);
            }
        }
    }

    /// Total size in bytes of the upload directory (admin stats).
    pub async fn dir_size(config: &UploadConfig) -> u64 {
        fn walk(path: PathBuf) -> u64 {
            let mut total = 0;
            if let Ok(entries) = std::fs::read_dir(path) {
                for entry in entries.flatten() {
                    if let Ok(meta) = entry.metadata() {
                        if meta.is_dir() {
                            total += walk(entry.path());
                        } else {
                            total += meta.len();
                        }
                    }
                }
            }
            total
        }

        let root = PathBuf::from(&config.upload_dir);
        tokio::task::spawn_blocking(move || walk(root))
            .await
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_magic_bytes_valid() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert!(validate_magic_bytes(&data, "image/jpeg"));
    }

    #[test]
    fn png_magic_bytes_valid() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];
        assert!(validate_magic_bytes(&data, "image/png"));
    }

    #[test]
    fn wrong_magic_bytes_rejected() {
        let png_data = [0x89, 0x50, 0x4E, 0x47];
        assert!(!validate_magic_bytes(&png_data, "image/jpeg"));
    }

    #[test]
    fn empty_data_rejected() {
        assert!(!validate_magic_bytes(&[], "image/jpeg"));
        assert!(!validate_magic_bytes(&[], "image/png"));
    }

    #[test]
    fn unknown_content_type_rejected() {
        let data = [0xFF, 0xD8, 0xFF];
        assert!(!validate_magic_bytes(&data, "application/pdf"));
    }
}
