//! Pre-flight checks before talking to the video API.
//!
//! Validates that the API key and local inputs are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, SnipError};
use std::path::Path;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    /// Any API call requires an API key.
    Api,
    /// Uploading also requires a readable, non-empty video file.
    Upload(&'a Path),
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings, operation: Operation<'_>) -> Result<()> {
    settings.api_key()?;

    if let Operation::Upload(path) = operation {
        check_video_file(path)?;
    }
    Ok(())
}

/// Check that a video file exists and has content.
fn check_video_file(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        SnipError::InvalidInput(format!("video file {} is not readable: {}", path.display(), e))
    })?;

    if !metadata.is_file() {
        return Err(SnipError::InvalidInput(format!(
            "{} is not a file",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(SnipError::InvalidInput(format!(
            "video file {} is empty",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings_with_key() -> Settings {
        let mut settings = Settings::default();
        settings.api.api_key = Some("tlk_test".to_string());
        settings
    }

    #[test]
    fn test_upload_requires_existing_file() {
        let settings = settings_with_key();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp4");

        let err = check(&settings, Operation::Upload(&missing)).unwrap_err();
        assert!(matches!(err, SnipError::InvalidInput(_)));

        let err = check(&settings, Operation::Upload(dir.path())).unwrap_err();
        assert!(err.to_string().contains("is not a file"));
    }

    #[test]
    fn test_upload_rejects_empty_file() {
        let settings = settings_with_key();
        let dir = tempfile::tempdir().unwrap();

        let empty = dir.path().join("empty.mp4");
        std::fs::File::create(&empty).unwrap();
        assert!(check(&settings, Operation::Upload(&empty)).is_err());

        let video = dir.path().join("clip.mp4");
        let mut file = std::fs::File::create(&video).unwrap();
        file.write_all(b"not really a video").unwrap();
        assert!(check_video_file(&video).is_ok());
    }
}
