use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Route prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

pub const MAX_IMAGES: usize = 5;

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Writes listing images to a local directory and hands back their public paths.
///
/// Files are not removed if the database write that follows fails.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save(&self, image: &UploadedImage) -> std::io::Result<String> {
        let stored_name = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8],
            sanitize_file_name(&image.file_name)
        );
        tokio::fs::write(self.dir.join(&stored_name), &image.bytes).await?;
        log::info!("Stored upload {} ({} bytes)", stored_name, image.bytes.len());
        Ok(format!("{}/{}", PUBLIC_PREFIX, stored_name))
    }

    pub async fn save_all(&self, images: &[UploadedImage]) -> std::io::Result<Vec<String>> {
        let mut paths = Vec::with_capacity(images.len());
        for image in images {
            paths.push(self.save(image).await?);
        }
        Ok(paths)
    }
}

/// Keeps the last path component and replaces anything outside `[A-Za-z0-9._-]`.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\front door.jpg"), "front_door.jpg");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "image");
    }

    #[tokio::test]
    async fn save_writes_file_and_returns_public_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads")).unwrap();
        let image = UploadedImage { file_name: "front.jpg".into(), bytes: vec![1, 2, 3] };

        let path = store.save(&image).await.unwrap();
        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with("-front.jpg"));

        let stored = store.dir().join(path.trim_start_matches("/uploads/"));
        assert_eq!(std::fs::read(stored).unwrap(), vec![1, 2, 3]);
    }
}
