//! Storage for files uploaded with comments.

use anyhow::{Result, anyhow};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Sub-directory of the media root that holds comment uploads.
pub const COMMENTS_MEDIA_DIR: &str = "comments_media";

/// URL prefix under which the media root is served.
pub const MEDIA_URL: &str = "/media";

const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];
const VIDEO_EXTENSIONS: [&str; 3] = [".mp4", ".webm", ".ogg"];

/// How an uploaded file is presented on the task page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    /// Classify by case-insensitive file suffix.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }

    /// Classify a `Content-Type` value. SVG can carry script, so it is not an image here.
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if essence == "image/svg+xml" {
            MediaKind::Other
        } else if essence.starts_with("image/") {
            MediaKind::Image
        } else if essence.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }
}

/// Reduce an uploaded file name to a safe single path component.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.chars().take(100).collect()
    }
}

/// Files live under `root`; the database stores paths relative to it.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an upload and return its relative path, e.g. `comments_media/1a2b3c4d_photo.png`.
    pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let dir = self.root.join(COMMENTS_MEDIA_DIR);
        std::fs::create_dir_all(&dir)?;

        let prefix = Uuid::new_v4().simple().to_string();
        let filename = format!("{}_{}", &prefix[..8], sanitize_filename(original_name));
        std::fs::write(dir.join(&filename), bytes)?;

        let relative = format!("{}/{}", COMMENTS_MEDIA_DIR, filename);
        debug!(path = %relative, size = bytes.len(), "stored upload");
        Ok(relative)
    }

    /// Resolve a stored relative path, refusing anything that escapes the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        let safe = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(anyhow!("invalid media path: {}", relative));
        }
        Ok(self.root.join(path))
    }

    /// Remove a stored file. A missing file is not an error.
    pub fn remove(&self, relative: &str) -> Result<()> {
        let path = self.resolve(relative)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "media file already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Public URL of a stored file.
    pub fn url(relative: &str) -> String {
        format!("{}/{}", MEDIA_URL, relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_content_types() {
        assert_eq!(MediaKind::from_content_type("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_content_type("Video/MP4"), MediaKind::Video);
        assert_eq!(MediaKind::from_content_type("image/svg+xml"), MediaKind::Other);
        assert_eq!(MediaKind::from_content_type("text/html; charset=utf-8"), MediaKind::Other);
    }

    #[test]
    fn classifies_by_suffix_ignoring_case() {
        assert_eq!(MediaKind::from_path("comments_media/a_Photo.JPG"), MediaKind::Image);
        assert_eq!(MediaKind::from_path("comments_media/clip.webm"), MediaKind::Video);
        assert_eq!(MediaKind::from_path("comments_media/notes.pdf"), MediaKind::Other);
    }

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\my file (1).png"), "my_file__1_.png");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[test]
    fn save_and_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let relative = store.save("pic.png", b"not really a png").unwrap();
        assert!(relative.starts_with("comments_media/"));
        assert!(relative.ends_with("_pic.png"));

        let path = store.resolve(&relative).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"not really a png");

        store.remove(&relative).unwrap();
        assert!(!path.exists());
        // Second removal is a no-op.
        store.remove(&relative).unwrap();
    }

    #[test]
    fn resolve_rejects_escapes() {
        let store = MediaStore::new("/srv/media");
        assert!(store.resolve("../secret").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("comments_media/x.png").is_ok());
    }
}
