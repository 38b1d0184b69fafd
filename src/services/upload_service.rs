use log::{info, warn};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use std::{
    io,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use uuid::Uuid;

use crate::errors::ApiError;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
pub const PUBLIC_PREFIX: &str = "/uploads";

/// A file part pulled out of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Image storage on local disk. Files are named `<uuid>_<sanitized name>`
/// and exposed under `/uploads/<name>`.
#[derive(Debug, Clone)]
pub struct UploadService {
    root: PathBuf,
}

impl UploadService {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `save` would store this file. Callers check this before
    /// touching the store so a rejected request leaves the disk alone.
    pub fn accepts(&self, file: &UploadedFile) -> bool {
        allowed_file(&secure_filename(&file.filename))
    }

    /// Writes the file and returns its public path, or `None` when the
    /// name or extension is not acceptable.
    pub async fn save(&self, file: &UploadedFile) -> Result<Option<String>, ApiError> {
        let filename = secure_filename(&file.filename);
        if !allowed_file(&filename) {
            info!("Ignoring upload '{}': extension not allowed", file.filename);
            return Ok(None);
        }

        let unique_filename = format!("{}_{}", Uuid::new_v4(), filename);
        tokio::fs::write(self.root.join(&unique_filename), &file.bytes)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to save upload: {}", e)))?;

        Ok(Some(format!("{}/{}", PUBLIC_PREFIX, unique_filename)))
    }

    /// Best-effort delete of the file behind a public path. Missing files
    /// are not an error.
    pub async fn remove(&self, public_path: &str) {
        let Some(file_path) = self.resolve(last_segment(public_path)) else {
            warn!("Refusing to remove suspicious upload path '{}'", public_path);
            return;
        };

        match tokio::fs::remove_file(&file_path).await {
            Ok(()) => info!("Removed upload {}", file_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove upload {}: {}", file_path.display(), e),
        }
    }

    pub async fn remove_all<'a>(&self, public_paths: impl IntoIterator<Item = &'a str>) {
        for path in public_paths {
            self.remove(path).await;
        }
    }

    /// Maps a bare filename to its location under the upload root. Anything
    /// that could escape the root resolves to `None`.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let is_plain = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\', '\0']);
        is_plain.then(|| self.root.join(filename))
    }
}

fn last_segment(public_path: &str) -> &str {
    public_path.rsplit('/').next().unwrap_or(public_path)
}

pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty() && ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        None => false,
    }
}

/// Reduces a client-supplied name to `[A-Za-z0-9._-]`, keeping only the
/// final path component and trimming leading/trailing dots and underscores.
/// Accented letters are decomposed (NFKD) first so they keep their base
/// ASCII letter.
pub fn secure_filename(filename: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());

    let ascii: String = filename.nfkd().filter(char::is_ascii).collect();
    let base = ascii.rsplit(['/', '\\']).next().unwrap_or_default();
    let spaced = base.split_whitespace().collect::<Vec<_>>().join("_");
    unsafe_chars
        .replace_all(&spaced, "")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("roamconnect-uploads-{}", Uuid::new_v4()))
    }

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            bytes: b"\x89PNG fake".to_vec(),
        }
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(secure_filename("beach day.png"), "beach_day.png");
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename("C:\\photos\\goa.JPG"), "goa.JPG");
        assert_eq!(secure_filename(".hidden.gif"), "hidden.gif");
        assert_eq!(secure_filename("ñandú.png"), "nandu.png");
        assert_eq!(secure_filename("Café Goa.JPG"), "Cafe_Goa.JPG");
        assert_eq!(secure_filename("東京.png"), "png");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(allowed_file("a.png"));
        assert!(allowed_file("a.JPEG"));
        assert!(allowed_file("a.b.gif"));
        assert!(!allowed_file("a.webp"));
        assert!(!allowed_file("png"));
        assert!(!allowed_file(".png"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn resolve_rejects_traversal() {
        let uploads = UploadService { root: PathBuf::from("/srv/uploads") };
        assert_eq!(
            uploads.resolve("x.png"),
            Some(PathBuf::from("/srv/uploads/x.png"))
        );
        assert!(uploads.resolve("..").is_none());
        assert!(uploads.resolve("../x.png").is_none());
        assert!(uploads.resolve("").is_none());
    }

    #[actix_rt::test]
    async fn save_then_remove() {
        let uploads = UploadService::new(temp_root()).unwrap();

        let path = uploads.save(&png("my trip.png")).await.unwrap().unwrap();
        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with("_my_trip.png"));

        let on_disk = uploads.root().join(last_segment(&path));
        assert!(on_disk.exists());

        uploads.remove(&path).await;
        assert!(!on_disk.exists());

        // Second removal is a no-op.
        uploads.remove(&path).await;
        let _ = std::fs::remove_dir_all(uploads.root());
    }

    #[actix_rt::test]
    async fn disallowed_files_are_silently_skipped() {
        let uploads = UploadService::new(temp_root()).unwrap();

        assert_eq!(uploads.save(&png("notes.txt")).await.unwrap(), None);
        assert_eq!(uploads.save(&png("")).await.unwrap(), None);
        assert!(!uploads.accepts(&png("noext")));
        assert_eq!(std::fs::read_dir(uploads.root()).unwrap().count(), 0);
        let _ = std::fs::remove_dir_all(uploads.root());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a"), "application/octet-stream");
    }
}
