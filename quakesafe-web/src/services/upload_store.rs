//! Per-request upload storage
//!
//! Each uploaded photograph is written to its own uniquely named file in the
//! upload directory. The file lives as long as the [`StoredUpload`] handle
//! and is removed when the request that created it finishes, so concurrent
//! uploads never overwrite each other.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use uuid::Uuid;

/// Image extensions accepted for upload (lowercase)
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Lowercased extension of `filename` if it is an accepted image type
///
/// The extension is the text after the last `.`; names without a `.` are
/// rejected.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Directory that holds in-flight uploads
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Create the store, creating `dir` if missing
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a fresh file named after a new request id
    pub async fn save(&self, extension: &str, bytes: &[u8]) -> std::io::Result<StoredUpload> {
        let id = Uuid::new_v4();
        let file = tempfile::Builder::new()
            .prefix(&format!("crack_{}_", id))
            .suffix(&format!(".{}", extension))
            .tempfile_in(&self.dir)?;

        tokio::fs::write(file.path(), bytes).await?;

        tracing::debug!(
            upload_id = %id,
            path = %file.path().display(),
            bytes = bytes.len(),
            "Stored upload"
        );

        Ok(StoredUpload { id, file })
    }
}

/// An upload on disk, deleted when dropped
#[derive(Debug)]
pub struct StoredUpload {
    id: Uuid,
    file: NamedTempFile,
}

impl StoredUpload {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the stored image back
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }
}
