use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::path::{MediaName, PathError};
use crate::render::MediaKind;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Upload is empty")]
    Empty,
    #[error("File not found: {0}")]
    NotFound(MediaName),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Uploaded files under `<root>/images` and `<root>/videos`.
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self, kind: MediaKind) -> PathBuf {
        match kind {
            MediaKind::Image => self.root.join("images"),
            MediaKind::Video => self.root.join("videos"),
        }
    }

    /// Store a raw image body, naming it after its content type.
    pub fn save_image(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<MediaName, MediaError> {
        let (prefix, ext) = match content_type.and_then(image_extension) {
            Some(ext) => ("image", ext),
            None => ("file", "bin".to_string()),
        };
        self.save(MediaKind::Image, prefix, &format!(".{ext}"), bytes)
    }

    /// Store a video, keeping the extension of the uploaded file name.
    pub fn save_video(
        &self,
        bytes: &[u8],
        original_name: Option<&str>,
    ) -> Result<MediaName, MediaError> {
        let ext = original_name
            .and_then(|name| Path::new(name).extension())
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .filter(|ext| is_clean_extension(ext))
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        self.save(MediaKind::Video, "video", &ext, bytes)
    }

    pub fn path(&self, kind: MediaKind, name: &MediaName) -> Result<PathBuf, MediaError> {
        let path = self.dir(kind).join(name.as_str());
        if path.is_file() {
            Ok(path)
        } else {
            Err(MediaError::NotFound(name.clone()))
        }
    }

    fn save(
        &self,
        kind: MediaKind,
        prefix: &str,
        ext: &str,
        bytes: &[u8],
    ) -> Result<MediaName, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }

        let dir = self.dir(kind);
        fs::create_dir_all(&dir)?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        // same-millisecond uploads get a numeric suffix
        for attempt in 0u32.. {
            let name = match attempt {
                0 => format!("{prefix}-{stamp}{ext}"),
                n => format!("{prefix}-{stamp}-{n}{ext}"),
            };

            let path = dir.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    fill(file, &path, bytes)?;
                    tracing::info!(file = %name, size = bytes.len(), "stored upload");
                    return Ok(MediaName::parse(&name)?);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(std::io::Error::other("exhausted upload file names").into())
    }
}

/// Write an upload into its freshly claimed file. A failed write removes the
/// file so a truncated upload never sits under a served name.
fn fill<W: Write>(mut out: W, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Err(e) = out.write_all(bytes).and_then(|_| out.flush()) {
        drop(out);
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!(file = %path.display(), "could not remove partial upload: {}", cleanup);
        }
        return Err(e);
    }
    Ok(())
}

/// `image/png` -> `png`, `image/svg+xml` -> `svg`. Non-image types yield nothing.
fn image_extension(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let subtype = essence.strip_prefix("image/")?;
    let ext = subtype.split('+').next()?;
    let ext = if ext == "jpeg" { "jpg" } else { ext };

    is_clean_extension(ext).then(|| ext.to_string())
}

fn is_clean_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}
