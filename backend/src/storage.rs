use crate::error::ApiError;
use crate::render::OutputFormat;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Filesystem store for rendered artifacts. Filenames are generated here and
/// are the only names ever served back.
pub struct ArtifactStore {
    base_dir: PathBuf,
    durable: bool,
    ttl: Duration,
}

fn generate_artifact_id() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"0123456789abcdef";
    let mut rng = rand::rng();
    (0..32)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// A filename is only served if it is a single plain path segment. Dot
/// prefixes are reserved for housekeeping files.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
}

fn content_type_for(filename: &str) -> &'static str {
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some("pdf") => OutputFormat::Pdf.content_type(),
        Some("png") => OutputFormat::Png.content_type(),
        _ => "application/octet-stream",
    }
}

impl ArtifactStore {
    /// Creates the base directory eagerly so the first request never races
    /// directory creation.
    pub fn new(base_dir: &Path, durable: bool, ttl: Duration) -> Result<Self, ApiError> {
        std::fs::create_dir_all(base_dir).map_err(|e| {
            ApiError::Storage(format!(
                "failed to create artifact dir {}: {}",
                base_dir.display(),
                e
            ))
        })?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            durable,
            ttl,
        })
    }

    /// Writes the bytes under a freshly generated collision-resistant
    /// filename and returns it.
    pub async fn save(&self, bytes: &[u8], format: OutputFormat) -> Result<String, ApiError> {
        let filename = format!("{}.{}", generate_artifact_id(), format.ext());
        let path = self.base_dir.join(&filename);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            ApiError::Storage(format!("failed to write {}: {}", path.display(), e))
        })?;
        info!("Stored artifact {} ({} bytes)", filename, bytes.len());
        Ok(filename)
    }

    /// Returns the artifact bytes and content type. Unsafe filenames are
    /// rejected before any filesystem access.
    pub async fn load(&self, filename: &str) -> Result<(Vec<u8>, &'static str), ApiError> {
        if !is_safe_filename(filename) {
            return Err(ApiError::PathSafety);
        }
        let path = self.base_dir.join(filename);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok((bytes, content_type_for(filename))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ApiError::NotFound),
            Err(e) => Err(ApiError::Storage(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Best-effort retention sweep. Never fails the triggering request:
    /// every error is logged and skipped. Only files already past the TTL
    /// are considered, so the ordering relative to a request's own fresh
    /// write does not matter.
    pub fn sweep(&self) {
        self.sweep_at(SystemTime::now());
    }

    fn sweep_at(&self, now: SystemTime) {
        if self.durable {
            return;
        }
        let entries = match std::fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Failed to scan artifact dir {}: {}",
                    self.base_dir.display(),
                    e
                );
                return;
            }
        };

        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let Ok(modified) = meta.modified() else {
                continue;
            };
            match now.duration_since(modified) {
                Ok(age) if age > self.ttl => match std::fs::remove_file(entry.path()) {
                    Ok(()) => info!("Cleaned up old artifact: {}", name),
                    Err(e) => warn!("Failed to remove {}: {}", name, e),
                },
                _ => {}
            }
        }
    }
}
