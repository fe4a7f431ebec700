// Storage directory abstraction - one flat directory, artifacts addressed by filename
//
// [`ArtifactStore`] exposes the handful of operations the gateway needs so
// sweeping can run against an in-memory store in tests.

use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// A direct entry of the storage directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub name: String,
    pub is_file: bool,
    /// Latest of creation and modification time; ages are measured from here
    pub touched: SystemTime,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Directory the artifacts live in
    fn root(&self) -> &Path;

    /// List the direct entries of the directory
    async fn list(&self) -> io::Result<Vec<ArtifactEntry>>;

    /// Delete one artifact by name
    async fn remove(&self, name: &str) -> io::Result<()>;

    /// Map a client-supplied filename to a path inside [`root`](Self::root).
    ///
    /// Returns `None` for anything that is not a plain filename.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !is_plain_filename(name) {
            return None;
        }
        let path = self.root().join(name);
        path.starts_with(self.root()).then_some(path)
    }
}

/// Rejects empty names, separators, NUL, `..` and hidden files.
pub fn is_plain_filename(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') {
        return false;
    }
    if name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Store backed by a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open `root`, creating it if missing.
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn list(&self) -> io::Result<Vec<ArtifactEntry>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut listed = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(error) => {
                    // Raced with a concurrent delete, most likely
                    tracing::debug!(path = %path.display(), "skipping entry: {}", error);
                    continue;
                }
            };

            listed.push(ArtifactEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_file: metadata.is_file(),
                touched: last_activity(metadata.created(), metadata.modified()),
            });
        }

        Ok(listed)
    }

    async fn remove(&self, name: &str) -> io::Result<()> {
        let path = self.resolve(name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to remove {:?}", name),
            )
        })?;
        tokio::fs::remove_file(path).await
    }
}

/// Later of the two timestamps.
///
/// yt-dlp writes into `<name>.part` and renames it when done; the rename keeps
/// the birth time, so a long transfer must not be aged from its start.
fn last_activity(
    created: io::Result<SystemTime>,
    modified: io::Result<SystemTime>,
) -> SystemTime {
    match (created, modified) {
        (Ok(created), Ok(modified)) => created.max(modified),
        (Ok(at), Err(_)) | (Err(_), Ok(at)) => at,
        (Err(_), Err(_)) => SystemTime::now(),
    }
}
