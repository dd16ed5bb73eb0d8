use crate::automation::MacroTimeline;
use crate::error::{PersistenceError, Result};
use crate::features::FeatureVector;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Snapshot format version written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

/// A learned example as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredExample {
    pub label: String,
    pub feature: FeatureVector,
}

/// Persisted engine state: learned examples and the macro timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub examples: Vec<StoredExample>,
    pub timeline: MacroTimeline,
}

impl Snapshot {
    pub fn new(examples: Vec<StoredExample>, timeline: MacroTimeline) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            examples,
            timeline,
        }
    }

    /// Check the invariants a loaded snapshot must satisfy
    pub fn validate(&self) -> std::result::Result<(), PersistenceError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        if let Some(first) = self.examples.first() {
            let dimension = first.feature.len();
            if let Some(bad) = self
                .examples
                .iter()
                .find(|example| example.feature.len() != dimension)
            {
                return Err(PersistenceError::Corrupted {
                    details: format!(
                        "example '{}' has {} features, expected {}",
                        bad.label,
                        bad.feature.len(),
                        dimension
                    ),
                });
            }
        }

        if let Some(bad) = self
            .examples
            .iter()
            .find(|example| example.label.trim().is_empty())
        {
            return Err(PersistenceError::Corrupted {
                details: format!("example with empty label ({} features)", bad.feature.len()),
            });
        }

        Ok(())
    }
}

/// Optional storage for snapshots; without one, state lives for the
/// process lifetime only
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Load the last snapshot, `None` when nothing was saved yet
    async fn load(&self) -> Result<Option<Snapshot>>;

    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Snapshot stored as a JSON document, replaced atomically on save
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl Persistence for JsonFilePersistence {
    async fn load(&self) -> Result<Option<Snapshot>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e).into()),
        };

        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|e| PersistenceError::Corrupted {
                details: e.to_string(),
            })?;
        snapshot.validate()?;

        info!(
            "Loaded snapshot from {} ({} examples, {} macro events)",
            self.path.display(),
            snapshot.examples.len(),
            snapshot.timeline.len()
        );
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| {
            PersistenceError::Corrupted {
                details: format!("failed to serialize snapshot: {}", e),
            }
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &json)
            .await
            .map_err(|e| self.io_error(e))?;

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            warn!("Failed to move snapshot into place: {}", e);
            let _ = fs::remove_file(&temp_path).await;
            return Err(self.io_error(e).into());
        }

        info!(
            "Saved snapshot to {} ({} examples, {} macro events)",
            self.path.display(),
            snapshot.examples.len(),
            snapshot.timeline.len()
        );
        Ok(())
    }
}
