//! JSON Directory Backend
//!
//! One pretty-printed `<id>.json` file per node inside a project directory.
//! Writes go to a temporary file that is then renamed over the target, so a
//! reader never observes a half-written record.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use super::error::PersistenceError;
use super::persistence::NodePersistence;
use crate::config::PersistenceConfig;
use crate::models::{validate_id, NodeRecord};

const RECORD_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

pub struct JsonDirPersistence {
    dir: PathBuf,
    policy: PersistenceConfig,
}

impl JsonDirPersistence {
    /// Open (creating if needed) a record directory
    pub fn new(dir: impl Into<PathBuf>, policy: PersistenceConfig) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| PersistenceError::io(&dir, e))?;
        debug!("Opened node directory {:?}", dir);
        Ok(Self { dir, policy })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, RECORD_EXTENSION))
    }

    fn temp_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, TEMP_EXTENSION))
    }

    fn read_record(&self, path: &Path) -> Result<NodeRecord, PersistenceError> {
        let contents = fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|e| PersistenceError::corrupt(path, e.to_string()))
    }

    /// Run a filesystem operation under the configured retry policy
    fn with_retry<T>(
        &self,
        id: &str,
        path: &Path,
        mut op: impl FnMut() -> std::io::Result<T>,
    ) -> Result<T, PersistenceError> {
        let started = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let elapsed = started.elapsed();
                    if elapsed >= self.policy.timeout() {
                        return Err(PersistenceError::TimedOut {
                            id: id.to_string(),
                            attempts,
                            elapsed,
                        });
                    }
                    if attempts >= self.policy.max_attempts {
                        return Err(PersistenceError::io(path, err));
                    }
                    warn!(
                        "Attempt {}/{} for node {} failed: {}",
                        attempts, self.policy.max_attempts, id, err
                    );
                    thread::sleep(self.policy.backoff());
                }
            }
        }
    }
}

impl NodePersistence for JsonDirPersistence {
    fn load(&self, id: &str) -> Result<Option<NodeRecord>, PersistenceError> {
        // Ids that cannot name a record file never resolve outside the directory
        if validate_id(id).is_err() {
            return Ok(None);
        }
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let record = self.read_record(&path)?;
        if record.id() != id {
            return Err(PersistenceError::corrupt(
                &path,
                format!("file holds node {}", record.id()),
            ));
        }
        Ok(Some(record))
    }

    fn load_all(&self) -> Result<Vec<NodeRecord>, PersistenceError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| PersistenceError::io(&self.dir, e))?;

        let mut records = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| PersistenceError::io(&self.dir, e))?.path();
            let is_record = path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXTENSION);
            if !is_record {
                continue;
            }

            let record = self.read_record(&path)?;
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if record.id() != stem {
                return Err(PersistenceError::corrupt(
                    &path,
                    format!("file holds node {}", record.id()),
                ));
            }
            records.push(record);
        }

        records.sort_by(|a, b| a.id().cmp(b.id()));
        debug!("Loaded {} node(s) from {:?}", records.len(), self.dir);
        Ok(records)
    }

    fn write(&self, record: &NodeRecord) -> Result<(), PersistenceError> {
        let id = record.id();
        let contents =
            serde_json::to_string_pretty(record).map_err(|source| PersistenceError::Serialization {
                id: id.to_string(),
                source,
            })?;

        let path = self.record_path(id);
        let temp = self.temp_path(id);
        self.with_retry(id, &path, || {
            fs::write(&temp, contents.as_bytes())?;
            fs::rename(&temp, &path)
        })
    }

    fn remove(&self, id: &str) -> Result<(), PersistenceError> {
        let path = self.record_path(id);
        self.with_retry(id, &path, || match fs::remove_file(&path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        })
    }
}
