use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::state::StoreState;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable storage for the single task document.
///
/// `load` returns `Ok(None)` when no document has ever been saved; seeding
/// a default is the caller's job. `save` replaces the whole document.
pub trait Gateway: Send + Sync {
    fn load(&self) -> Result<Option<StoreState>, GatewayError>;
    fn save(&self, state: &StoreState) -> Result<(), GatewayError>;
}

/// The document as a pretty-printed JSON file, replaced atomically on save.
///
/// A failed save journals the document to the recovery log once per run
/// of consecutive failures; retries inside the same run are not journaled.
pub struct JsonFileGateway {
    path: PathBuf,
    data_dir: PathBuf,
    failing: AtomicBool,
}

impl JsonFileGateway {
    /// `data_dir` is where failed writes are journaled.
    pub fn new(path: PathBuf, data_dir: PathBuf) -> Self {
        JsonFileGateway {
            path,
            data_dir,
            failing: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Gateway for JsonFileGateway {
    fn load(&self) -> Result<Option<StoreState>, GatewayError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(GatewayError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                recovery::log_recovery(
                    &self.data_dir,
                    RecoveryEntry::new(RecoveryCategory::Parser, "document did not parse")
                        .field("Source", self.path.display().to_string())
                        .field("Error", e.to_string())
                        .body(content),
                );
                Err(GatewayError::Parse {
                    path: self.path.clone(),
                    source: e,
                })
            }
        }
    }

    fn save(&self, state: &StoreState) -> Result<(), GatewayError> {
        let content = serde_json::to_string_pretty(state)?;
        if let Err(e) = recovery::atomic_write(&self.path, content.as_bytes()) {
            if !self.failing.swap(true, Ordering::SeqCst) {
                recovery::log_recovery(
                    &self.data_dir,
                    RecoveryEntry::new(RecoveryCategory::Write, "document write failed")
                        .field("Target", self.path.display().to_string())
                        .field("Error", e.to_string())
                        .body(content),
                );
            }
            return Err(GatewayError::Write {
                path: self.path.clone(),
                source: e,
            });
        }
        self.failing.store(false, Ordering::SeqCst);
        Ok(())
    }
}
