// # File Audit Log
//
// JSON-file implementation of AuditLog with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: the whole log is written to a `.tmp` file, then renamed
// - Backup: after each rename the new file is copied to `.backup`
// - Recovery: a main file that fails to parse is moved to `.corrupt-<time>`
//   and replaced by the backup
// - No usable backup: opening fails and the corrupted file is left untouched
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": [
//     {
//       "zone_id": "Z1D633PJN98FT9",
//       "zone_name": "example.com",
//       "comment": "Generated by zonesync for ops@build01 at 2025-01-09 12:00:00.",
//       "creates": 1,
//       "deletes": 1,
//       "change_id": "/change/C2682N5HXP0BZ4",
//       "status": "PENDING",
//       "submitted_at": "2025-01-09T12:00:00Z",
//       "request_xml": "<?xml version=\"1.0\" encoding=\"UTF-8\"?>..."
//     }
//   ]
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::model::ZoneId;
use crate::traits::audit_log::{AuditLog, AuditRecord};

/// Audit file format version
const AUDIT_FILE_VERSION: &str = "1.0";

/// File-backed audit log
///
/// Every append rewrites the file atomically before returning.
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    records: Vec<AuditRecord>,
    dirty: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct AuditFileFormat {
    version: String,
    records: Vec<AuditRecord>,
}

impl FileAuditLog {
    /// Open or create the audit log at `path`
    ///
    /// Parent directories are created. A corrupted file is kept aside and
    /// the log is recovered from its backup.
    ///
    /// # Errors
    ///
    /// [`Error::AuditLog`] when the file is corrupted and no usable backup
    /// exists. Nothing is rewritten in that case.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create audit log directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let records = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                records,
                dirty: false,
            })),
        })
    }

    /// Path of the main file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_with_recovery(path: &Path) -> Result<Vec<AuditRecord>, Error> {
        let err = match Self::load(path).await {
            Ok(records) => {
                tracing::debug!("Loaded audit log: {} records", records.len());
                return Ok(records);
            }
            Err(e @ Error::Json(_)) => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            "Audit log {} appears corrupted: {}. Attempting recovery from backup.",
            path.display(),
            err
        );

        let backup_path = Self::backup_path(path);
        let records = match Self::load_existing(&backup_path).await {
            Ok(Some(records)) => records,
            Ok(None) => {
                return Err(Error::audit_log(format!(
                    "{} is corrupted ({}) and has no backup; repair or move it aside",
                    path.display(),
                    err
                )));
            }
            Err(backup_err) => {
                return Err(Error::audit_log(format!(
                    "{} is corrupted ({}) and its backup is unreadable ({})",
                    path.display(),
                    err,
                    backup_err
                )));
            }
        };

        let corrupt_path = Self::corrupt_path(path);
        fs::rename(path, &corrupt_path).await.map_err(|e| {
            Error::audit_log(format!(
                "Failed to move corrupted {} aside: {}",
                path.display(),
                e
            ))
        })?;
        tracing::warn!("Corrupted audit log kept as {}", corrupt_path.display());

        fs::copy(&backup_path, path).await.map_err(|e| {
            Error::audit_log(format!(
                "Failed to restore {} from backup: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!("Recovered audit log from backup: {} records", records.len());
        Ok(records)
    }

    /// Load a file that must exist
    async fn load_existing(path: &Path) -> Result<Option<Vec<AuditRecord>>, Error> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).await.map(Some)
    }

    async fn load(path: &Path) -> Result<Vec<AuditRecord>, Error> {
        if !path.exists() {
            tracing::debug!("Audit log does not exist yet: {}", path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::audit_log(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let file: AuditFileFormat = serde_json::from_str(&content)?;

        if file.version != AUDIT_FILE_VERSION {
            tracing::warn!(
                "Audit log version mismatch: expected {}, got {}. Loading anyway.",
                AUDIT_FILE_VERSION,
                file.version
            );
        }

        Ok(file.records)
    }

    async fn write(&self) -> Result<(), Error> {
        let mut guard = self.state.write().await;

        let file = AuditFileFormat {
            version: AUDIT_FILE_VERSION.to_string(),
            records: guard.records.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::audit_log(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::audit_log(format!("Failed to write {}: {}", temp_path.display(), e))
            })?;
            out.flush().await.map_err(|e| {
                Error::audit_log(format!("Failed to flush {}: {}", temp_path.display(), e))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::audit_log(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        // The backup mirrors the file just written
        if let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await {
            tracing::warn!("Failed to back up audit log: {}", e);
        }

        guard.dirty = false;
        tracing::trace!("Audit log written: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    fn corrupt_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(
            "{}.corrupt-{}",
            name,
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f")
        ))
    }
}

#[async_trait]
impl AuditLog for FileAuditLog {
    async fn append(&self, record: AuditRecord) -> Result<(), Error> {
        {
            let mut guard = self.state.write().await;
            guard.records.push(record);
            guard.dirty = true;
        }
        self.write().await
    }

    async fn records(&self, zone: Option<&ZoneId>) -> Result<Vec<AuditRecord>, Error> {
        let guard = self.state.read().await;
        Ok(guard
            .records
            .iter()
            .filter(|r| zone.is_none_or(|z| &r.zone_id == z))
            .cloned()
            .collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty { self.write().await } else { Ok(()) }
    }
}
