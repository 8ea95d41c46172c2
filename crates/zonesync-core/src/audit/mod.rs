// # Audit Log Implementations

pub mod file;
pub mod memory;

pub use file::FileAuditLog;
pub use memory::MemoryAuditLog;

use crate::config::AuditLogConfig;
use crate::traits::AuditLog;

/// Build the audit log described by `config`
///
/// Returns `None` when auditing is disabled.
pub async fn from_config(config: &AuditLogConfig) -> crate::Result<Option<Box<dyn AuditLog>>> {
    match config {
        AuditLogConfig::Disabled => Ok(None),
        AuditLogConfig::Memory => Ok(Some(Box::new(MemoryAuditLog::new()))),
        AuditLogConfig::File { path } => Ok(Some(Box::new(FileAuditLog::open(path).await?))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config() {
        assert!(from_config(&AuditLogConfig::Disabled).await.unwrap().is_none());
        assert!(from_config(&AuditLogConfig::Memory).await.unwrap().is_some());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        let log = from_config(&AuditLogConfig::File {
            path: path.to_string_lossy().into_owned(),
        })
        .await
        .unwrap();
        assert!(log.is_some());
    }
}
