// # File Purge Ledger
//
// Append-only, file-based implementation of PurgeLedger.
//
// ## File Format
//
// One JSON object per line (JSON lines):
//
// ```json
// {"created_at":"2025-01-09T12:00:00Z","method":"key","target":"blog.post:7","success":true,"response_status":200,"response_body":"{\"status\":\"ok\"}"}
// ```
//
// Appending a line is the only write the ledger ever performs; entries
// are never rewritten, so a crash mid-append can lose at most the entry
// being written. A torn trailing line is skipped on read (logged at warn
// level) rather than poisoning the whole history.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::traits::{PurgeLedger, PurgeLogEntry};
use crate::Error;

/// File-based purge ledger (append-only JSON lines)
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    // Serializes appends so concurrent purges can't interleave lines
    write_lock: Mutex<()>,
}

impl FileLedger {
    /// Create or open a file ledger at the given path.
    ///
    /// Parent directories are created if needed; the file itself is
    /// created lazily on the first append.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::ledger(format!(
                        "Failed to create ledger directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    async fn read_entries(&self) -> Result<Vec<PurgeLogEntry>, Error> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::ledger(format!(
                "Failed to read ledger file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut entries = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<PurgeLogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        "Skipping unreadable ledger line in {}: {}",
                        self.path.display(),
                        e
                    );
                }
            }
        }

        Ok(entries)
    }
}

#[async_trait]
impl PurgeLedger for FileLedger {
    async fn record(&self, entry: PurgeLogEntry) -> Result<(), Error> {
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                Error::ledger(format!(
                    "Failed to open ledger file {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        file.write_all(line.as_bytes()).await.map_err(|e| {
            Error::ledger(format!(
                "Failed to append to ledger file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::ledger(format!(
                "Failed to flush ledger file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PurgeLogEntry>, Error> {
        let entries = self.read_entries().await?;
        Ok(entries.into_iter().rev().take(limit).collect())
    }

    async fn len(&self) -> Result<usize, Error> {
        Ok(self.read_entries().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PurgeMethod;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_ledger_append_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("purges.jsonl");

        let ledger = FileLedger::new(&path).await.unwrap();
        assert_eq!(ledger.len().await.unwrap(), 0);

        ledger
            .record(PurgeLogEntry::new(
                PurgeMethod::Key,
                "blog.post:1",
                true,
                Some(200),
                "ok",
            ))
            .await
            .unwrap();
        ledger
            .record(PurgeLogEntry::new(
                PurgeMethod::Url,
                "/blog/hello/",
                false,
                Some(500),
                "boom",
            ))
            .await
            .unwrap();

        assert_eq!(ledger.len().await.unwrap(), 2);

        let recent = ledger.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].target, "/blog/hello/");
        assert!(!recent[0].success);
        assert_eq!(recent[1].target, "blog.post:1");
    }

    #[tokio::test]
    async fn test_file_ledger_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("purges.jsonl");

        {
            let ledger = FileLedger::new(&path).await.unwrap();
            ledger
                .record(PurgeLogEntry::new(
                    PurgeMethod::PurgeAll,
                    "*",
                    true,
                    Some(200),
                    "ok",
                ))
                .await
                .unwrap();
        }

        let reopened = FileLedger::new(&path).await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_file_ledger_skips_torn_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("purges.jsonl");

        let ledger = FileLedger::new(&path).await.unwrap();
        ledger
            .record(PurgeLogEntry::new(
                PurgeMethod::Key,
                "blog.post:1",
                true,
                Some(200),
                "ok",
            ))
            .await
            .unwrap();

        // Simulate a crash mid-append
        let mut content = fs::read_to_string(&path).await.unwrap();
        content.push_str("{\"created_at\":\"2025-01-");
        fs::write(&path, content).await.unwrap();

        let entries = ledger.recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, "blog.post:1");
    }

    #[tokio::test]
    async fn test_file_ledger_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("purges.jsonl");

        let ledger = FileLedger::new(&path).await.unwrap();
        ledger
            .record(PurgeLogEntry::new(
                PurgeMethod::Key,
                "blog.post:1",
                true,
                Some(200),
                "ok",
            ))
            .await
            .unwrap();

        assert!(path.exists());
    }
}
