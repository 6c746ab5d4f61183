use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::domain::email::EmailRecord;
use crate::error::{MailError, Result};

/// On-disk shape: `{"timestamp": <epoch secs>, "emails": [...]}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default)]
    pub timestamp: f64,
    pub emails: Vec<EmailRecord>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: f64, expiry: Duration) -> bool {
        now - self.timestamp <= expiry.as_secs_f64()
    }
}

/// Single-file cache of the last successful fetch, valid for `expiry`.
pub struct CacheStore {
    path: PathBuf,
    expiry: Duration,
}

fn now_epoch() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn io_err(path: &Path, source: std::io::Error) -> MailError {
    MailError::CacheIo {
        path: path.display().to_string(),
        source,
    }
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>, expiry: Duration) -> Self {
        Self {
            path: path.into(),
            expiry,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached records if a fresh entry exists. Every failure reads as a miss.
    pub fn read(&self) -> Option<Vec<EmailRecord>> {
        match self.try_read() {
            Ok(hit) => hit,
            Err(e) => {
                debug!("ignoring unreadable cache {}: {e}", self.path.display());
                None
            }
        }
    }

    pub fn try_read(&self) -> Result<Option<Vec<EmailRecord>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path).map_err(|e| io_err(&self.path, e))?;
        let entry: CacheEntry = serde_json::from_reader(BufReader::new(file))?;

        if !entry.is_fresh(now_epoch(), self.expiry) {
            debug!("cache {} expired", self.path.display());
            return Ok(None);
        }
        Ok(Some(entry.emails))
    }

    /// Replace the cache with `emails`, stamped with the current time.
    ///
    /// The entry is written to a temp file beside the target and renamed
    /// over it, so readers see either the old entry or the new one.
    pub fn write(&self, emails: &[EmailRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

        let entry = CacheEntry {
            timestamp: now_epoch(),
            emails: emails.to_vec(),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| io_err(&dir, e))?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), &entry)?;
        tmp.as_file_mut()
            .flush()
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| io_err(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| io_err(&self.path, e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32) -> EmailRecord {
        EmailRecord {
            id: id.to_string(),
            subject: format!("Subject {id}"),
            sender: "Alice <alice@example.com>".into(),
            date: "Mon, 1 Jan 2024 10:00:00 +0000".into(),
            body: format!("body {id}, ünïcödé"),
        }
    }

    #[test]
    fn missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache.json"), Duration::from_secs(300));
        assert_eq!(store.read(), None);
    }

    #[test]
    fn write_then_read_returns_same_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(
            dir.path().join("sub").join("cache.json"),
            Duration::from_secs(300),
        );
        let emails: Vec<_> = [5, 3, 9, 1].into_iter().map(record).collect();

        store.write(&emails).unwrap();
        assert_eq!(store.read(), Some(emails));
    }

    #[test]
    fn rewrite_overwrites_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache.json"), Duration::from_secs(300));

        store.write(&[record(1), record(2)]).unwrap();
        store.write(&[record(7)]).unwrap();
        assert_eq!(store.read(), Some(vec![record(7)]));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let stale = CacheEntry {
            timestamp: now_epoch() - 301.0,
            emails: vec![record(1)],
        };
        fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();

        let store = CacheStore::new(&path, Duration::from_secs(300));
        assert_eq!(store.read(), None);

        let lenient = CacheStore::new(&path, Duration::from_secs(3600));
        assert_eq!(lenient.read(), Some(vec![record(1)]));
    }

    #[test]
    fn corrupt_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ this is not json").unwrap();

        let store = CacheStore::new(&path, Duration::from_secs(300));
        assert_eq!(store.read(), None);
        assert!(store.try_read().is_err());
    }

    #[test]
    fn missing_timestamp_counts_as_expired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"emails": []}"#).unwrap();

        let store = CacheStore::new(&path, Duration::from_secs(300));
        assert_eq!(store.read(), None);
    }

    #[test]
    fn file_uses_documented_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let store = CacheStore::new(&path, Duration::from_secs(300));
        store.write(&[record(4)]).unwrap();

        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(v["timestamp"].is_number());
        let first = &v["emails"][0];
        for key in ["id", "subject", "sender", "date", "body"] {
            assert!(first[key].is_string(), "missing {key}");
        }
        assert_eq!(first["id"], "4");
    }
}
