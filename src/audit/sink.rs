//! Persistence boundary for audit records.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;

use super::AuditRecord;

/// Storage abstraction for the audit trail. `save` is called once per
/// decision; `load` backs offline inspection.
pub trait AuditSink: Send + Sync {
    fn save(&self, record: &AuditRecord) -> Result<()>;
    fn load(&self) -> Result<Vec<AuditRecord>>;
}

/// Sink that keeps records in memory. Test and embedding support.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn save(&self, record: &AuditRecord) -> Result<()> {
        let mut records = self.records.lock().expect("audit sink lock poisoned");
        records.push(record.clone());
        Ok(())
    }

    fn load(&self) -> Result<Vec<AuditRecord>> {
        let records = self.records.lock().expect("audit sink lock poisoned");
        Ok(records.clone())
    }
}

/// File-backed sink: one JSON record per line, append-only.
#[derive(Debug, Clone)]
pub struct FileAuditSink {
    path: PathBuf,
}

impl FileAuditSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location: `~/.toolgate/audit.jsonl`.
    pub fn new_default() -> Self {
        Self {
            path: default_audit_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn save(&self, record: &AuditRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<AuditRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut records = Vec::new();
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }
}

fn default_audit_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".toolgate"))
        .unwrap_or_else(|| PathBuf::from(".toolgate"))
        .join("audit.jsonl")
}
