//! Trusted collaborator contracts and default implementations.
//!
//! # Responsibility
//! - Define the narrow interfaces handler factories delegate to.
//! - Ship small default implementations for server-side bootstrap.
//!
//! # Invariants
//! - Collaborators are only reachable through a trusted `ServiceMap`.
//! - Collaborator calls report failures as data, never by panicking.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Request model for one command execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// Result of one command execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Command-execution collaborator.
pub trait CommandService: Send + Sync {
    fn execute(&self, request: &CommandRequest) -> CommandOutput;
}

/// One file-system entry projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub size_bytes: u64,
}

/// File-system inspection collaborator.
pub trait FileSystemService: Send + Sync {
    fn list_directory(&self, path: &Path) -> Result<Vec<FileEntry>, String>;
    fn stat(&self, path: &Path) -> Result<FileEntry, String>;
}

/// One stored log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub level: String,
    pub message: String,
    pub timestamp_ms: i64,
}

/// Log storage collaborator.
pub trait LogStoreService: Send + Sync {
    fn append(&self, record: LogRecord);
    /// Returns up to `limit` records, newest last.
    fn recent(&self, limit: usize) -> Vec<LogRecord>;
    fn clear(&self);
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandService;

impl CommandService for ProcessCommandService {
    fn execute(&self, request: &CommandRequest) -> CommandOutput {
        let mut command = Command::new(request.command.as_str());
        command.args(&request.args);
        if let Some(cwd) = &request.cwd {
            command.current_dir(cwd);
        }

        match command.output() {
            Ok(output) => CommandOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code().unwrap_or(-1),
                error: None,
            },
            Err(err) => CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: String::new(),
                exit_code: 1,
                error: Some(format!("failed to spawn `{}`: {err}", request.command)),
            },
        }
    }
}

/// Reads the local file system through `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystemService;

impl FileSystemService for LocalFileSystemService {
    fn list_directory(&self, path: &Path) -> Result<Vec<FileEntry>, String> {
        let reader = std::fs::read_dir(path)
            .map_err(|err| format!("failed to read directory `{}`: {err}", path.display()))?;

        let mut entries = Vec::new();
        for item in reader {
            let item = item.map_err(|err| format!("failed to read entry: {err}"))?;
            entries.push(self.stat(&item.path())?);
        }
        entries.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(entries)
    }

    fn stat(&self, path: &Path) -> Result<FileEntry, String> {
        let metadata = std::fs::metadata(path)
            .map_err(|err| format!("failed to stat `{}`: {err}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(FileEntry {
            name,
            path: path.to_path_buf(),
            is_dir: metadata.is_dir(),
            size_bytes: if metadata.is_dir() { 0 } else { metadata.len() },
        })
    }
}

const DEFAULT_LOG_STORE_CAPACITY: usize = 1_000;

/// Bounded in-memory log store; oldest records are evicted first.
#[derive(Debug)]
pub struct MemoryLogStore {
    capacity: usize,
    records: Mutex<VecDeque<LogRecord>>,
}

impl MemoryLogStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Mutex::new(VecDeque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_STORE_CAPACITY)
    }
}

impl LogStoreService for MemoryLogStore {
    fn append(&self, record: LogRecord) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    fn recent(&self, limit: usize) -> Vec<LogRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
