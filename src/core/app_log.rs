use crate::models::Config;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const LIVE_FILE: &str = "window-state.log.jsonl";
const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;
/// Rotated files kept next to the live one.
const KEPT_GENERATIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppLogRecord {
    pub ts_ms: i64,
    pub level: String,
    pub scope: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl AppLogRecord {
    pub fn new(level: &str, scope: &str, message: &str, data: Option<Value>) -> Self {
        Self {
            ts_ms: Utc::now().timestamp_millis(),
            level: level.to_string(),
            scope: scope.to_string(),
            message: message.to_string(),
            data,
        }
    }

    /// `needle` must already be lowercase.
    fn mentions(&self, needle: &str) -> bool {
        [&self.level, &self.scope, &self.message]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sink {
    Silent,
    Stderr,
    Dir(PathBuf),
}

/// Where a keeper's log records go: a rotating JSON-lines file, stderr, or nowhere.
#[derive(Debug)]
pub struct AppLog {
    sink: Sink,
    lock: Mutex<()>,
}

impl AppLog {
    fn with_sink(sink: Sink) -> Self {
        Self {
            sink,
            lock: Mutex::new(()),
        }
    }

    /// `log_dir` wins over `log_stderr`; with neither, records are dropped.
    pub fn from_config(config: &Config) -> Self {
        match (&config.log_dir, config.log_stderr) {
            (Some(dir), _) => Self::to_dir(dir.clone()),
            (None, true) => Self::stderr(),
            (None, false) => Self::silent(),
        }
    }

    pub fn to_dir(dir: impl Into<PathBuf>) -> Self {
        Self::with_sink(Sink::Dir(dir.into()))
    }

    pub fn stderr() -> Self {
        Self::with_sink(Sink::Stderr)
    }

    pub fn silent() -> Self {
        Self::with_sink(Sink::Silent)
    }

    pub fn dir(&self) -> Option<&Path> {
        match &self.sink {
            Sink::Dir(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn append(&self, record: AppLogRecord) -> Result<(), String> {
        let dir = match &self.sink {
            Sink::Silent => return Ok(()),
            Sink::Stderr => {
                let line = serde_json::to_string(&record)
                    .map_err(|e| format!("Failed to serialize log record: {}", e))?;
                eprintln!("{}", line);
                return Ok(());
            }
            Sink::Dir(dir) => dir,
        };

        let mut line = serde_json::to_vec(&record)
            .map_err(|e| format!("Failed to serialize log record: {}", e))?;
        line.push(b'\n');

        let _guard = self.lock.lock();
        fs::create_dir_all(dir).map_err(|e| format!("Failed to create log dir: {}", e))?;
        rotate(dir).map_err(|e| format!("Failed to rotate log: {}", e))?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(generation_path(dir, 0))
            .and_then(|mut file| file.write_all(&line))
            .map_err(|e| format!("Failed to write log record: {}", e))
    }

    fn emit(&self, level: &str, scope: &str, message: &str, data: Option<Value>) {
        // logging must never take the caller down with it
        let _ = self.append(AppLogRecord::new(level, scope, message, data));
    }

    pub fn info(&self, scope: &str, message: &str, data: Option<Value>) {
        self.emit("info", scope, message, data);
    }

    pub fn warn(&self, scope: &str, message: &str, data: Option<Value>) {
        self.emit("warn", scope, message, data);
    }

    pub fn error(&self, scope: &str, message: &str, data: Option<Value>) {
        self.emit("error", scope, message, data);
    }

    /// The newest `limit` records, oldest first, whose level, scope or message contains `query`
    /// (case-insensitive). Always empty unless logging to a directory.
    pub fn read(&self, limit: usize, query: Option<&str>) -> Result<Vec<AppLogRecord>, String> {
        let Some(dir) = self.dir() else {
            return Ok(Vec::new());
        };
        let needle = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let _guard = self.lock.lock();
        let mut newest = VecDeque::new();
        for path in log_files(dir) {
            let file = File::open(&path)
                .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
            let records = BufReader::new(file)
                .lines()
                .map_while(Result::ok)
                .filter_map(|line| serde_json::from_str::<AppLogRecord>(&line).ok());
            for record in records {
                if needle.as_deref().is_some_and(|n| !record.mentions(n)) {
                    continue;
                }
                if newest.len() == limit {
                    newest.pop_front();
                }
                if limit > 0 {
                    newest.push_back(record);
                }
            }
        }
        Ok(newest.into())
    }

    pub fn clear(&self) -> Result<(), String> {
        let Some(dir) = self.dir() else {
            return Ok(());
        };
        let _guard = self.lock.lock();
        for path in log_files(dir) {
            fs::remove_file(&path)
                .map_err(|e| format!("Failed to remove {}: {}", path.display(), e))?;
        }
        Ok(())
    }
}

/// Generation 0 is the live file; higher generations are older.
fn generation_path(dir: &Path, generation: usize) -> PathBuf {
    if generation == 0 {
        dir.join(LIVE_FILE)
    } else {
        dir.join(format!("window-state.log.{}.jsonl", generation))
    }
}

/// Log files that exist, oldest first.
fn log_files(dir: &Path) -> Vec<PathBuf> {
    (0..=KEPT_GENERATIONS)
        .rev()
        .map(|generation| generation_path(dir, generation))
        .filter(|path| path.is_file())
        .collect()
}

/// Once the live file is full, every generation moves one slot older and the oldest falls off.
fn rotate(dir: &Path) -> io::Result<()> {
    match fs::metadata(generation_path(dir, 0)) {
        Ok(meta) if meta.len() >= ROTATE_AT_BYTES => {}
        _ => return Ok(()),
    }
    for generation in (0..KEPT_GENERATIONS).rev() {
        let from = generation_path(dir, generation);
        if from.is_file() {
            fs::rename(&from, generation_path(dir, generation + 1))?;
        }
    }
    Ok(())
}
