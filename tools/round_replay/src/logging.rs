use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::PathBuf,
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};
use serde_json::json;

/// `log` backend: human-readable lines on stderr, plus JSON lines in an
/// optional file for later diffing.
pub struct Logger {
    level: LevelFilter,
    json_file: Mutex<Option<File>>,
}

impl Logger {
    pub fn new(level: LevelFilter, path: Option<PathBuf>) -> Result<Self> {
        let json_file = match path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("failed to open log file {}", path.display()))?;
                Some(file)
            }
            None => None,
        };
        Ok(Self {
            level,
            json_file: Mutex::new(json_file),
        })
    }

    pub fn install(self) -> Result<()> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self)).context("logger already installed")?;
        log::set_max_level(level);
        Ok(())
    }

    fn event(&self, level: &str, target: &str, message: &str) {
        let Ok(mut guard) = self.json_file.lock() else {
            return;
        };
        let Some(file) = guard.as_mut() else {
            return;
        };

        let ts_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let entry = json!({
            "ts_ms": ts_ms,
            "level": level,
            "target": target,
            "msg": message,
        });

        let _ = writeln!(file, "{}", entry);
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        eprintln!("[{}] {}", record.level(), message);
        self.event(record.level().as_str(), record.target(), &message);
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.json_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}
