//! Process-wide debug logger
//!
//! Keeps a ring buffer of recent entries (shown by `/logs` in the chat
//! terminal), optionally appends to a file, and forwards every entry to
//! `tracing` so a subscriber installed by the binary sees it too.

use chrono::Local;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Lowercase name, as used in config files and filter directives
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

pub struct DebugLogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub module: String,
    pub message: String,
}

impl std::fmt::Display for DebugLogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] [{}] [{}] {}",
            self.timestamp,
            self.level.label(),
            self.module,
            self.message
        )
    }
}

pub struct DebugLogger {
    ring_buffer: VecDeque<DebugLogEntry>,
    max_entries: usize,
    min_level: LogLevel,
    file_path: Option<PathBuf>,
}

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();

fn get_logger() -> &'static Mutex<DebugLogger> {
    LOGGER.get_or_init(|| Mutex::new(DebugLogger::new(1000)))
}

impl DebugLogger {
    pub fn new(max_entries: usize) -> Self {
        Self {
            ring_buffer: VecDeque::with_capacity(max_entries),
            max_entries,
            min_level: LogLevel::Info,
            file_path: None,
        }
    }

    pub fn set_file_path(&mut self, path: PathBuf) {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        self.file_path = Some(path);
    }

    pub fn set_min_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn log(&mut self, level: LogLevel, module: &str, message: &str) {
        if level < self.min_level {
            return;
        }

        let entry = DebugLogEntry {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            level,
            module: module.to_string(),
            message: message.to_string(),
        };

        if let Some(path) = &self.file_path {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", entry);
            }
        }

        if self.ring_buffer.len() >= self.max_entries {
            self.ring_buffer.pop_front();
        }
        self.ring_buffer.push_back(entry);
    }

    pub fn get_recent(&self, n: usize) -> Vec<String> {
        self.ring_buffer
            .iter()
            .rev()
            .take(n)
            .map(|e| e.to_string())
            .collect()
    }
}

/// Configure the global logger. Safe to call more than once.
pub fn init(level: LogLevel, file: Option<PathBuf>) {
    let mut logger = get_logger().lock();
    logger.set_min_level(level);
    if let Some(path) = file {
        logger.set_file_path(path);
    }
}

pub fn log(level: LogLevel, module: &str, message: impl Into<String>) {
    let message = message.into();
    match level {
        LogLevel::Debug => tracing::debug!(target: "folio", module, "{}", message),
        LogLevel::Info => tracing::info!(target: "folio", module, "{}", message),
        LogLevel::Warn => tracing::warn!(target: "folio", module, "{}", message),
        LogLevel::Error => tracing::error!(target: "folio", module, "{}", message),
    }
    get_logger().lock().log(level, module, &message);
}

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Debug, module_path!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Info, module_path!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Warn, module_path!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Error, module_path!(), format!($($arg)*));
    };
}

pub fn get_recent_logs(n: usize) -> Vec<String> {
    get_logger().lock().get_recent(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let mut logger = DebugLogger::new(2);
        logger.set_min_level(LogLevel::Debug);
        logger.log(LogLevel::Info, "m", "first");
        logger.log(LogLevel::Info, "m", "second");
        logger.log(LogLevel::Info, "m", "third");

        let recent = logger.get_recent(10);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].ends_with("third"));
        assert!(recent[1].ends_with("second"));
    }

    #[test]
    fn test_min_level_filters() {
        let mut logger = DebugLogger::new(10);
        logger.set_min_level(LogLevel::Warn);
        logger.log(LogLevel::Info, "m", "quiet");
        logger.log(LogLevel::Error, "m", "loud");

        let recent = logger.get_recent(10);
        assert_eq!(recent.len(), 1);
        assert!(recent[0].contains("[ERROR]"));
    }

    #[test]
    fn test_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("folio.log");
        let mut logger = DebugLogger::new(10);
        logger.set_file_path(path.clone());
        logger.log(LogLevel::Info, "folio_core::test", "written");

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("[folio_core::test] written"));
    }
}
