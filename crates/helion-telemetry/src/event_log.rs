//! Per-symbol append-only JSON-lines event log.
//!
//! One file per `(symbol, date)`; rotates by opening a new file when the
//! date component changes. Each line is one `EventRecord`. Partial
//! corruption only ever affects the last line, never the whole file.

use crate::error::TelemetryResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// One line in a per-symbol event log: start/stop, cycle errors, order
/// submissions, fills.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub ts: i64,
    pub level: String,
    pub symbol: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

struct ActiveFile {
    writer: BufWriter<File>,
    date: String,
}

/// Owns one open file handle per symbol, rotating by date.
pub struct EventLogger {
    logs_dir: PathBuf,
    files: HashMap<String, ActiveFile>,
}

impl EventLogger {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        let logs_dir = logs_dir.into();
        if let Err(e) = std::fs::create_dir_all(&logs_dir) {
            warn!(?e, dir = %logs_dir.display(), "failed to create logs directory");
        }
        Self {
            logs_dir,
            files: HashMap::new(),
        }
    }

    /// Appends one record, opening or rotating the symbol's file as needed.
    pub fn log(&mut self, record: EventRecord) -> TelemetryResult<()> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let needs_rotation = self
            .files
            .get(&record.symbol)
            .map(|f| f.date != today)
            .unwrap_or(true);

        if needs_rotation {
            let path = self
                .logs_dir
                .join(format!("{}_{}.jsonl", record.symbol, today));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            info!(path = %path.display(), "opened per-symbol event log");
            self.files.insert(
                record.symbol.clone(),
                ActiveFile {
                    writer: BufWriter::new(file),
                    date: today,
                },
            );
        }

        let active = self.files.get_mut(&record.symbol).expect("just inserted");
        let json = serde_json::to_string(&record)?;
        writeln!(active.writer, "{}", json)?;
        active.writer.flush()?;
        Ok(())
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        for (symbol, active) in self.files.iter_mut() {
            if let Err(e) = active.writer.flush() {
                warn!(?e, symbol = %symbol, "failed to flush event log on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use tempfile::TempDir;

    fn record(symbol: &str, event_type: &str) -> EventRecord {
        EventRecord {
            ts: 1_700_000_000_000,
            level: "info".to_string(),
            symbol: symbol.to_string(),
            event_type: event_type.to_string(),
            payload: serde_json::json!({}),
        }
    }

    #[test]
    fn log_creates_one_file_per_symbol() {
        let dir = TempDir::new().unwrap();
        let mut logger = EventLogger::new(dir.path());

        logger.log(record("BTC/USDT", "start")).unwrap();
        logger.log(record("ETH/USDT", "start")).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn records_append_across_calls() {
        let dir = TempDir::new().unwrap();
        let mut logger = EventLogger::new(dir.path());

        logger.log(record("BTC/USDT", "start")).unwrap();
        logger.log(record("BTC/USDT", "cycle_error")).unwrap();
        drop(logger);

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);

        let file = File::open(entries[0].as_ref().unwrap().path()).unwrap();
        let lines: Vec<_> = BufReader::new(file).lines().filter_map(|l| l.ok()).collect();
        assert_eq!(lines.len(), 2);

        let parsed: EventRecord = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(parsed.event_type, "cycle_error");
    }
}
