//! Diagnostic Log
//!
//! Append-only JSONL log of engine events. Every line carries a sequential
//! event id and the id of the run that wrote it.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use uuid::Uuid;
use war_events::EngineEvent;

/// One line of the diagnostic log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub event_id: String,
    pub run_id: Uuid,
    #[serde(flatten)]
    pub event: EngineEvent,
}

/// Writes engine events to a JSONL file
pub struct DiagnosticLog {
    writer: Option<BufWriter<File>>,
    run_id: Uuid,
    event_count: u64,
    next_event_id: u64,
}

impl DiagnosticLog {
    /// Opens `path` for appending, creating it and its parent directory.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            run_id: Uuid::new_v4(),
            event_count: 0,
            next_event_id: 1,
        })
    }

    /// Create a log that discards events (for testing)
    pub fn null() -> Self {
        Self {
            writer: None,
            run_id: Uuid::new_v4(),
            event_count: 0,
            next_event_id: 1,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Generate the next event ID
    pub fn next_id(&mut self) -> String {
        let id = format!("evt_{:08}", self.next_event_id);
        self.next_event_id += 1;
        id
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Appends one event
    pub fn log(&mut self, event: EngineEvent) -> std::io::Result<()> {
        let record = LogRecord {
            event_id: self.next_id(),
            run_id: self.run_id,
            event,
        };
        self.event_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(&record)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    /// Appends events in order
    pub fn log_batch(&mut self, events: Vec<EngineEvent>) -> std::io::Result<()> {
        for event in events {
            self.log(event)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for DiagnosticLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush diagnostic log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use tempfile::tempdir;
    use war_events::{AgentHandle, EventKind, Faction};

    fn registered(agent: u64) -> EngineEvent {
        EngineEvent::new(
            1000,
            EventKind::Registered {
                agent: AgentHandle(agent),
                faction: Faction::Hero,
                previous: None,
            },
        )
    }

    #[test]
    fn test_log_writes_jsonl() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");

        let mut log = DiagnosticLog::new(&path).unwrap();
        let run_id = log.run_id();
        log.log_batch(vec![registered(1), registered(2)]).unwrap();
        log.flush().unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["event_id"], "evt_00000001");
        assert_eq!(first["run_id"], run_id.to_string());
        assert_eq!(first["type"], "registered");
        assert_eq!(first["agent"], 1);
        assert_eq!(first["faction"], "Hero");

        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["event_id"], "evt_00000002");
    }

    #[test]
    fn test_log_appends_across_runs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let first_run = {
            let mut log = DiagnosticLog::new(&path).unwrap();
            log.log(registered(1)).unwrap();
            log.run_id()
        };
        {
            let mut log = DiagnosticLog::new(&path).unwrap();
            log.log(registered(2)).unwrap();
            assert_ne!(log.run_id(), first_run);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_null_log() {
        let mut log = DiagnosticLog::null();
        log.log(registered(1)).unwrap();
        assert_eq!(log.event_count(), 1);
        assert_eq!(log.next_id(), "evt_00000002");
    }
}
