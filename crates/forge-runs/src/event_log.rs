//! `JsonlEventLog`: durable, append-only writer/reader for a run's
//! `events.jsonl` (spec.md §4.2, §6).
//!
//! One writer per run folder, many readers. Each `emit` is `fsync`'d before
//! returning so a crash never loses an acknowledged event. `read_all`
//! tolerates a truncated trailing record, which can only happen if a reader
//! observes the file mid-write.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use forge_models::{Event, EventLevel, EventSink};

use crate::error::PersistenceError;

pub struct JsonlEventLog {
    path: PathBuf,
    writer: Mutex<File>,
}

impl JsonlEventLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let writer = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, writer: Mutex::new(writer) })
    }

    pub fn emit(&self, event: &Event) -> Result<(), PersistenceError> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let mut writer = self.writer.lock().expect("event log writer lock poisoned");
        writer.write_all(line.as_bytes())?;
        writer.sync_data()?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<Event>, PersistenceError> {
        Self::read_path(&self.path)
    }

    pub fn read_filtered(&self, filter: &EventFilter) -> Result<Vec<Event>, PersistenceError> {
        Ok(self.read_all()?.into_iter().filter(|e| filter.matches(e)).collect())
    }

    fn read_path(path: &Path) -> Result<Vec<Event>, PersistenceError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(&line) {
                Ok(event) => events.push(event),
                // A partial tail line can only be the last one a single
                // append-only writer produces; stop rather than error out.
                Err(_) => break,
            }
        }
        Ok(events)
    }
}

/// Lets `forge-adapters`' Artifact Store and step implementations append
/// job-facing events (`file.written`, `llm.request`, `llm.response`)
/// without depending on `forge-runs` directly — they hold this behind
/// `forge_models::EventSink` instead.
impl EventSink for JsonlEventLog {
    fn record(&self, event: Event) {
        if let Err(err) = self.emit(&event) {
            log::error!("failed to append event {:?} for job {}: {err}", event.event_type, event.job_id);
        }
    }
}

#[derive(Default, Clone)]
pub struct EventFilter {
    pub event_type: Option<String>,
    pub step: Option<String>,
    pub level: Option<EventLevel>,
}

impl EventFilter {
    fn matches(&self, event: &Event) -> bool {
        if let Some(t) = &self.event_type {
            if &event.event_type != t {
                return false;
            }
        }
        if let Some(s) = &self.step {
            if event.step.as_deref() != Some(s.as_str()) {
                return false;
            }
        }
        if let Some(l) = self.level {
            if event.level != l {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_and_reads_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlEventLog::open(dir.path().join("events.jsonl")).unwrap();
        log.emit(&Event::new("job-1", "job.started")).unwrap();
        log.emit(&Event::new("job-1", "step.started").with_step("architect")).unwrap();
        let events = log.read_all().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "job.started");
        assert_eq!(events[1].step.as_deref(), Some("architect"));
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlEventLog::open(dir.path().join("events.jsonl")).unwrap();
        std::fs::remove_file(dir.path().join("events.jsonl")).unwrap();
        assert_eq!(JsonlEventLog::read_path(dir.path().join("events.jsonl").as_path()).unwrap().len(), 0);
    }

    #[test]
    fn tolerates_truncated_trailing_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        {
            let log = JsonlEventLog::open(&path).unwrap();
            log.emit(&Event::new("job-1", "job.started")).unwrap();
        }
        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push_str("{\"ts\":\"not-fi");
        std::fs::write(&path, raw).unwrap();
        let events = JsonlEventLog::read_path(&path).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn filter_matches_on_step_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlEventLog::open(dir.path().join("events.jsonl")).unwrap();
        log.emit(&Event::new("job-1", "step.started").with_step("architect")).unwrap();
        log.emit(&Event::new("job-1", "step.started").with_step("qa")).unwrap();
        let filtered = log
            .read_filtered(&EventFilter { step: Some("qa".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].step.as_deref(), Some("qa"));
    }
}
