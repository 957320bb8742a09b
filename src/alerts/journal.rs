// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Alert journal - append-only JSON-lines record of delivery outcomes

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::AlertEvent;
use crate::tracking::TrackId;
use crate::zones::{Rect, ZoneId};

/// One line of the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub alert_id: Uuid,
    pub raised_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub zone_id: ZoneId,
    pub track_id: TrackId,
    pub class_label: String,
    pub bbox: Rect,
    pub frame_sequence: u64,
    pub contact: Option<String>,
    pub delivered: bool,
    pub error: Option<String>,
}

impl JournalEntry {
    pub fn new(event: &AlertEvent, outcome: &Result<(), String>) -> Self {
        Self {
            alert_id: event.id,
            raised_at: event.raised_at,
            recorded_at: Utc::now(),
            zone_id: event.zone_id.clone(),
            track_id: event.object.id,
            class_label: event.object.class_label.clone(),
            bbox: event.object.bbox,
            frame_sequence: event.frame.sequence,
            contact: event.contact.as_ref().map(|c| c.name.clone()),
            delivered: outcome.is_ok(),
            error: outcome.as_ref().err().cloned(),
        }
    }
}

/// Journal writer owned by the dispatch consumer
pub struct AlertJournal {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: usize,
}

impl AlertJournal {
    /// Open `path` for appending, creating parent directories
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!("Alert journal opened at {:?}", path);

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            entries: 0,
        })
    }

    pub fn record(&mut self, event: &AlertEvent, outcome: &Result<(), String>) -> Result<()> {
        let entry = JournalEntry::new(event, outcome);
        let json = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;
        self.entries += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries written by this handle
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Read every entry back from a journal file
    pub fn read_all(path: &Path) -> Result<Vec<JournalEntry>> {
        let content = std::fs::read_to_string(path)?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(anyhow::Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::test_support::event;

    #[test]
    fn test_record_and_read_back() {
        let path = std::env::temp_dir()
            .join(format!("zonewatch-{}", Uuid::new_v4()))
            .join("alerts.jsonl");

        let mut journal = AlertJournal::open(&path).unwrap();
        let ok = event(1, "north");
        let failed = event(2, "south");
        journal.record(&ok, &Ok(())).unwrap();
        journal.record(&failed, &Err("timeout".to_string())).unwrap();
        assert_eq!(journal.entries(), 2);

        let entries = AlertJournal::read_all(&path).unwrap();
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].alert_id, ok.id);
        assert!(entries[0].delivered);
        assert_eq!(entries[1].track_id, 2);
        assert_eq!(entries[1].error.as_deref(), Some("timeout"));
        assert_eq!(entries[1].contact.as_deref(), Some("manager-south"));
    }
}
