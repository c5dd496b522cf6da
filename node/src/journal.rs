//! Append-only journal of conflict engine events.
//!
//! One JSON object per line, in the order the engine emitted them.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use arbiter_conflict::ConflictEvent;

use crate::NodeError;

pub struct EventJournal {
    path: PathBuf,
    file: Mutex<File>,
}

impl EventJournal {
    /// Open the journal for appending, creating it if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, events: &[ConflictEvent]) -> Result<(), NodeError> {
        let mut buf = Vec::new();
        for event in events {
            serde_json::to_writer(&mut buf, event)?;
            buf.push(b'\n');
        }
        let mut file = self
            .file
            .lock()
            .map_err(|_| NodeError::Config("event journal lock poisoned".into()))?;
        file.write_all(&buf)?;
        file.flush()?;
        Ok(())
    }

    /// Read every event recorded at `path`.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<ConflictEvent>, NodeError> {
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }
}
