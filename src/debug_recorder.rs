//! JSON-lines dump of every decoded frame, for protocol debugging. Purely
//! observational; the model never sees it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::protocol::Frame;

#[derive(Serialize)]
struct RecordedFrame<'a> {
    timestamp: DateTime<Utc>,
    frame: &'a Frame,
}

pub struct DebugRecorder {
    writer: BufWriter<File>,
}

impl DebugRecorder {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn record_frame(&mut self, frame: &Frame) -> Result<()> {
        let json = serde_json::to_string(&RecordedFrame {
            timestamp: Utc::now(),
            frame,
        })?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }
}
