use serde::{Deserialize, Serialize};

use crate::economics::{RoomEconomicsInput, RoomEconomicsResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRecord {
    pub preview_id: String,
    pub input: RoomEconomicsInput,
    pub result: RoomEconomicsResult,
    #[serde(default)]
    pub ts: Option<String>,
}

pub fn format_preview_id(yyyymmdd: &str, seq: u32) -> String {
    format!("{}-{:06}", yyyymmdd, seq)
}

use chrono::{SecondsFormat, Utc};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Appends previews as JSON lines.
pub struct PreviewLogger {
    writer: Option<BufWriter<std::fs::File>>,
    date: String,
    seq: u32,
}

impl PreviewLogger {
    /// Opens `path` for appending. Numbering continues after the highest
    /// id already logged today, so reopening never repeats an id.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let date = Utc::now().format("%Y%m%d").to_string();
        let seq = last_seq(path, &date)?;
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { writer: Some(BufWriter::new(f)), date, seq })
    }

    pub fn with_seq_for_test(date: &str) -> Self {
        Self { writer: None, date: date.to_string(), seq: 0 }
    }

    pub fn next_id(&mut self) -> String {
        self.seq += 1;
        format_preview_id(&self.date, self.seq)
    }

    pub fn record(
        &mut self,
        input: &RoomEconomicsInput,
        result: &RoomEconomicsResult,
    ) -> io::Result<PreviewRecord> {
        let rec = PreviewRecord {
            preview_id: self.next_id(),
            input: input.clone(),
            result: result.clone(),
            ts: None,
        };
        self.write(&rec)
    }

    pub fn write(&mut self, record: &PreviewRecord) -> io::Result<PreviewRecord> {
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec).map_err(io::Error::other)?;
        if let Some(w) = &mut self.writer {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        Ok(rec)
    }
}

/// Highest sequence number logged under `date`; 0 for a missing file.
/// Lines that are not preview records are skipped.
fn last_seq(path: &Path, date: &str) -> io::Result<u32> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let prefix = format!("{}-", date);
    let mut max = 0;
    for line in BufReader::new(file).lines() {
        let line = line?;
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&line) else {
            continue;
        };
        let seq = value
            .get("preview_id")
            .and_then(|id| id.as_str())
            .and_then(|id| id.strip_prefix(&prefix))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(seq) = seq {
            max = max.max(seq);
        }
    }
    Ok(max)
}
