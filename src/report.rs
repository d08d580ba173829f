use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::logger::Logger;
use crate::sync::SyncStats;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportAction {
    Mkdir,
    Upload,
    Skip,
    Delete,
    Error,
    Done,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReportEntry {
    pub timestamp: String,
    pub run_id: String,
    pub action: ReportAction,
    pub local: Option<PathBuf>,
    pub remote: Option<String>,
    pub bytes: u64,
    pub error: Option<String>,
}

/// JSON-lines record of everything a run did, one object per line
pub struct DeployReport {
    path: PathBuf,
    run_id: String,
    writer: Mutex<BufWriter<File>>,
}

impl DeployReport {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open report file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            run_id: uuid::Uuid::new_v4().to_string(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn add_entry(&self, action: ReportAction, local: Option<&Path>, remote: Option<&str>, bytes: u64, error: Option<&str>) {
        let entry = ReportEntry {
            timestamp: Utc::now().to_rfc3339(),
            run_id: self.run_id.clone(),
            action,
            local: local.map(Path::to_path_buf),
            remote: remote.map(str::to_string),
            bytes,
            error: error.map(str::to_string),
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = serde_json::to_writer(&mut *writer, &entry);
            let _ = writer.write_all(b"\n");
            let _ = writer.flush();
        }
    }
}

impl Logger for DeployReport {
    fn mkdir(&self, remote: &str) {
        self.add_entry(ReportAction::Mkdir, None, Some(remote), 0, None);
    }
    fn upload_done(&self, local: &Path, remote: &str, bytes: u64) {
        self.add_entry(ReportAction::Upload, Some(local), Some(remote), bytes, None);
    }
    fn skip(&self, local: &Path, remote: &str) {
        self.add_entry(ReportAction::Skip, Some(local), Some(remote), 0, None);
    }
    fn delete(&self, remote: &str, _is_directory: bool) {
        self.add_entry(ReportAction::Delete, None, Some(remote), 0, None);
    }
    fn vanished(&self, remote: &str) {
        self.add_entry(ReportAction::Skip, None, Some(remote), 0, None);
    }
    fn error(&self, context: &str, path: &str, msg: &str) {
        let msg = format!("{}: {}", context, msg);
        self.add_entry(ReportAction::Error, None, Some(path), 0, Some(&msg));
    }
    fn done(&self, stats: &SyncStats, _seconds: f64) {
        self.add_entry(ReportAction::Done, None, None, stats.bytes_uploaded, None);
    }
}

/// Read every entry of a report file, skipping blank lines
pub fn read_report(path: &Path) -> Result<Vec<ReportEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).context("Failed to open report file for reading")?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ReportEntry = serde_json::from_str(&line)?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn report_round_trips_through_jsonl() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.jsonl");
        let report = DeployReport::create(&path).unwrap();
        report.mkdir("/www/css");
        report.upload_done(Path::new("/src/css/a.css"), "/www/css/a.css", 12);
        report.skip(Path::new("/src/b.txt"), "/www/b.txt");
        report.error("upload", "/www/c.txt", "550 denied");

        let entries = read_report(&path).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.run_id == report.run_id()));
        assert_eq!(entries[0].action, ReportAction::Mkdir);
        assert_eq!(entries[1].bytes, 12);
        assert_eq!(entries[1].local.as_deref(), Some(Path::new("/src/css/a.css")));
        assert_eq!(entries[2].action, ReportAction::Skip);
        assert_eq!(entries[3].error.as_deref(), Some("upload: 550 denied"));
    }

    #[test]
    fn missing_report_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_report(&temp_dir.path().join("none.jsonl")).unwrap().is_empty());
    }
}
