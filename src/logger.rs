use anyhow::Result;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::sync::SyncStats;

pub trait Logger: Send + Sync {
    fn start(&self, _src: &Path, _server: &str, _remote_root: &str) {}
    fn stage(&self, _name: &str, _total: u64) {}
    fn mkdir(&self, _remote: &str) {}
    fn upload_done(&self, _local: &Path, _remote: &str, _bytes: u64) {}
    fn skip(&self, _local: &Path, _remote: &str) {}
    fn delete(&self, _remote: &str, _is_directory: bool) {}
    /// A listed remote entry was already gone when it was removed
    fn vanished(&self, _remote: &str) {}
    fn error(&self, _context: &str, _path: &str, _msg: &str) {}
    fn done(&self, _stats: &SyncStats, _seconds: f64) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

/// Forwards every event to each inner logger
pub struct FanoutLogger {
    inner: Vec<Box<dyn Logger>>,
}

impl FanoutLogger {
    pub fn new(inner: Vec<Box<dyn Logger>>) -> Self {
        Self { inner }
    }
}

impl Logger for FanoutLogger {
    fn start(&self, src: &Path, server: &str, remote_root: &str) {
        self.inner.iter().for_each(|l| l.start(src, server, remote_root));
    }
    fn stage(&self, name: &str, total: u64) {
        self.inner.iter().for_each(|l| l.stage(name, total));
    }
    fn mkdir(&self, remote: &str) {
        self.inner.iter().for_each(|l| l.mkdir(remote));
    }
    fn upload_done(&self, local: &Path, remote: &str, bytes: u64) {
        self.inner.iter().for_each(|l| l.upload_done(local, remote, bytes));
    }
    fn skip(&self, local: &Path, remote: &str) {
        self.inner.iter().for_each(|l| l.skip(local, remote));
    }
    fn delete(&self, remote: &str, is_directory: bool) {
        self.inner.iter().for_each(|l| l.delete(remote, is_directory));
    }
    fn vanished(&self, remote: &str) {
        self.inner.iter().for_each(|l| l.vanished(remote));
    }
    fn error(&self, context: &str, path: &str, msg: &str) {
        self.inner.iter().for_each(|l| l.error(context, path, msg));
    }
    fn done(&self, stats: &SyncStats, seconds: f64) {
        self.inner.iter().for_each(|l| l.done(stats, seconds));
    }
}

pub struct TextLogger {
    file: Mutex<File>,
}

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(f),
        })
    }

    fn line(&self, s: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "[{}] {}", Utc::now().to_rfc3339(), s);
        }
    }
}

impl Logger for TextLogger {
    fn start(&self, src: &Path, server: &str, remote_root: &str) {
        self.line(&format!(
            "START src={} server={} remote={}",
            src.display(),
            server,
            remote_root
        ));
    }
    fn mkdir(&self, remote: &str) {
        self.line(&format!("MKDIR remote={}", remote));
    }
    fn upload_done(&self, local: &Path, remote: &str, bytes: u64) {
        self.line(&format!(
            "UPLOAD src={} remote={} bytes={}",
            local.display(),
            remote,
            bytes
        ));
    }
    fn skip(&self, local: &Path, remote: &str) {
        self.line(&format!("SKIP src={} remote={}", local.display(), remote));
    }
    fn delete(&self, remote: &str, is_directory: bool) {
        let kind = if is_directory { "dir" } else { "file" };
        self.line(&format!("DELETE {} remote={}", kind, remote));
    }
    fn vanished(&self, remote: &str) {
        self.line(&format!("GONE remote={}", remote));
    }
    fn error(&self, context: &str, path: &str, msg: &str) {
        self.line(&format!("ERROR ctx={} path={} msg={}", context, path, msg));
    }
    fn done(&self, stats: &SyncStats, seconds: f64) {
        self.line(&format!(
            "DONE uploaded={} skipped={} dirs={} deleted={} bytes={} seconds={seconds:.3}",
            stats.files_uploaded,
            stats.files_skipped,
            stats.dirs_created,
            stats.remote_files_deleted + stats.remote_dirs_deleted,
            stats.bytes_uploaded
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn text_logger_appends_timestamped_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs/deploy.log");
        let logger = TextLogger::new(&path).unwrap();
        logger.start(Path::new("/src"), "ftp.example.com:21", "/www");
        logger.upload_done(Path::new("/src/a.txt"), "/www/a.txt", 42);
        logger.delete("/www/old", true);
        logger.done(&SyncStats::default(), 1.5);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].contains("START src=/src server=ftp.example.com:21 remote=/www"));
        assert!(lines[1].contains("UPLOAD src=/src/a.txt remote=/www/a.txt bytes=42"));
        assert!(lines[2].contains("DELETE dir remote=/www/old"));
        assert!(lines[3].contains("seconds=1.500"));
    }
}
