//! Cargo-style console output
//!
//! File operations scroll above a spinner that stays on the bottom line
//! and shows the current stage.

use crossterm::style::{Color, Stylize};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::logger::Logger;
use crate::sync::SyncStats;

pub struct ConsoleProgress {
    spinner: ProgressBar,
    start_time: Instant,
    stage: Mutex<(String, u64)>,
    done: AtomicU64,
    bytes: AtomicU64,
    show_files: bool,
}

impl ConsoleProgress {
    pub fn new(show_files: bool) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            spinner,
            start_time: Instant::now(),
            stage: Mutex::new((String::new(), 0)),
            done: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            show_files,
        }
    }

    /// Print a file operation above the progress line
    fn print_file_op(&self, operation: &str, path: &str) {
        if self.show_files {
            self.spinner.suspend(|| {
                println!(
                    "  {:>8} {}",
                    operation.with(Color::Green).bold(),
                    path.with(Color::Cyan)
                );
            });
        }
    }

    fn tick(&self) {
        let current = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let Ok(stage) = self.stage.lock() else {
            return;
        };
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let bytes = self.bytes.load(Ordering::Relaxed);
        let msg = if stage.1 > 0 {
            format!(
                "{} ({}/{}) {:.1} MB in {:.1}s",
                stage.0.as_str().with(Color::Green).bold(),
                current,
                stage.1,
                bytes as f64 / 1_048_576.0,
                elapsed
            )
        } else {
            format!("{} in {:.1}s", stage.0.as_str().with(Color::Green).bold(), elapsed)
        };
        self.spinner.set_message(msg);
    }
}

impl Logger for ConsoleProgress {
    fn stage(&self, name: &str, total: u64) {
        if let Ok(mut stage) = self.stage.lock() {
            *stage = (name.to_string(), total);
        }
        self.done.store(0, Ordering::Relaxed);
        self.spinner
            .set_message(format!("{}...", name.with(Color::Green).bold()));
    }

    fn mkdir(&self, remote: &str) {
        self.print_file_op("Mkdir", remote);
        self.tick();
    }

    fn upload_done(&self, _local: &Path, remote: &str, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.print_file_op("Upload", remote);
        self.tick();
    }

    fn skip(&self, _local: &Path, remote: &str) {
        self.print_file_op("Skip", remote);
        self.tick();
    }

    fn delete(&self, remote: &str, _is_directory: bool) {
        self.print_file_op("Delete", remote);
        self.tick();
    }

    fn vanished(&self, remote: &str) {
        self.print_file_op("Gone", remote);
        self.tick();
    }

    fn error(&self, context: &str, path: &str, _msg: &str) {
        self.spinner.finish_with_message(format!(
            "{} {} {}",
            "Failed".with(Color::Red).bold(),
            context,
            path
        ));
    }

    fn done(&self, stats: &SyncStats, seconds: f64) {
        let throughput = if seconds > 0.0 {
            stats.bytes_uploaded as f64 / seconds / 1_048_576.0
        } else {
            0.0
        };
        self.spinner.finish_with_message(format!(
            "{} {} files ({:.1} MB) in {:.1}s ({:.1} MB/s)",
            "Deployed".with(Color::Green).bold(),
            stats.files_uploaded,
            stats.bytes_uploaded as f64 / 1_048_576.0,
            seconds,
            throughput
        ));
    }
}
