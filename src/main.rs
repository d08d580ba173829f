//! ftpdeploy - mirror a local directory tree to an FTP server
//!
//! connect → optional remote wipe → directories → filtered uploads

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Instant;

use ftpdeploy::cli::Args;
use ftpdeploy::config::{Profile, SyncConfig};
use ftpdeploy::ftp::FtpRemote;
use ftpdeploy::logger::{FanoutLogger, Logger, TextLogger};
use ftpdeploy::progress::ConsoleProgress;
use ftpdeploy::remote::RemoteFs;
use ftpdeploy::report::DeployReport;
use ftpdeploy::sync::{self, SyncStats};

fn main() {
    // Set up Ctrl-C handler
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
        // Exit immediately with 130 (128 + SIGINT)
        std::process::exit(130);
    }) {
        eprintln!("Warning: failed to install Ctrl-C handler: {}", e);
    }

    let args = Args::parse();
    if let Err(e) = real_main(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn real_main(args: &Args) -> Result<()> {
    let profile = match args.config {
        Some(ref path) => Profile::load(path)?,
        None => Profile::default(),
    };
    let config = SyncConfig::from_profile(profile.overlay(args.to_profile()))?;

    if config.dry_run {
        println!("DRY RUN MODE - the server will not be changed");
    }

    if args.verbose {
        println!("ftpdeploy {}", env!("CARGO_PKG_VERSION"));
        for line in config.summary_lines() {
            println!("{}", line);
        }
    }

    let logger = build_logger(args, &config)?;

    if args.verbose {
        println!("Connecting to {}...", config.server.socket_string());
    }
    let start = Instant::now();
    let mut remote = FtpRemote::connect(&config.server, &config.username, &config.password, &config.ftp)?;

    let stats = sync::run(&mut remote, &config, &*logger)?;
    remote.quit().ok();

    print_summary(&stats, start.elapsed().as_secs_f64(), config.dry_run);
    Ok(())
}

fn build_logger(args: &Args, config: &SyncConfig) -> Result<Box<dyn Logger>> {
    let mut loggers: Vec<Box<dyn Logger>> = Vec::new();
    // Dry runs list every planned operation instead of writing logs
    loggers.push(Box::new(ConsoleProgress::new(args.progress || config.dry_run)));
    if !config.dry_run {
        if let Some(ref p) = args.log_file {
            let text = TextLogger::new(p)
                .with_context(|| format!("Failed to open log file {}", p.display()))?;
            loggers.push(Box::new(text));
        }
        if let Some(ref p) = args.report {
            let report = DeployReport::create(p)?;
            if args.verbose {
                println!("Report: {} (run {})", report.path().display(), report.run_id());
            }
            loggers.push(Box::new(report));
        }
    }
    Ok(Box::new(FanoutLogger::new(loggers)))
}

fn print_summary(stats: &SyncStats, seconds: f64, dry_run: bool) {
    println!();
    if dry_run {
        println!("=== Dry Run Summary ===");
    } else {
        println!("=== Deploy Complete ===");
    }
    println!("Directories created: {}", stats.dirs_created);
    println!("Files uploaded: {}", stats.files_uploaded);
    if stats.files_skipped > 0 {
        println!("Files unchanged: {}", stats.files_skipped);
    }
    if stats.files_filtered > 0 {
        println!("Files filtered: {}", stats.files_filtered);
    }
    if stats.remote_files_deleted + stats.remote_dirs_deleted > 0 {
        println!(
            "Remote deleted: {} files, {} directories",
            stats.remote_files_deleted, stats.remote_dirs_deleted
        );
    }
    println!(
        "Total size: {:.2} MB",
        stats.bytes_uploaded as f64 / 1_048_576.0
    );
    println!("Time: {:.2}s", seconds);
}
