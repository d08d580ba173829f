//! The deployment pipeline
//!
//! Strictly sequential over one remote session:
//! transfer type → remote root → optional wipe → directories → files.
//! The first failing remote operation aborts the run.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use crate::compare::needs_upload;
use crate::config::SyncConfig;
use crate::fs_enum::{enumerate_source, LocalEntry};
use crate::logger::Logger;
use crate::remote::{join_remote, remote_ancestors, RemoteFs};

/// Counters for one run. In dry-run mode they count what would happen.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    pub dirs_created: u64,
    pub files_uploaded: u64,
    pub files_skipped: u64,
    pub files_filtered: u64,
    pub remote_files_deleted: u64,
    pub remote_dirs_deleted: u64,
    pub bytes_uploaded: u64,
}

impl SyncStats {
    pub fn add_upload(&mut self, bytes: u64) {
        self.files_uploaded += 1;
        self.bytes_uploaded += bytes;
    }
}

/// Delete everything below `root`, keeping `root` itself.
/// Files go first, then directories deepest first. Entries that vanish
/// between LIST and DELE/RMD are reported and skipped.
pub fn clear_remote(
    remote: &mut dyn RemoteFs,
    root: &str,
    dry_run: bool,
    logger: &dyn Logger,
    stats: &mut SyncStats,
) -> Result<()> {
    let entries = remote.list(root)?;
    let (dirs, files): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.is_directory);

    for file in files {
        let path = join_remote(root, &file.name);
        let removed = dry_run
            || match remote.remove_file(&path) {
                Ok(removed) => removed,
                Err(e) => {
                    logger.error("delete", &path, &format!("{:#}", e));
                    return Err(e);
                }
            };
        if removed {
            logger.delete(&path, false);
            stats.remote_files_deleted += 1;
        } else {
            logger.vanished(&path);
        }
    }

    for dir in dirs {
        let path = join_remote(root, &dir.name);
        clear_remote(remote, &path, dry_run, logger, stats)?;
        let removed = dry_run
            || match remote.remove_dir(&path) {
                Ok(removed) => removed,
                Err(e) => {
                    logger.error("delete", &path, &format!("{:#}", e));
                    return Err(e);
                }
            };
        if removed {
            logger.delete(&path, true);
            stats.remote_dirs_deleted += 1;
        } else {
            logger.vanished(&path);
        }
    }

    Ok(())
}

/// Make sure the remote root and its ancestors exist.
/// Returns true when the root did not exist before (so it is empty).
fn prepare_root(
    remote: &mut dyn RemoteFs,
    root: &str,
    dry_run: bool,
    logger: &dyn Logger,
    stats: &mut SyncStats,
) -> Result<bool> {
    let mut missing = false;
    for dir in remote_ancestors(root) {
        let created = if dry_run {
            missing || !remote.dir_exists(&dir)?
        } else {
            remote.ensure_dir(&dir)?
        };
        if created {
            missing = true;
            logger.mkdir(&dir);
            stats.dirs_created += 1;
        }
    }
    Ok(missing)
}

fn upload_file(remote: &mut dyn RemoteFs, file: &LocalEntry, remote_path: &str) -> Result<u64> {
    let f = File::open(&file.path)
        .with_context(|| format!("Failed to open {}", file.path.display()))?;
    let mut reader = BufReader::new(f);
    remote
        .upload(remote_path, &mut reader)
        .with_context(|| format!("Failed to upload {} to {}", file.path.display(), remote_path))
}

/// Run a full deployment against an open remote session
pub fn run(remote: &mut dyn RemoteFs, config: &SyncConfig, logger: &dyn Logger) -> Result<SyncStats> {
    let start = Instant::now();
    let root = config.remote_path.as_str();
    logger.start(&config.source_path, &config.server.socket_string(), root);

    let tree = enumerate_source(&config.source_path, &config.filter)
        .context("Failed to enumerate source directory")?;

    let mut stats = SyncStats {
        files_filtered: tree.filtered,
        ..SyncStats::default()
    };

    if !config.dry_run {
        remote.set_transfer_mode(config.transfer_mode)?;
    }

    logger.stage("Preparing remote root", 0);
    let mut remote_empty = prepare_root(remote, root, config.dry_run, logger, &mut stats)?;

    if config.delete_old_files && !remote_empty {
        logger.stage("Clearing remote", 0);
        clear_remote(remote, root, config.dry_run, logger, &mut stats)?;
        remote_empty = true;
    }

    logger.stage("Creating directories", tree.dirs.len() as u64);
    for dir in &tree.dirs {
        let path = join_remote(root, &dir.rel_path);
        let created = if config.dry_run {
            remote_empty || !remote.dir_exists(&path)?
        } else {
            match remote.ensure_dir(&path) {
                Ok(created) => created,
                Err(e) => {
                    logger.error("mkdir", &path, &e.to_string());
                    return Err(e);
                }
            }
        };
        if created {
            logger.mkdir(&path);
            stats.dirs_created += 1;
        }
    }

    logger.stage("Uploading", tree.files.len() as u64);
    for file in &tree.files {
        let path = join_remote(root, &file.rel_path);

        if config.ignore_unchanged && !remote_empty {
            let existing = remote.stat(&path)?;
            if !needs_upload(file, existing.as_ref()) {
                logger.skip(&file.path, &path);
                stats.files_skipped += 1;
                continue;
            }
        }

        let bytes = if config.dry_run {
            file.size
        } else {
            match upload_file(remote, file, &path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    logger.error("upload", &path, &format!("{:#}", e));
                    return Err(e);
                }
            }
        };
        logger.upload_done(&file.path, &path, bytes);
        stats.add_upload(bytes);
    }

    logger.done(&stats, start.elapsed().as_secs_f64());
    Ok(stats)
}
