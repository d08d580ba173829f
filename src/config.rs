//! Deployment parameters: TOML profiles, CLI overlay and mandatory checks

use anyhow::{bail, Context, Result};
use normpath::PathExt;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filter::{split_patterns, FileFilter};
use crate::ftp::FtpOptions;
use crate::remote::{normalize_remote_path, TransferMode};
use crate::url::{parse_server, ServerAddr, DEFAULT_FTP_PORT};

pub const MISSING_SOURCE: &str = "sourcePath is mandatory (--source)";
pub const MISSING_SERVER: &str = "serverName is mandatory (--server)";
pub const MISSING_USERNAME: &str = "username is mandatory (--user)";
pub const MISSING_PASSWORD: &str = "password is mandatory (--password or FTPDEPLOY_PASSWORD)";
pub const MISSING_REMOTE_PATH: &str = "remotePath is mandatory (--remote-path)";

/// Every parameter as optional, the shape of a deployment profile file
/// and of the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub source_path: Option<PathBuf>,
    pub server_name: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub remote_path: Option<String>,
    pub use_binary: Option<bool>,
    pub exclude_filter: Vec<String>,
    pub ignore_unchanged_files: Option<bool>,
    pub delete_old_files: Option<bool>,
    pub deployment_files_only: Option<bool>,
    pub passive: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub dry_run: Option<bool>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid profile {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Values set in `over` win; exclude patterns accumulate
    pub fn overlay(self, over: Profile) -> Profile {
        let mut exclude_filter = self.exclude_filter;
        exclude_filter.extend(over.exclude_filter);
        Profile {
            source_path: over.source_path.or(self.source_path),
            server_name: over.server_name.or(self.server_name),
            port: over.port.or(self.port),
            username: over.username.or(self.username),
            password: over.password.or(self.password),
            remote_path: over.remote_path.or(self.remote_path),
            use_binary: over.use_binary.or(self.use_binary),
            exclude_filter,
            ignore_unchanged_files: over.ignore_unchanged_files.or(self.ignore_unchanged_files),
            delete_old_files: over.delete_old_files.or(self.delete_old_files),
            deployment_files_only: over.deployment_files_only.or(self.deployment_files_only),
            passive: over.passive.or(self.passive),
            timeout_secs: over.timeout_secs.or(self.timeout_secs),
            dry_run: over.dry_run.or(self.dry_run),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Fully resolved and validated parameters of one run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub source_path: PathBuf,
    pub server: ServerAddr,
    pub username: String,
    pub password: String,
    pub remote_path: String,
    pub transfer_mode: TransferMode,
    pub filter: FileFilter,
    pub ignore_unchanged: bool,
    pub delete_old_files: bool,
    pub ftp: FtpOptions,
    pub dry_run: bool,
}

impl SyncConfig {
    /// Validate mandatory parameters and resolve defaults
    pub fn from_profile(profile: Profile) -> Result<Self> {
        let Some(source) = profile.source_path.filter(|p| !p.as_os_str().is_empty()) else {
            bail!(MISSING_SOURCE);
        };
        let Some(server_name) = non_empty(profile.server_name) else {
            bail!(MISSING_SERVER);
        };
        let Some(username) = non_empty(profile.username) else {
            bail!(MISSING_USERNAME);
        };
        let Some(password) = profile.password.filter(|p| !p.is_empty()) else {
            bail!(MISSING_PASSWORD);
        };

        let server = parse_server(&server_name, profile.port.unwrap_or(DEFAULT_FTP_PORT))
            .with_context(|| format!("Invalid server name '{}'", server_name))?;

        let Some(raw_remote) = non_empty(profile.remote_path).or_else(|| server.path.clone()) else {
            bail!(MISSING_REMOTE_PATH);
        };
        let remote_path = normalize_remote_path(&raw_remote)?;

        let source_path = source
            .normalize()
            .map(|p| p.into_path_buf())
            .with_context(|| format!("Source does not exist: {}", source.display()))?;
        if !source_path.is_dir() {
            bail!("Source is not a directory: {}", source_path.display());
        }

        let filter = FileFilter::new(
            split_patterns(&profile.exclude_filter),
            profile.deployment_files_only.unwrap_or(false),
        )?;

        let defaults = FtpOptions::default();
        let ftp = FtpOptions {
            passive: profile.passive.unwrap_or(defaults.passive),
            timeout: match profile.timeout_secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.timeout,
            },
        };

        Ok(Self {
            source_path,
            server,
            username,
            password,
            remote_path,
            transfer_mode: TransferMode::from_binary_flag(profile.use_binary.unwrap_or(true)),
            filter,
            ignore_unchanged: profile.ignore_unchanged_files.unwrap_or(false),
            delete_old_files: profile.delete_old_files.unwrap_or(false),
            ftp,
            dry_run: profile.dry_run.unwrap_or(false),
        })
    }

    /// Human readable settings for --verbose, password redacted
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Source: {}", self.source_path.display()),
            format!("Server: {} (user {}, password ****)", self.server.socket_string(), self.username),
            format!("Remote path: {}", self.remote_path),
            format!("Transfer type: {:?}", self.transfer_mode),
            format!("Passive mode: {}", self.ftp.passive),
        ];
        if !self.filter.exclude_patterns.is_empty() {
            lines.push(format!("Excluding: {:?}", self.filter.exclude_patterns));
        }
        if self.filter.deployment_only {
            lines.push("Deployment files only: enabled".to_string());
        }
        if self.ignore_unchanged {
            lines.push("Skipping unchanged files (same size on the server)".to_string());
        }
        if self.delete_old_files {
            lines.push("Delete mode: remote target is cleared first".to_string());
        }
        lines
    }
}
