//! Remote filesystem abstraction and remote path helpers
//!
//! The sync pipeline only talks to [`RemoteFs`]; `FtpRemote` is the
//! production implementation.

use anyhow::{bail, Result};
use std::io::Read;
use std::time::SystemTime;

/// FTP representation type (TYPE I / TYPE A)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    #[default]
    Binary,
    Ascii,
}

impl TransferMode {
    pub fn from_binary_flag(use_binary: bool) -> Self {
        if use_binary {
            Self::Binary
        } else {
            Self::Ascii
        }
    }
}

/// What the server reports for an existing remote file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStat {
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// One item of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_directory: bool,
}

pub trait RemoteFs {
    fn set_transfer_mode(&mut self, mode: TransferMode) -> Result<()>;

    /// Create `path` if missing. Returns true when it was created.
    fn ensure_dir(&mut self, path: &str) -> Result<bool>;

    fn dir_exists(&mut self, path: &str) -> Result<bool>;

    /// Size and mtime of a remote file, None when it does not exist
    fn stat(&mut self, path: &str) -> Result<Option<RemoteStat>>;

    /// Direct children of a remote directory, without `.` and `..`
    fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>>;

    /// Returns false when the file was already gone
    fn remove_file(&mut self, path: &str) -> Result<bool>;

    /// Returns false when the directory was already gone
    fn remove_dir(&mut self, path: &str) -> Result<bool>;

    /// Store `reader` at `path`, returning the bytes sent
    fn upload(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64>;

    fn quit(&mut self) -> Result<()>;
}

/// Normalize a user supplied remote path to `/a/b` form.
///
/// Backslashes become `/`, empty and `.` components are dropped. `..` is
/// rejected since FTP servers resolve it inconsistently.
pub fn normalize_remote_path(raw: &str) -> Result<String> {
    if raw.contains('\0') {
        bail!("remote path contains NUL byte");
    }
    let replaced = raw.trim().replace('\\', "/");
    let mut parts = Vec::new();
    for component in replaced.split('/') {
        match component {
            "" | "." => {}
            ".." => bail!("remote path must not contain '..': {}", raw),
            s => parts.push(s),
        }
    }
    Ok(format!("/{}", parts.join("/")))
}

/// Join a normalized remote root and a `/`-separated relative path
pub fn join_remote(root: &str, rel: &str) -> String {
    let rel = rel.trim_start_matches('/');
    if rel.is_empty() {
        root.to_string()
    } else if root.ends_with('/') {
        format!("{}{}", root, rel)
    } else {
        format!("{}/{}", root, rel)
    }
}

/// Parent of a normalized remote path, None for `/`
pub fn remote_parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(i) => Some(&path[..i]),
        None => None,
    }
}

/// `/a/b/c` → `["/a", "/a/b", "/a/b/c"]`
pub fn remote_ancestors(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for part in path.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(part);
        out.push(current.clone());
    }
    out
}
