//! In-memory FTP server stand-in shared by the integration tests
#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use ftpdeploy::config::{Profile, SyncConfig};
use ftpdeploy::remote::{remote_parent, RemoteEntry, RemoteFs, RemoteStat, TransferMode};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};
use std::path::Path;
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub struct MemFile {
    pub data: Vec<u8>,
    pub modified: SystemTime,
}

pub struct MemoryRemote {
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, MemFile>,
    pub mode: Option<TransferMode>,
    /// Timestamp given to uploaded files
    pub clock: SystemTime,
    pub fail_upload: Option<String>,
    /// Files that LIST still shows but that are already gone
    pub vanished: BTreeSet<String>,
    /// Mutating commands in the order they were issued
    pub ops: Vec<String>,
    pub quit_called: bool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert("/".to_string());
        Self {
            dirs,
            files: BTreeMap::new(),
            mode: None,
            clock: SystemTime::now(),
            fail_upload: None,
            vanished: BTreeSet::new(),
            ops: Vec::new(),
            quit_called: false,
        }
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        let mut current = String::new();
        for part in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(part);
            self.dirs.insert(current.clone());
        }
        self
    }

    pub fn with_file(mut self, path: &str, data: &[u8], modified: SystemTime) -> Self {
        if let Some(parent) = remote_parent(path) {
            self = self.with_dir(parent);
        }
        self.files.insert(
            path.to_string(),
            MemFile {
                data: data.to_vec(),
                modified,
            },
        );
        self
    }

    pub fn content(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|f| f.data.as_slice())
    }

    fn children(&self, dir: &str) -> Vec<RemoteEntry> {
        let mut out = Vec::new();
        for d in &self.dirs {
            if d != dir && remote_parent(d) == Some(dir) {
                out.push(RemoteEntry {
                    name: d.rsplit('/').next().unwrap_or_default().to_string(),
                    is_directory: true,
                });
            }
        }
        for f in self.files.keys() {
            if remote_parent(f) == Some(dir) {
                out.push(RemoteEntry {
                    name: f.rsplit('/').next().unwrap_or_default().to_string(),
                    is_directory: false,
                });
            }
        }
        out
    }
}

impl RemoteFs for MemoryRemote {
    fn set_transfer_mode(&mut self, mode: TransferMode) -> Result<()> {
        self.mode = Some(mode);
        Ok(())
    }

    fn ensure_dir(&mut self, path: &str) -> Result<bool> {
        if self.dirs.contains(path) {
            return Ok(false);
        }
        let parent = remote_parent(path).ok_or_else(|| anyhow!("550 bad path {}", path))?;
        if !self.dirs.contains(parent) {
            bail!("550 parent of {} does not exist", path);
        }
        self.ops.push(format!("MKD {}", path));
        self.dirs.insert(path.to_string());
        Ok(true)
    }

    fn dir_exists(&mut self, path: &str) -> Result<bool> {
        Ok(self.dirs.contains(path))
    }

    fn stat(&mut self, path: &str) -> Result<Option<RemoteStat>> {
        Ok(self.files.get(path).map(|f| RemoteStat {
            size: f.data.len() as u64,
            modified: Some(f.modified),
        }))
    }

    fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>> {
        if !self.dirs.contains(dir) {
            bail!("550 {} not found", dir);
        }
        let mut entries = self.children(dir);
        for path in &self.vanished {
            if remote_parent(path) == Some(dir) {
                entries.push(RemoteEntry {
                    name: path.rsplit('/').next().unwrap_or_default().to_string(),
                    is_directory: false,
                });
            }
        }
        Ok(entries)
    }

    fn remove_file(&mut self, path: &str) -> Result<bool> {
        if self.files.remove(path).is_none() {
            return Ok(false);
        }
        self.ops.push(format!("DELE {}", path));
        Ok(true)
    }

    fn remove_dir(&mut self, path: &str) -> Result<bool> {
        if !self.children(path).is_empty() {
            bail!("550 {} not empty", path);
        }
        if !self.dirs.remove(path) {
            return Ok(false);
        }
        self.ops.push(format!("RMD {}", path));
        Ok(true)
    }

    fn upload(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64> {
        if self.fail_upload.as_deref() == Some(path) {
            bail!("553 could not create {}", path);
        }
        let parent = remote_parent(path).ok_or_else(|| anyhow!("553 bad path"))?;
        if !self.dirs.contains(parent) {
            bail!("553 no directory for {}", path);
        }
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let len = data.len() as u64;
        self.ops.push(format!("STOR {}", path));
        self.files.insert(
            path.to_string(),
            MemFile {
                data,
                modified: self.clock,
            },
        );
        Ok(len)
    }

    fn quit(&mut self) -> Result<()> {
        self.quit_called = true;
        Ok(())
    }
}

pub fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = std::fs::File::create(path)?;
    f.write_all(contents)?;
    Ok(())
}

/// Complete parameter set pointing at `source`
pub fn profile_for(source: &Path, remote_path: &str) -> Profile {
    Profile {
        source_path: Some(source.to_path_buf()),
        server_name: Some("ftp.test.local".into()),
        username: Some("deploy".into()),
        password: Some("secret".into()),
        remote_path: Some(remote_path.into()),
        ..Profile::default()
    }
}

pub fn config_for(source: &Path, remote_path: &str) -> Result<SyncConfig> {
    SyncConfig::from_profile(profile_for(source, remote_path))
}
