//! `RemoteFs` over a single suppaftp control connection

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use std::io::Read;
use std::time::{Duration, SystemTime};
use suppaftp::list::File as ListFile;
use suppaftp::types::{FileType, FormatControl};
use suppaftp::{FtpError, FtpStream, Mode, Status};

use crate::remote::{RemoteEntry, RemoteFs, RemoteStat, TransferMode};
use crate::url::ServerAddr;

/// Connection options
#[derive(Debug, Clone)]
pub struct FtpOptions {
    pub passive: bool,
    pub timeout: Option<Duration>,
}

impl Default for FtpOptions {
    fn default() -> Self {
        Self {
            passive: true,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

pub struct FtpRemote {
    stream: FtpStream,
    closed: bool,
}

impl FtpRemote {
    /// Connect, tune the socket and log in
    pub fn connect(addr: &ServerAddr, user: &str, password: &str, opts: &FtpOptions) -> Result<Self> {
        let target = addr.socket_string();
        let mut stream =
            FtpStream::connect(&target).with_context(|| format!("Failed to connect to {}", target))?;

        if let Some(timeout) = opts.timeout {
            let sock = stream.get_ref();
            sock.set_read_timeout(Some(timeout)).ok();
            sock.set_write_timeout(Some(timeout)).ok();
        }

        stream
            .login(user, password)
            .with_context(|| format!("Login to {} as '{}' failed", target, user))?;

        stream.set_mode(if opts.passive { Mode::Passive } else { Mode::Active });

        Ok(Self {
            stream,
            closed: false,
        })
    }
}

/// Server replies (550 and friends) mean "no such file"; transport errors do not
fn missing_on_reply<T>(result: std::result::Result<T, FtpError>) -> std::result::Result<Option<T>, FtpError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(FtpError::UnexpectedResponse(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// 550 on DELE/RMD: the entry vanished since it was listed
fn removed_unless_gone(result: std::result::Result<(), FtpError>) -> std::result::Result<bool, FtpError> {
    match result {
        Ok(()) => Ok(true),
        Err(FtpError::UnexpectedResponse(resp)) if resp.status == Status::FileUnavailable => Ok(false),
        Err(e) => Err(e),
    }
}

/// Turn LIST output into entries. Only blank lines and the `total N`
/// header are skipped; any other line that does not parse is an error.
pub fn parse_list_lines(lines: &[String]) -> Result<Vec<RemoteEntry>> {
    let mut entries = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_total_header(trimmed) {
            continue;
        }
        let file = match trimmed.parse::<ListFile>() {
            Ok(f) => f,
            Err(e) => bail!("Unrecognized LIST line '{}': {}", trimmed, e),
        };
        if file.name() == "." || file.name() == ".." {
            continue;
        }
        entries.push(RemoteEntry {
            name: file.name().to_string(),
            is_directory: file.is_directory(),
        });
    }
    Ok(entries)
}

fn is_total_header(line: &str) -> bool {
    let mut parts = line.split_whitespace();
    matches!(parts.next(), Some(w) if w.eq_ignore_ascii_case("total"))
        && parts.next().is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
        && parts.next().is_none()
}

impl RemoteFs for FtpRemote {
    fn set_transfer_mode(&mut self, mode: TransferMode) -> Result<()> {
        let file_type = match mode {
            TransferMode::Binary => FileType::Binary,
            TransferMode::Ascii => FileType::Ascii(FormatControl::Default),
        };
        self.stream
            .transfer_type(file_type)
            .with_context(|| format!("Failed to set transfer type {:?}", mode))
    }

    fn ensure_dir(&mut self, path: &str) -> Result<bool> {
        match self.stream.mkdir(path) {
            Ok(()) => Ok(true),
            Err(e) => {
                if self.dir_exists(path)? {
                    Ok(false)
                } else {
                    Err(e).with_context(|| format!("Failed to create remote directory {}", path))
                }
            }
        }
    }

    fn dir_exists(&mut self, path: &str) -> Result<bool> {
        // Every path handed to the stream is absolute, so the CWD change is harmless
        let changed = missing_on_reply(self.stream.cwd(path))
            .with_context(|| format!("CWD {} failed", path))?;
        Ok(changed.is_some())
    }

    fn stat(&mut self, path: &str) -> Result<Option<RemoteStat>> {
        let size = missing_on_reply(self.stream.size(path))
            .with_context(|| format!("SIZE {} failed", path))?;
        let Some(size) = size else {
            return Ok(None);
        };
        let modified = missing_on_reply(self.stream.mdtm(path))
            .with_context(|| format!("MDTM {} failed", path))?
            .map(|naive| SystemTime::from(Utc.from_utc_datetime(&naive)));
        Ok(Some(RemoteStat {
            size: size as u64,
            modified,
        }))
    }

    fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>> {
        let lines = self
            .stream
            .list(Some(dir))
            .with_context(|| format!("Failed to list remote directory {}", dir))?;
        parse_list_lines(&lines).with_context(|| format!("Failed to read listing of {}", dir))
    }

    fn remove_file(&mut self, path: &str) -> Result<bool> {
        removed_unless_gone(self.stream.rm(path))
            .with_context(|| format!("Failed to delete remote file {}", path))
    }

    fn remove_dir(&mut self, path: &str) -> Result<bool> {
        removed_unless_gone(self.stream.rmdir(path))
            .with_context(|| format!("Failed to remove remote directory {}", path))
    }

    fn upload(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64> {
        let mut reader = reader;
        self.stream
            .put_file(path, &mut reader)
            .with_context(|| format!("STOR {} failed", path))
    }

    fn quit(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream.quit().context("QUIT failed")
    }
}

impl Drop for FtpRemote {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.stream.quit();
        }
    }
}
