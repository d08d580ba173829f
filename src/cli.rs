//! Command-line arguments and their mapping onto a deployment profile

use clap::{ArgAction, Args as ClapArgs, Parser};
use std::path::PathBuf;

use crate::config::Profile;

/// Server and credentials
#[derive(Clone, Debug, Default, ClapArgs)]
pub struct ConnectionOpts {
    /// FTP server (host, host:port or ftp://host[:port]/path)
    #[arg(long = "server", alias = "server-name")]
    pub server: Option<String>,

    /// Port used when the server name has none
    #[arg(long)]
    pub port: Option<u16>,

    /// FTP user name
    #[arg(short = 'u', long = "user", alias = "username")]
    pub user: Option<String>,

    /// FTP password
    #[arg(long, env = "FTPDEPLOY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Use active instead of passive data connections
    #[arg(long)]
    pub active: bool,

    /// Socket timeout in seconds (0 = none)
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ftpdeploy - mirror a local directory tree to an FTP server"
)]
pub struct Args {
    /// Local directory to deploy
    #[arg(short = 's', long = "source", alias = "source-path")]
    pub source: Option<PathBuf>,

    /// Target directory on the server
    #[arg(short = 'r', long = "remote-path", alias = "remote")]
    pub remote_path: Option<String>,

    #[command(flatten)]
    pub connection: ConnectionOpts,

    /// Deployment profile (TOML); command-line values win
    #[arg(short = 'C', long = "config")]
    pub config: Option<PathBuf>,

    /// Transfer files in ASCII mode instead of binary
    #[arg(long, conflicts_with = "binary")]
    pub ascii: bool,

    /// Transfer files in binary mode (default)
    #[arg(long)]
    pub binary: bool,

    /// Exclude files matching patterns (comma separated or repeated)
    #[arg(short = 'x', long = "exclude", action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Skip files whose remote copy has the same size
    #[arg(short = 'i', long = "ignore-unchanged")]
    pub ignore_unchanged: bool,

    /// Delete everything below the remote path before uploading
    #[arg(long = "delete-old", alias = "purge")]
    pub delete_old: bool,

    /// Only upload deployment files (no sources, project files or VCS data)
    #[arg(short = 'd', long = "deployment-only")]
    pub deployment_only: bool,

    /// List what would be done without changing the server
    #[arg(short = 'l', long, alias = "list-only")]
    pub dry_run: bool,

    /// Show processing stages and resolved settings
    #[arg(short, long)]
    pub verbose: bool,

    /// Show individual file operations as they happen
    #[arg(short, long)]
    pub progress: bool,

    /// Append a text log of every operation to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Append a JSONL report of every operation to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

fn flag(set: bool) -> Option<bool> {
    set.then_some(true)
}

impl Args {
    /// Command-line values as a profile overlay; unset flags stay None
    pub fn to_profile(&self) -> Profile {
        let use_binary = if self.ascii {
            Some(false)
        } else {
            flag(self.binary)
        };
        Profile {
            source_path: self.source.clone(),
            server_name: self.connection.server.clone(),
            port: self.connection.port,
            username: self.connection.user.clone(),
            password: self.connection.password.clone(),
            remote_path: self.remote_path.clone(),
            use_binary,
            exclude_filter: self.exclude.clone(),
            ignore_unchanged_files: flag(self.ignore_unchanged),
            delete_old_files: flag(self.delete_old),
            deployment_files_only: flag(self.deployment_only),
            passive: self.connection.active.then_some(false),
            timeout_secs: self.connection.timeout,
            dry_run: flag(self.dry_run),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_map_onto_profile() {
        let args = Args::try_parse_from([
            "ftpdeploy",
            "--source",
            "site",
            "--server",
            "ftp.example.com:2121",
            "-u",
            "deploy",
            "--password",
            "pw",
            "-r",
            "/www",
            "--ascii",
            "-x",
            "*.log,*.tmp",
            "-x",
            "web.*.config",
            "-i",
            "--delete-old",
            "-d",
            "--active",
        ])
        .unwrap();
        let profile = args.to_profile();
        assert_eq!(profile.source_path, Some(PathBuf::from("site")));
        assert_eq!(profile.server_name.as_deref(), Some("ftp.example.com:2121"));
        assert_eq!(profile.username.as_deref(), Some("deploy"));
        assert_eq!(profile.remote_path.as_deref(), Some("/www"));
        assert_eq!(profile.use_binary, Some(false));
        assert_eq!(profile.exclude_filter, vec!["*.log,*.tmp", "web.*.config"]);
        assert_eq!(profile.ignore_unchanged_files, Some(true));
        assert_eq!(profile.delete_old_files, Some(true));
        assert_eq!(profile.deployment_files_only, Some(true));
        assert_eq!(profile.passive, Some(false));
        assert_eq!(profile.dry_run, None);
    }

    #[test]
    fn unset_flags_leave_profile_values_alone() {
        let args = Args::try_parse_from(["ftpdeploy", "--config", "deploy.toml"]).unwrap();
        let profile = args.to_profile();
        assert_eq!(profile.use_binary, None);
        assert_eq!(profile.ignore_unchanged_files, None);
        assert_eq!(profile.passive, None);
        assert!(profile.exclude_filter.is_empty());
    }

    #[test]
    fn ascii_and_binary_conflict() {
        assert!(Args::try_parse_from(["ftpdeploy", "--ascii", "--binary"]).is_err());
    }
}
