//! ftpdeploy library
//!
//! Mirror a local directory tree onto an FTP server: directory structure,
//! filtered uploads, unchanged-file skipping and an optional remote wipe.

pub mod cli;
pub mod compare;
pub mod config;
pub mod filter;
pub mod fs_enum;
pub mod ftp;
pub mod logger;
pub mod progress;
pub mod remote;
pub mod report;
pub mod sync;
pub mod url;
