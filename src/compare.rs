//! Staleness check for `--ignore-unchanged`

use crate::fs_enum::LocalEntry;
use crate::remote::RemoteStat;

/// Check if a local file has to be uploaded over its remote copy.
///
/// Upload when the remote file is missing, sizes differ, or either side
/// has no modification time. An equal-size remote copy with a known
/// timestamp is unchanged, older or newer.
pub fn needs_upload(local: &LocalEntry, remote: Option<&RemoteStat>) -> bool {
    let Some(remote) = remote else {
        return true;
    };

    if local.size != remote.size {
        return true;
    }

    local.modified.is_none() || remote.modified.is_none()
}
