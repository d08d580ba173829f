//! Server address parsing for `host`, `host:port` and ftp:// forms

pub const DEFAULT_FTP_PORT: u16 = 21;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddr {
    pub host: String,
    pub port: u16,
    /// Path component of an ftp:// URL, if one was given
    pub path: Option<String>,
}

impl ServerAddr {
    pub fn socket_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a server name. Returns None for an empty host or a bad port.
///
/// A port in the string wins over `default_port`.
pub fn parse_server(s: &str, default_port: u16) -> Option<ServerAddr> {
    let s_trim = s.trim();
    let mut rest = s_trim;
    let mut is_url = false;
    if let Some(scheme_end) = s_trim.find("://") {
        let scheme = s_trim[..scheme_end].to_ascii_lowercase();
        if scheme != "ftp" {
            return None;
        }
        rest = &s_trim[scheme_end + 3..];
        is_url = true;
    }
    let (hp, p) = if is_url {
        rest.split_once('/').unwrap_or((rest, ""))
    } else {
        (rest, "")
    };
    // user@ is allowed in URLs but credentials come from their own parameters
    let hp = hp.rsplit_once('@').map(|(_, h)| h).unwrap_or(hp);
    if hp.is_empty() {
        return None;
    }
    let (host, port) = match hp.split_once(':') {
        Some((h, pr)) => (h.to_string(), pr.parse().ok()?),
        None => (hp.to_string(), default_port),
    };
    if host.is_empty() {
        return None;
    }
    Some(ServerAddr {
        host,
        port,
        path: if p.is_empty() {
            None
        } else {
            Some(format!("/{}", p))
        },
    })
}
