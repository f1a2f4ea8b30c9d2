//! Where to connect to.
use std::{fmt, str::FromStr};

use crate::error::TargetError;

/// The address half of a connection request.
///
/// A target either names its host, or only carries a port, in which case the
/// [`Connector`](crate::Connector)'s default host is used.
/// ```
/// use remote_dial::Target;
///
/// let local: Target = 6000.into();
/// let remote: Target = ("example.org", 6000).into();
/// assert_eq!(local.host(), None);
/// assert_eq!(remote, "example.org:6000".parse().unwrap());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    host: Option<String>,
    port: u16,
}

impl Target {
    /// A port on the default host.
    pub fn local(port: u16) -> Self {
        Self { host: None, port }
    }

    /// A port on `host`. An empty host means the default host, same as
    /// [`Self::local`].
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            host: (!host.is_empty()).then_some(host),
            port,
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Fills in `default_host` if this target doesn't name one.
    pub fn resolve(&self, default_host: &str) -> Endpoint {
        Endpoint {
            host: self.host.as_deref().unwrap_or(default_host).to_owned(),
            port: self.port,
        }
    }
}

impl From<u16> for Target {
    fn from(port: u16) -> Self {
        Self::local(port)
    }
}

impl From<(&str, u16)> for Target {
    fn from((host, port): (&str, u16)) -> Self {
        Self::new(host, port)
    }
}

impl From<(String, u16)> for Target {
    fn from((host, port): (String, u16)) -> Self {
        Self::new(host, port)
    }
}

impl From<Endpoint> for Target {
    fn from(endpoint: Endpoint) -> Self {
        Self::new(endpoint.host, endpoint.port)
    }
}

/// Accepts `"port"`, `"host:port"` and `"[v6-address]:port"`.
impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.contains(':') && !s.starts_with('[') {
            return Ok(Self::local(s.parse()?));
        }
        let (host, port) = match s.strip_prefix('[') {
            Some(rest) => rest
                .split_once("]:")
                .ok_or_else(|| TargetError::MissingPort(s.into()))?,
            None => s
                .rsplit_once(':')
                .filter(|(host, _)| !host.contains(':'))
                .ok_or_else(|| TargetError::MissingPort(s.into()))?,
        };
        if host.is_empty() {
            return Err(TargetError::EmptyHost(s.into()));
        }
        Ok(Self::new(host, port.parse()?))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) => write!(f, "{}", Endpoint::fmt_host_port(host, self.port)),
            None => write!(f, "{}", self.port),
        }
    }
}

/// A [`Target`] with its host filled in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn fmt_host_port(host: &str, port: u16) -> String {
        if host.contains(':') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::fmt_host_port(&self.host, self.port))
    }
}
