use serde::{Deserialize, Serialize};

/// The host port-only targets connect to, unless configured otherwise.
pub const DEFAULT_HOST: &str = "localhost";

/// Settings for a [`Connector`](crate::Connector).
///
/// Missing fields take their defaults when deserializing, so an empty
/// document is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host used for targets that only carry a port.
    pub default_host: String,
    /// Disable Nagle's algorithm on TCP streams.
    pub nodelay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_host: DEFAULT_HOST.into(),
            nodelay: false,
        }
    }
}
