use std::{io, num::ParseIntError, sync::Arc};

use derive_more::From;
use thiserror::Error;

use crate::target::Endpoint;

/// A transport-level failure to establish a connection.
///
/// This is the only error a connection attempt ever settles with. Failures
/// raised by a [`Handshake`](crate::Handshake) travel inside its own output
/// instead.
#[derive(Clone, Debug, Error)]
#[error("failed to connect to {endpoint}: {source}")]
pub struct ConnectionFailure {
    endpoint: Endpoint,
    source: Arc<io::Error>,
}

impl ConnectionFailure {
    pub(crate) fn new(endpoint: Endpoint, source: Arc<io::Error>) -> Self {
        Self { endpoint, source }
    }

    /// The address the attempt was made against.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Shortcut for `self.io_error().kind()`.
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }

    pub fn io_error(&self) -> &io::Error {
        &self.source
    }
}

/// Returned when a string can't be parsed into a [`Target`](crate::Target).
#[derive(Debug, Error, From)]
pub enum TargetError {
    #[error("invalid port: {0}")]
    Port(ParseIntError),
    #[error("missing port in {0:?}")]
    #[from(skip)]
    MissingPort(String),
    #[error("empty host in {0:?}")]
    #[from(skip)]
    EmptyHost(String),
}
