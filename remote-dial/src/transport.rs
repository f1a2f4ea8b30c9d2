//! How raw streams get opened.
use std::{future::Future, io};

use crate::{signal::Signals, target::Endpoint};

/// Opens raw, bidirectional streams.
///
/// The [`Connector`](crate::Connector) turns whatever `open` returns into a
/// [`Signal`](crate::Signal) itself. Implementations only need to raise
/// signals through `signals` when they learn something later, e.g. a
/// connection that breaks while the handshake is still running.
pub trait Transport {
    type Stream;

    fn open(&self, endpoint: &Endpoint, signals: &Signals) -> impl Future<Output = io::Result<Self::Stream>>;
}

impl<T: Transport> Transport for &T {
    type Stream = T::Stream;

    fn open(&self, endpoint: &Endpoint, signals: &Signals) -> impl Future<Output = io::Result<Self::Stream>> {
        (**self).open(endpoint, signals)
    }
}

#[cfg(feature = "tcp")]
pub use tcp::Tcp;

#[cfg(feature = "tcp")]
mod tcp {
    use std::io;

    use tokio::net::TcpStream;
    use tracing::trace;

    use super::Transport;
    use crate::{signal::Signals, target::Endpoint};

    /// Plain TCP, the default transport.
    ///
    /// Only the outcome of the connect itself is signalled. A peer that
    /// resets the stream while the handshake runs is seen by the handshake's
    /// own reads and writes, so the attempt settles with that failure inside
    /// the session. Raise an error on the attempt's [`Signals`] to fail it
    /// instead.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Tcp {
        nodelay: bool,
    }

    impl Tcp {
        pub fn new() -> Self {
            Self::default()
        }

        /// Sets `TCP_NODELAY` on every stream this transport opens.
        pub fn nodelay(mut self, nodelay: bool) -> Self {
            self.nodelay = nodelay;
            self
        }
    }

    impl Transport for Tcp {
        type Stream = TcpStream;

        async fn open(&self, endpoint: &Endpoint, _signals: &Signals) -> io::Result<TcpStream> {
            let stream = TcpStream::connect((endpoint.host(), endpoint.port())).await?;
            if self.nodelay {
                stream.set_nodelay(true)?;
            }
            trace!(%endpoint, local = ?stream.local_addr().ok(), "tcp stream open");
            Ok(stream)
        }
    }
}
