use std::{io, sync::Arc};

use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    config::Config,
    error::ConnectionFailure,
    handshake::Handshake,
    signal::{Kind, ListenerId, SignalExt, Signals},
    target::{Endpoint, Target},
    transport::Transport,
};
#[cfg(feature = "tcp")]
use crate::transport::Tcp;

/// What a connection attempt settles with. Produced exactly once per attempt.
pub type Outcome<S, R> = Result<Handle<S, R>, ConnectionFailure>;

/// A ready connection: the raw stream plus whatever the handshake produced.
#[derive(Debug)]
pub struct Handle<S, R> {
    stream: S,
    session: R,
}

impl<S, R> Handle<S, R> {
    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn session(&self) -> &R {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut R {
        &mut self.session
    }

    /// Drops the stream, keeping the handshake's output.
    ///
    /// Only do this when the session doesn't need the stream anymore, or owns
    /// a handle of its own to it.
    pub fn into_session(self) -> R {
        self.session
    }

    pub fn into_parts(self) -> (S, R) {
        (self.stream, self.session)
    }
}

enum Settle {
    Connected,
    Failed(Arc<io::Error>),
}

/// The listeners one attempt put on a registry.
///
/// Dropping it deregisters exactly those, whether the attempt finished or was
/// cancelled, and leaves everybody else's listeners alone.
struct Attached<'a> {
    signals: &'a Signals,
    on_error: ListenerId,
    on_connect: ListenerId,
}

impl Attached<'_> {
    /// Registers the racing pair, both feeding `settle`.
    ///
    /// An error deregisters the connect listener before reporting. A connect
    /// leaves the error listener in place, it keeps watching the handshake.
    fn race<'a>(signals: &'a Signals, settle: mpsc::UnboundedSender<Settle>) -> Attached<'a> {
        let on_error = signals.next_id();
        let on_connect = signals.next_id();
        let weak = signals.downgrade();
        let failed = settle.clone();
        signals.once_as(on_error, Kind::Error, move |signal| {
            if let Some(signals) = weak.upgrade() {
                signals.off(on_connect);
            }
            if let Some(error) = signal.into_error() {
                let _ = failed.send(Settle::Failed(error));
            }
        });
        signals.once_as(on_connect, Kind::Connect, move |_| {
            let _ = settle.send(Settle::Connected);
        });
        Attached {
            signals,
            on_error,
            on_connect,
        }
    }
}

impl Drop for Attached<'_> {
    fn drop(&mut self) {
        self.signals.off(self.on_connect);
        self.signals.off(self.on_error);
    }
}

/// Establishes connections and hands them to a [`Handshake`].
///
/// ```no_run
/// use remote_dial::{Config, Connector};
/// use tokio::net::TcpStream;
///
/// # async fn run() {
/// let connector = Connector::from_config(Config {
///     default_host: "10.0.0.2".into(),
///     ..Config::default()
/// });
/// let handle = connector
///     .connect(6000, async |_: &mut TcpStream| "ready")
///     .await
///     .expect("Failed to connect");
/// assert_eq!(*handle.session(), "ready");
/// # }
/// ```
///
/// No timeout is applied; wrap the returned future in
/// `tokio::time::timeout` if the attempt must be bounded. Dropping the
/// future cancels the attempt and closes the stream.
#[derive(Clone, Debug)]
pub struct Connector<T> {
    transport: T,
    config: Config,
}

#[cfg(feature = "tcp")]
impl Connector<Tcp> {
    /// A TCP connector with the default [`Config`].
    pub fn new() -> Self {
        Self::from_config(Config::default())
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            transport: Tcp::new().nodelay(config.nodelay),
            config,
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for Connector<Tcp> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Connector<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            config: Config::default(),
        }
    }

    /// Host used for port-only targets.
    pub fn default_host(mut self, host: impl Into<String>) -> Self {
        self.config.default_host = host.into();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Connects to `target` and runs `handshake` on the new stream.
    pub async fn connect<H>(&self, target: impl Into<Target>, handshake: H) -> Outcome<T::Stream, H::Output>
    where
        H: Handshake<T::Stream>,
    {
        self.connect_on(target, handshake, &Signals::new()).await
    }

    /// Callback flavour of [`Self::connect`]. `callback` runs exactly once.
    pub async fn connect_with<H, F>(&self, target: impl Into<Target>, handshake: H, callback: F)
    where
        H: Handshake<T::Stream>,
        F: FnOnce(Outcome<T::Stream, H::Output>),
    {
        callback(self.connect(target, handshake).await)
    }

    /// Like [`Self::connect`], but signals of the raw connection go through
    /// `signals`.
    ///
    /// The caller may keep its own listeners on the registry, they are never
    /// touched by the attempt, and may raise signals on it, e.g. an error to
    /// abort a handshake that takes too long.
    pub async fn connect_on<H>(
        &self,
        target: impl Into<Target>,
        handshake: H,
        signals: &Signals,
    ) -> Outcome<T::Stream, H::Output>
    where
        H: Handshake<T::Stream>,
    {
        let endpoint = target.into().resolve(&self.config.default_host);
        let (settle, mut settled) = mpsc::unbounded_channel();
        let attached = Attached::race(signals, settle);

        debug!(%endpoint, "connecting");
        let (stream, signal) = self.transport.open(&endpoint, signals).await.into_signal();
        signals.emit(signal);

        // Decided by now, but a listener taken by a delivery on another
        // thread may not have reported yet. Listeners are only ever dropped
        // unrun by `attached`, so something is on its way.
        match settled.recv().await {
            Some(Settle::Connected) => {}
            Some(Settle::Failed(error)) => return Err(failed(endpoint, error)),
            None => return Err(failed(endpoint, unsettled())),
        }
        let Some(mut stream) = stream else {
            // connect was raised by the transport itself, then open failed
            let error = match settled.recv().await {
                Some(Settle::Failed(error)) => error,
                _ => unsettled(),
            };
            return Err(failed(endpoint, error));
        };

        debug!(%endpoint, "connected, running handshake");
        let session = tokio::select! {
            biased;
            Some(Settle::Failed(error)) = settled.recv() => {
                debug!(%endpoint, %error, "transport failed during handshake");
                return Err(failed(endpoint, error));
            }
            session = handshake.handshake(&mut stream) => session,
        };

        // From here on transport errors are the session's business.
        drop(attached);
        debug!(%endpoint, "ready");
        Ok(Handle { stream, session })
    }
}

/// Connects over TCP with a default [`Connector`].
///
/// Port-only targets go to [`DEFAULT_HOST`](crate::DEFAULT_HOST).
#[cfg(feature = "tcp")]
pub async fn connect<H>(target: impl Into<Target>, handshake: H) -> Outcome<tokio::net::TcpStream, H::Output>
where
    H: Handshake<tokio::net::TcpStream>,
{
    Connector::new().connect(target, handshake).await
}

fn failed(endpoint: Endpoint, error: Arc<io::Error>) -> ConnectionFailure {
    debug!(%endpoint, %error, "connection failed");
    ConnectionFailure::new(endpoint, error)
}

fn unsettled() -> Arc<io::Error> {
    Arc::new(io::Error::other("transport settled without raising a signal"))
}
