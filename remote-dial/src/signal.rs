//! Connection lifecycle signals and the listeners waiting on them.
//!
//! A [`Signals`] registry is shared between a connection attempt, its
//! [`Transport`](crate::Transport) and whoever else wants to observe the raw
//! connection. Every listener is one-shot and is removed from the registry
//! right before it runs, so listeners are free to call back into the registry
//! (for example to deregister a sibling) while a signal is being delivered.
use std::{
    fmt, io,
    sync::{Arc, Weak},
};

use easy_ext::ext;
use parking_lot::Mutex;
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, trace};

/// The kinds of signal a raw connection raises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    Connect,
    Error,
}

#[derive(Clone, Debug)]
pub enum Signal {
    /// The stream is established.
    Connect,
    /// The transport failed. Shared, since every error listener gets a copy.
    Error(Arc<io::Error>),
}

impl Signal {
    pub fn error(error: io::Error) -> Self {
        Self::Error(Arc::new(error))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Signal::Connect => Kind::Connect,
            Signal::Error(_) => Kind::Error,
        }
    }

    pub fn into_error(self) -> Option<Arc<io::Error>> {
        match self {
            Signal::Error(error) => Some(error),
            Signal::Connect => None,
        }
    }
}

#[ext(SignalExt)]
pub(crate) impl<T> io::Result<T> {
    /// Splits an open result into the stream, if any, and the signal it raises.
    fn into_signal(self) -> (Option<T>, Signal) {
        match self {
            Ok(value) => (Some(value), Signal::Connect),
            Err(error) => (None, Signal::error(error)),
        }
    }
}

/// Identifies a registered listener, see [`Signals::off`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnOnce(Signal) + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    // kept in registration order, which is also delivery order
    listeners: Vec<(ListenerId, Kind, Listener)>,
}

/// A shared registry of one-shot listeners.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct Signals {
    registry: Arc<Mutex<Registry>>,
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves an id for [`Self::once_as`].
    ///
    /// Useful when a listener has to know the id of a listener that is
    /// registered after it.
    pub fn next_id(&self) -> ListenerId {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        ListenerId(registry.next_id)
    }

    /// Registers `listener` to run the next time a signal of `kind` is raised.
    pub fn once(&self, kind: Kind, listener: impl FnOnce(Signal) + Send + 'static) -> ListenerId {
        let id = self.next_id();
        self.once_as(id, kind, listener);
        id
    }

    /// Same as [`Self::once`], under an id obtained from [`Self::next_id`].
    ///
    /// Registering twice under the same id replaces the earlier listener.
    pub fn once_as(&self, id: ListenerId, kind: Kind, listener: impl FnOnce(Signal) + Send + 'static) {
        let mut registry = self.registry.lock();
        registry.listeners.retain(|(other, ..)| *other != id);
        registry.listeners.push((id, kind, Box::new(listener)));
    }

    /// Deregisters one listener. Returns `false` if it already ran or was removed.
    pub fn off(&self, id: ListenerId) -> bool {
        self.take(id).is_some()
    }

    pub fn listener_count(&self, kind: Kind) -> usize {
        self.registry
            .lock()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// Delivers `signal` to every listener registered for its kind.
    ///
    /// Listeners added during delivery wait for the next signal; listeners
    /// removed during delivery don't run. Returns how many listeners ran.
    pub fn emit(&self, signal: Signal) -> usize {
        let kind = signal.kind();
        let pending: Vec<ListenerId> = self
            .registry
            .lock()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(id, ..)| *id)
            .collect();

        let mut delivered = 0;
        for id in pending {
            // the lock must not be held here, listeners may re-enter
            let Some(listener) = self.take(id) else {
                trace!(?id, %kind, "listener removed during delivery");
                continue;
            };
            trace!(?id, %kind, "delivering signal");
            listener(signal.clone());
            delivered += 1;
        }
        if delivered == 0 {
            match &signal {
                Signal::Error(error) => debug!(%error, "unobserved error signal"),
                Signal::Connect => trace!("unobserved connect signal"),
            }
        }
        delivered
    }

    pub(crate) fn downgrade(&self) -> WeakSignals {
        WeakSignals(Arc::downgrade(&self.registry))
    }

    fn take(&self, id: ListenerId) -> Option<Listener> {
        let mut registry = self.registry.lock();
        let pos = registry.listeners.iter().position(|(other, ..)| *other == id)?;
        Some(registry.listeners.remove(pos).2)
    }
}

impl fmt::Debug for Signals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_list()
            .entries(registry.listeners.iter().map(|(id, kind, _)| (id, kind)))
            .finish()
    }
}

/// A handle that doesn't keep the registry alive.
///
/// Listeners hold these when they refer back to their own registry.
#[derive(Clone)]
pub(crate) struct WeakSignals(Weak<Mutex<Registry>>);

impl WeakSignals {
    pub fn upgrade(&self) -> Option<Signals> {
        self.0.upgrade().map(|registry| Signals { registry })
    }
}
