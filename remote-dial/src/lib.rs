//! Open a stream, run a handshake on it, get exactly one answer back.
//!
//! `remote-dial` is the piece that sits in front of a remote-object or RPC
//! client: it establishes the raw connection, hands it to a [`Handshake`]
//! once it's up, and settles with either a [`ConnectionFailure`] or a
//! [`Handle`] holding the stream and the handshake's product. The protocol
//! spoken over the stream is entirely the handshake's business.
//!
//! To quickly get started, try this example:
//! <details>
//! <summary> Example code </summary>
//!
//! ```no_run
#![doc = include_str!("../examples/hello.rs")]
//! ```
//!
//! </details>
//!
//! ## How an attempt settles
//! Every attempt races a `connect` against an `error` [`Signal`] on its
//! [`Signals`] registry, and whichever listener runs first decides the
//! outcome. An error removes the connect listener and fails the attempt right
//! away. A connect starts the handshake while the error listener keeps
//! watching; once the handshake is done that listener is removed too, and the
//! stream belongs to the caller.
//!
//! ## Features
//! - `tcp` (default): enables [`Tcp`], [`connect`] and [`Connector::new`].
mod config;
mod connector;
mod error;
mod handshake;
pub mod signal;
mod target;
pub mod transport;

pub use config::{Config, DEFAULT_HOST};
#[cfg(feature = "tcp")]
pub use connector::connect;
pub use connector::{Connector, Handle, Outcome};
pub use error::{ConnectionFailure, TargetError};
pub use handshake::Handshake;
pub use signal::{Kind, ListenerId, Signal, Signals};
pub use target::{Endpoint, Target};
#[cfg(feature = "tcp")]
pub use transport::Tcp;
pub use transport::Transport;
