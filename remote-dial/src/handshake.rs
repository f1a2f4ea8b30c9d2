use std::future::Future;

/// The step that turns a freshly connected raw stream into a session.
///
/// A handshake is used exactly once. It borrows the stream for as long as it
/// runs; afterwards the stream and the handshake's output are handed to the
/// caller together in a [`Handle`](crate::Handle).
///
/// Any async closure taking `&mut S` is a handshake:
/// ```no_run
/// # async fn run() {
/// use tokio::{io::AsyncReadExt, net::TcpStream};
///
/// let outcome = remote_dial::connect(6000, async |stream: &mut TcpStream| {
///     stream.read_u32().await
/// })
/// .await;
/// # }
/// ```
///
/// Failures of the handshake itself are not connection failures. Report them
/// through `Output`, as the closure above does with its `io::Result`.
pub trait Handshake<S> {
    type Output;

    fn handshake(self, stream: &mut S) -> impl Future<Output = Self::Output>;
}

impl<S, F, R> Handshake<S> for F
where
    F: AsyncFnOnce(&mut S) -> R,
{
    type Output = R;

    fn handshake(self, stream: &mut S) -> impl Future<Output = R> {
        self(stream)
    }
}
