use std::io;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::tunnel::conn::TunnelConn;

/// Terminal error returned by [`TunnelListener::accept`] once the bridge has
/// been closed.
pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "tunnel listener closed")
}

/// A software-only listener yielding connections sourced from upgraded
/// tunnel sessions instead of the OS accept queue.
///
/// Connections are delivered strictly in upgrade-completion order. Once the
/// bridge is closed, every queued-but-unaccepted connection is dropped
/// (closing its session) and `accept` returns a terminal error; connections
/// already accepted belong to the consumer and are left alone.
pub struct TunnelListener {
    pub(crate) rx: mpsc::UnboundedReceiver<TunnelConn>,
    pub(crate) closed: CancellationToken,
}

impl TunnelListener {
    /// Wait for the next upgraded connection, FIFO.
    pub async fn accept(&mut self) -> io::Result<TunnelConn> {
        tokio::select! {
            // Cancellation is checked before the queue so a close racing an
            // already-queued connection always wins; the recheck below covers
            // a close landing between the two polls.
            biased;
            _ = self.closed.cancelled() => {
                self.discard_queued();
                Err(closed_error())
            }
            conn = self.rx.recv() => {
                if self.closed.is_cancelled() {
                    self.discard_queued();
                    return Err(closed_error());
                }
                conn.ok_or_else(closed_error)
            }
        }
    }

    /// Close the listener from the consumer side. Equivalent to closing the
    /// bridge: further upgrades are rejected and queued connections dropped.
    pub fn close(&mut self) {
        self.closed.cancel();
        self.discard_queued();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    fn discard_queued(&mut self) {
        self.rx.close();
        while let Ok(conn) = self.rx.try_recv() {
            tracing::debug!(conn = %conn.id(), "dropping queued tunnel connection on close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener_with_queued_conn() -> (TunnelListener, CancellationToken) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = CancellationToken::new();
        let listener = TunnelListener {
            rx,
            closed: closed.clone(),
        };
        let (near, _far) = tokio::io::duplex(64);
        tx.send(TunnelConn::new(near)).unwrap();
        (listener, closed)
    }

    #[tokio::test]
    async fn close_beats_an_already_queued_connection() {
        // Both select arms are ready at once; close must still win and the
        // queued connection must be dropped, not handed out.
        for _ in 0..40 {
            let (mut listener, closed) = listener_with_queued_conn();
            closed.cancel();
            let err = listener.accept().await.unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
            assert!(listener.accept().await.is_err());
        }
    }

    #[tokio::test]
    async fn queued_connection_is_delivered_while_open() {
        let (mut listener, _closed) = listener_with_queued_conn();
        assert!(listener.accept().await.is_ok());
    }
}
