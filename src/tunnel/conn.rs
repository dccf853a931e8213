use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use uuid::Uuid;

/// One end of an upgraded tunnel session, presented to the RPC server as an
/// ordinary byte stream.
///
/// The other end is owned by the session pump, which concatenates incoming
/// WebSocket frame payloads into this stream and fragments outgoing bytes
/// back into frames. Dropping the connection tears the session down.
#[derive(Debug)]
pub struct TunnelConn {
    id: Uuid,
    io: DuplexStream,
}

impl TunnelConn {
    pub(crate) fn new(io: DuplexStream) -> Self {
        Self {
            id: Uuid::new_v4(),
            io,
        }
    }

    /// Unique identity of the tunnel session this connection belongs to.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl AsyncRead for TunnelConn {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_read(cx, buf)
    }
}

impl AsyncWrite for TunnelConn {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.io).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_shutdown(cx)
    }
}
