//! Bridges message-framed, HTTP-upgraded sessions onto a byte-stream
//! listener abstraction.
//!
//! Each successful upgrade produces a [`TunnelConn`] handed to the accept
//! queue and a pump task (the upgrade callback itself) that shuttles bytes
//! between the WebSocket and the connection: incoming frame payloads are
//! concatenated into the stream in order, outgoing bytes are fragmented into
//! Binary frames. The pump also probes the peer with Ping frames; a missing
//! Pong within one keepalive interval closes exactly that session.
use std::{io, sync::Arc, time::Duration};

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use bytes::Bytes;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, DuplexStream},
    sync::mpsc,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use crate::tunnel::{conn::TunnelConn, listener::TunnelListener};

/// Sub-protocol identifying the RPC tunnel during upgrade negotiation.
pub const TUNNEL_SUBPROTOCOL: &str = "spangate-rpc";

/// In-memory buffer per direction of a tunnel session.
///
/// This is also the back-pressure bound on an unread session: once a peer
/// has this many bytes in flight ahead of the consumer, `write_all` in the
/// pump blocks and the session stops reading frames and sending keepalive
/// probes until the consumer drains the backlog.
const SESSION_BUFFER: usize = 64 * 1024;

/// Producer half of the tunnel: owns the accept queue sender and the
/// keepalive policy. The matching [`TunnelListener`] is created alongside it
/// by [`TunnelBridge::new`].
pub struct TunnelBridge {
    tx: mpsc::UnboundedSender<TunnelConn>,
    keepalive: Duration,
    closed: CancellationToken,
}

impl TunnelBridge {
    /// Create a bridge and its virtual listener.
    pub fn new(keepalive: Duration) -> (Arc<Self>, TunnelListener) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = CancellationToken::new();
        let listener = TunnelListener {
            rx,
            closed: closed.clone(),
        };
        (
            Arc::new(Self {
                tx,
                keepalive,
                closed,
            }),
            listener,
        )
    }

    /// Close the bridge: further upgrades are completed and then immediately
    /// closed, queued connections are dropped, accepted ones are untouched.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    async fn run_session(self: Arc<Self>, mut socket: WebSocket) {
        let (rpc_half, pump_half) = tokio::io::duplex(SESSION_BUFFER);
        let conn = TunnelConn::new(rpc_half);
        let id = conn.id();

        // The upgrade already completed; if nobody can accept the connection
        // the only correct move is a clean close, never a dangling socket.
        if self.closed.is_cancelled() || self.tx.send(conn).is_err() {
            tracing::warn!(conn = %id, "tunnel bridge closed, refusing new session");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }

        tracing::info!(conn = %id, "tunnel session established");
        match pump(&mut socket, pump_half, self.keepalive).await {
            Ok(end) => tracing::info!(conn = %id, reason = %end, "tunnel session ended"),
            Err(e) => tracing::warn!(conn = %id, error = %e, "tunnel session failed"),
        }
        let _ = socket.send(Message::Close(None)).await;
    }
}

/// Why a pump loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    PeerClosed,
    ConsumerClosed,
    KeepaliveFailed,
}

impl std::fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEnd::PeerClosed => write!(f, "peer closed"),
            SessionEnd::ConsumerClosed => write!(f, "consumer closed"),
            SessionEnd::KeepaliveFailed => write!(f, "keepalive failed"),
        }
    }
}

/// Shuttle bytes between the WebSocket and the byte-stream half until either
/// side closes or the peer stops answering keepalive probes.
async fn pump(
    socket: &mut WebSocket,
    mut io: DuplexStream,
    keepalive: Duration,
) -> io::Result<SessionEnd> {
    let mut ticker = tokio::time::interval(keepalive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; consume it so the first probe goes
    // out one full interval after the upgrade.
    ticker.tick().await;

    let mut awaiting_pong = false;
    let mut buf = vec![0u8; 8 * 1024];

    loop {
        tokio::select! {
            message = socket.recv() => match message {
                Some(Ok(Message::Binary(data))) => io.write_all(&data).await?,
                Some(Ok(Message::Text(text))) => io.write_all(text.as_bytes()).await?,
                Some(Ok(Message::Pong(_))) => awaiting_pong = false,
                // The underlying protocol stack answers pings for us.
                Some(Ok(Message::Ping(_))) => {}
                Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::PeerClosed),
                Some(Err(e)) => return Err(io::Error::other(e)),
            },
            read = io.read(&mut buf) => match read {
                Ok(0) => return Ok(SessionEnd::ConsumerClosed),
                Ok(n) => socket
                    .send(Message::Binary(Bytes::copy_from_slice(&buf[..n])))
                    .await
                    .map_err(io::Error::other)?,
                Err(e) => return Err(e),
            },
            _ = ticker.tick() => {
                if awaiting_pong {
                    return Ok(SessionEnd::KeepaliveFailed);
                }
                socket
                    .send(Message::Ping(Bytes::new()))
                    .await
                    .map_err(io::Error::other)?;
                awaiting_pong = true;
            }
        }
    }
}

/// HTTP-upgrade handler mounted on the route table at the tunnel path.
pub async fn upgrade_handler(
    State(bridge): State<Arc<TunnelBridge>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.protocols([TUNNEL_SUBPROTOCOL])
        .on_upgrade(move |socket| bridge.run_session(socket))
}
