// Tunnel lifecycle and RPC behavior over a real listener: accept ordering,
// keepalive enforcement, close semantics and a full request round-trip.
use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use spangate::{
    adapters::{AppState, MemoryStorage, StaticAssets, build_router},
    core::{
        CredentialGate, CredentialSet, TraceServer,
        model::{RawSpan, SpanId, TraceId},
    },
    rpc::{self, RpcRequest, RpcResponse},
    tunnel::{TunnelBridge, TunnelListener},
};
use tempfile::TempDir;
use tokio::{io::AsyncReadExt, net::TcpStream, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

struct Gateway {
    addr: SocketAddr,
    bridge: Arc<TunnelBridge>,
    listener: TunnelListener,
    server: TraceServer,
    _assets: TempDir,
}

async fn start_gateway(keepalive: Duration) -> Gateway {
    let assets = TempDir::new().unwrap();
    let server = TraceServer::new(Arc::new(MemoryStorage::default()));
    let state = AppState {
        server: server.clone(),
        gate: Arc::new(CredentialGate::new(CredentialSet::parse(""))),
        assets: StaticAssets::new(assets.path()),
    };
    let (bridge, listener) = TunnelBridge::new(keepalive);
    let app = build_router(state, bridge.clone());

    let socket = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(socket, app).await.unwrap();
    });

    Gateway {
        addr,
        bridge,
        listener,
        server,
        _assets: assets,
    }
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}/rpc"))
        .await
        .expect("tunnel handshake");
    ws
}

/// Send one length-prefixed JSON request and collect the matching reply,
/// reassembling it across however many frames the gateway fragments it into.
async fn rpc_call(ws: &mut WsClient, request: &RpcRequest) -> RpcResponse {
    let payload = serde_json::to_vec(request).unwrap();
    let mut frame = (payload.len() as u32).to_be_bytes().to_vec();
    frame.extend_from_slice(&payload);
    ws.send(Message::Binary(frame.into())).await.unwrap();

    let mut buf: Vec<u8> = Vec::new();
    loop {
        if buf.len() >= 4 {
            let len = u32::from_be_bytes(buf[..4].try_into().unwrap()) as usize;
            if buf.len() >= 4 + len {
                return serde_json::from_slice(&buf[4..4 + len]).unwrap();
            }
        }
        let message = timeout(WAIT, ws.next()).await.expect("reply in time");
        match message {
            Some(Ok(Message::Binary(data))) => buf.extend_from_slice(&data),
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
            other => panic!("unexpected tunnel message: {other:?}"),
        }
    }
}

/// Drive the client until the server closes the session.
async fn expect_closed(mut ws: WsClient) {
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let message = timeout(WAIT, ws.next()).await.expect("close in time");
        match message {
            Some(Ok(Message::Close(_))) | None => return,
            Some(Ok(_)) => {
                assert!(tokio::time::Instant::now() < deadline, "no close observed");
            }
            Some(Err(_)) => return,
        }
    }
}

fn span(trace: u64, id: u64, service: &str) -> RawSpan {
    RawSpan {
        trace_id: TraceId(trace),
        span_id: SpanId(id),
        parent_id: None,
        service_name: service.to_string(),
        operation_name: "get /users".to_string(),
        start_time_us: 1_000,
        duration_us: 250,
        tags: Default::default(),
    }
}

#[tokio::test]
async fn sessions_are_accepted_in_arrival_order() {
    let mut gw = start_gateway(Duration::from_secs(20)).await;

    let mut first = connect(gw.addr).await;
    // Let the first session reach the accept queue before the second arrives.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut second = connect(gw.addr).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    first.send(Message::Binary(b"one".to_vec().into())).await.unwrap();
    second.send(Message::Binary(b"two".to_vec().into())).await.unwrap();

    let mut conn_a = timeout(WAIT, gw.listener.accept()).await.unwrap().unwrap();
    let mut conn_b = timeout(WAIT, gw.listener.accept()).await.unwrap().unwrap();

    let mut buf = [0u8; 3];
    timeout(WAIT, conn_a.read_exact(&mut buf)).await.unwrap().unwrap();
    assert_eq!(&buf, b"one");
    timeout(WAIT, conn_b.read_exact(&mut buf)).await.unwrap().unwrap();
    assert_eq!(&buf, b"two");
}

#[tokio::test]
async fn rpc_round_trip_through_the_tunnel() {
    let gw = start_gateway(Duration::from_secs(20)).await;
    gw.server.ingest(span(0x162e, 0x162f, "users-api")).await.unwrap();
    tokio::spawn(rpc::serve(gw.listener, gw.server.clone()));

    let mut ws = connect(gw.addr).await;

    assert_eq!(rpc_call(&mut ws, &RpcRequest::Ping).await, RpcResponse::Pong);

    let reply = rpc_call(&mut ws, &RpcRequest::Services).await;
    assert_eq!(
        reply,
        RpcResponse::Services {
            services: vec!["users-api".to_string()]
        }
    );

    let reply = rpc_call(&mut ws, &RpcRequest::TraceById { id: TraceId(0x162e) }).await;
    match reply {
        RpcResponse::Trace { trace } => {
            assert_eq!(trace.trace_id(), Some(TraceId(0x162e)));
            assert_eq!(trace.spans.len(), 1);
        }
        other => panic!("expected trace reply, got {other:?}"),
    }

    // A lookup miss is an error reply on the same, still-usable session.
    let reply = rpc_call(&mut ws, &RpcRequest::TraceById { id: TraceId(0xdead) }).await;
    assert!(matches!(reply, RpcResponse::Error { .. }));
    assert_eq!(rpc_call(&mut ws, &RpcRequest::Ping).await, RpcResponse::Pong);

    drop(gw.bridge);
}

#[tokio::test]
async fn silent_peer_is_disconnected_by_keepalive() {
    let mut gw = start_gateway(Duration::from_millis(200)).await;

    // The client never polls its socket, so the protocol stack never answers
    // the gateway's pings.
    let ws = connect(gw.addr).await;

    let mut conn = timeout(WAIT, gw.listener.accept()).await.unwrap().unwrap();
    let mut buf = [0u8; 16];
    let n = timeout(WAIT, conn.read(&mut buf))
        .await
        .expect("keepalive should end the session")
        .unwrap();
    assert_eq!(n, 0, "session stream should reach EOF");

    drop(ws);
}

#[tokio::test]
async fn closing_the_bridge_drops_queued_sessions() {
    let mut gw = start_gateway(Duration::from_secs(20)).await;

    let first = connect(gw.addr).await;
    let second = connect(gw.addr).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    gw.bridge.close();

    let err = timeout(WAIT, gw.listener.accept()).await.unwrap().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);

    // Both peers observe an orderly close, not a hang.
    expect_closed(first).await;
    expect_closed(second).await;
}

#[tokio::test]
async fn upgrade_after_close_completes_then_closes() {
    let gw = start_gateway(Duration::from_secs(20)).await;
    gw.bridge.close();

    // The handshake itself still succeeds; the session is closed right after.
    let ws = connect(gw.addr).await;
    expect_closed(ws).await;
}
