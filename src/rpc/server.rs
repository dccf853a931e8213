//! Generic stream-oriented RPC accept loop.
//!
//! `serve` consumes any source of byte-stream connections - in production
//! the tunnel bridge's virtual listener - and answers remote procedure calls
//! against the shared [`TraceServer`]. The loop runs on its own task; it
//! returning an error is fatal to the whole process (there is no
//! supervision/restart strategy inside the gateway).
use std::io;

use bytes::Bytes;
use eyre::{Result, WrapErr};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::{
    core::server::TraceServer,
    ports::storage::StorageError,
    rpc::wire::{RpcRequest, RpcResponse},
    tunnel::TunnelListener,
};

/// Accept connections from the virtual listener until it is closed, serving
/// each on its own task.
///
/// Returns `Ok(())` only for an orderly listener close (gateway shutdown);
/// any other accept failure is a fatal transport error.
pub async fn serve(mut listener: TunnelListener, server: TraceServer) -> Result<()> {
    tracing::info!("rpc server started on tunnel listener");
    loop {
        match listener.accept().await {
            Ok(conn) => {
                let id = conn.id();
                let server = server.clone();
                tokio::spawn(async move {
                    tracing::debug!(conn = %id, "rpc connection accepted");
                    if let Err(e) = handle_connection(conn, server).await {
                        tracing::debug!(conn = %id, error = %e, "rpc connection ended with error");
                    } else {
                        tracing::debug!(conn = %id, "rpc connection closed");
                    }
                });
            }
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                tracing::info!("tunnel listener closed, rpc server stopping");
                return Ok(());
            }
            Err(e) => return Err(e).wrap_err("rpc accept loop failed"),
        }
    }
}

/// Serve one connection: length-delimited JSON request/response pairs until
/// the peer disconnects. Malformed frames and storage failures are answered
/// with an `Error` reply, never by dropping the connection.
pub(crate) async fn handle_connection<S>(io: S, server: TraceServer) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(io, LengthDelimitedCodec::new());

    while let Some(frame) = framed.next().await {
        let frame = frame?;
        let response = match serde_json::from_slice::<RpcRequest>(&frame) {
            Ok(request) => dispatch(&server, request).await,
            Err(e) => RpcResponse::Error {
                message: format!("malformed request: {e}"),
            },
        };
        let encoded = serde_json::to_vec(&response).map_err(io::Error::other)?;
        framed.send(Bytes::from(encoded)).await?;
    }
    Ok(())
}

async fn dispatch(server: &TraceServer, request: RpcRequest) -> RpcResponse {
    let result = match request {
        RpcRequest::Ping => return RpcResponse::Pong,
        RpcRequest::TraceById { id } => server
            .trace_by_id(id)
            .await
            .map(|trace| RpcResponse::Trace { trace }),
        RpcRequest::Services => server
            .services()
            .await
            .map(|services| RpcResponse::Services { services }),
        RpcRequest::Operations { service } => server
            .operations(&service)
            .await
            .map(|operations| RpcResponse::Operations { operations }),
        RpcRequest::Query { query } => server
            .query(query)
            .await
            .map(|traces| RpcResponse::Traces { traces }),
    };

    result.unwrap_or_else(|e: StorageError| RpcResponse::Error {
        message: e.to_string(),
    })
}
