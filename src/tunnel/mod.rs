pub mod bridge;
pub mod conn;
pub mod listener;

pub use bridge::{TUNNEL_SUBPROTOCOL, TunnelBridge, upgrade_handler};
pub use conn::TunnelConn;
pub use listener::TunnelListener;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn accept_returns_terminal_error_after_close() {
        let (bridge, mut listener) = TunnelBridge::new(Duration::from_secs(20));
        bridge.close();
        let err = listener.accept().await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
        // And again: the closed state is terminal.
        assert!(listener.accept().await.is_err());
    }

    #[tokio::test]
    async fn listener_side_close_is_equivalent() {
        let (bridge, mut listener) = TunnelBridge::new(Duration::from_secs(20));
        listener.close();
        assert!(bridge.is_closed());
        assert!(listener.accept().await.is_err());
    }
}
