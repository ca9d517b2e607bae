// Server loop module
// Accepts connections until shutdown is requested

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::ConnectionTracker;
use super::signal::SignalHandler;
use crate::config;
use crate::logger;

/// Run the accept loop
///
/// Once `signals` requests shutdown the listener stops accepting and
/// connections already accepted are drained, bounded by
/// `performance.write_timeout`. Returns after the drain.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    signals: Arc<SignalHandler>,
) {
    let mut connections = ConnectionTracker::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connections.accept(stream, peer_addr, &state);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = connections.reap() => {}

            _ = signals.shutdown.notified() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    drop(listener);
    logger::log_info(&format!(
        "[Shutdown] {} connection(s) still finishing",
        connections.active()
    ));
    connections
        .drain(Duration::from_secs(state.config.performance.write_timeout))
        .await;
    logger::log_info("[Shutdown] All connections closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, AppState};
    use crate::server::create_listener;
    use crate::store::{Message, MessageId, MessageStore, MemoryStore, NewMessage, StoreError};
    use async_trait::async_trait;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Store whose listing takes a while, to keep a request in flight
    struct SlowStore {
        delay: Duration,
    }

    #[async_trait]
    impl MessageStore for SlowStore {
        async fn find_all(&self) -> Result<Vec<Message>, StoreError> {
            tokio::time::sleep(self.delay).await;
            Ok(Vec::new())
        }

        async fn find_by_id(&self, _id: &MessageId) -> Result<Vec<Message>, StoreError> {
            Ok(Vec::new())
        }

        async fn insert(&self, draft: NewMessage) -> Result<Message, StoreError> {
            Ok(Message::create(draft))
        }
    }

    fn spawn_server(
        state: AppState,
    ) -> (std::net::SocketAddr, Arc<SignalHandler>, tokio::task::JoinHandle<()>) {
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let signals = Arc::new(SignalHandler::new());
        let server = tokio::spawn(start_server_loop(
            listener,
            Arc::new(state),
            Arc::clone(&signals),
        ));
        (addr, signals, server)
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let state = AppState::new(test_config(), Arc::new(MemoryStore::new()));
        let (addr, signals, server) = spawn_server(state);

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /about HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");
        assert!(response.contains("imageUrl"));

        signals.request_shutdown();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_in_flight_request_completes_after_shutdown() {
        let store = SlowStore {
            delay: Duration::from_millis(500),
        };
        let state = AppState::new(test_config(), Arc::new(store));
        let (addr, signals, server) = spawn_server(state);

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /messages HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        signals.request_shutdown();

        // The loop only returns once the slow request has been answered
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");
        assert!(response.contains("all good"));
    }

    #[tokio::test]
    async fn test_idle_keep_alive_does_not_hold_shutdown() {
        let state = AppState::new(test_config(), Arc::new(MemoryStore::new()));
        let (addr, signals, server) = spawn_server(state);

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /about HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut buf = [0u8; 1024];
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0);

        // Far shorter than the drain deadline
        signals.request_shutdown();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_drain_deadline_aborts_stuck_connections() {
        let mut cfg = test_config();
        cfg.performance.write_timeout = 1;
        let store = SlowStore {
            delay: Duration::from_secs(30),
        };
        let (addr, signals, server) = spawn_server(AppState::new(cfg, Arc::new(store)));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /messages HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        signals.request_shutdown();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }
}
