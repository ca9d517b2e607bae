// Connection handling module
// Serves accepted TCP connections and drains them on shutdown

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::config;
use crate::handler;
use crate::logger;

/// Connections owned by the accept loop
///
/// Every served connection runs as a task in `tasks`, so shutdown can wait
/// for them instead of dropping them with the runtime.
pub struct ConnectionTracker {
    tasks: JoinSet<()>,
    active: Arc<AtomicUsize>,
    draining: watch::Sender<bool>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            active: Arc::new(AtomicUsize::new(0)),
            draining: watch::Sender::new(false),
        }
    }

    /// Number of connections currently being served
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Collect one finished connection task
    ///
    /// Pending forever while no task is running.
    pub async fn reap(&mut self) {
        if self.tasks.join_next().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// Accept and process a connection, checking limits.
    ///
    /// # Arguments
    ///
    /// * `stream` - The TCP stream to handle
    /// * `peer_addr` - The peer's socket address
    /// * `state` - Shared application state
    pub fn accept(
        &mut self,
        stream: tokio::net::TcpStream,
        peer_addr: std::net::SocketAddr,
        state: &Arc<config::AppState>,
    ) {
        // Increment counter first, then check limit (prevents race condition)
        let prev_count = self.active.fetch_add(1, Ordering::SeqCst);

        if let Some(max_conn) = state.config.performance.max_connections {
            if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
                // Exceeded limit: rollback counter and reject
                self.active.fetch_sub(1, Ordering::SeqCst);
                logger::log_warning(&format!(
                    "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
                ));
                drop(stream);
                return;
            }
        }

        self.tasks.spawn(handle_connection(
            stream,
            peer_addr,
            Arc::clone(state),
            Arc::clone(&self.active),
            self.draining.subscribe(),
        ));
    }

    /// Ask every connection to finish and wait for them, up to `deadline`
    ///
    /// Idle keep-alive connections close at once; requests in progress get
    /// their response. Tasks still running at the deadline are aborted.
    pub async fn drain(mut self, deadline: Duration) {
        self.draining.send_replace(true);

        let finished = tokio::time::timeout(deadline, async {
            while self.tasks.join_next().await.is_some() {}
        })
        .await;

        if finished.is_err() {
            logger::log_warning(&format!(
                "[Shutdown] {} connection(s) aborted after {} seconds",
                self.tasks.len(),
                deadline.as_secs()
            ));
            self.tasks.shutdown().await;
        }
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve a single connection.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 connection settings (keep-alive)
/// 3. Serves the connection with the middleware chain
/// 4. Switches to graceful shutdown once draining starts
/// 5. Applies timeout to the connection
/// 6. Decrements connection counter when done
async fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<config::AppState>,
    conn_counter: Arc<AtomicUsize>,
    mut draining: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);

    let keep_alive_timeout = state.config.performance.keep_alive_timeout;
    let timeout_duration = Duration::from_secs(std::cmp::max(
        state.config.performance.read_timeout,
        state.config.performance.write_timeout,
    ));

    let mut builder = http1::Builder::new();
    builder.keep_alive(keep_alive_timeout > 0);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&state), peer_addr)),
    );

    let serve = async move {
        tokio::pin!(conn);
        let mut shutting_down = *draining.borrow_and_update();
        if shutting_down {
            conn.as_mut().graceful_shutdown();
        }
        loop {
            tokio::select! {
                result = conn.as_mut() => break result,
                _ = draining.changed(), if !shutting_down => {
                    shutting_down = true;
                    conn.as_mut().graceful_shutdown();
                }
            }
        }
    };

    match tokio::time::timeout(timeout_duration, serve).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&err),
        Err(_) => {
            logger::log_warning(&format!(
                "Connection from {peer_addr} timed out after {} seconds",
                timeout_duration.as_secs()
            ));
        }
    }

    conn_counter.fetch_sub(1, Ordering::SeqCst);
}
