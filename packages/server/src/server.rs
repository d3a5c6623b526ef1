//! Server lifecycle: bind, accept loop and per-connection task spawning.

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use klvchat_shared::time::{Clock, SystemClock};
use tokio::net::{TcpListener, TcpStream};

use crate::{
    config::ServerConfig,
    error::ServerError,
    handler::ConnectionHandler,
    history::HistoryBuffer,
    pusher::{ConnectionId, FramePusher},
    registry::BroadcastRegistry,
    session::Session,
    signal::shutdown_signal,
};

/// Pause after a failed `accept` so a persistent error does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// KLV chat server
///
/// Owns the listening socket, the broadcast registry and the history buffer.
/// Each accepted connection runs as its own task with handles to both.
///
/// # Example
///
/// ```ignore
/// let server = Server::bind(ServerConfig::default()).await?;
/// server.run(shutdown_signal()).await;
/// ```
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    registry: Arc<BroadcastRegistry>,
    history: Arc<HistoryBuffer>,
    clock: Arc<dyn Clock>,
}

impl Server {
    /// Bind the listening socket described by `config`.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            registry: Arc::new(BroadcastRegistry::new()),
            history: Arc::new(HistoryBuffer::new(config.history_capacity)),
            clock: Arc::new(SystemClock),
            config,
        })
    }

    /// Replace the clock used by `TIME`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> Arc<BroadcastRegistry> {
        self.registry.clone()
    }

    pub fn history(&self) -> Arc<HistoryBuffer> {
        self.history.clone()
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Stopping closes the listening socket; connections already accepted keep
    /// running until their peers disconnect or the runtime shuts down.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        match self.listener.local_addr() {
            Ok(addr) => tracing::info!("KLV chat server listening on {}", addr),
            Err(_) => tracing::info!("KLV chat server listening on {}", self.config.bind_addr()),
        }
        tracing::info!(
            "History capacity {}, frame value limit {} bytes",
            self.config.history_capacity,
            self.config.max_frame_len
        );

        tokio::pin!(shutdown);
        let mut next_id = 1;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let id = ConnectionId::new(next_id);
                        next_id += 1;
                        tracing::info!("[{}] Connected from {}", id, peer);
                        self.spawn_connection(id, stream, peer);
                    }
                    Err(e) => {
                        tracing::error!("Error accepting connection: {}", e);
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        drop(self.listener);
        tracing::info!("Server stopped");
    }

    fn spawn_connection(&self, id: ConnectionId, stream: TcpStream, peer: SocketAddr) {
        let registry = self.registry.clone();
        let handler_pusher: Arc<dyn FramePusher> = registry.clone();
        let history = self.history.clone();
        let clock = self.clock.clone();
        let max_frame_len = self.config.max_frame_len;

        tokio::spawn(async move {
            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!("[{}] Failed to set TCP_NODELAY: {}", id, e);
            }
            let (reader, writer) = stream.into_split();
            registry.register(id, Box::new(writer)).await;

            ConnectionHandler::new(
                reader,
                peer,
                Session::new(id),
                handler_pusher,
                history,
                clock,
                max_frame_len,
            )
            .run()
            .await;
        });
    }
}

/// Bind according to `config` and serve until Ctrl+C (or SIGTERM).
///
/// # Arguments
///
/// * `config` - Listening endpoint and limits
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let server = Server::bind(config).await?;
    tracing::info!("Press Ctrl+C to shutdown gracefully");
    server.run(shutdown_signal()).await;
    Ok(())
}
