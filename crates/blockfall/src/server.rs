//! `BlockfallServer` builder and accept loop.
//!
//! This is the entry point for running the relay. It owns the shared
//! state and spawns one handler task per accepted connection.

use std::sync::Arc;

use blockfall_protocol::JsonCodec;
use blockfall_room::LifecycleController;
use blockfall_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::relay::ClientRelay;
use crate::BlockfallError;

/// Shared server state passed to each connection handler task.
///
/// The controller mutex serializes event handling across connections,
/// which is the whole concurrency model: one event at a time, exactly
/// like the single-threaded original.
pub(crate) struct ServerState {
    pub(crate) controller: Mutex<LifecycleController>,
    pub(crate) relay: Mutex<ClientRelay>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Blockfall server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> Result<(), blockfall::BlockfallError> {
/// let server = blockfall::BlockfallServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct BlockfallServerBuilder {
    bind_addr: String,
}

impl BlockfallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the transport and builds the server.
    pub async fn build(self) -> Result<BlockfallServer, BlockfallError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            controller: Mutex::new(LifecycleController::new()),
            relay: Mutex::new(ClientRelay::new()),
            codec: JsonCodec,
        });

        Ok(BlockfallServer { transport, state })
    }
}

impl Default for BlockfallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Blockfall relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BlockfallServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl BlockfallServer {
    /// Creates a new builder.
    pub fn builder() -> BlockfallServerBuilder {
        BlockfallServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated; a failed accept is logged
    /// and does not take the server down.
    pub async fn run(mut self) -> Result<(), BlockfallError> {
        tracing::info!("Blockfall relay running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
