//! TCP listener and accept loop for the chat server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use super::session::{ChatSession, CHAT_FULL};
use crate::chat::Registry;
use crate::config::ServerConfig;
use crate::Result;

/// Chat server that accepts TCP connections and spawns one session task
/// per client.
pub struct ChatServer {
    listener: TcpListener,
    registry: Arc<Registry>,
}

impl ChatServer {
    /// Bind to the configured address.
    ///
    /// A bind failure is fatal: the error propagates to the caller, which
    /// terminates the process.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        info!("Server is listening on {}", local_addr);

        Ok(Self {
            listener,
            registry: Arc::new(Registry::new(config.max_users)),
        })
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared handle to the user registry.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Run the accept loop.
    ///
    /// A connection arriving while the registry is at its cap is told the
    /// chat is filled and closed without a session ever being created.
    /// Accept errors on individual connections are logged and do not stop
    /// the loop.
    pub async fn run(self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    if self.registry.is_full().await {
                        debug!("Rejecting {}: chat is filled", addr);
                        reject(stream).await;
                        continue;
                    }

                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        ChatSession::new(stream, addr, registry).run().await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Tell a rejected client the chat is filled, then drop the connection.
async fn reject(mut stream: TcpStream) {
    let notice = format!("{CHAT_FULL}\n");
    if let Err(e) = stream.write_all(notice.as_bytes()).await {
        debug!("Failed to send rejection notice: {}", e);
    }
}
