//! TCP front end: accepts connections and runs one session task per client.

use crate::error::Result;
use crate::registry::CommandRegistry;
use crate::session::run_session;
use core_service::CoreService;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct Server {
    listener: TcpListener,
    core: Arc<CoreService>,
    registry: Arc<CommandRegistry>,
}

impl Server {
    /// Binds to the configured `hostname:port` with the built-in commands.
    ///
    /// # Errors
    ///
    /// Fails if the built-in commands collide or the address cannot be bound.
    pub async fn bind(core: Arc<CoreService>) -> Result<Self> {
        let registry = Arc::new(CommandRegistry::with_builtins()?);
        let address = core.config().listen_address();
        let listener = TcpListener::bind(&address).await?;
        info!(address = %address, commands = registry.len(), "MPD server listening");

        Ok(Self {
            listener,
            core,
            registry,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves clients until `shutdown` completes. Open sessions keep running
    /// until their clients disconnect.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("MPD server shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(connection) => connection,
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };
                    self.spawn_session(stream, peer);
                }
            }
        }
    }

    /// Serves clients forever.
    pub async fn serve(self) -> Result<()> {
        self.serve_until(std::future::pending()).await
    }

    fn spawn_session(&self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        let core = Arc::clone(&self.core);
        let registry = Arc::clone(&self.registry);

        tokio::spawn(async move {
            info!(%peer, "Client connected");
            if let Err(e) = run_session(stream, core, registry).await {
                warn!(%peer, error = %e, "Session failed");
            }
            info!(%peer, "Client disconnected");
        });
    }
}
