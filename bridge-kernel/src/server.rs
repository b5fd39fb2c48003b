//! hyper server hosting a [`WireBridge`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::{AddrIncoming, AddrStream};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Server};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::wire::WireBridge;

/// Errors raised while binding or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying hyper error.
        #[source]
        source: hyper::Error,
    },
    /// The accept loop failed.
    #[error("server error: {0}")]
    Serve(#[source] hyper::Error),
    /// The background server task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A bound listener paired with the bridge that answers its requests.
///
/// Each accepted connection is served on its own tokio task.
#[derive(Debug)]
pub struct BridgeServer {
    incoming: AddrIncoming,
    local_addr: SocketAddr,
    bridge: Arc<WireBridge>,
}

impl BridgeServer {
    /// Binds `addr`. Port `0` picks a free port; see [`Self::local_addr`].
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the socket cannot be bound.
    pub fn bind(addr: SocketAddr, bridge: WireBridge) -> Result<Self, ServerError> {
        let incoming = AddrIncoming::bind(&addr).map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = incoming.local_addr();
        Ok(Self {
            incoming,
            local_addr,
            bridge: Arc::new(bridge),
        })
    }

    /// Returns the address actually bound.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves until `signal` resolves, then drains in-flight connections.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Serve`] if the accept loop fails.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let bridge = self.bridge;
        let make_service = make_service_fn(move |conn: &AddrStream| {
            let bridge = Arc::clone(&bridge);
            debug!(remote = %conn.remote_addr(), "connection accepted");
            async move {
                Ok::<_, Infallible>(service_fn(move |request: Request<Body>| {
                    let bridge = Arc::clone(&bridge);
                    async move { Ok::<_, Infallible>(bridge.handle(request).await) }
                }))
            }
        });

        info!(addr = %self.local_addr, "listening");
        Server::builder(self.incoming)
            .serve(make_service)
            .with_graceful_shutdown(signal)
            .await
            .map_err(ServerError::Serve)?;
        info!(addr = %self.local_addr, "server stopped");
        Ok(())
    }

    /// Serves until the process exits.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Serve`] if the accept loop fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Runs the server on a background task.
    #[must_use]
    pub fn spawn(self) -> ServerHandle {
        let addr = self.local_addr;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(self.serve_with_shutdown(async move {
            let _ = shutdown_rx.await;
        }));
        ServerHandle {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a server started with [`BridgeServer::spawn`].
///
/// Dropping the handle signals shutdown without waiting for it.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
}

impl ServerHandle {
    /// Returns the bound address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signals shutdown and waits for the server to drain.
    ///
    /// # Errors
    ///
    /// Returns the server's own error, or [`ServerError::Join`] if its task
    /// failed.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
        match self.task.take() {
            Some(task) => task.await?,
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use bridge_registry::HandlerRegistry;

    use super::*;
    use crate::dispatch::Dispatcher;

    fn bridge() -> WireBridge {
        WireBridge::new(Dispatcher::new(Arc::new(HandlerRegistry::new())))
    }

    #[tokio::test]
    async fn binds_ephemeral_port_and_shuts_down() {
        let server = BridgeServer::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), bridge()).unwrap();
        let addr = server.local_addr();
        assert_ne!(addr.port(), 0);

        let handle = server.spawn();
        assert_eq!(handle.addr(), addr);

        let client = hyper::Client::new();
        let uri: hyper::Uri = format!("http://{addr}/health").parse().unwrap();
        let response = client.get(uri).await.unwrap();
        assert_eq!(response.status(), hyper::StatusCode::OK);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn occupied_port_fails_to_bind() {
        let first = BridgeServer::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), bridge()).unwrap();
        let err = BridgeServer::bind(first.local_addr(), bridge()).unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
