//! TCP listener wrapper
//!
//! Thin outer shell around the per-connection engine: bind a tuned
//! socket, accept, and spawn one connection task per socket. Plain and
//! TLS transports are interchangeable from the engine's point of view.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::router::Router;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub backlog: i32,
    /// Overrides the default Server header
    pub server_ident: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 3000,
            backlog: 1024,
            server_ident: None,
        }
    }
}

/// HTTP server: a router behind an accept loop
pub struct Server {
    config: ServerConfig,
    router: Arc<Router>,
}

impl Server {
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// Serve plain TCP connections until the accept loop fails.
    pub async fn run(self) -> Result<()> {
        let listener = bind_listener(&self.config)?;
        info!(
            address = %self.config.address,
            port = self.config.port,
            "listening"
        );

        loop {
            let (stream, peer) = listener.accept().await?;
            stream.set_nodelay(true).ok();
            let conn = self.connection(peer);
            tokio::spawn(conn.run(stream));
        }
    }

    /// Serve TLS connections using the given certificate configuration.
    #[cfg(feature = "tls")]
    pub async fn run_tls(self, tls: crate::tls::TlsConfig) -> Result<()> {
        let acceptor = tokio_rustls::TlsAcceptor::from(tls.build_server_config()?);
        let listener = bind_listener(&self.config)?;
        info!(
            address = %self.config.address,
            port = self.config.port,
            "listening (tls)"
        );

        loop {
            let (stream, peer) = listener.accept().await?;
            stream.set_nodelay(true).ok();
            let conn = self.connection(peer);
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                match acceptor.accept(stream).await {
                    Ok(tls_stream) => conn.run(tls_stream).await,
                    Err(err) => {
                        tracing::warn!(peer = %peer, error = %err, "TLS handshake failed")
                    }
                }
            });
        }
    }

    fn connection(&self, peer: SocketAddr) -> Connection {
        let conn = Connection::new(self.router.clone(), peer);
        match &self.config.server_ident {
            Some(ident) => conn.server_ident(ident.clone()),
            None => conn,
        }
    }
}

/// Bind a listener with reuse-addr and the configured backlog
fn bind_listener(config: &ServerConfig) -> Result<TcpListener> {
    let addr: SocketAddr = format!("{}:{}", config.address, config.port)
        .parse()
        .map_err(|e| Error::invariant(format!("invalid listen address: {e}")))?;

    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(config.backlog)?;

    TcpListener::from_std(socket.into()).map_err(Error::from)
}
