//! TCP listener.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Skip per-connection accept failures
//! - Back off and keep accepting while the process is out of descriptors
//!   or buffers; surface everything else

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

/// Pause before accepting again after a resource exhaustion error.
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(#[source] io::Error),
}

/// A bound TCP listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `address` (anything `TcpListener::bind` resolves).
    pub async fn bind(address: &str) -> Result<Self, ListenerError> {
        let bind_error = |source| ListenerError::Bind {
            address: address.to_string(),
            source,
        };

        let listener = TcpListener::bind(address).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self {
            inner: listener,
            local_addr,
        })
    }

    /// Bind to the first of `addresses` that succeeds.
    ///
    /// Returns the last error when none of them can be bound.
    pub async fn bind_any(addresses: &[String]) -> Result<Self, ListenerError> {
        let mut last_error = None;
        for address in addresses {
            match Self::bind(address).await {
                Ok(listener) => return Ok(listener),
                Err(e) => {
                    tracing::debug!(error = %e, "Bind attempt failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ListenerError::Bind {
            address: String::new(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "no address to bind"),
        }))
    }

    /// Accept the next connection.
    ///
    /// Failures that only concern the connection being accepted (the peer
    /// reset or aborted before the handshake finished) are logged and
    /// skipped. Running out of file descriptors or socket buffers pauses
    /// for [`ACCEPT_BACKOFF`] and retries. Any other error ends the accept
    /// loop.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        loop {
            match self.inner.accept().await {
                Ok((stream, peer_addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::trace!(peer_addr = %peer_addr, error = %e, "Failed to set TCP_NODELAY");
                    }
                    tracing::trace!(peer_addr = %peer_addr, "Connection accepted");
                    return Ok((stream, peer_addr));
                }
                Err(e) if is_connection_error(&e) => {
                    tracing::debug!(error = %e, "Accept failed for a single connection");
                }
                Err(e) if is_resource_exhausted(&e) => {
                    tracing::warn!(
                        error = %e,
                        backoff = ?ACCEPT_BACKOFF,
                        "Accept failed, out of resources; retrying"
                    );
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
                Err(e) => return Err(ListenerError::Accept(e)),
            }
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

#[cfg(unix)]
fn is_resource_exhausted(e: &io::Error) -> bool {
    use libc::{EMFILE, ENFILE, ENOBUFS, ENOMEM};

    e.kind() == io::ErrorKind::OutOfMemory
        || matches!(e.raw_os_error(), Some(EMFILE | ENFILE | ENOBUFS | ENOMEM))
}

#[cfg(not(unix))]
fn is_resource_exhausted(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::OutOfMemory
}
