//! HTTP transport for protocol messages.
//!
//! Each request opens a fresh TCP connection, performs one HTTP/1
//! exchange and reports the response status. The whole exchange runs
//! under a single deadline.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::Full;
use tracing::debug;

use crate::error::TransportError;

/// Delivers one request to `addr` (`host:port`) and returns the status.
///
/// The request URI carries only the path; the transport supplies the
/// `Host` header.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, addr: &str, request: Request<Bytes>) -> Result<StatusCode, TransportError>;
}

/// [`Transport`] built on a hyper HTTP/1 client connection.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    timeout: Duration,
}

impl HyperTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, addr: &str, request: Request<Bytes>) -> Result<StatusCode, TransportError> {
        match tokio::time::timeout(self.timeout, exchange(addr, request)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(%addr, timeout = ?self.timeout, "request timed out");
                Err(TransportError::Timeout {
                    addr: addr.to_string(),
                    after: self.timeout,
                })
            }
        }
    }
}

async fn exchange(addr: &str, request: Request<Bytes>) -> Result<StatusCode, TransportError> {
    let stream = tokio::net::TcpStream::connect(addr).await.map_err(|e| {
        debug!(error = %e, %addr, "connection failed");
        if e.kind() == ErrorKind::ConnectionRefused {
            TransportError::ConnectionRefused {
                addr: addr.to_string(),
            }
        } else {
            TransportError::Connect {
                addr: addr.to_string(),
                source: e,
            }
        }
    })?;

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| TransportError::Handshake {
            addr: addr.to_string(),
            source: e,
        })?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let (mut parts, body) = request.into_parts();
    let host = http::HeaderValue::from_str(addr)
        .map_err(|e| TransportError::InvalidRequest(format!("host header {addr:?}: {e}")))?;
    parts.headers.insert(http::header::HOST, host);
    let request = Request::from_parts(parts, Full::new(body));

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| TransportError::Request {
            addr: addr.to_string(),
            source: e,
        })?;

    Ok(response.status())
}
