//! Addressed message delivery.

use bytes::Bytes;
use http::{Method, Request, StatusCode};
use tracing::debug;

use rpibridge_proto::{ProcessAddress, WireMessage};

use crate::error::{MessengerError, MessengerResult, TransportError};
use crate::transport::Transport;

/// Header naming the sending process, so the receiver can reply.
pub const LIBPROCESS_FROM: &str = "libprocess-from";

/// Content type of every message body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Sends messages on behalf of one local process.
#[derive(Debug, Clone)]
pub struct Outbox<T> {
    sender: ProcessAddress,
    transport: T,
}

impl<T: Transport> Outbox<T> {
    pub fn new(sender: ProcessAddress, transport: T) -> Self {
        Self { sender, transport }
    }

    /// The address messages are sent from.
    pub fn sender(&self) -> &ProcessAddress {
        &self.sender
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Deliver `message` to `destination`.
    ///
    /// Succeeds only on `200 OK` or `202 Accepted`.
    pub async fn deliver<M: WireMessage>(
        &self,
        destination: &ProcessAddress,
        message: &M,
    ) -> MessengerResult<()> {
        let message_type = message.message_type();
        let body = message
            .to_body()
            .map_err(|e| MessengerError::Encode(e.to_string()))?;

        let request = Request::builder()
            .method(Method::POST)
            .uri(destination.message_path(message_type))
            .header(LIBPROCESS_FROM, self.sender.to_string())
            .header(http::header::CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(Bytes::from(body))
            .map_err(|e| MessengerError::Transport {
                context: format!("building {message_type} for {destination}"),
                source: TransportError::InvalidRequest(e.to_string()),
            })?;

        debug!(%destination, %message_type, "sending message");
        let status = self
            .transport
            .send(&destination.transport_addr(), request)
            .await
            .map_err(|source| MessengerError::Transport {
                context: format!("sending {message_type} to {destination}"),
                source,
            })?;

        if status == StatusCode::OK || status == StatusCode::ACCEPTED {
            Ok(())
        } else {
            debug!(%destination, %message_type, %status, "message rejected");
            Err(MessengerError::Protocol {
                destination: destination.to_string(),
                status: status.as_u16(),
            })
        }
    }

    /// Unauthenticated `GET /` against `destination`'s `host:port`.
    ///
    /// Any HTTP response proves the process is up. Transport failures
    /// are returned untouched for the caller to classify.
    pub async fn probe(&self, destination: &ProcessAddress) -> Result<StatusCode, TransportError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Bytes::new())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        self.transport
            .send(&destination.transport_addr(), request)
            .await
    }
}
