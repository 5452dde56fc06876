//! rpibridge-messenger — pushing protocol messages to remote processes.
//!
//! # Architecture
//!
//! ```text
//! FrameworkManager ──┐
//!                    ├── Outbox (sender address + acceptance rule)
//! LibprocessDriver ──┘     └── Transport (HyperTransport: one HTTP/1 request, with deadline)
//! ```
//!
//! Every message is one `POST /{process_id}/{message_type}` to the
//! destination's `host:port`, carrying the sender's address in the
//! `Libprocess-From` header. Only `200 OK` and `202 Accepted` count as
//! delivered. Nothing here retries.

pub mod driver;
pub mod error;
pub mod manager;
pub mod offer;
pub mod outbox;
pub mod transport;

pub use driver::{DriverConfig, LibprocessDriver};
pub use error::{MessengerError, MessengerResult, TransportError};
pub use manager::FrameworkManager;
pub use offer::OfferCapacity;
pub use outbox::Outbox;
pub use transport::{HyperTransport, Transport};
