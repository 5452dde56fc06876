//! rpibridge-proto — cluster wire-protocol types for rpibridge.
//!
//! Everything the bridge puts on the wire lives here:
//!
//! - [`ProcessAddress`]: the `(host, port, process_id)` endpoint identity
//!   with explicit parse/format functions.
//! - Cluster data types (ids, task status, resources, offers, master info),
//!   JSON-serialized with the protocol's snake_case field names.
//! - [`FrameworkMessage`] and [`MasterMessage`]: closed unions of every
//!   message the bridge sends, one constructor each.
//!
//! # Wire format
//!
//! ```text
//! POST http://{host}:{port}/{process_id}/{message_type}
//! Libprocess-From: {sender}
//! Content-Type: application/json
//!
//! {json body}
//! ```

pub mod address;
pub mod error;
pub mod master;
pub mod messages;
pub mod types;

pub use address::ProcessAddress;
pub use error::{ProtoError, ProtoResult};
pub use master::{MasterState, PROTOCOL_VERSION};
pub use messages::*;
pub use types::*;
