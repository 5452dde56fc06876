//! rpibridge-registry — persistent registry of resource providers.
//!
//! Backed by [redb](https://docs.rs/redb). Each [`RpiInfo`] record is
//! JSON-serialized into a single table keyed by provider name.
//!
//! The [`RpiRegistry`] is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and can be shared across request handlers.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{RegistryError, RegistryResult};
pub use store::RpiRegistry;
pub use types::RpiInfo;
