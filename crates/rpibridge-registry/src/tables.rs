//! redb table definitions for the provider registry.

use redb::TableDefinition;

/// Provider records keyed by provider name.
pub const PROVIDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("providers");
