//! Object-type registries: the durable name-to-handle memory.
//!
//! One registry table per object type, pre-registered at startup. Entries
//! are inserted only after the hardware create succeeds and erased in the
//! same step that removes the hardware object, so a registry never names an
//! object that is not live in hardware.

use std::collections::HashMap;
use swsm_sai::RawOid;
use thiserror::Error;

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown registry table: {0}")]
    UnknownTable(String),
}

/// Per-table mappings from logical object name to hardware handle.
///
/// Lookups never create tables or entries. Inserting into a table that was
/// not pre-registered is an error, not an implicit table creation. Null
/// handles are unrepresentable by construction ([`RawOid`] is non-zero).
#[derive(Debug, Default)]
pub struct TypeRegistry {
    tables: HashMap<String, HashMap<String, RawOid>>,
}

impl TypeRegistry {
    /// Creates an empty registry with no known tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the given tables pre-registered.
    pub fn with_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for table in tables {
            registry.register_table(table);
        }
        registry
    }

    /// Registers a table type. Idempotent.
    pub fn register_table(&mut self, table: impl Into<String>) {
        self.tables.entry(table.into()).or_default();
    }

    /// Returns true if the table type is known.
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Looks up the handle registered under (table, name).
    pub fn lookup(&self, table: &str, name: &str) -> Option<RawOid> {
        self.tables.get(table)?.get(name).copied()
    }

    /// Returns true if (table, name) is registered.
    pub fn contains(&self, table: &str, name: &str) -> bool {
        self.lookup(table, name).is_some()
    }

    /// Registers a handle under (table, name).
    ///
    /// Returns the previous handle if the name was already registered.
    pub fn insert(
        &mut self,
        table: &str,
        name: impl Into<String>,
        oid: RawOid,
    ) -> Result<Option<RawOid>, RegistryError> {
        let entries = self
            .tables
            .get_mut(table)
            .ok_or_else(|| RegistryError::UnknownTable(table.to_string()))?;
        Ok(entries.insert(name.into(), oid))
    }

    /// Removes the entry for (table, name), returning the handle if present.
    pub fn erase(&mut self, table: &str, name: &str) -> Option<RawOid> {
        self.tables.get_mut(table)?.remove(name)
    }

    /// Returns the number of entries registered under a table.
    pub fn table_len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, |t| t.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(raw: u64) -> RawOid {
        RawOid::new(raw).unwrap()
    }

    #[test]
    fn test_lookup_requires_registration() {
        let mut registry = TypeRegistry::with_tables(["BUFFER_POOL_TABLE"]);

        assert!(registry.has_table("BUFFER_POOL_TABLE"));
        assert!(!registry.has_table("BUFFER_PROFILE_TABLE"));
        assert!(registry.lookup("BUFFER_POOL_TABLE", "pool0").is_none());

        registry
            .insert("BUFFER_POOL_TABLE", "pool0", oid(0x1000))
            .unwrap();
        assert_eq!(registry.lookup("BUFFER_POOL_TABLE", "pool0"), Some(oid(0x1000)));
    }

    #[test]
    fn test_insert_into_unknown_table_is_an_error() {
        let mut registry = TypeRegistry::new();
        let err = registry.insert("NO_SUCH_TABLE", "x", oid(1)).unwrap_err();
        assert_eq!(err, RegistryError::UnknownTable("NO_SUCH_TABLE".to_string()));
    }

    #[test]
    fn test_erase() {
        let mut registry = TypeRegistry::with_tables(["BUFFER_POOL_TABLE"]);
        registry
            .insert("BUFFER_POOL_TABLE", "pool0", oid(0x1000))
            .unwrap();

        assert_eq!(registry.erase("BUFFER_POOL_TABLE", "pool0"), Some(oid(0x1000)));
        assert!(!registry.contains("BUFFER_POOL_TABLE", "pool0"));
        assert!(registry.erase("BUFFER_POOL_TABLE", "pool0").is_none());
    }

    #[test]
    fn test_insert_returns_previous_handle() {
        let mut registry = TypeRegistry::with_tables(["BUFFER_POOL_TABLE"]);
        registry
            .insert("BUFFER_POOL_TABLE", "pool0", oid(0x1000))
            .unwrap();
        let prev = registry
            .insert("BUFFER_POOL_TABLE", "pool0", oid(0x2000))
            .unwrap();
        assert_eq!(prev, Some(oid(0x1000)));
    }
}
