//! Change-queue consumer with per-key update merging.
//!
//! Each consumer wraps one table's change stream and owns that table's
//! pending-update map. Incoming changes are folded into the map by
//! [`Consumer::add_to_sync`] before the drain loop ever sees them, so the
//! map holds at most one pending entry per key at all times.

use indexmap::IndexMap;

/// Operation tag of a change-stream entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Set operation (create or update)
    Set,
    /// Delete operation
    Del,
}

impl Operation {
    /// Parses the wire verb. Exactly "SET" and "DEL" are recognized;
    /// anything else is an invalid entry at the caller.
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "SET" => Some(Operation::Set),
            "DEL" => Some(Operation::Del),
            _ => None,
        }
    }

    /// Returns the wire verb for this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Set => "SET",
            Operation::Del => "DEL",
        }
    }

    /// Returns true if this is a Set operation.
    pub fn is_set(&self) -> bool {
        matches!(self, Operation::Set)
    }

    /// Returns true if this is a Del operation.
    pub fn is_del(&self) -> bool {
        matches!(self, Operation::Del)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field-value pair from a change-stream entry.
pub type FieldValue = (String, String);

/// Key, operation, and field-values tuple popped from a change stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOpFieldsValues {
    /// The key (e.g., "ingress_pool", "Ethernet0,Ethernet4:2-3")
    pub key: String,
    /// The operation (Set or Del)
    pub op: Operation,
    /// Field-value pairs (empty for Del operations)
    pub fvs: Vec<FieldValue>,
}

impl KeyOpFieldsValues {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, op: Operation, fvs: Vec<FieldValue>) -> Self {
        Self {
            key: key.into(),
            op,
            fvs,
        }
    }

    /// Creates a Set entry.
    pub fn set(key: impl Into<String>, fvs: Vec<FieldValue>) -> Self {
        Self::new(key, Operation::Set, fvs)
    }

    /// Creates a Del entry.
    pub fn del(key: impl Into<String>) -> Self {
        Self::new(key, Operation::Del, vec![])
    }

    /// Returns the value for a field, if present.
    pub fn get_field(&self, field: &str) -> Option<&str> {
        self.fvs
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if this entry has the given field.
    pub fn has_field(&self, field: &str) -> bool {
        self.fvs.iter().any(|(f, _)| f == field)
    }

    /// One-line diagnostic form: key, verb, and all fields.
    pub fn dump(&self) -> String {
        format!("{} {} {:?}", self.key, self.op, self.fvs)
    }
}

/// Consumer for one table's change stream.
///
/// Owns the table's pending-update map, keyed by logical object key and
/// iterated in insertion order of first-seen keys.
///
/// # Merge rules
///
/// - A key not currently pending, or any DEL, replaces outright (DEL drops
///   all accumulated field state).
/// - A SET onto a pending entry merges field-by-field: an incoming field
///   erases any same-named pending field and is appended at the end, so
///   untouched fields keep their order and incoming fields move last. The
///   pending op becomes the incoming op.
pub struct Consumer {
    table_name: String,
    to_sync: IndexMap<String, KeyOpFieldsValues>,
}

impl Consumer {
    /// Creates a consumer for the named table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            to_sync: IndexMap::new(),
        }
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns true if there are pending entries.
    pub fn has_pending(&self) -> bool {
        !self.to_sync.is_empty()
    }

    /// Returns the number of pending entries.
    pub fn pending_count(&self) -> usize {
        self.to_sync.len()
    }

    /// Folds one popped change into the pending map.
    pub fn add_to_sync(&mut self, entry: KeyOpFieldsValues) {
        if entry.op.is_del() || !self.to_sync.contains_key(&entry.key) {
            self.to_sync.insert(entry.key.clone(), entry);
            return;
        }

        // Merge into the pending SET for this key.
        if let Some(pending) = self.to_sync.get_mut(&entry.key) {
            for (field, value) in entry.fvs {
                pending.fvs.retain(|(f, _)| *f != field);
                pending.fvs.push((field, value));
            }
            pending.op = entry.op;
        }
    }

    /// Folds a batch of popped changes in order.
    pub fn add_batch(&mut self, entries: Vec<KeyOpFieldsValues>) {
        for entry in entries {
            self.add_to_sync(entry);
        }
    }

    /// Returns the pending entry for a key, if any.
    pub fn pending(&self, key: &str) -> Option<&KeyOpFieldsValues> {
        self.to_sync.get(key)
    }

    /// Takes the whole pending map for a drain pass.
    ///
    /// The drain pass processes the taken entries and puts the survivors
    /// back with [`Consumer::restore_pending`]. Single-threaded: nothing is
    /// enqueued between take and restore.
    pub fn take_pending(&mut self) -> IndexMap<String, KeyOpFieldsValues> {
        std::mem::take(&mut self.to_sync)
    }

    /// Restores entries left over after a drain pass, preserving order.
    pub fn restore_pending(&mut self, entries: IndexMap<String, KeyOpFieldsValues>) {
        if self.to_sync.is_empty() {
            self.to_sync = entries;
        } else {
            for (key, entry) in entries {
                self.to_sync.insert(key, entry);
            }
        }
    }

    /// Clears all pending entries.
    pub fn clear(&mut self) {
        self.to_sync.clear();
    }

    /// Dumps pending entries for debugging, in drain order.
    pub fn dump(&self) -> Vec<String> {
        self.to_sync
            .values()
            .map(|e| format!("{}:{}", self.table_name, e.dump()))
            .collect()
    }
}
