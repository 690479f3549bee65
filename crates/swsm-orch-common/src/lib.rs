//! Common orchestration abstractions for swsm.
//!
//! This crate is the reusable reconciliation core shared by every concrete
//! object-type handler: the change-queue consumer with per-key update
//! merging, the cross-table reference resolver, the object-type registry,
//! the composite binding-key parsers, and the four-way task status the
//! drain loop is driven by.

pub mod consumer;
pub mod keys;
pub mod orch;
pub mod refs;
pub mod registry;
pub mod task;

pub use consumer::{Consumer, FieldValue, KeyOpFieldsValues, Operation};
pub use keys::{parse_bind_key, parse_index_range, parse_name_array, KeyParseError};
pub use orch::Orch;
pub use refs::{
    parse_reference, resolve_field_ref, resolve_field_ref_list, RefResolveError, Reference,
};
pub use registry::{RegistryError, TypeRegistry};
pub use task::TaskStatus;
