//! Cross-table reference resolution.
//!
//! Objects refer to already-created objects by name using the textual form
//! `[TABLE_NAME:object_name]`, or a comma-joined list of such tokens for
//! multi-valued attributes. Resolution happens synchronously against the
//! [`TypeRegistry`](crate::registry::TypeRegistry) at the moment the
//! dependent update is processed, and is never cached: a reference is only
//! good if its target is live in hardware right now.
//!
//! Failure modes are deliberately split in two. A syntactically valid
//! reference whose target is simply not registered yet is a race with
//! upstream ordering and maps to [`RefResolveError::NotResolved`] (callers
//! retry). A bad bracket/delimiter structure or a reference to a table that
//! is not a known registry is a configuration error and maps to
//! [`RefResolveError::Malformed`] (callers discard the update).

use thiserror::Error;

use crate::consumer::KeyOpFieldsValues;
use crate::registry::TypeRegistry;
use swsm_sai::RawOid;

/// A parsed scalar reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub table: String,
    pub name: String,
}

/// Error type for reference resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RefResolveError {
    /// A field meant to be singleton appeared more than once.
    #[error("field appears multiple times")]
    MultipleInstances,
    /// The referenced object is not registered yet; retry later.
    #[error("referenced object not resolved")]
    NotResolved,
    /// Bad reference syntax or a reference to an unknown table; permanent.
    #[error("malformed reference")]
    Malformed,
}

/// Parses one `[TABLE_NAME:object_name]` token.
///
/// Returns `None` unless the token is enclosed in exactly one bracket pair
/// and contains a table/name delimiter with both sides non-empty.
pub fn parse_reference(value: &str) -> Option<Reference> {
    let inner = value.strip_prefix('[')?.strip_suffix(']')?;
    let (table, name) = inner.split_once(':')?;
    if table.is_empty() || name.is_empty() || inner.contains('[') || inner.contains(']') {
        return None;
    }
    Some(Reference {
        table: table.to_string(),
        name: name.to_string(),
    })
}

/// Scans an update for a singleton field holding one scalar reference and
/// resolves it against the registry.
///
/// `Ok(None)` means the field is absent, which is not an error: the caller
/// treats the attribute as simply not configured.
pub fn resolve_field_ref(
    registry: &TypeRegistry,
    field_name: &str,
    update: &KeyOpFieldsValues,
) -> Result<Option<RawOid>, RefResolveError> {
    let value = match singleton_field(field_name, update)? {
        Some(value) => value,
        None => return Ok(None),
    };
    resolve_one(registry, value).map(Some)
}

/// Scans an update for a singleton field holding a comma-joined reference
/// list and resolves every element in list order.
///
/// Resolution is atomic: if any element fails, no handles are returned.
pub fn resolve_field_ref_list(
    registry: &TypeRegistry,
    field_name: &str,
    update: &KeyOpFieldsValues,
) -> Result<Option<Vec<RawOid>>, RefResolveError> {
    let value = match singleton_field(field_name, update)? {
        Some(value) => value,
        None => return Ok(None),
    };

    let mut handles = Vec::new();
    for token in value.split(',') {
        handles.push(resolve_one(registry, token)?);
    }
    Ok(Some(handles))
}

fn singleton_field<'a>(
    field_name: &str,
    update: &'a KeyOpFieldsValues,
) -> Result<Option<&'a str>, RefResolveError> {
    let mut matches = update.fvs.iter().filter(|(f, _)| f == field_name);
    let first = matches.next();
    if matches.next().is_some() {
        return Err(RefResolveError::MultipleInstances);
    }
    Ok(first.map(|(_, v)| v.as_str()))
}

fn resolve_one(registry: &TypeRegistry, token: &str) -> Result<RawOid, RefResolveError> {
    let reference = parse_reference(token).ok_or(RefResolveError::Malformed)?;
    if !registry.has_table(&reference.table) {
        return Err(RefResolveError::Malformed);
    }
    registry
        .lookup(&reference.table, &reference.name)
        .ok_or(RefResolveError::NotResolved)
}
