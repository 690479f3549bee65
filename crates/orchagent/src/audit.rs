//! Audit logging for hardware-affecting operations.
//!
//! Structured audit records aligned with NIST SP 800-53 AU-3 (content of
//! audit records): UTC timestamp, source module, action, outcome, affected
//! object, and failure details. Records serialize to JSON for SIEM
//! ingestion and are emitted through the [`audit_log!`] macro, which maps
//! outcomes to severity (success at info, failure at warn).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audit event categories (NIST AU-2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Resource creation events
    ResourceCreate,
    /// Resource modification events
    ResourceModify,
    /// Resource deletion events
    ResourceDelete,
    /// Hardware API operations
    SaiOperation,
    /// Error and failure events
    ErrorCondition,
    /// Administrative actions
    AdminAction,
    /// System startup and shutdown
    SystemLifecycle,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditCategory::ResourceCreate => write!(f, "RESOURCE_CREATE"),
            AuditCategory::ResourceModify => write!(f, "RESOURCE_MODIFY"),
            AuditCategory::ResourceDelete => write!(f, "RESOURCE_DELETE"),
            AuditCategory::SaiOperation => write!(f, "SAI_OPERATION"),
            AuditCategory::ErrorCondition => write!(f, "ERROR_CONDITION"),
            AuditCategory::AdminAction => write!(f, "ADMIN_ACTION"),
            AuditCategory::SystemLifecycle => write!(f, "SYSTEM_LIFECYCLE"),
        }
    }
}

/// Outcome of an audited action (NIST AU-3(e)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// Action completed successfully
    Success,
    /// Action failed
    Failure,
    /// Action is in progress
    InProgress,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Failure => write!(f, "failure"),
            AuditOutcome::InProgress => write!(f, "in_progress"),
        }
    }
}

/// Structured audit record (NIST AU-3).
///
/// Immutable once built; the builder pattern ensures complete records
/// before logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// UTC timestamp with microsecond precision (NIST AU-8)
    pub timestamp: DateTime<Utc>,

    /// Event category for filtering and analysis
    pub category: AuditCategory,

    /// Source module generating the event
    pub source: String,

    /// Human-readable action description
    pub action: String,

    /// Outcome of the action
    pub outcome: AuditOutcome,

    /// Object identifier affected by the action
    /// Examples: hardware handle (0x1000), pool name, binding key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// Object type for classification
    /// Examples: "buffer_pool", "qos_map", "queue_binding"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    /// Additional context for forensic analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Error message if the outcome is failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    /// Creates a new audit record with the current timestamp.
    ///
    /// The outcome defaults to InProgress until explicitly set.
    pub fn new(
        category: AuditCategory,
        source: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            source: source.into(),
            action: action.into(),
            outcome: AuditOutcome::InProgress,
            object_id: None,
            object_type: None,
            details: None,
            error: None,
        }
    }

    /// Sets the outcome of the action.
    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Sets the object identifier affected by the action.
    pub fn with_object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    /// Sets the object type for classification.
    pub fn with_object_type(mut self, obj_type: impl Into<String>) -> Self {
        self.object_type = Some(obj_type.into());
        self
    }

    /// Adds additional context details as JSON.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Sets the error message and marks the outcome as Failure.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.outcome = AuditOutcome::Failure;
        self
    }

    /// Serializes the record to JSON for logging.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization_failed","message":"{}"}}"#, e))
    }
}

/// Emits a structured audit record.
///
/// Outcome-based severity: Success at info, InProgress at debug,
/// Failure at warn. The full record rides along as JSON under the
/// `audit` target.
///
/// # Usage
/// ```ignore
/// let record = AuditRecord::new(AuditCategory::ResourceCreate, "BufferOrch", "create_pool")
///     .with_outcome(AuditOutcome::Success)
///     .with_object_id("0x1000")
///     .with_object_type("buffer_pool");
/// audit_log!(record);
/// ```
#[macro_export]
macro_rules! audit_log {
    ($record:expr) => {
        let record = $record;
        match record.outcome {
            $crate::audit::AuditOutcome::Success => {
                tracing::info!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::InProgress => {
                tracing::debug!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::Failure => {
                tracing::warn!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    error = record.error.as_deref().unwrap_or(""),
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
        }
    };
}

pub use audit_log;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = AuditRecord::new(AuditCategory::ResourceCreate, "BufferOrch", "create_pool")
            .with_outcome(AuditOutcome::Success)
            .with_object_id("0x1000")
            .with_object_type("buffer_pool");

        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.object_id.as_deref(), Some("0x1000"));
        assert_eq!(record.object_type.as_deref(), Some("buffer_pool"));
        assert!(record.error.is_none());
    }

    #[test]
    fn test_with_error_sets_failure() {
        let record = AuditRecord::new(AuditCategory::SaiOperation, "QosOrch", "remove_map")
            .with_error("object in use");

        assert_eq!(record.outcome, AuditOutcome::Failure);
        assert_eq!(record.error.as_deref(), Some("object in use"));
    }

    #[test]
    fn test_to_json_skips_absent_fields() {
        let record = AuditRecord::new(AuditCategory::AdminAction, "OrchDaemon", "stop")
            .with_outcome(AuditOutcome::Success);
        let json = record.to_json();

        assert!(json.contains("\"ADMIN_ACTION\""));
        assert!(!json.contains("object_id"));
        assert!(!json.contains("error"));
    }
}
