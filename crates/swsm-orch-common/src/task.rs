//! Task processing status.

/// Result of processing a single pending update.
///
/// The drain loop is driven entirely by this four-way classification:
/// `Success` and `InvalidEntry` remove the entry, `NeedRetry` keeps it and
/// advances, and `Failed` keeps it and halts the whole pass for its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Hardware state now matches the update.
    Success,
    /// The update is structurally wrong; discard, never retry.
    InvalidEntry,
    /// A referenced dependency is not yet resolvable; keep for a later pass.
    NeedRetry,
    /// The hardware call itself failed; halt the table's drain pass.
    Failed,
}

impl TaskStatus {
    /// Returns true if the entry should be removed from the pending map.
    pub fn removes_entry(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::InvalidEntry)
    }

    /// Returns true if the entry should be retried on a later pass.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskStatus::NeedRetry)
    }

    /// Returns true if the table's drain pass must stop immediately.
    pub fn halts_drain(&self) -> bool {
        matches!(self, TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Success => "success",
            TaskStatus::InvalidEntry => "invalid_entry",
            TaskStatus::NeedRetry => "need_retry",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(TaskStatus::Success.removes_entry());
        assert!(TaskStatus::InvalidEntry.removes_entry());
        assert!(!TaskStatus::NeedRetry.removes_entry());
        assert!(!TaskStatus::Failed.removes_entry());

        assert!(TaskStatus::NeedRetry.is_retryable());
        assert!(!TaskStatus::Failed.is_retryable());

        assert!(TaskStatus::Failed.halts_drain());
        assert!(!TaskStatus::InvalidEntry.halts_drain());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TaskStatus::NeedRetry.to_string(), "need_retry");
        assert_eq!(TaskStatus::Failed.to_string(), "failed");
    }
}
