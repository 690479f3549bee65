//! Base Orch trait.

use async_trait::async_trait;

use crate::consumer::KeyOpFieldsValues;

/// Base trait for all orchestration modules.
///
/// Each module owns one consumer per table it handles and implements this
/// trait to participate in the daemon's event loop. The daemon routes
/// incoming changes with `add_to_sync` and drives draining with `do_task`.
///
/// Drain semantics every implementation follows: a table's pending map is
/// processed in insertion order of first-seen keys; `Success` and
/// `InvalidEntry` remove the entry, `NeedRetry` leaves it for a later pass,
/// and `Failed` leaves it and stops that table's pass immediately. If the
/// module's topology dependency is not ready, the whole drain is skipped
/// without touching any entry.
#[async_trait]
pub trait Orch: Send {
    /// Returns the name of this module (for logging and debugging).
    fn name(&self) -> &str;

    /// Returns the table names this module consumes.
    fn table_names(&self) -> Vec<&str>;

    /// Routes one popped change into the owning consumer's pending map.
    ///
    /// Returns false if this module does not consume `table`.
    fn add_to_sync(&mut self, table: &str, entry: KeyOpFieldsValues) -> bool;

    /// Drains pending entries from all of this module's consumers.
    async fn do_task(&mut self);

    /// Returns the priority of this module (lower = higher priority).
    fn priority(&self) -> i32 {
        0
    }

    /// Returns true if this module has pending work.
    fn has_pending_tasks(&self) -> bool {
        false
    }

    /// Dumps pending tasks for debugging.
    fn dump_pending_tasks(&self) -> Vec<String> {
        vec![]
    }
}
