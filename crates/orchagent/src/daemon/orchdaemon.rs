//! OrchDaemon implementation.
//!
//! The OrchDaemon is the central coordinator for all Orch modules. It owns
//! change routing from the table streams into the modules' pending maps,
//! keeps modules ordered by priority, and runs the drain loop.

use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::str::FromStr;

use swsm_orch_common::{KeyOpFieldsValues, Operation, Orch};

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;

/// What to do with a change addressed to a table no module consumes.
///
/// `Drop` treats it as operator noise and discards with a warning. `Halt`
/// treats it as a deployment error and faults the daemon so the mismatch
/// cannot be silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTablePolicy {
    #[default]
    Drop,
    Halt,
}

impl FromStr for UnknownTablePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop" => Ok(UnknownTablePolicy::Drop),
            "halt" => Ok(UnknownTablePolicy::Halt),
            other => Err(format!("unknown table policy {other:?} (want drop|halt)")),
        }
    }
}

/// Configuration for the OrchDaemon.
#[derive(Debug, Clone)]
pub struct OrchDaemonConfig {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval_ms: u64,
    /// Batch size for consumer operations
    pub batch_size: usize,
    /// Handling of changes for tables with no consumer
    pub unknown_table_policy: UnknownTablePolicy,
}

impl Default for OrchDaemonConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 1000,
            batch_size: 128,
            unknown_table_policy: UnknownTablePolicy::Drop,
        }
    }
}

/// The main orchestration daemon.
pub struct OrchDaemon {
    config: OrchDaemonConfig,
    /// Registered modules, keyed by priority (lower drains first).
    orchs: BTreeMap<i32, Vec<Box<dyn Orch>>>,
    running: bool,
    faulted: bool,
}

impl OrchDaemon {
    pub fn new(config: OrchDaemonConfig) -> Self {
        Self {
            config,
            orchs: BTreeMap::new(),
            running: false,
            faulted: false,
        }
    }

    pub fn config(&self) -> &OrchDaemonConfig {
        &self.config
    }

    /// Registers a module with the daemon.
    pub fn register_orch(&mut self, orch: Box<dyn Orch>) {
        let priority = orch.priority();
        let name = orch.name().to_string();
        info!("Registering {name} with priority {priority}");

        let record = AuditRecord::new(
            AuditCategory::AdminAction,
            "OrchDaemon",
            format!("register_orch: {name}"),
        )
        .with_outcome(AuditOutcome::Success)
        .with_object_id(&name)
        .with_object_type("orch_module")
        .with_details(serde_json::json!({
            "priority": priority,
            "tables": orch.table_names(),
        }));
        audit_log!(record);

        self.orchs.entry(priority).or_default().push(orch);
    }

    /// True once a Halt-policy unknown table has faulted the daemon.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Routes one popped change into the consuming module's pending map.
    ///
    /// A change is consumed by the first registered module that claims the
    /// table. A verb other than SET/DEL is a producer bug: the change is
    /// logged and discarded without reaching any module.
    pub fn dispatch(&mut self, table: &str, key: &str, op: &str, fvs: Vec<(String, String)>) {
        let op = match Operation::parse(op) {
            Some(op) => op,
            None => {
                warn!("discarding {table}:{key}: unrecognized operation {op:?}");
                return;
            }
        };
        let entry = KeyOpFieldsValues::new(key, op, fvs);

        for orchs in self.orchs.values_mut() {
            for orch in orchs.iter_mut() {
                if orch.add_to_sync(table, entry.clone()) {
                    return;
                }
            }
        }

        match self.config.unknown_table_policy {
            UnknownTablePolicy::Drop => {
                warn!("no consumer for table {table}, dropping {key}");
            }
            UnknownTablePolicy::Halt => {
                error!("no consumer for table {table}, faulting daemon");
                let record = AuditRecord::new(
                    AuditCategory::ErrorCondition,
                    "OrchDaemon",
                    "unknown_table",
                )
                .with_object_id(table)
                .with_object_type("table")
                .with_error(format!("no consumer registered for {table}"));
                audit_log!(record);
                self.faulted = true;
            }
        }
    }

    /// Drives one drain pass over every module in priority order.
    pub async fn drain_all(&mut self) {
        for orchs in self.orchs.values_mut() {
            for orch in orchs.iter_mut() {
                if orch.has_pending_tasks() {
                    debug!("Processing tasks for {}", orch.name());
                    orch.do_task().await;
                }
            }
        }
    }

    /// Initializes the daemon before the event loop begins.
    pub async fn init(&mut self) -> bool {
        info!(
            "Initializing OrchDaemon with {} priority groups",
            self.orchs.len()
        );

        let record = AuditRecord::new(
            AuditCategory::SystemLifecycle,
            "OrchDaemon",
            "daemon_initialization",
        )
        .with_outcome(AuditOutcome::Success)
        .with_details(serde_json::json!({
            "orch_groups": self.orchs.len(),
            "heartbeat_interval_ms": self.config.heartbeat_interval_ms,
        }));
        audit_log!(record);

        true
    }

    /// Runs the main event loop until `stop()` is called or the daemon
    /// faults.
    pub async fn run(&mut self) {
        info!("Starting OrchDaemon event loop");
        self.running = true;

        let record =
            AuditRecord::new(AuditCategory::AdminAction, "OrchDaemon", "event_loop_started")
                .with_outcome(AuditOutcome::Success);
        audit_log!(record);

        while self.running && !self.faulted {
            self.drain_all().await;

            tokio::time::sleep(tokio::time::Duration::from_millis(
                self.config.heartbeat_interval_ms,
            ))
            .await;
        }

        if self.faulted {
            error!("OrchDaemon event loop stopped on fault");
        } else {
            info!("OrchDaemon event loop stopped");
        }

        let record =
            AuditRecord::new(AuditCategory::AdminAction, "OrchDaemon", "event_loop_stopped")
                .with_outcome(if self.faulted {
                    AuditOutcome::Failure
                } else {
                    AuditOutcome::Success
                });
        audit_log!(record);
    }

    /// Stops the event loop.
    pub fn stop(&mut self) {
        info!("Stopping OrchDaemon");
        self.running = false;
    }

    /// Dumps every module's pending entries for debugging.
    pub fn dump(&self) -> Vec<String> {
        self.orchs
            .values()
            .flatten()
            .flat_map(|orch| {
                let name = orch.name();
                orch.dump_pending_tasks()
                    .into_iter()
                    .map(move |line| format!("{name}: {line}"))
            })
            .collect()
    }
}
