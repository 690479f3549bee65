//! swsm orchagent - switch state reconciliation daemon.
//!
//! The orchagent observes ordered per-table change streams describing
//! desired switch configuration (buffer pools and profiles, QoS maps,
//! schedulers, WRED profiles, and their bindings to queues, priority groups
//! and ports) and drives the hardware programming API to bring device state
//! into agreement. Per-table registries remember the mapping from logical
//! object names to hardware handles, which is what lets one object's
//! configuration refer to another by name.
//!
//! # Architecture
//!
//! ```text
//! [change streams] ──> [OrchDaemon] ──> [BufferOrch / QosOrch] ──> [hardware API]
//!                                              │
//!                                       [name registries]
//! ```
//!
//! # Key Components
//!
//! - [`daemon::OrchDaemon`]: change routing, priority ordering, event loop
//! - [`buffer::BufferOrch`]: buffer pools, profiles, queue/PG/port bindings
//! - [`qos::QosOrch`]: QoS maps, schedulers, WRED profiles, queue/port bindings
//! - [`ports::PortTopology`]: the alias-to-handle topology collaborator

pub mod audit;
pub mod buffer;
pub mod daemon;
pub mod ports;
pub mod qos;
pub mod sim;

pub use buffer::BufferOrch;
pub use daemon::{OrchDaemon, OrchDaemonConfig, UnknownTablePolicy};
pub use ports::{Port, PortTopology, SharedPortTopology};
pub use qos::QosOrch;
pub use sim::SimSwitch;
