//! Switch abstraction layer for swsm.
//!
//! Provides type-safe hardware object handles, status/error types, and the
//! per-category hardware programming API traits (`BufferApi`, `QosApi`) that
//! concrete backends implement. The orchestration layer only ever talks to
//! hardware through these traits, which is also what makes the reconciliation
//! engine testable against an in-memory mock.

pub mod api;
pub mod error;
pub mod types;

pub use api::buffer::{
    BufferApi, BufferPoolAttr, BufferPoolType, BufferProfileAttr, BufferThresholdMode,
    TrafficDirection,
};
pub use api::qos::{EcnMode, QosApi, QosMapAttr, QosMapType, SchedulerAttr, SchedulingType, WredAttr};
pub use error::{SaiError, SaiResult, SaiStatus};
pub use types::{
    BufferPoolOid, BufferProfileOid, IngressPriorityGroupOid, PortOid, QosMapOid, QueueOid, RawOid,
    SaiObjectId, SaiObjectKind, SchedulerOid, WredOid,
};
