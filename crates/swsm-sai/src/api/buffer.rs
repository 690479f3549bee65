//! Buffer-category hardware API: pools, profiles, and profile bindings.

use crate::error::SaiResult;
use crate::types::{
    BufferPoolOid, BufferProfileOid, IngressPriorityGroupOid, PortOid, QueueOid,
};

/// Direction of a per-port buffer profile list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficDirection {
    Ingress,
    Egress,
}

/// Buffer pool placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPoolType {
    Ingress,
    Egress,
}

/// Shared-headroom accounting mode for a buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferThresholdMode {
    Dynamic,
    Static,
}

/// Creation/modification attributes for buffer pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPoolAttr {
    /// Pool size in bytes.
    Size(u64),
    Type(BufferPoolType),
    ThresholdMode(BufferThresholdMode),
}

/// Creation/modification attributes for buffer profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferProfileAttr {
    /// The pool this profile draws from.
    PoolId(BufferPoolOid),
    /// Reserved buffer size in bytes.
    ReservedSize(u64),
    /// Xon threshold in bytes (PFC resume).
    XonThreshold(u64),
    /// Xoff threshold in bytes (PFC pause).
    XoffThreshold(u64),
    /// Dynamic shared threshold (alpha exponent).
    DynamicThreshold(i64),
    /// Static shared threshold in bytes.
    StaticThreshold(u64),
}

/// Hardware operations for the buffer object category.
///
/// Binding setters take `Option`: `None` detaches the profile (the backend
/// translates this to the ABI's null object id at the boundary).
pub trait BufferApi: Send {
    fn create_buffer_pool(&mut self, attrs: &[BufferPoolAttr]) -> SaiResult<BufferPoolOid>;
    fn set_buffer_pool_attr(&mut self, pool: BufferPoolOid, attr: BufferPoolAttr)
        -> SaiResult<()>;
    fn remove_buffer_pool(&mut self, pool: BufferPoolOid) -> SaiResult<()>;

    fn create_buffer_profile(&mut self, attrs: &[BufferProfileAttr])
        -> SaiResult<BufferProfileOid>;
    fn set_buffer_profile_attr(
        &mut self,
        profile: BufferProfileOid,
        attr: BufferProfileAttr,
    ) -> SaiResult<()>;
    fn remove_buffer_profile(&mut self, profile: BufferProfileOid) -> SaiResult<()>;

    fn set_queue_buffer_profile(
        &mut self,
        queue: QueueOid,
        profile: Option<BufferProfileOid>,
    ) -> SaiResult<()>;
    fn set_priority_group_buffer_profile(
        &mut self,
        pg: IngressPriorityGroupOid,
        profile: Option<BufferProfileOid>,
    ) -> SaiResult<()>;
    fn set_port_buffer_profile_list(
        &mut self,
        port: PortOid,
        direction: TrafficDirection,
        profiles: &[BufferProfileOid],
    ) -> SaiResult<()>;
}
