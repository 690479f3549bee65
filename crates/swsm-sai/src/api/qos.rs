//! QoS-category hardware API: maps, schedulers, WRED profiles and bindings.

use crate::error::SaiResult;
use crate::types::{PortOid, QosMapOid, QueueOid, SchedulerOid, WredOid};

/// Kind of a QoS map, which doubles as the per-port bind point selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QosMapType {
    DscpToTc,
    TcToQueue,
}

/// Creation/modification attributes for QoS maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QosMapAttr {
    Type(QosMapType),
    /// Ordered (from, to) entries of the map.
    MapToValueList(Vec<(u8, u8)>),
}

/// Scheduling discipline of a scheduler profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingType {
    Strict,
    Dwrr,
    Wrr,
}

/// Creation/modification attributes for scheduler profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerAttr {
    Type(SchedulingType),
    /// Scheduling weight, meaningful for weighted disciplines only.
    Weight(u8),
}

/// ECN marking mode for a WRED profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcnMode {
    None,
    Green,
    All,
}

/// Creation/modification attributes for WRED profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WredAttr {
    GreenEnable(bool),
    GreenMinThreshold(u32),
    GreenMaxThreshold(u32),
    GreenDropProbability(u32),
    EcnMarkMode(EcnMode),
}

/// Hardware operations for the QoS object category.
pub trait QosApi: Send {
    fn create_qos_map(&mut self, attrs: &[QosMapAttr]) -> SaiResult<QosMapOid>;
    fn set_qos_map_attr(&mut self, map: QosMapOid, attr: QosMapAttr) -> SaiResult<()>;
    fn remove_qos_map(&mut self, map: QosMapOid) -> SaiResult<()>;

    fn create_scheduler(&mut self, attrs: &[SchedulerAttr]) -> SaiResult<SchedulerOid>;
    fn set_scheduler_attr(&mut self, scheduler: SchedulerOid, attr: SchedulerAttr)
        -> SaiResult<()>;
    fn remove_scheduler(&mut self, scheduler: SchedulerOid) -> SaiResult<()>;

    fn create_wred(&mut self, attrs: &[WredAttr]) -> SaiResult<WredOid>;
    fn set_wred_attr(&mut self, wred: WredOid, attr: WredAttr) -> SaiResult<()>;
    fn remove_wred(&mut self, wred: WredOid) -> SaiResult<()>;

    fn set_queue_scheduler(
        &mut self,
        queue: QueueOid,
        scheduler: Option<SchedulerOid>,
    ) -> SaiResult<()>;
    fn set_queue_wred(&mut self, queue: QueueOid, wred: Option<WredOid>) -> SaiResult<()>;
    fn set_port_qos_map(
        &mut self,
        port: PortOid,
        kind: QosMapType,
        map: Option<QosMapOid>,
    ) -> SaiResult<()>;
}
