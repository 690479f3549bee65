//! QoS object family: classification maps, scheduler and WRED profiles,
//! and their bindings.

mod orch;
mod types;

pub use orch::QosOrch;
pub use types::{
    parse_ecn_mode, parse_scheduling_type, QosTable, DSCP_MAX, DSCP_TO_TC_MAP_TABLE,
    PORT_QOS_MAP_TABLE, QUEUE_TABLE, SCHEDULER_TABLE, TC_MAX, TC_TO_QUEUE_MAP_TABLE,
    WRED_PROFILE_TABLE,
};
