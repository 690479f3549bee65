//! Buffer object family: pools, profiles, and profile bindings.

mod orch;
mod types;

pub use orch::BufferOrch;
pub use types::{
    parse_pool_type, parse_threshold_mode, BufferTable, BUFFER_PG_TABLE, BUFFER_POOL_TABLE,
    BUFFER_PORT_EGRESS_PROFILE_LIST_TABLE, BUFFER_PORT_INGRESS_PROFILE_LIST_TABLE,
    BUFFER_PROFILE_TABLE, BUFFER_QUEUE_TABLE,
};
