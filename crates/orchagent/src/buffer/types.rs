//! Buffer table names, field names, and value parsing.

use swsm_sai::{BufferPoolType, BufferThresholdMode};

pub const BUFFER_POOL_TABLE: &str = "BUFFER_POOL_TABLE";
pub const BUFFER_PROFILE_TABLE: &str = "BUFFER_PROFILE_TABLE";
pub const BUFFER_QUEUE_TABLE: &str = "BUFFER_QUEUE_TABLE";
pub const BUFFER_PG_TABLE: &str = "BUFFER_PG_TABLE";
pub const BUFFER_PORT_INGRESS_PROFILE_LIST_TABLE: &str = "BUFFER_PORT_INGRESS_PROFILE_LIST_TABLE";
pub const BUFFER_PORT_EGRESS_PROFILE_LIST_TABLE: &str = "BUFFER_PORT_EGRESS_PROFILE_LIST_TABLE";

pub const FIELD_SIZE: &str = "size";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_MODE: &str = "mode";
pub const FIELD_POOL: &str = "pool";
pub const FIELD_XON: &str = "xon";
pub const FIELD_XOFF: &str = "xoff";
pub const FIELD_DYNAMIC_TH: &str = "dynamic_th";
pub const FIELD_STATIC_TH: &str = "static_th";
pub const FIELD_PROFILE: &str = "profile";
pub const FIELD_PROFILE_LIST: &str = "profile_list";

/// The fixed set of tables the buffer module consumes.
///
/// Dispatch is by closed enum, so a consumer for a table with no handler
/// cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTable {
    Pool,
    Profile,
    Queue,
    PriorityGroup,
    IngressProfileList,
    EgressProfileList,
}

impl BufferTable {
    pub const ALL: [BufferTable; 6] = [
        BufferTable::Pool,
        BufferTable::Profile,
        BufferTable::Queue,
        BufferTable::PriorityGroup,
        BufferTable::IngressProfileList,
        BufferTable::EgressProfileList,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            BUFFER_POOL_TABLE => Some(BufferTable::Pool),
            BUFFER_PROFILE_TABLE => Some(BufferTable::Profile),
            BUFFER_QUEUE_TABLE => Some(BufferTable::Queue),
            BUFFER_PG_TABLE => Some(BufferTable::PriorityGroup),
            BUFFER_PORT_INGRESS_PROFILE_LIST_TABLE => Some(BufferTable::IngressProfileList),
            BUFFER_PORT_EGRESS_PROFILE_LIST_TABLE => Some(BufferTable::EgressProfileList),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BufferTable::Pool => BUFFER_POOL_TABLE,
            BufferTable::Profile => BUFFER_PROFILE_TABLE,
            BufferTable::Queue => BUFFER_QUEUE_TABLE,
            BufferTable::PriorityGroup => BUFFER_PG_TABLE,
            BufferTable::IngressProfileList => BUFFER_PORT_INGRESS_PROFILE_LIST_TABLE,
            BufferTable::EgressProfileList => BUFFER_PORT_EGRESS_PROFILE_LIST_TABLE,
        }
    }
}

/// Parses the pool `type` field.
pub fn parse_pool_type(value: &str) -> Option<BufferPoolType> {
    match value {
        "ingress" => Some(BufferPoolType::Ingress),
        "egress" => Some(BufferPoolType::Egress),
        _ => None,
    }
}

/// Parses the pool `mode` field.
pub fn parse_threshold_mode(value: &str) -> Option<BufferThresholdMode> {
    match value {
        "dynamic" => Some(BufferThresholdMode::Dynamic),
        "static" => Some(BufferThresholdMode::Static),
        _ => None,
    }
}
