//! QoS table names, field names, and value parsing.

use swsm_sai::{EcnMode, SchedulingType};

pub const DSCP_TO_TC_MAP_TABLE: &str = "DSCP_TO_TC_MAP_TABLE";
pub const TC_TO_QUEUE_MAP_TABLE: &str = "TC_TO_QUEUE_MAP_TABLE";
pub const SCHEDULER_TABLE: &str = "SCHEDULER_TABLE";
pub const WRED_PROFILE_TABLE: &str = "WRED_PROFILE_TABLE";
pub const QUEUE_TABLE: &str = "QUEUE_TABLE";
pub const PORT_QOS_MAP_TABLE: &str = "PORT_QOS_MAP_TABLE";

pub const FIELD_TYPE: &str = "type";
pub const FIELD_WEIGHT: &str = "weight";
pub const FIELD_GREEN_MIN_THRESHOLD: &str = "green_min_threshold";
pub const FIELD_GREEN_MAX_THRESHOLD: &str = "green_max_threshold";
pub const FIELD_GREEN_DROP_PROBABILITY: &str = "green_drop_probability";
pub const FIELD_ECN: &str = "ecn";
pub const FIELD_SCHEDULER: &str = "scheduler";
pub const FIELD_WRED_PROFILE: &str = "wred_profile";
pub const FIELD_DSCP_TO_TC_MAP: &str = "dscp_to_tc_map";
pub const FIELD_TC_TO_QUEUE_MAP: &str = "tc_to_queue_map";

/// Highest valid DSCP code point.
pub const DSCP_MAX: u8 = 63;
/// Highest valid traffic class.
pub const TC_MAX: u8 = 7;

/// The fixed set of tables the QoS module consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QosTable {
    DscpToTcMap,
    TcToQueueMap,
    Scheduler,
    WredProfile,
    Queue,
    PortQosMap,
}

impl QosTable {
    pub const ALL: [QosTable; 6] = [
        QosTable::DscpToTcMap,
        QosTable::TcToQueueMap,
        QosTable::Scheduler,
        QosTable::WredProfile,
        QosTable::Queue,
        QosTable::PortQosMap,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            DSCP_TO_TC_MAP_TABLE => Some(QosTable::DscpToTcMap),
            TC_TO_QUEUE_MAP_TABLE => Some(QosTable::TcToQueueMap),
            SCHEDULER_TABLE => Some(QosTable::Scheduler),
            WRED_PROFILE_TABLE => Some(QosTable::WredProfile),
            QUEUE_TABLE => Some(QosTable::Queue),
            PORT_QOS_MAP_TABLE => Some(QosTable::PortQosMap),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QosTable::DscpToTcMap => DSCP_TO_TC_MAP_TABLE,
            QosTable::TcToQueueMap => TC_TO_QUEUE_MAP_TABLE,
            QosTable::Scheduler => SCHEDULER_TABLE,
            QosTable::WredProfile => WRED_PROFILE_TABLE,
            QosTable::Queue => QUEUE_TABLE,
            QosTable::PortQosMap => PORT_QOS_MAP_TABLE,
        }
    }
}

/// Parses the scheduler `type` field.
pub fn parse_scheduling_type(value: &str) -> Option<SchedulingType> {
    match value {
        "STRICT" => Some(SchedulingType::Strict),
        "DWRR" => Some(SchedulingType::Dwrr),
        "WRR" => Some(SchedulingType::Wrr),
        _ => None,
    }
}

/// Parses the WRED `ecn` field.
pub fn parse_ecn_mode(value: &str) -> Option<EcnMode> {
    match value {
        "ecn_none" => Some(EcnMode::None),
        "ecn_green" => Some(EcnMode::Green),
        "ecn_all" => Some(EcnMode::All),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_name_round_trip() {
        for table in QosTable::ALL {
            assert_eq!(QosTable::from_name(table.name()), Some(table));
        }
        assert_eq!(QosTable::from_name("BUFFER_POOL_TABLE"), None);
    }

    #[test]
    fn test_value_parsers() {
        assert_eq!(parse_scheduling_type("DWRR"), Some(SchedulingType::Dwrr));
        assert_eq!(parse_scheduling_type("WRR"), Some(SchedulingType::Wrr));
        assert_eq!(parse_scheduling_type("STRICT"), Some(SchedulingType::Strict));
        assert_eq!(parse_scheduling_type("dwrr"), None);

        assert_eq!(parse_ecn_mode("ecn_all"), Some(EcnMode::All));
        assert_eq!(parse_ecn_mode("ecn_green"), Some(EcnMode::Green));
        assert_eq!(parse_ecn_mode("ecn_none"), Some(EcnMode::None));
        assert_eq!(parse_ecn_mode("green"), None);
    }
}
