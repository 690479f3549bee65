//! Port topology shared between orchestration modules.

mod port;

pub use port::Port;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use swsm_sai::PortOid;

/// Known ports and their per-index hardware handles.
///
/// Binding handlers consult the topology to translate a port alias and
/// queue or priority-group index into the hardware handle that the
/// programming API needs. Until the topology is marked ready, modules
/// that depend on it skip draining entirely so that no binding is
/// half-applied against an incomplete port map.
#[derive(Debug, Default)]
pub struct PortTopology {
    ports: HashMap<String, Port>,
    ready: bool,
}

impl PortTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once port discovery has populated every port.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn set_ready(&mut self) {
        self.ready = true;
    }

    pub fn add_port(&mut self, port: Port) {
        self.ports.insert(port.alias.clone(), port);
    }

    pub fn get_port(&self, alias: &str) -> Option<&Port> {
        self.ports.get(alias)
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn port_id(&self, alias: &str) -> Option<PortOid> {
        self.ports.get(alias).map(|p| p.port_id)
    }
}

/// Handle to a topology shared between the discovery side and the
/// orchestration modules.
pub type SharedPortTopology = Arc<Mutex<PortTopology>>;

pub fn shared_topology(topology: PortTopology) -> SharedPortTopology {
    Arc::new(Mutex::new(topology))
}

/// Locks a shared topology, recovering from a poisoned lock.
///
/// Topology state is only mutated by whole-value insertions, so a panic
/// mid-update cannot leave a torn port behind.
pub fn lock_topology(topology: &SharedPortTopology) -> std::sync::MutexGuard<'_, PortTopology> {
    topology.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swsm_sai::{IngressPriorityGroupOid, PortOid, QueueOid};

    fn test_port(alias: &str, base: u64) -> Port {
        Port {
            alias: alias.to_string(),
            port_id: PortOid::from_raw(base).unwrap(),
            queues: (1..=8)
                .map(|i| QueueOid::from_raw(base + i).unwrap())
                .collect(),
            priority_groups: (11..=18)
                .map(|i| IngressPriorityGroupOid::from_raw(base + i).unwrap())
                .collect(),
        }
    }

    #[test]
    fn test_topology_lookup() {
        let mut topology = PortTopology::new();
        assert!(!topology.is_ready());

        topology.add_port(test_port("Ethernet0", 0x100));
        topology.add_port(test_port("Ethernet4", 0x200));
        topology.set_ready();

        assert!(topology.is_ready());
        assert_eq!(topology.port_count(), 2);
        assert_eq!(
            topology.port_id("Ethernet0"),
            Some(PortOid::from_raw(0x100).unwrap())
        );
        assert!(topology.get_port("Ethernet8").is_none());
    }

    #[test]
    fn test_port_index_bounds() {
        let port = test_port("Ethernet0", 0x100);
        assert!(port.queue(0).is_some());
        assert!(port.queue(7).is_some());
        assert!(port.queue(8).is_none());
        assert!(port.priority_group(7).is_some());
        assert!(port.priority_group(8).is_none());
    }

    #[test]
    fn test_shared_topology() {
        let shared = shared_topology(PortTopology::new());
        lock_topology(&shared).add_port(test_port("Ethernet0", 0x100));
        assert_eq!(lock_topology(&shared).port_count(), 1);
    }
}
