//! Per-port handle bundle.

use swsm_sai::{IngressPriorityGroupOid, PortOid, QueueOid};

/// One physical port with its queue and priority-group handles.
///
/// Handles are indexed positionally; index `i` in a binding key refers to
/// `queues[i]` or `priority_groups[i]`.
#[derive(Debug, Clone)]
pub struct Port {
    /// Logical name, e.g. `Ethernet0`.
    pub alias: String,
    /// Port-level hardware handle.
    pub port_id: PortOid,
    /// Egress queue handles in index order.
    pub queues: Vec<QueueOid>,
    /// Ingress priority-group handles in index order.
    pub priority_groups: Vec<IngressPriorityGroupOid>,
}

impl Port {
    pub fn new(alias: impl Into<String>, port_id: PortOid) -> Self {
        Self {
            alias: alias.into(),
            port_id,
            queues: Vec::new(),
            priority_groups: Vec::new(),
        }
    }

    /// Queue handle at `index`, if the port has that many queues.
    pub fn queue(&self, index: u32) -> Option<QueueOid> {
        self.queues.get(index as usize).copied()
    }

    /// Priority-group handle at `index`.
    pub fn priority_group(&self, index: u32) -> Option<IngressPriorityGroupOid> {
        self.priority_groups.get(index as usize).copied()
    }
}
