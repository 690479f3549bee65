//! End-to-end tests: change dispatch through the daemon, down to the
//! simulated switch backend.

use pretty_assertions::assert_eq;

use swsm_orchagent::daemon::{OrchDaemon, OrchDaemonConfig, UnknownTablePolicy};
use swsm_orchagent::ports::{shared_topology, Port, PortTopology, SharedPortTopology};
use swsm_orchagent::{BufferOrch, QosOrch, SimSwitch};
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

fn ready_topology() -> SharedPortTopology {
    let mut topology = PortTopology::new();
    topology.add_port(test_port("Ethernet0", 0x100));
    topology.add_port(test_port("Ethernet4", 0x200));
    topology.set_ready();
    shared_topology(topology)
}

fn build_daemon(policy: UnknownTablePolicy) -> (OrchDaemon, SimSwitch) {
    let switch = SimSwitch::new();
    let topology = ready_topology();
    let mut daemon = OrchDaemon::new(OrchDaemonConfig {
        unknown_table_policy: policy,
        ..OrchDaemonConfig::default()
    });
    daemon.register_orch(Box::new(BufferOrch::new(
        Box::new(switch.clone()),
        topology.clone(),
    )));
    daemon.register_orch(Box::new(QosOrch::new(
        Box::new(switch.clone()),
        topology,
    )));
    (daemon, switch)
}

fn fv(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(f, v)| (f.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_out_of_order_buffer_config_converges() {
    let (mut daemon, switch) = build_daemon(UnknownTablePolicy::Drop);

    // The binding and the profile arrive before the pool they depend on.
    daemon.dispatch(
        "BUFFER_QUEUE_TABLE",
        "Ethernet0:3",
        "SET",
        fv(&[("profile", "[BUFFER_PROFILE_TABLE:prof0]")]),
    );
    daemon.dispatch(
        "BUFFER_PROFILE_TABLE",
        "prof0",
        "SET",
        fv(&[("pool", "[BUFFER_POOL_TABLE:pool0]"), ("size", "9216")]),
    );
    daemon.drain_all().await;

    // Nothing could be applied yet; both entries are retried, not lost.
    assert_eq!(daemon.dump().len(), 2);
    assert_eq!(switch.object_count(), 0);

    daemon.dispatch(
        "BUFFER_POOL_TABLE",
        "pool0",
        "SET",
        fv(&[("size", "16777216"), ("type", "egress")]),
    );
    daemon.drain_all().await;

    // Pool, profile, and binding all converged in one pass.
    assert!(daemon.dump().is_empty());
    assert_eq!(switch.object_count(), 2);
    let queue = QueueOid::from_raw(0x104).unwrap();
    assert!(switch.queue_profile(queue).is_some());
}

#[tokio::test]
async fn test_range_binding_touches_every_queue() {
    let (mut daemon, switch) = build_daemon(UnknownTablePolicy::Drop);

    daemon.dispatch(
        "BUFFER_POOL_TABLE",
        "pool0",
        "SET",
        fv(&[("size", "1048576"), ("type", "egress")]),
    );
    daemon.dispatch(
        "BUFFER_PROFILE_TABLE",
        "prof0",
        "SET",
        fv(&[("pool", "[BUFFER_POOL_TABLE:pool0]")]),
    );
    daemon.dispatch(
        "BUFFER_QUEUE_TABLE",
        "Ethernet0,Ethernet4:2-3",
        "SET",
        fv(&[("profile", "[BUFFER_PROFILE_TABLE:prof0]")]),
    );
    daemon.drain_all().await;
    assert!(daemon.dump().is_empty());

    // Queue handle for index i on port base b is b + 1 + i.
    for raw in [0x103u64, 0x104, 0x203, 0x204] {
        let queue = QueueOid::from_raw(raw).unwrap();
        assert!(switch.queue_profile(queue).is_some(), "queue {raw:#x} unbound");
    }
    // Queues outside the range are untouched.
    assert!(switch.queue_profile(QueueOid::from_raw(0x102).unwrap()).is_none());
    assert!(switch.queue_profile(QueueOid::from_raw(0x105).unwrap()).is_none());
}

#[tokio::test]
async fn test_hardware_failure_halts_pass_and_preserves_later_entries() {
    let (mut daemon, switch) = build_daemon(UnknownTablePolicy::Drop);

    daemon.dispatch(
        "BUFFER_POOL_TABLE",
        "pool0",
        "SET",
        fv(&[("size", "1024"), ("type", "ingress")]),
    );
    daemon.dispatch(
        "BUFFER_PROFILE_TABLE",
        "prof0",
        "SET",
        fv(&[("pool", "[BUFFER_POOL_TABLE:pool0]")]),
    );
    daemon.drain_all().await;
    assert_eq!(switch.object_count(), 2);

    // Deleting the pool while the profile still draws from it fails in
    // hardware. The entry queued after it must survive untouched.
    daemon.dispatch("BUFFER_POOL_TABLE", "pool0", "DEL", vec![]);
    daemon.dispatch(
        "BUFFER_POOL_TABLE",
        "pool1",
        "SET",
        fv(&[("size", "2048"), ("type", "egress")]),
    );
    daemon.drain_all().await;

    let pending = daemon.dump();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().any(|l| l.contains("pool0")));
    assert!(pending.iter().any(|l| l.contains("pool1")));
    // pool1 was never applied: the pass halted before reaching it.
    assert_eq!(switch.object_count(), 2);

    // Remove the blocking profile; the retried DEL and the stalled SET
    // then both go through.
    daemon.dispatch("BUFFER_PROFILE_TABLE", "prof0", "DEL", vec![]);
    daemon.drain_all().await;
    daemon.drain_all().await;

    assert!(daemon.dump().is_empty());
    // pool0 and prof0 gone, pool1 live.
    assert_eq!(switch.object_count(), 1);
}

#[tokio::test]
async fn test_unknown_table_is_discarded_under_drop_policy() {
    let (mut daemon, switch) = build_daemon(UnknownTablePolicy::Drop);

    daemon.dispatch("VLAN_TABLE", "Vlan100", "SET", fv(&[("vlanid", "100")]));
    daemon.drain_all().await;

    assert!(!daemon.is_faulted());
    assert!(daemon.dump().is_empty());
    assert_eq!(switch.object_count(), 0);
}

#[tokio::test]
async fn test_unknown_table_faults_under_halt_policy() {
    let (mut daemon, _switch) = build_daemon(UnknownTablePolicy::Halt);

    daemon.dispatch("VLAN_TABLE", "Vlan100", "SET", vec![]);
    assert!(daemon.is_faulted());
}

#[tokio::test]
async fn test_updates_for_one_key_merge_before_drain() {
    let (mut daemon, switch) = build_daemon(UnknownTablePolicy::Drop);

    // Two SETs for the same pool between drains collapse into one pending
    // entry, so hardware sees a single create with the merged fields.
    daemon.dispatch(
        "BUFFER_POOL_TABLE",
        "pool0",
        "SET",
        fv(&[("size", "1024")]),
    );
    daemon.dispatch(
        "BUFFER_POOL_TABLE",
        "pool0",
        "SET",
        fv(&[("type", "ingress"), ("size", "4096")]),
    );
    daemon.drain_all().await;

    assert!(daemon.dump().is_empty());
    assert_eq!(switch.object_count(), 1);
}

#[tokio::test]
async fn test_qos_family_end_to_end() {
    let (mut daemon, switch) = build_daemon(UnknownTablePolicy::Drop);

    daemon.dispatch(
        "DSCP_TO_TC_MAP_TABLE",
        "dscp_map",
        "SET",
        fv(&[("0", "0"), ("46", "5")]),
    );
    daemon.dispatch(
        "TC_TO_QUEUE_MAP_TABLE",
        "tc_map",
        "SET",
        fv(&[("0", "0"), ("5", "5")]),
    );
    daemon.dispatch(
        "SCHEDULER_TABLE",
        "sched0",
        "SET",
        fv(&[("type", "DWRR"), ("weight", "80")]),
    );
    daemon.dispatch(
        "WRED_PROFILE_TABLE",
        "wred0",
        "SET",
        fv(&[
            ("green_min_threshold", "1048576"),
            ("green_max_threshold", "2097152"),
            ("ecn", "ecn_all"),
        ]),
    );
    daemon.dispatch(
        "QUEUE_TABLE",
        "Ethernet0:5",
        "SET",
        fv(&[
            ("scheduler", "[SCHEDULER_TABLE:sched0]"),
            ("wred_profile", "[WRED_PROFILE_TABLE:wred0]"),
        ]),
    );
    daemon.dispatch(
        "PORT_QOS_MAP_TABLE",
        "Ethernet0,Ethernet4",
        "SET",
        fv(&[
            ("dscp_to_tc_map", "[DSCP_TO_TC_MAP_TABLE:dscp_map]"),
            ("tc_to_queue_map", "[TC_TO_QUEUE_MAP_TABLE:tc_map]"),
        ]),
    );
    daemon.drain_all().await;

    assert!(daemon.dump().is_empty());
    // Two maps, one scheduler, one wred profile.
    assert_eq!(switch.object_count(), 4);

    // DEL detaches; the objects can then be removed.
    daemon.dispatch("QUEUE_TABLE", "Ethernet0:5", "DEL", vec![]);
    daemon.dispatch("PORT_QOS_MAP_TABLE", "Ethernet0,Ethernet4", "DEL", vec![]);
    daemon.drain_all().await;
    daemon.dispatch("SCHEDULER_TABLE", "sched0", "DEL", vec![]);
    daemon.dispatch("WRED_PROFILE_TABLE", "wred0", "DEL", vec![]);
    daemon.dispatch("DSCP_TO_TC_MAP_TABLE", "dscp_map", "DEL", vec![]);
    daemon.dispatch("TC_TO_QUEUE_MAP_TABLE", "tc_map", "DEL", vec![]);
    daemon.drain_all().await;

    assert!(daemon.dump().is_empty());
    assert_eq!(switch.object_count(), 0);
}
