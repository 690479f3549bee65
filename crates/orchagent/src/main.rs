//! Orchagent entry point.
//!
//! Wires the orchestration modules to an in-memory switch backend, seeds a
//! port topology, and runs the daemon event loop until interrupted.

use clap::Parser;
use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Mutex;

use swsm_orchagent::daemon::{OrchDaemon, OrchDaemonConfig, UnknownTablePolicy};
use swsm_orchagent::ports::{lock_topology, shared_topology, Port, PortTopology};
use swsm_orchagent::{BufferOrch, QosOrch, SimSwitch};
use swsm_sai::{IngressPriorityGroupOid, PortOid, QueueOid};

/// Switch state reconciliation agent
#[derive(Parser, Debug)]
#[command(name = "orchagent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Batch size for consumer table operations
    #[arg(short = 'b', long, default_value = "128")]
    batch_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Heartbeat interval in milliseconds
    #[arg(long, default_value = "1000")]
    heartbeat_interval: u64,

    /// Handling of changes for unconsumed tables (drop, halt)
    #[arg(long, default_value = "drop")]
    unknown_table_policy: UnknownTablePolicy,

    /// Number of simulated front-panel ports
    #[arg(long, default_value = "32")]
    port_count: u32,
}

/// Seeds the simulated topology: `port_count` ports named Ethernet0,
/// Ethernet4, ... with eight queues and eight priority groups each.
fn seed_topology(port_count: u32) -> PortTopology {
    let mut topology = PortTopology::new();
    for i in 0..port_count {
        // Handle layout mirrors common ASIC numbering: one base handle per
        // port with queue/PG handles offset from it.
        let base = 0x0100_0000 + u64::from(i) * 0x100;
        let mut port = Port::new(
            format!("Ethernet{}", i * 4),
            PortOid::from_raw(base).unwrap_or_else(|| unreachable!("base is non-zero")),
        );
        for q in 0..8u64 {
            if let Some(queue) = QueueOid::from_raw(base + 1 + q) {
                port.queues.push(queue);
            }
            if let Some(pg) = IngressPriorityGroupOid::from_raw(base + 0x10 + q) {
                port.priority_groups.push(pg);
            }
        }
        topology.add_port(port);
    }
    topology.set_ready();
    topology
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    info!("====================================================================");
    info!("Starting swsm orchagent");
    info!("====================================================================");
    info!("Batch size: {}", args.batch_size);
    info!("Heartbeat interval: {}ms", args.heartbeat_interval);
    info!("Unknown table policy: {:?}", args.unknown_table_policy);
    info!("Simulated ports: {}", args.port_count);

    let daemon_config = OrchDaemonConfig {
        heartbeat_interval_ms: args.heartbeat_interval,
        batch_size: args.batch_size,
        unknown_table_policy: args.unknown_table_policy,
    };
    let mut daemon = OrchDaemon::new(daemon_config);

    let switch = SimSwitch::new();
    let topology = shared_topology(seed_topology(args.port_count));
    info!(
        "Port topology ready with {} ports",
        lock_topology(&topology).port_count()
    );

    info!("Registering orchestration modules...");
    info!("  Registering module: BufferOrch (priority 35)");
    daemon.register_orch(Box::new(BufferOrch::new(
        Box::new(switch.clone()),
        topology.clone(),
    )));
    info!("  Registering module: QosOrch (priority 35)");
    daemon.register_orch(Box::new(QosOrch::new(
        Box::new(switch.clone()),
        topology.clone(),
    )));

    info!("Initializing orchagent daemon...");
    if !daemon.init().await {
        error!("Failed to initialize orchagent daemon");
        return ExitCode::FAILURE;
    }
    info!("Daemon initialization complete");
    info!("Starting event loop...");

    let daemon_arc = Arc::new(Mutex::new(daemon));
    let daemon_clone = Arc::clone(&daemon_arc);

    let shutdown_handle = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Received SIGINT, shutting down gracefully...");
                let mut daemon = daemon_clone.lock().await;
                daemon.stop();
            }
            Err(err) => {
                error!("Failed to listen for ctrl-c: {err}");
            }
        }
    });

    {
        let mut daemon = daemon_arc.lock().await;
        daemon.run().await;
    }
    shutdown_handle.abort();

    info!("====================================================================");
    info!("swsm orchagent shutdown complete");
    info!("====================================================================");

    ExitCode::SUCCESS
}
