//! Daemon coordination: change routing and the drain loop.

mod orchdaemon;

pub use orchdaemon::{OrchDaemon, OrchDaemonConfig, UnknownTablePolicy};
