#![allow(dead_code)]

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Routes the store's `tracing` output through the test harness. Set `RUST_LOG=selfstore=debug`
/// to see flushes and transaction boundaries.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub fn read_file(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}
