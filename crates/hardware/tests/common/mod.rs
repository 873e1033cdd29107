#![allow(dead_code)]

pub mod harness;

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("uarchsim_core=trace")
        .try_init();
}
