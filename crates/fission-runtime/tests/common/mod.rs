//! Shared helpers for the scenario tests.
#![allow(dead_code)] // each test binary uses a different subset

use fission_runtime::{PlantConfig, PowerPlant};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Builds a plant with `threads` workers and quiet defaults.
pub fn plant(threads: usize) -> Arc<PowerPlant> {
    init_tracing();
    Arc::new(
        PowerPlant::new(PlantConfig {
            threads,
            ..PlantConfig::default()
        })
        .expect("valid test config"),
    )
}

/// Runs `plant.start()` on a background thread.
///
/// `start` blocks until shutdown completes, so tests drive it from
/// here and join after requesting shutdown.
pub fn run(plant: &Arc<PowerPlant>) -> JoinHandle<()> {
    let plant = plant.clone();
    std::thread::spawn(move || plant.start())
}

/// Waits until the plant has emitted its startup event, i.e. emits
/// from the test thread dispatch synchronously from here on.
pub fn wait_until_running(plant: &Arc<PowerPlant>) {
    wait_for(|| plant.diagnostics().emitted >= 1);
}

/// Waits until `done` reports true, or panics after ~2 seconds.
pub fn wait_for(done: impl Fn() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    panic!("condition not reached within 2s");
}

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
