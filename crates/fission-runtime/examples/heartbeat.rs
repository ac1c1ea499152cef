//! A periodic heartbeat joined with the latest sensor reading, plus a
//! toy IO backend that reports readiness from a background thread.
//!
//! Run with:
//!
//! ```sh
//! RUST_LOG=info cargo run --example heartbeat
//! ```

use fission_runtime::io::{Fd, IoBackend, IoError, IoEvent, IoSet};
use fission_runtime::{PlantConfig, PowerPlant, ReactionId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct SensorReading(f64);

/// Pretends one descriptor becomes readable every 250 ms.
#[derive(Default)]
struct ToyPoller {
    watched: Arc<Mutex<Vec<(Fd, ReactionId)>>>,
}

impl IoBackend for ToyPoller {
    fn bind(&self, fd: Fd, _interest: IoSet, token: ReactionId) -> Result<(), IoError> {
        if fd < 0 {
            return Err(IoError::InvalidFd(fd));
        }
        self.watched.lock().push((fd, token));
        Ok(())
    }

    fn unbind(&self, token: ReactionId) {
        self.watched.lock().retain(|(_, t)| *t != token);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let watched: Arc<Mutex<Vec<(Fd, ReactionId)>>> = Arc::default();
    let plant = Arc::new(
        PowerPlant::builder()
            .config(PlantConfig {
                threads: 2,
                ..PlantConfig::default()
            })
            .io_backend(ToyPoller {
                watched: watched.clone(),
            })
            .build()?,
    );

    let ctx = plant.scope("monitor");

    // Heartbeat: log the latest reading (if any) every 100 ms.
    ctx.every(Duration::from_millis(100))
        .label("heartbeat")
        .then({
            let emitter = ctx.emitter();
            move |tick: Arc<fission_runtime::dsl::Tick>| {
                let reading = emitter.latest::<SensorReading>().map(|r| r.0);
                info!(beat = tick.index, ?reading, "thump");
            }
        })?;

    // "Sensor": each readiness event stores a new reading.
    ctx.on_io(42, IoSet::READ).label("sensor").then({
        let emitter = ctx.emitter();
        move |event: IoEvent| {
            let value = f64::from(event.fd) + 0.5;
            emitter.emit(SensorReading(value));
        }
    })?;

    // Stop the demo after a second.
    {
        let emitter = ctx.emitter();
        ctx.every(Duration::from_secs(1))
            .label("stopper")
            .then(move |_| emitter.shutdown())?;
    }

    // Background "kernel" reporting readiness.
    let io_plant = plant.clone();
    std::thread::spawn(move || loop {
        std::thread::sleep(Duration::from_millis(250));
        for (fd, token) in watched.lock().iter() {
            io_plant.dispatch_io(
                *token,
                IoEvent {
                    fd: *fd,
                    ready: IoSet::READ,
                },
            );
        }
    });

    plant.start();
    info!(stats = ?plant.diagnostics(), "done");
    Ok(())
}
