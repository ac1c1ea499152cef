//! Two reactors playing ping-pong until a rally count is reached.
//!
//! Run with:
//!
//! ```sh
//! RUST_LOG=info cargo run --example ping_pong
//! ```

use fission_runtime::dsl::Trigger;
use fission_runtime::error::BindError;
use fission_runtime::reactor::{Reactor, ReactorContext};
use fission_runtime::{PlantConfig, PowerPlant};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Ping(u32);
struct Pong(u32);

struct Paddle;

impl Reactor for Paddle {
    fn name(&self) -> &str {
        "paddle"
    }

    fn setup(self: &Arc<Self>, ctx: &ReactorContext<'_>) -> Result<(), BindError> {
        let emitter = ctx.emitter();
        ctx.on::<(Trigger<Ping>,)>()
            .label("return-ping")
            .then(move |ping: Arc<Ping>| {
                info!(rally = ping.0, "ping");
                emitter.emit(Pong(ping.0));
            })?;
        Ok(())
    }
}

struct Server {
    rallies: u32,
}

impl Reactor for Server {
    fn name(&self) -> &str {
        "server"
    }

    fn setup(self: &Arc<Self>, ctx: &ReactorContext<'_>) -> Result<(), BindError> {
        {
            let emitter = ctx.emitter();
            ctx.on_startup().label("serve").then(move |_| {
                emitter.emit(Ping(0));
            })?;
        }
        let emitter = ctx.emitter();
        let limit = self.rallies;
        ctx.on::<(Trigger<Pong>,)>()
            .label("return-pong")
            .then(move |pong: Arc<Pong>| {
                info!(rally = pong.0, "pong");
                if pong.0 + 1 >= limit {
                    emitter.shutdown();
                } else {
                    emitter.emit(Ping(pong.0 + 1));
                }
            })?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let plant = PowerPlant::new(PlantConfig {
        threads: 2,
        ..PlantConfig::default()
    })?;

    plant.install(Paddle)?;
    plant.install(Server { rallies: 10 })?;

    plant.start();

    let stats = plant.diagnostics();
    info!(
        dispatched = stats.dispatched,
        emitted = stats.emitted,
        "rally over"
    );
    Ok(())
}
