//! Backend contract scenarios: the chronometer, a fake IO readiness
//! loop, and a capturing network transport.

mod common;

use common::{plant, run, wait_for, wait_until_running};
use fission_runtime::dsl::IoReady;
use fission_runtime::error::BindError;
use fission_runtime::io::{Fd, IoBackend, IoError, IoEvent, IoSet};
use fission_runtime::net::{NetError, NetworkFrame, NetworkTransport};
use fission_runtime::types::ErrorCode;
use fission_runtime::{PlantConfig, PowerPlant, ReactionId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn every_fires_periodically_within_bounds() {
    let pp = plant(1);
    let ctx = pp.scope("ticker");

    let ticks = Arc::new(AtomicU32::new(0));
    {
        let ticks = ticks.clone();
        ctx.every(Duration::from_millis(10))
            .label("heartbeat")
            .then(move |_| {
                ticks.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let runner = run(&pp);
    wait_until_running(&pp);
    std::thread::sleep(Duration::from_millis(100));
    pp.shutdown();
    runner.join().unwrap();

    let count = ticks.load(Ordering::SeqCst);
    assert!(
        (4..=11).contains(&count),
        "expected roughly one tick per 10ms over 100ms, got {count}"
    );
}

#[test]
fn tick_indices_are_strictly_increasing() {
    let pp = plant(1);
    let ctx = pp.scope("tick-index");

    let indices: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let indices = indices.clone();
        ctx.every(Duration::from_millis(5))
            .then(move |tick: Arc<fission_runtime::dsl::Tick>| {
                indices.lock().push(tick.index);
            })
            .unwrap();
    }

    let runner = run(&pp);
    wait_for(|| indices.lock().len() >= 4);
    pp.shutdown();
    runner.join().unwrap();

    let indices = indices.lock();
    assert!(indices.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn zero_period_is_a_bind_error() {
    let pp = plant(1);
    let ctx = pp.scope("bad-period");

    let err = ctx.every(Duration::ZERO).then(move |_| {}).unwrap_err();
    assert_eq!(err, BindError::InvalidPeriod);
    assert_eq!(pp.reaction_count(), 0);
}

#[derive(Default)]
struct FakePoller {
    bound: Mutex<Vec<(Fd, IoSet, ReactionId)>>,
    unbound: Mutex<Vec<ReactionId>>,
}

impl IoBackend for FakePoller {
    fn bind(&self, fd: Fd, interest: IoSet, token: ReactionId) -> Result<(), IoError> {
        if fd < 0 {
            return Err(IoError::InvalidFd(fd));
        }
        self.bound.lock().push((fd, interest, token));
        Ok(())
    }

    fn unbind(&self, token: ReactionId) {
        self.unbound.lock().push(token);
    }
}

fn io_plant(poller: Arc<FakePoller>) -> Arc<PowerPlant> {
    common::init_tracing();
    Arc::new(
        PowerPlant::builder()
            .config(PlantConfig {
                threads: 2,
                ..PlantConfig::default()
            })
            .io_backend(SharedPoller(poller))
            .build()
            .expect("valid test config"),
    )
}

/// Lets the test keep its own handle on the poller installed in the
/// plant.
struct SharedPoller(Arc<FakePoller>);

impl IoBackend for SharedPoller {
    fn bind(&self, fd: Fd, interest: IoSet, token: ReactionId) -> Result<(), IoError> {
        self.0.bind(fd, interest, token)
    }

    fn unbind(&self, token: ReactionId) {
        self.0.unbind(token);
    }
}

#[test]
fn io_readiness_reaches_the_callback_as_transient() {
    let poller = Arc::new(FakePoller::default());
    let pp = io_plant(poller.clone());
    let ctx = pp.scope("io");

    let events: Arc<Mutex<Vec<IoEvent>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let events = events.clone();
        ctx.on_io(5, IoSet::READ | IoSet::CLOSE)
            .label("socket")
            .then(move |event: IoEvent| {
                events.lock().push(event);
            })
            .unwrap();
    }

    let (fd, interest, token) = poller.bound.lock()[0];
    assert_eq!(fd, 5);
    assert_eq!(interest, IoSet::READ | IoSet::CLOSE);

    let runner = run(&pp);
    wait_until_running(&pp);

    pp.dispatch_io(
        token,
        IoEvent {
            fd: 5,
            ready: IoSet::READ,
        },
    );
    wait_for(|| events.lock().len() == 1);
    assert_eq!(events.lock()[0].ready, IoSet::READ);

    pp.shutdown();
    runner.join().unwrap();
}

#[test]
fn io_reactions_are_implicitly_single() {
    let poller = Arc::new(FakePoller::default());
    let pp = io_plant(poller.clone());
    let ctx = pp.scope("io-single");

    let entered = Arc::new(AtomicU32::new(0));
    {
        let entered = entered.clone();
        ctx.on_io(7, IoSet::READ)
            .then(move |_: IoEvent| {
                entered.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(40));
            })
            .unwrap();
    }
    let token = poller.bound.lock()[0].2;

    let runner = run(&pp);
    wait_until_running(&pp);

    let event = IoEvent {
        fd: 7,
        ready: IoSet::READ,
    };
    pp.dispatch_io(token, event);
    pp.dispatch_io(token, event);
    pp.dispatch_io(token, event);

    std::thread::sleep(Duration::from_millis(100));
    pp.shutdown();
    runner.join().unwrap();

    assert_eq!(entered.load(Ordering::SeqCst), 1);
    assert_eq!(pp.diagnostics().dropped_single, 2);
}

#[test]
fn unbinding_an_io_reaction_tells_the_backend() {
    let poller = Arc::new(FakePoller::default());
    let pp = io_plant(poller.clone());
    let ctx = pp.scope("io-unbind");

    let handle = ctx.on_io(9, IoSet::WRITE).then(move |_: IoEvent| {}).unwrap();
    handle.unbind();

    assert!(poller.unbound.lock().contains(&handle.id()));
}

#[test]
fn io_bind_without_backend_fails() {
    let pp = plant(1);
    let ctx = pp.scope("no-backend");

    let err = ctx.on_io(3, IoSet::READ).then(move |_: IoEvent| {}).unwrap_err();
    assert_eq!(err, BindError::NoIoBackend);
    assert_eq!(pp.reaction_count(), 0);
}

#[test]
fn io_ready_word_is_absent_outside_io_dispatch() {
    let pp = plant(1);
    let ctx = pp.scope("no-transient");

    let hits = Arc::new(AtomicU32::new(0));
    {
        let hits = hits.clone();
        // Bound through the bus, not on_io: the transient slot is
        // never installed, so every dispatch must skip.
        ctx.on::<(IoReady,)>()
            .then(move |_: IoEvent| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let runner = run(&pp);
    wait_until_running(&pp);

    pp.emit(IoEvent {
        fd: 1,
        ready: IoSet::READ,
    });
    pp.drain();
    pp.shutdown();
    runner.join().unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(pp.diagnostics().skipped_joins >= 1);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Telemetry {
    sequence: u32,
    voltage: f64,
}

#[derive(Default)]
struct CapturingTransport {
    frames: Arc<Mutex<Vec<NetworkFrame>>>,
}

impl NetworkTransport for CapturingTransport {
    fn send(&self, frame: NetworkFrame) -> Result<(), NetError> {
        self.frames.lock().push(frame);
        Ok(())
    }
}

#[test]
fn emit_net_hands_frames_to_the_transport() {
    common::init_tracing();
    let frames: Arc<Mutex<Vec<NetworkFrame>>> = Arc::default();
    let pp = PowerPlant::builder()
        .config(PlantConfig {
            threads: 1,
            ..PlantConfig::default()
        })
        .network(CapturingTransport {
            frames: frames.clone(),
        })
        .build()
        .unwrap();

    let value = Telemetry {
        sequence: 3,
        voltage: 11.7,
    };
    pp.emit_net(&value).unwrap();

    let frames = frames.lock();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].plant, pp.plant_id());
    assert_eq!(frames[0].decode::<Telemetry>().unwrap(), value);
}

#[test]
fn emit_net_without_transport_reports_no_transport() {
    let pp = plant(1);
    let err = pp
        .emit_net(&Telemetry {
            sequence: 0,
            voltage: 0.0,
        })
        .unwrap_err();
    assert_eq!(err.code(), "NET_NO_TRANSPORT");
}
