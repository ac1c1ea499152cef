//! Scenario tests for the dispatch engine: once, single-flight, sync
//! groups, priorities, and the argument-join rules.

mod common;

use common::{plant, run, wait_for, wait_until_running};
use fission_runtime::dsl::{Last, Optional, Raw, Trigger, With};
use fission_runtime::{Priority, SyncKey};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

struct Step(u32);
struct Left(u8);
struct Right(u8);
struct Block;
struct LowWork;
struct HighWork;
struct Sample(u8);
struct Payload(String);

#[test]
fn once_reaction_fires_exactly_once() {
    let pp = plant(4);
    let ctx = pp.scope("once-test");

    let once_hits = Arc::new(AtomicU32::new(0));
    let every_hits = Arc::new(AtomicU32::new(0));

    {
        let once_hits = once_hits.clone();
        ctx.on::<(Trigger<Step>,)>()
            .label("counts-once")
            .once()
            .then(move |_: Arc<Step>| {
                once_hits.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    {
        let every_hits = every_hits.clone();
        let emitter = ctx.emitter();
        ctx.on::<(Trigger<Step>,)>()
            .label("counts-all")
            .then(move |step: Arc<Step>| {
                let total = every_hits.fetch_add(1, Ordering::SeqCst) + 1;
                if total == 5 {
                    emitter.shutdown();
                } else {
                    emitter.emit(Step(step.0 + 1));
                }
            })
            .unwrap();
    }

    pp.emit(Step(0));
    run(&pp).join().unwrap();

    assert_eq!(once_hits.load(Ordering::SeqCst), 1);
    assert_eq!(every_hits.load(Ordering::SeqCst), 5);
}

#[test]
fn once_is_not_consumed_by_a_join_skip() {
    let pp = plant(2);
    let ctx = pp.scope("once-skip");

    let hits = Arc::new(AtomicU32::new(0));
    {
        let hits = hits.clone();
        ctx.on::<(Trigger<Left>, With<Right>)>()
            .label("needs-both")
            .once()
            .then(move |_: Arc<Left>, _: Arc<Right>| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let runner = run(&pp);
    wait_until_running(&pp);

    // Right absent: the dispatch skips silently and the reaction must
    // stay bound with its single execution still available.
    pp.emit(Left(1));
    pp.drain();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(pp.diagnostics().skipped_joins >= 1);
    assert_eq!(pp.reaction_count(), 1, "skip must not unbind a once reaction");

    // With the join satisfied it fires exactly once, then unbinds.
    pp.emit(Right(2));
    pp.emit(Left(3));
    wait_for(|| hits.load(Ordering::SeqCst) == 1);
    pp.drain();

    pp.emit(Left(4));
    pp.drain();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(pp.reaction_count(), 0, "spent once reaction is reclaimed");

    pp.shutdown();
    runner.join().unwrap();
}

#[test]
fn single_flight_drops_excess_emits() {
    let pp = plant(4);
    let ctx = pp.scope("single-test");

    let executions = Arc::new(AtomicU32::new(0));
    {
        let executions = executions.clone();
        ctx.on::<(Trigger<Step>,)>()
            .label("slow")
            .single()
            .then(move |_: Arc<Step>| {
                executions.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));
            })
            .unwrap();
    }

    let runner = run(&pp);
    for i in 0..5 {
        pp.emit(Step(i));
    }

    std::thread::sleep(Duration::from_millis(150));
    pp.shutdown();
    runner.join().unwrap();

    assert_eq!(executions.load(Ordering::SeqCst), 1);
    assert_eq!(pp.diagnostics().dropped_single, 4);
}

#[test]
fn sync_group_serializes_reactions() {
    let pp = plant(4);
    let ctx = pp.scope("sync-test");

    let current = Arc::new(AtomicI64::new(0));
    let max_seen = Arc::new(AtomicI64::new(0));
    let done = Arc::new(AtomicU32::new(0));

    let body = |current: Arc<AtomicI64>, max_seen: Arc<AtomicI64>, done: Arc<AtomicU32>| {
        move || {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            current.fetch_sub(1, Ordering::SeqCst);
            done.fetch_add(1, Ordering::SeqCst);
        }
    };

    {
        let inner = body(current.clone(), max_seen.clone(), done.clone());
        ctx.on::<(Trigger<Left>,)>()
            .sync(SyncKey::new("gearbox"))
            .then(move |_: Arc<Left>| inner())
            .unwrap();
    }
    {
        let inner = body(current.clone(), max_seen.clone(), done.clone());
        ctx.on::<(Trigger<Right>,)>()
            .sync(SyncKey::new("gearbox"))
            .then(move |_: Arc<Right>| inner())
            .unwrap();
    }

    let runner = run(&pp);
    pp.emit(Left(0));
    pp.emit(Right(0));

    wait_for(|| done.load(Ordering::SeqCst) == 2);
    pp.shutdown();
    runner.join().unwrap();

    assert_eq!(max_seen.load(Ordering::SeqCst), 1, "group must serialize");
}

#[test]
fn high_priority_dispatches_before_low() {
    let pp = plant(1);
    let ctx = pp.scope("priority-test");

    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let (release, gate) = mpsc::channel::<()>();
    let gate = Arc::new(Mutex::new(gate));

    {
        let gate = gate.clone();
        ctx.on::<(Trigger<Block>,)>()
            .label("hold-the-worker")
            .then(move |_: Arc<Block>| {
                let _ = gate.lock().recv();
            })
            .unwrap();
    }
    {
        let order = order.clone();
        ctx.on::<(Trigger<LowWork>,)>()
            .priority(Priority::Low)
            .then(move |_: Arc<LowWork>| order.lock().push("low"))
            .unwrap();
    }
    {
        let order = order.clone();
        ctx.on::<(Trigger<HighWork>,)>()
            .priority(Priority::High)
            .then(move |_: Arc<HighWork>| order.lock().push("high"))
            .unwrap();
    }

    let runner = run(&pp);
    pp.emit(Block);
    // Give the lone worker time to pick up the blocker.
    std::thread::sleep(Duration::from_millis(50));

    pp.emit(LowWork);
    pp.emit(HighWork);
    release.send(()).unwrap();

    wait_for(|| order.lock().len() == 2);
    pp.shutdown();
    runner.join().unwrap();

    assert_eq!(*order.lock(), vec!["high", "low"]);
}

#[test]
fn subscribers_run_in_bind_order() {
    let pp = plant(1);
    let ctx = pp.scope("bind-order");

    let order: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    for tag in [1u8, 2, 3] {
        let order = order.clone();
        ctx.on::<(Trigger<Step>,)>()
            .then(move |_: Arc<Step>| order.lock().push(tag))
            .unwrap();
    }

    let runner = run(&pp);
    pp.emit(Step(0));

    wait_for(|| order.lock().len() == 3);
    pp.shutdown();
    runner.join().unwrap();

    assert_eq!(*order.lock(), vec![1, 2, 3]);
}

#[test]
fn same_priority_is_fifo_per_subscriber() {
    let pp = plant(1);
    let ctx = pp.scope("fifo");

    let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        ctx.on::<(Trigger<Step>,)>()
            .then(move |s: Arc<Step>| seen.lock().push(s.0))
            .unwrap();
    }

    let runner = run(&pp);
    wait_until_running(&pp);
    for i in 0..4 {
        pp.emit(Step(i));
    }

    wait_for(|| seen.lock().len() == 4);
    pp.shutdown();
    runner.join().unwrap();

    assert_eq!(*seen.lock(), vec![0, 1, 2, 3]);
}

#[test]
fn missing_with_skips_dispatch_silently() {
    let pp = plant(2);
    let ctx = pp.scope("join");

    let hits = Arc::new(AtomicU32::new(0));
    let last_right = Arc::new(AtomicU32::new(0));
    {
        let hits = hits.clone();
        let last_right = last_right.clone();
        ctx.on::<(Trigger<Left>, With<Right>)>()
            .then(move |_: Arc<Left>, r: Arc<Right>| {
                hits.fetch_add(1, Ordering::SeqCst);
                last_right.store(u32::from(r.0), Ordering::SeqCst);
            })
            .unwrap();
    }

    let runner = run(&pp);
    wait_until_running(&pp);

    // No Right stored yet: the dispatch must skip, not error.
    pp.emit(Left(1));
    pp.drain();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(pp.diagnostics().skipped_joins >= 1);

    pp.emit(Right(9));
    pp.emit(Left(2));
    wait_for(|| hits.load(Ordering::SeqCst) == 1);
    assert_eq!(last_right.load(Ordering::SeqCst), 9);

    pp.shutdown();
    runner.join().unwrap();
}

#[test]
fn optional_with_turns_absence_into_none() {
    let pp = plant(2);
    let ctx = pp.scope("optional");

    let outcomes: Arc<Mutex<Vec<Option<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let outcomes = outcomes.clone();
        ctx.on::<(Trigger<Left>, Optional<With<Right>>)>()
            .then(move |_: Arc<Left>, right: Option<Arc<Right>>| {
                outcomes.lock().push(right.map(|r| r.0));
            })
            .unwrap();
    }

    let runner = run(&pp);
    pp.emit(Left(0));
    wait_for(|| outcomes.lock().len() == 1);

    pp.emit(Right(4));
    pp.emit(Left(1));
    wait_for(|| outcomes.lock().len() == 2);

    pp.shutdown();
    runner.join().unwrap();

    assert_eq!(*outcomes.lock(), vec![None, Some(4)]);
}

#[test]
fn last_n_snapshot_is_oldest_first() {
    let pp = plant(1);
    let ctx = pp.scope("history");

    let snapshots: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let snapshots = snapshots.clone();
        ctx.on::<(Last<Sample, 3>,)>()
            .then(move |window: Vec<Arc<Sample>>| {
                snapshots.lock().push(window.iter().map(|s| s.0).collect());
            })
            .unwrap();
    }

    let runner = run(&pp);
    wait_until_running(&pp);
    // Drain between emits: the window is read at dispatch time.
    for i in 1..=4 {
        pp.emit(Sample(i));
        pp.drain();
    }

    wait_for(|| snapshots.lock().len() == 4);
    pp.shutdown();
    runner.join().unwrap();

    let snaps = snapshots.lock();
    assert_eq!(snaps[0], vec![1]);
    assert_eq!(snaps[1], vec![1, 2]);
    assert_eq!(snaps[3], vec![2, 3, 4], "window is bounded, oldest first");
}

#[test]
fn raw_claim_goes_to_first_bound_subscriber() {
    let pp = plant(1);
    let ctx = pp.scope("raw");

    let winner = Arc::new(AtomicU32::new(0));
    let loser = Arc::new(AtomicU32::new(0));
    let shared_view = Arc::new(AtomicU32::new(0));

    {
        let winner = winner.clone();
        ctx.on::<(Raw<Payload>,)>()
            .label("first-bound")
            .then(move |_: Arc<Payload>| {
                winner.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    {
        let loser = loser.clone();
        ctx.on::<(Raw<Payload>,)>()
            .label("second-bound")
            .then(move |_: Arc<Payload>| {
                loser.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    {
        let shared_view = shared_view.clone();
        ctx.on::<(Trigger<Payload>,)>()
            .then(move |_: Arc<Payload>| {
                shared_view.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let runner = run(&pp);
    wait_until_running(&pp);
    pp.emit(Payload("exclusive".into()));
    pp.drain();
    pp.shutdown();
    runner.join().unwrap();

    assert_eq!(winner.load(Ordering::SeqCst), 1);
    assert_eq!(loser.load(Ordering::SeqCst), 0, "later raw binds observe absence");
    assert_eq!(shared_view.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_callback_is_isolated_and_journaled() {
    let pp = plant(2);
    let ctx = pp.scope("panics");

    let after = Arc::new(AtomicU32::new(0));
    ctx.on::<(Trigger<Step>,)>()
        .label("explodes")
        .then(move |_: Arc<Step>| panic!("deliberate test panic"))
        .unwrap();
    {
        let after = after.clone();
        ctx.on::<(Trigger<Step>,)>()
            .then(move |_: Arc<Step>| {
                after.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let runner = run(&pp);
    pp.emit(Step(0));
    wait_for(|| after.load(Ordering::SeqCst) == 1);

    // The worker survived; the plant still dispatches.
    pp.emit(Step(1));
    wait_for(|| after.load(Ordering::SeqCst) == 2);

    pp.shutdown();
    runner.join().unwrap();

    assert_eq!(pp.diagnostics().panics, 2);
    let journal = pp.journal(10);
    assert!(journal
        .iter()
        .any(|e| e.detail.contains("deliberate test panic")));
    assert!(journal.iter().any(|e| e
        .label
        .as_deref()
        .is_some_and(|l| l.contains("explodes"))));
}
