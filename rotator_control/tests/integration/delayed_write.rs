//! Integration test: delayed position write and store failures.

use rotator_common::rotator::config::RotatorConfig;
use rotator_common::rotator::state::ParkState;

use super::{Bench, blank_store};

fn started() -> Bench {
    let mut bench = Bench::new(&RotatorConfig::default(), blank_store());
    assert!(bench.start().is_empty());
    bench
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn position_written_after_settling() {
    let mut bench = started();
    bench.service.goto_target(45.0).unwrap();

    // Tick 1 sees the goto in progress and postpones to 1 + 5.
    bench.tick();
    bench.run_axis();
    for _ in 2..=6 {
        bench.tick();
        assert_eq!(bench.stored_settings().position, 0.0);
    }

    bench.tick();
    assert_eq!(bench.stored_settings().position, 45.0);
    assert_eq!(bench.service.status().position, 45.0);

    let written = bench.service.with(|r| r.store().bytes_written());
    for _ in 0..20 {
        bench.tick();
    }
    assert_eq!(bench.service.with(|r| r.store().bytes_written()), written);
}

#[test]
fn motion_keeps_postponing() {
    let mut bench = started();
    bench.service.goto_target(120.0).unwrap();

    // No physics: the goto never finishes, so nothing is written.
    for _ in 0..30 {
        bench.tick();
    }
    assert_eq!(bench.stored_settings().position, 0.0);
    assert!(bench.service.status().slewing);
}

#[test]
fn write_failure_is_counted_not_fatal() {
    let mut bench = started();
    bench.service.goto_target(-20.0).unwrap();
    bench.run_axis();
    bench.service.with(|r| r.store_mut().set_fail_io(true));

    for _ in 0..10 {
        bench.tick();
    }
    let status = bench.service.status();
    assert!(status.persist_failures >= 1);
    assert_eq!(status.park_state, ParkState::Unparked);

    bench.service.with(|r| r.store_mut().set_fail_io(false));
    bench.service.park().unwrap();
    bench.settle();
    assert_eq!(bench.stored_settings().park_state, ParkState::Parked);
    assert_eq!(bench.stored_settings().position, -20.0);
}
