//! Integration test: park, power cycle and unpark.
//!
//! Parks at a working angle, restarts the controller on a fresh axis whose
//! step counter is back at zero, and checks the unpark returns the
//! instrument to the same orientation.

use rotator_common::axis::{AxisMotion, Direction};
use rotator_common::rotator::config::RotatorConfig;
use rotator_common::rotator::error::CommandError;
use rotator_common::rotator::settings::RotatorSettings;
use rotator_common::rotator::state::ParkState;
use rotator_control::state::park::TransitionResult;
use rotator_hal::MemoryStore;

use super::{Bench, STORE_CAPACITY, blank_store};

fn started(config: &RotatorConfig) -> Bench {
    let mut bench = Bench::new(config, blank_store());
    assert!(bench.start().is_empty());
    bench
}

fn parked_at(config: &RotatorConfig, angle: f64) -> Bench {
    let mut bench = started(config);
    bench.service.goto_target(angle).unwrap();
    bench.run_axis();
    bench.service.park().unwrap();
    bench.settle();
    assert_eq!(bench.service.park_state(), ParkState::Parked);
    bench
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn park_completes_on_monitor_tick() {
    let mut bench = started(&RotatorConfig::default());
    bench.service.goto_target(30.0).unwrap();
    bench.run_axis();
    assert_eq!(bench.coordinate(), 30.0);

    bench.service.park().unwrap();
    assert_eq!(bench.service.park_state(), ParkState::Parking);
    assert_eq!(bench.stored_settings().park_state, ParkState::Parking);

    bench.settle();
    assert_eq!(bench.service.park_state(), ParkState::Parked);
    assert!(!bench.axis.lock().is_enabled());

    let stored = bench.stored_settings();
    assert_eq!(stored.park_state, ParkState::Parked);
    assert_eq!(stored.position, 30.0);
}

#[test]
fn parked_rotator_rejects_motion() {
    let bench = parked_at(&RotatorConfig::default(), -45.0);
    assert_eq!(bench.service.goto_target(0.0), Err(CommandError::Parked));
    assert_eq!(bench.service.slew(Direction::Forward), Err(CommandError::Parked));
    assert_eq!(bench.service.set_backlash(10), Err(CommandError::Parked));
    assert_eq!(bench.service.park(), Ok(()));
    assert_eq!(bench.service.park_state(), ParkState::Parked);
}

#[test]
fn unpark_after_power_cycle_restores_orientation() {
    let config = RotatorConfig::default();
    let before = parked_at(&config, 72.25);
    let store = before.power_cycle_store();
    drop(before);

    let mut after = Bench::new(&config, store);
    assert!(after.start().is_empty());
    assert_eq!(after.service.park_state(), ParkState::Unparking);
    assert_eq!(after.axis.lock().motor_position_steps(), 0);
    assert_eq!(after.coordinate(), 72.25);

    after.settle();
    assert_eq!(after.service.park_state(), ParkState::Unparked);
    assert_eq!(after.coordinate(), 72.25);
    assert_eq!(after.stored_settings().park_state, ParkState::Unparked);

    after.service.goto_target(0.0).unwrap();
    after.run_axis();
    assert_eq!(after.coordinate(), 0.0);
}

#[test]
fn park_snaps_to_whole_steps() {
    let config = RotatorConfig::default();
    let mut bench = started(&config);
    bench.service.goto_target(10.004).unwrap();
    bench.run_axis();

    bench.service.park().unwrap();
    bench.settle();
    assert_eq!(bench.service.park_state(), ParkState::Parked);

    let steps = config.axis.steps_per_degree;
    let coordinate = bench.coordinate();
    assert_eq!((coordinate * steps).fract(), 0.0, "{coordinate}");
    assert!((coordinate - 10.004).abs() <= 0.5 / steps);
}

#[test]
fn park_during_transition_is_rejected() {
    let mut bench = started(&RotatorConfig::default());
    bench.service.park().unwrap();
    assert_eq!(bench.service.park_state(), ParkState::Parking);
    assert_eq!(bench.service.park(), Err(CommandError::ParkFailed));
    assert_eq!(bench.service.unpark(), Err(CommandError::ParkFailed));
    bench.settle();
    assert_eq!(bench.service.park_state(), ParkState::Parked);
}

#[test]
fn park_fault_is_terminal_across_restart() {
    let config = RotatorConfig::default();
    let bench = started(&config);
    bench.service.goto_target(90.0).unwrap();
    bench.run_axis();
    bench.service.goto_target(0.0).unwrap();
    bench.axis.update(std::time::Duration::from_millis(500));

    // Park while still moving: the axis refuses a second goto.
    assert!(matches!(bench.service.park(), Err(CommandError::Axis(_))));
    assert_eq!(bench.service.park_state(), ParkState::Unparked);
    bench.run_axis();

    bench.service.park().unwrap();
    assert!(matches!(
        bench.service.report_park_fault(),
        TransitionResult::Ok(ParkState::ParkFailed)
    ));
    assert!(matches!(
        bench.service.report_park_fault(),
        TransitionResult::Rejected(_)
    ));

    let mut after = Bench::new(&config, bench.power_cycle_store());
    let errors = after.start();
    assert!(!errors.is_fatal());
    assert_eq!(after.service.park_state(), ParkState::ParkFailed);
    assert!(!after.axis.lock().is_enabled());
    assert_eq!(after.service.goto_target(0.0), Err(CommandError::Parked));
    assert_eq!(after.service.park(), Err(CommandError::ParkFailed));
}

#[test]
fn strict_parking_requires_parked_state() {
    let mut config = RotatorConfig::default();
    config.rotator.write_delay = 0;

    // Unparked record: position is not trustworthy, unpark refused.
    let mut bench = Bench::new(&config, blank_store());
    assert!(bench.start().is_empty());
    assert_eq!(bench.service.unpark(), Err(CommandError::NotParked));
    assert!(!bench.axis.lock().is_enabled());

    let parked = RotatorSettings {
        position: 15.0,
        park_state: ParkState::Parked,
        ..Default::default()
    };
    let store = MemoryStore::with_record(STORE_CAPACITY, 0, &parked.encode().unwrap()).unwrap();
    let mut bench = Bench::new(&config, store);
    assert!(bench.start().is_empty());
    bench.settle();
    assert_eq!(bench.service.park_state(), ParkState::Unparked);
    assert_eq!(bench.coordinate(), 15.0);

    bench.service.goto_target(20.0).unwrap();
    bench.run_axis();
    for _ in 0..20 {
        bench.tick();
    }
    assert_eq!(bench.stored_settings().position, 15.0);

    bench.service.park().unwrap();
    bench.settle();
    let stored = bench.stored_settings();
    assert_eq!(stored.park_state, ParkState::Parked);
    assert_eq!(stored.position, 20.0);
}
