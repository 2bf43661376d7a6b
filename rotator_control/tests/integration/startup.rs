//! Integration test: startup against fresh, valid and damaged stores.

use rotator_common::consts::BACKLASH_MAX;
use rotator_common::rotator::config::RotatorConfig;
use rotator_common::rotator::error::InitError;
use rotator_common::rotator::settings::{ENCODED_LEN, RotatorSettings};
use rotator_common::rotator::state::ParkState;
use rotator_control::config::load_config_from_str;
use rotator_hal::MemoryStore;

use super::{Bench, STORE_CAPACITY, blank_store};

const CONFIG_TOML: &str = r#"
[shared]
service_name = "startup-test"

[axis]
limit_min = -170.0
limit_max = 170.0
slew_rate = 4.0
acceleration_time = 1.0

[rotator]
write_delay = 5
"#;

fn record(settings: RotatorSettings) -> MemoryStore {
    let bytes = settings.encode().unwrap();
    MemoryStore::with_record(STORE_CAPACITY, 0, &bytes).unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn fresh_store_gets_defaults_and_unparks() {
    let config = load_config_from_str(CONFIG_TOML).unwrap();
    let mut bench = Bench::new(&config, blank_store());
    let errors = bench.start();
    assert!(errors.is_empty(), "{errors:?}");

    assert_eq!(bench.service.park_state(), ParkState::Unparked);
    assert_eq!(bench.stored_settings(), RotatorSettings::default());
    assert_eq!(bench.scheduler.tasks.len(), 1);
    assert_eq!(bench.scheduler.tasks[0].0, "RotMon");
    assert!(bench.axis.lock().is_enabled());
}

#[test]
fn axis_configured_from_config() {
    let config = load_config_from_str(CONFIG_TOML).unwrap();
    let mut bench = Bench::new(&config, record(RotatorSettings {
        backlash: 120,
        ..Default::default()
    }));
    bench.start();

    assert_eq!(bench.service.backlash(), 120);
    assert_eq!(bench.axis.lock().backlash_steps(), 120);
}

#[test]
fn unparked_record_resyncs_coordinate() {
    let config = RotatorConfig::default();
    let mut bench = Bench::new(&config, record(RotatorSettings {
        position: 42.5,
        ..Default::default()
    }));
    assert!(bench.start().is_empty());

    assert_eq!(bench.service.park_state(), ParkState::Unparked);
    assert_eq!(bench.coordinate(), 42.5);
    assert!(!bench.service.status().slewing);
}

#[test]
fn out_of_range_record_is_repaired() {
    let config = load_config_from_str(CONFIG_TOML).unwrap();
    let mut bench = Bench::new(&config, record(RotatorSettings {
        backlash: BACKLASH_MAX + 1,
        position: 200.0,
        park_state: ParkState::Unparked,
    }));
    let errors = bench.start();
    assert_eq!(errors, InitError::VALUE);

    let status = bench.service.status();
    assert_eq!(status.backlash, 0);
    assert_eq!(status.position, 0.0);
}

#[test]
fn undecodable_record_flags_nv() {
    let mut bytes = RotatorSettings::default().encode().unwrap();
    bytes[ENCODED_LEN - 4] = 0xEE;
    let store = MemoryStore::with_record(STORE_CAPACITY, 0, &bytes).unwrap();

    let mut bench = Bench::new(&RotatorConfig::default(), store);
    let errors = bench.start();
    assert!(errors.contains(InitError::NV));
    assert!(!errors.is_fatal());
    assert_eq!(bench.service.park_state(), ParkState::Unparked);
}

#[test]
fn small_record_runs_without_persistence() {
    let mut config = RotatorConfig::default();
    config.store.record_size = ENCODED_LEN - 1;
    let mut bench = Bench::new(&config, blank_store());
    let errors = bench.start();
    assert_eq!(errors, InitError::NV);

    bench.service.goto_target(10.0).unwrap();
    bench.settle();
    assert!(bench.store_image().iter().all(|&b| b == 0));
}

#[test]
fn failing_store_flags_store() {
    let mut store = blank_store();
    store.set_fail_io(true);
    let mut bench = Bench::new(&RotatorConfig::default(), store);
    let errors = bench.start();
    assert!(errors.contains(InitError::STORE));
    assert!(!errors.is_fatal());
    assert_eq!(bench.service.park_state(), ParkState::Unparked);
}
