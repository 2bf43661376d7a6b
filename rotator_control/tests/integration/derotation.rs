//! Integration test: field de-rotation from a simulated mount.

use std::sync::Arc;
use std::time::Duration;

use rotator_common::axis::AxisMotion;
use rotator_common::pointing::{MountGeometry, PointingSource};
use rotator_common::rotator::config::RotatorConfig;
use rotator_common::rotator::state::ParkState;
use rotator_control::derotation::parallactic_rate;
use rotator_hal::SimulatedMount;

use super::{Bench, blank_store};

const LATITUDE: f64 = 40.0;

fn derotating_config() -> RotatorConfig {
    let mut config = RotatorConfig::default();
    config.rotator.derotate = true;
    config
}

fn bench_with_mount(config: &RotatorConfig, mount: &Arc<SimulatedMount>) -> Bench {
    let pointing: Arc<dyn PointingSource> = Arc::clone(mount) as Arc<dyn PointingSource>;
    let mut bench = Bench::with_pointing(config, blank_store(), pointing);
    assert!(bench.start().is_empty());
    bench
}

fn base_rate(bench: &Bench) -> f64 {
    bench.axis.lock().frequency_base()
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn alt_azimuth_mount_drives_base_rate() {
    let mount = Arc::new(SimulatedMount::with_hour_angle(
        MountGeometry::AltAzimuth,
        LATITUDE,
        0.0,
        10.0,
    ));
    let mut bench = bench_with_mount(&derotating_config(), &mount);
    bench.tick();

    let rate = base_rate(&bench);
    assert!((rate - 0.006_384).abs() < 1e-5, "rate {rate}");
    assert_eq!(rate, parallactic_rate(&mount.position(), mount.latitude()));
    assert!(bench.axis.synchronized());

    // Idle axis drifts at the base rate.
    bench.axis.update(Duration::from_secs(10));
    assert!((bench.coordinate() - rate * 10.0).abs() < 1e-9);
}

#[test]
fn rate_follows_tracking() {
    let mount = Arc::new(SimulatedMount::with_hour_angle(
        MountGeometry::AltAzimuth,
        LATITUDE,
        -30.0,
        10.0,
    ));
    let mut bench = bench_with_mount(&derotating_config(), &mount);
    bench.tick();
    let east = base_rate(&bench);

    mount.advance(Duration::from_secs(4 * 3600));
    bench.tick();
    let west = base_rate(&bench);

    assert!(east > 0.0 && west > 0.0);
    assert!((east - west).abs() / east < 0.05, "east {east} west {west}");
    let meridian = 0.006_384;
    assert!(east < meridian && west < meridian);
}

#[test]
fn reverse_flips_sign() {
    let mount = Arc::new(SimulatedMount::with_hour_angle(
        MountGeometry::AltAzimuth,
        LATITUDE,
        15.0,
        30.0,
    ));
    let mut config = derotating_config();
    config.rotator.derotate_reverse = true;
    let mut bench = bench_with_mount(&config, &mount);
    bench.tick();
    let reversed = base_rate(&bench);

    bench.service.set_derotator_reverse(false);
    bench.tick();
    assert_eq!(base_rate(&bench), -reversed);
    assert!(reversed != 0.0);
}

#[test]
fn equatorial_mount_never_derotates() {
    let mount = Arc::new(SimulatedMount::with_hour_angle(
        MountGeometry::Equatorial,
        LATITUDE,
        0.0,
        10.0,
    ));
    let mut bench = bench_with_mount(&derotating_config(), &mount);
    for _ in 0..3 {
        bench.tick();
    }
    assert_eq!(base_rate(&bench), 0.0);
}

#[test]
fn disabled_by_default() {
    let mount = Arc::new(SimulatedMount::with_hour_angle(
        MountGeometry::AltAzimuth,
        LATITUDE,
        0.0,
        10.0,
    ));
    let mut bench = bench_with_mount(&RotatorConfig::default(), &mount);
    bench.tick();
    assert_eq!(base_rate(&bench), 0.0);

    bench.service.set_derotator_enabled(true);
    bench.tick();
    assert!(base_rate(&bench) > 0.0);

    bench.service.set_derotator_enabled(false);
    assert_eq!(base_rate(&bench), 0.0);
}

#[test]
fn goto_and_park_stop_derotation() {
    let mount = Arc::new(SimulatedMount::with_hour_angle(
        MountGeometry::AltAzimuth,
        LATITUDE,
        0.0,
        10.0,
    ));
    let mut bench = bench_with_mount(&derotating_config(), &mount);
    bench.tick();
    assert!(base_rate(&bench) > 0.0);

    bench.service.goto_target(5.0).unwrap();
    assert_eq!(base_rate(&bench), 0.0);
    bench.settle();
    assert!(base_rate(&bench) > 0.0);

    bench.service.park().unwrap();
    assert_eq!(base_rate(&bench), 0.0);
    assert!(!bench.service.status().derotator_enabled);

    bench.settle();
    assert_eq!(bench.service.park_state(), ParkState::Parked);
    bench.tick();
    assert_eq!(base_rate(&bench), 0.0);
}
