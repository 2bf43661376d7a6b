//! Shared harness for the integration tests.

mod delayed_write;
mod derotation;
mod park_cycle;
mod startup;

use std::sync::Arc;
use std::time::Duration;

use rotator_common::pointing::PointingSource;
use rotator_common::rotator::config::RotatorConfig;
use rotator_common::rotator::error::InitError;
use rotator_common::rotator::settings::{ENCODED_LEN, RotatorSettings};
use rotator_common::scheduler::{PeriodicScheduler, TaskCallback, TaskPriority};
use rotator_control::rotator::Rotator;
use rotator_control::service::RotatorService;
use rotator_hal::{MemoryStore, SimAxisHandle, SimulatedAxis};

pub const STORE_CAPACITY: usize = 64;
const PHYSICS_STEP: Duration = Duration::from_millis(10);
const PHYSICS_LIMIT: Duration = Duration::from_secs(600);

/// Scheduler that only runs tasks when told to.
#[derive(Default)]
pub struct ManualScheduler {
    pub tasks: Vec<(&'static str, TaskCallback)>,
}

impl PeriodicScheduler for ManualScheduler {
    fn add(
        &mut self,
        _period: Duration,
        _offset: Duration,
        _repeat: bool,
        _priority: TaskPriority,
        callback: TaskCallback,
        label: &'static str,
    ) -> bool {
        self.tasks.push((label, callback));
        true
    }
}

impl ManualScheduler {
    /// Run every registered task once.
    pub fn tick(&mut self) {
        for (_, task) in &mut self.tasks {
            task();
        }
    }
}

/// Controller wired to a simulated axis and an in-memory store.
pub struct Bench {
    pub service: RotatorService<SimAxisHandle, MemoryStore>,
    pub axis: SimAxisHandle,
    pub scheduler: ManualScheduler,
}

impl Bench {
    pub fn new(config: &RotatorConfig, store: MemoryStore) -> Self {
        Self::build(config, store, None)
    }

    pub fn with_pointing(
        config: &RotatorConfig,
        store: MemoryStore,
        pointing: Arc<dyn PointingSource>,
    ) -> Self {
        Self::build(config, store, Some(pointing))
    }

    fn build(
        config: &RotatorConfig,
        store: MemoryStore,
        pointing: Option<Arc<dyn PointingSource>>,
    ) -> Self {
        let axis = SimAxisHandle::new(SimulatedAxis::new(&config.axis));
        let mut rotator = Rotator::new(axis.clone(), store, config);
        if let Some(pointing) = pointing {
            rotator = rotator.with_pointing(pointing);
        }
        let period = Duration::from_millis(config.rotator.monitor_period_ms);
        Self {
            service: RotatorService::new(rotator, period),
            axis,
            scheduler: ManualScheduler::default(),
        }
    }

    /// Init the controller and register its monitor.
    pub fn start(&mut self) -> InitError {
        self.service.init(&mut self.scheduler)
    }

    /// One monitor tick.
    pub fn tick(&mut self) {
        self.scheduler.tick();
    }

    /// Step physics until the axis stops.
    pub fn run_axis(&self) -> Duration {
        self.axis.run_until_idle(PHYSICS_STEP, PHYSICS_LIMIT)
    }

    /// Finish any motion, then tick the monitor once.
    pub fn settle(&mut self) {
        self.run_axis();
        self.tick();
    }

    pub fn coordinate(&self) -> f64 {
        self.service.status().coordinate
    }

    /// Copy of the whole store image.
    pub fn store_image(&self) -> Vec<u8> {
        self.service.with(|r| r.store().bytes().to_vec())
    }

    /// Settings record as persisted.
    pub fn stored_settings(&self) -> RotatorSettings {
        let image = self.store_image();
        RotatorSettings::decode(&image[..ENCODED_LEN]).unwrap()
    }

    /// Fresh store holding this bench's image, as after a power cycle.
    pub fn power_cycle_store(&self) -> MemoryStore {
        MemoryStore::with_record(STORE_CAPACITY, 0, &self.store_image()).unwrap()
    }
}

pub fn blank_store() -> MemoryStore {
    MemoryStore::new(STORE_CAPACITY)
}
