/*
 *  engine.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Engine - wires the decay table, scheduler and day/night controller to
 *  their periodic loops
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::future::Future;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Timelike};
use log::{debug, error, info};
use tokio::sync::{watch, Mutex as TokMutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Config;
use crate::daynight::DayNightController;
use crate::display::factory::BoxedDriver;
use crate::display::{DisplayMode, ModeScheduler, SchedulerConfig};
use crate::edge_queue::EdgeQueue;
use crate::error::SetupError;
use crate::zones::{SharedZones, ZoneDecayTable, ZoneSpec};

/// Local wall clock, replaceable in tests
pub type WallClock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub fn local_clock() -> WallClock {
    Arc::new(|| Local::now().naive_local())
}

/// Everything the engine needs, resolved from [`Config`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub tick_period: Duration,
    pub decay_period: Duration,
    pub daynight_period: Duration,
    pub day_hour: u8,
    pub night_hour: u8,
    pub bright_level: u8,
    pub dim_level: u8,
    pub day_mode: DisplayMode,
    pub night_mode: DisplayMode,
    pub zones: Vec<ZoneSpec>,
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    pub fn from_config(cfg: &Config, identity: IpAddr) -> Self {
        Self {
            tick_period: cfg.tick_period(),
            decay_period: cfg.decay_period(),
            daynight_period: cfg.daynight_period(),
            day_hour: cfg.day_hour(),
            night_hour: cfg.night_hour(),
            bright_level: cfg.bright_level(),
            dim_level: cfg.dim_level(),
            day_mode: cfg.day_mode(),
            night_mode: cfg.night_mode(),
            zones: cfg.zones(),
            scheduler: SchedulerConfig {
                initial_mode: cfg.initial_mode(),
                brightness: cfg.display_brightness(),
                hour_format: cfg.hour_format(),
                alarm: cfg.alarm(),
                countdown_max: cfg.countdown_max(),
                identity,
            },
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default(), IpAddr::from([127, 0, 0, 1]))
    }
}

/// Running engine
///
/// Dropping it drops the stop sender, so every loop ends at its next poll
/// without waiting on the tasks or blanking the panel. Use `shutdown` for
/// an orderly stop.
pub struct Engine {
    scheduler: Arc<TokMutex<ModeScheduler>>,
    zones: SharedZones,
    daynight: Arc<Mutex<DayNightController>>,
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

/// Runs `body` every `period` until the stop signal flips
///
/// A body that has started always runs to completion before the stop is seen.
fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut stop: watch::Receiver<bool>, mut body: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => body().await,
                _ = stop.changed() => {
                    info!("{} loop received stop signal. Exiting.", name);
                    break;
                }
            }
        }
    })
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Engine {
    /// Start the scheduler, decay and day/night loops on the current runtime
    pub fn start(display: BoxedDriver, config: EngineConfig) -> Result<Self, SetupError> {
        Self::start_with_clock(display, config, local_clock())
    }

    pub fn start_with_clock(display: BoxedDriver, config: EngineConfig, clock: WallClock) -> Result<Self, SetupError> {
        let zones = ZoneDecayTable::new(config.zones).shared();
        let scheduler = Arc::new(TokMutex::new(ModeScheduler::new(
            display,
            Arc::clone(&zones),
            config.scheduler,
        )?));
        let daynight = Arc::new(Mutex::new(
            DayNightController::new(config.day_hour, config.night_hour)
                .with_levels(config.bright_level, config.dim_level)
                .with_modes(config.day_mode, config.night_mode),
        ));
        let (stop_tx, stop_rx) = watch::channel(false);

        let mut tasks = Vec::with_capacity(4);

        {
            let scheduler = Arc::clone(&scheduler);
            let clock = Arc::clone(&clock);
            tasks.push(spawn_periodic("Scheduler", config.tick_period, stop_rx.clone(), move || {
                let scheduler = Arc::clone(&scheduler);
                let now = clock().time();
                async move {
                    scheduler.lock().await.tick(now);
                }
            }));
        }

        {
            let zones = Arc::clone(&zones);
            tasks.push(spawn_periodic("Decay", config.decay_period, stop_rx.clone(), move || {
                lock(&zones).tick();
                async {}
            }));
        }

        {
            let scheduler = Arc::clone(&scheduler);
            let daynight = Arc::clone(&daynight);
            tasks.push(spawn_periodic("Day/night", config.daynight_period, stop_rx, move || {
                let scheduler = Arc::clone(&scheduler);
                let daynight = Arc::clone(&daynight);
                let hour = clock().hour() as u8;
                async move {
                    let mut scheduler = scheduler.lock().await;
                    lock(&daynight).evaluate(hour, &mut *scheduler);
                }
            }));
        }

        info!(
            "Engine started: tick {:?}, decay {:?}, day/night {:?}",
            config.tick_period, config.decay_period, config.daynight_period
        );
        Ok(Self { scheduler, zones, daynight, stop_tx, tasks })
    }

    /// Drain `queue` in a task, refreshing `zone` on every rising edge
    pub fn attach_motion(&mut self, queue: Arc<EdgeQueue>, zone: impl Into<String>) {
        let zone = zone.into();
        let zones = Arc::clone(&self.zones);
        let mut stop = self.stop_tx.subscribe();
        info!("Motion events refresh '{}'", zone);
        self.tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = queue.recv() => {
                        debug!("Edge event high={}", event.high);
                        if event.high {
                            lock(&zones).refresh(&zone);
                        }
                    }
                    _ = stop.changed() => {
                        info!("Motion consumer received stop signal. Exiting.");
                        break;
                    }
                }
            }
        }));
    }

    /// Topic-addressed motion; unknown topics are ignored
    pub fn motion_detected(&self, topic: &str) -> bool {
        lock(&self.zones).refresh(topic)
    }

    pub fn zones(&self) -> SharedZones {
        Arc::clone(&self.zones)
    }

    pub fn scheduler(&self) -> Arc<TokMutex<ModeScheduler>> {
        Arc::clone(&self.scheduler)
    }

    pub async fn set_mode(&self, mode: DisplayMode) -> bool {
        self.scheduler.lock().await.set_mode(mode)
    }

    pub fn lights_on(&self) -> bool {
        lock(&self.daynight).lights_on()
    }

    /// Stop every loop, wait for them, then blank the panel
    pub async fn shutdown(self) {
        // receivers may already be gone if a task ended early
        let _ = self.stop_tx.send(true);
        for handle in self.tasks {
            handle.await.unwrap_or_else(|e| error!("Engine task failed to join: {}", e));
        }
        if let Err(e) = self.scheduler.lock().await.clear_display() {
            error!("Display not cleared on shutdown: {}", e);
        }
        info!("Engine stopped.");
    }
}
