/*
 *  display/mode_controller.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display mode scheduler - one panel, one active mode, one render per tick
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

use std::net::IpAddr;
use std::sync::PoisonError;

use chrono::NaiveTime;
use log::{debug, error, info, warn};

use super::DisplayMode;
use crate::daynight::LightingControl;
use crate::display::components::{ClockMode, CountdownMode, HourFormat, IdentityMode, OccupancyRenderer};
use crate::display::error::DisplayError;
use crate::display::factory::BoxedDriver;
use crate::display::traits::{BlinkRate, DisplayDriver, MAX_BRIGHTNESS};
use crate::zones::SharedZones;

/// Configuration for the mode scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub initial_mode: DisplayMode,

    /// Brightness applied at construction
    pub brightness: u8,

    pub hour_format: HourFormat,

    /// Alarm indicator on the clock
    pub alarm: bool,

    pub countdown_max: u32,

    /// Address shown by the identity mode
    pub identity: IpAddr,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_mode: DisplayMode::Clock,
            brightness: 12,
            hour_format: HourFormat::Twelve,
            alarm: false,
            countdown_max: crate::display::components::MAXIMUM_COUNT,
            identity: IpAddr::from([127, 0, 0, 1]),
        }
    }
}

/// Single owner of the display
///
/// Holds every mode's private state but renders only the active one. All
/// access goes through `&mut self`, so a mode switch can never land in the
/// middle of a tick once the scheduler sits behind a lock.
pub struct ModeScheduler {
    display: BoxedDriver,
    zones: SharedZones,
    current_mode: DisplayMode,
    brightness: u8,
    clock: ClockMode,
    identity: IdentityMode,
    countdown: CountdownMode,
    occupancy: OccupancyRenderer,
}

fn clamp_brightness(level: u8) -> u8 {
    if level > MAX_BRIGHTNESS {
        warn!("Brightness {} above {}, clamped", level, MAX_BRIGHTNESS);
        MAX_BRIGHTNESS
    } else {
        level
    }
}

impl ModeScheduler {
    /// Takes ownership of an initialized display
    pub fn new(mut display: BoxedDriver, zones: SharedZones, config: SchedulerConfig) -> Result<Self, DisplayError> {
        let brightness = clamp_brightness(config.brightness);
        display.set_brightness(brightness)?;
        let occupancy = OccupancyRenderer::new(display.capabilities());
        let kind = display.capabilities().kind;
        let current_mode = config.initial_mode.fit_to(kind);
        if current_mode != config.initial_mode {
            warn!("{:?} cannot be drawn on a {:?} panel, starting in {:?}", config.initial_mode, kind, current_mode);
        }
        Ok(Self {
            display,
            zones,
            current_mode,
            brightness,
            clock: ClockMode::new(config.hour_format, config.alarm),
            identity: IdentityMode::from_ip(config.identity),
            countdown: CountdownMode::new(config.countdown_max),
            occupancy,
        })
    }

    pub fn current_mode(&self) -> DisplayMode {
        self.current_mode
    }

    /// Returns true if the mode changed
    ///
    /// A mode the panel has no surface for is refused.
    pub fn set_mode(&mut self, mode: DisplayMode) -> bool {
        if mode == self.current_mode {
            return false;
        }
        let kind = self.display.capabilities().kind;
        if !mode.renders_on(kind) {
            warn!("{:?} cannot be drawn on a {:?} panel, staying in {:?}", mode, kind, self.current_mode);
            return false;
        }
        info!("Display mode changed: {:?} -> {:?}", self.current_mode, mode);
        self.current_mode = mode;
        true
    }

    /// Render the active mode once
    ///
    /// A failed render is logged and skipped; returns false in that case.
    pub fn tick(&mut self, now: NaiveTime) -> bool {
        match self.dispatch(now) {
            Ok(()) => true,
            Err(e) => {
                error!("{:?} render failed: {}", self.current_mode, e);
                false
            }
        }
    }

    fn dispatch(&mut self, now: NaiveTime) -> Result<(), DisplayError> {
        let display = self.display.as_mut();
        match self.current_mode {
            DisplayMode::Clock => self.clock.render(now, display),
            DisplayMode::Identity => self.identity.render(display),
            DisplayMode::Countdown => self.countdown.render(display),
            DisplayMode::Occupancy => {
                let table = self.zones.lock().unwrap_or_else(PoisonError::into_inner);
                self.occupancy.render(&table, display)
            }
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Out-of-range levels are clamped to MAX_BRIGHTNESS
    pub fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        let level = clamp_brightness(level);
        self.display.set_brightness(level)?;
        self.brightness = level;
        debug!("Brightness {}", level);
        Ok(())
    }

    pub fn increase_brightness(&mut self) -> Result<(), DisplayError> {
        self.set_brightness(self.brightness.saturating_add(1).min(MAX_BRIGHTNESS))
    }

    pub fn decrease_brightness(&mut self) -> Result<(), DisplayError> {
        self.set_brightness(self.brightness.saturating_sub(1))
    }

    pub fn set_blink_rate(&mut self, rate: BlinkRate) -> Result<(), DisplayError> {
        self.display.set_blink_rate(rate)
    }

    pub fn set_hour_format(&mut self, format: HourFormat) {
        self.clock.set_hour_format(format);
    }

    pub fn set_alarm(&mut self, alarm: bool) {
        self.clock.set_alarm(alarm);
    }

    /// Rejected (returns false) above the countdown ceiling
    pub fn set_countdown_maximum(&mut self, n: u32) -> bool {
        self.countdown.set_maximum(n)
    }

    pub fn set_identity(&mut self, addr: IpAddr) {
        self.identity = IdentityMode::from_ip(addr);
    }

    /// Blank the panel immediately
    pub fn clear_display(&mut self) -> Result<(), DisplayError> {
        self.display.clear()?;
        self.display.write_display()
    }

    pub fn display(&self) -> &dyn DisplayDriver {
        self.display.as_ref()
    }
}

impl LightingControl for ModeScheduler {
    fn apply_brightness(&mut self, level: u8) {
        if let Err(e) = self.set_brightness(level) {
            error!("Brightness {} not applied: {}", level, e);
        }
    }

    fn apply_mode(&mut self, mode: DisplayMode) {
        self.set_mode(mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::color::LedColor;
    use crate::display::drivers::mock::{MockDriver, MockDriverState};
    use crate::display::traits::DisplayKind;
    use crate::zones::{Footprint, ZoneDecayTable, ZoneSpec};
    use std::sync::{Arc, Mutex};

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 30, 0).unwrap()
    }

    fn scheduler() -> (ModeScheduler, Arc<Mutex<MockDriverState>>, SharedZones) {
        let mock = MockDriver::new_with_size(8, 8);
        let state = mock.state();
        let zones = ZoneDecayTable::new([ZoneSpec::new("front", Footprint::new(0, 3, 1, 2), 60)]).shared();
        let sched = ModeScheduler::new(Box::new(mock), Arc::clone(&zones), SchedulerConfig::default()).unwrap();
        (sched, state, zones)
    }

    #[test]
    fn test_initial_mode_is_clock() {
        let (sched, state, _) = scheduler();
        assert_eq!(sched.current_mode(), DisplayMode::Clock);
        assert_eq!(state.lock().unwrap().last_brightness(), Some(12));
    }

    #[test]
    fn test_tick_dispatches_to_active_mode_only() {
        let (mut sched, state, zones) = scheduler();
        zones.lock().unwrap().refresh("front");

        assert!(sched.tick(noon()));
        {
            let s = state.lock().unwrap();
            assert_eq!(s.shown_numerals, "1230");
            assert_eq!(s.image_count, 0);
        }

        assert!(sched.set_mode(DisplayMode::Occupancy));
        assert!(!sched.set_mode(DisplayMode::Occupancy));
        assert!(sched.tick(noon()));
        {
            let s = state.lock().unwrap();
            assert_eq!(s.image_count, 1);
            assert_eq!(s.shown_pixels[3 * 8], LedColor::Red);
            assert_eq!(s.write_count, 2);
        }

        sched.set_mode(DisplayMode::Countdown);
        assert!(sched.tick(noon()));
        assert_eq!(state.lock().unwrap().shown_numerals, "9998");
        assert_eq!(state.lock().unwrap().image_count, 1);
    }

    #[test]
    fn test_identity_cycles() {
        let mock = MockDriver::new_with_size(4, 1);
        let state = mock.state();
        let config = SchedulerConfig {
            initial_mode: DisplayMode::Identity,
            identity: "192.168.0.9".parse().unwrap(),
            ..Default::default()
        };
        let mut sched = ModeScheduler::new(Box::new(mock), ZoneDecayTable::default().shared(), config).unwrap();

        let mut shown = Vec::new();
        for _ in 0..5 {
            sched.tick(noon());
            shown.push(state.lock().unwrap().shown_numerals.clone());
        }
        assert_eq!(shown, vec!["192", "168", "0", "9", "192"]);
    }

    #[test]
    fn test_failed_tick_is_logged_and_next_tick_proceeds() {
        let (mut sched, state, _) = scheduler();
        state.lock().unwrap().simulate_write_failure = true;
        assert!(!sched.tick(noon()));

        state.lock().unwrap().simulate_write_failure = false;
        assert!(sched.tick(noon()));
        assert_eq!(state.lock().unwrap().write_count, 1);
    }

    #[test]
    fn test_brightness_clamped_and_stepped() {
        let (mut sched, state, _) = scheduler();
        sched.set_brightness(200).unwrap();
        assert_eq!(sched.brightness(), MAX_BRIGHTNESS);

        sched.increase_brightness().unwrap();
        assert_eq!(sched.brightness(), MAX_BRIGHTNESS);

        sched.set_brightness(1).unwrap();
        sched.decrease_brightness().unwrap();
        sched.decrease_brightness().unwrap();
        assert_eq!(sched.brightness(), 0);

        let history = state.lock().unwrap().brightness_history.clone();
        assert_eq!(history, vec![12, 15, 15, 1, 0, 0]);
    }

    #[test]
    fn test_clock_options_and_countdown_ceiling() {
        let (mut sched, state, _) = scheduler();
        sched.set_hour_format(HourFormat::TwentyFour);
        sched.set_alarm(true);
        sched.tick(NaiveTime::from_hms_opt(21, 7, 0).unwrap());
        {
            let s = state.lock().unwrap();
            assert_eq!(s.shown_numerals, "2107");
            assert_eq!(s.decimals, [false, true, false, true]);
        }

        assert!(!sched.set_countdown_maximum(10_000));
        assert!(sched.set_countdown_maximum(5));
        sched.set_mode(DisplayMode::Countdown);
        sched.tick(noon());
        assert_eq!(state.lock().unwrap().shown_numerals, "4");
    }

    #[test]
    fn test_blink_and_clear() {
        let (mut sched, state, _) = scheduler();
        sched.set_blink_rate(BlinkRate::HalfHz).unwrap();
        sched.tick(noon());
        sched.clear_display().unwrap();

        let s = state.lock().unwrap();
        assert_eq!(s.last_blink, Some(BlinkRate::HalfHz));
        assert_eq!(s.shown_numerals, "");
        assert_eq!(s.write_count, 2);
    }

    #[test]
    fn test_matrix_panel_refuses_numeral_modes() {
        let mock = MockDriver::new_with_size(8, 8).with_kind(DisplayKind::Matrix);
        let state = mock.state();
        let mut sched = ModeScheduler::new(Box::new(mock), ZoneDecayTable::default().shared(), SchedulerConfig::default()).unwrap();
        assert_eq!(sched.current_mode(), DisplayMode::Occupancy);

        assert!(!sched.set_mode(DisplayMode::Clock));
        assert!(!sched.set_mode(DisplayMode::Countdown));
        assert_eq!(sched.current_mode(), DisplayMode::Occupancy);

        assert!(sched.tick(noon()));
        assert_eq!(state.lock().unwrap().image_count, 1);
    }

    #[test]
    fn test_segment_panel_refuses_occupancy() {
        let mock = MockDriver::new_with_size(4, 1).with_kind(DisplayKind::SevenSegment);
        let mut sched = ModeScheduler::new(Box::new(mock), ZoneDecayTable::default().shared(), SchedulerConfig::default()).unwrap();
        assert!(!sched.set_mode(DisplayMode::Occupancy));
        assert!(sched.set_mode(DisplayMode::Countdown));
        sched.apply_mode(DisplayMode::Occupancy);
        assert_eq!(sched.current_mode(), DisplayMode::Countdown);
    }

    #[test]
    fn test_lighting_control() {
        let (mut sched, state, _) = scheduler();
        sched.apply_brightness(0);
        sched.apply_mode(DisplayMode::Occupancy);
        assert_eq!(sched.current_mode(), DisplayMode::Occupancy);
        assert_eq!(state.lock().unwrap().last_brightness(), Some(0));
    }
}
