/*
 *  daynight.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Day/night lighting controller
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

use log::info;

use crate::display::DisplayMode;

/// What the controller drives when the lights change
pub trait LightingControl {
    fn apply_brightness(&mut self, level: u8);
    fn apply_mode(&mut self, mode: DisplayMode);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    LightsOn,
    LightsOff,
}

/// Bright/dim gate keyed on the hour of day
///
/// Hours after `day_hour` and before `night_hour` are daytime. The first
/// evaluation always applies its band, since the panel state at startup is
/// unknown. After that the controller only acts when the band disagrees with
/// its remembered `lights_on`, so repeated evaluation within a band writes
/// nothing.
#[derive(Debug, Clone)]
pub struct DayNightController {
    day_hour: u8,
    night_hour: u8,
    lights_on: bool,
    settled: bool,
    bright_level: u8,
    dim_level: u8,
    day_mode: DisplayMode,
    night_mode: DisplayMode,
}

impl DayNightController {
    pub fn new(day_hour: u8, night_hour: u8) -> Self {
        Self {
            day_hour,
            night_hour,
            lights_on: false,
            settled: false,
            bright_level: 12,
            dim_level: 0,
            day_mode: DisplayMode::Occupancy,
            night_mode: DisplayMode::Clock,
        }
    }

    pub fn with_levels(mut self, bright: u8, dim: u8) -> Self {
        self.bright_level = bright;
        self.dim_level = dim;
        self
    }

    pub fn with_modes(mut self, day: DisplayMode, night: DisplayMode) -> Self {
        self.day_mode = day;
        self.night_mode = night;
        self
    }

    pub fn lights_on(&self) -> bool {
        self.lights_on
    }

    pub fn is_daytime(&self, hour: u8) -> bool {
        hour > self.day_hour && hour < self.night_hour
    }

    pub fn evaluate<L: LightingControl + ?Sized>(&mut self, hour: u8, target: &mut L) -> Option<Transition> {
        let daytime = self.is_daytime(hour);
        if self.settled && daytime == self.lights_on {
            return None;
        }
        self.settled = true;
        if daytime {
            info!("Hour {}: lights on, brightness {}", hour, self.bright_level);
            target.apply_brightness(self.bright_level);
            target.apply_mode(self.day_mode);
            self.lights_on = true;
            Some(Transition::LightsOn)
        } else {
            info!("Hour {}: lights off, brightness {}", hour, self.dim_level);
            target.apply_brightness(self.dim_level);
            target.apply_mode(self.night_mode);
            self.lights_on = false;
            Some(Transition::LightsOff)
        }
    }
}
