/*
 *  display/components/countdown.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Countdown mode - wrapping down-counter
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

use std::fmt::Write;

use arrayvec::ArrayString;
use log::warn;

use crate::display::error::DisplayError;
use crate::display::traits::DisplayDriver;

/// Largest value four numerals can show
pub const MAXIMUM_COUNT: u32 = 9999;

#[derive(Debug, Clone)]
pub struct CountdownMode {
    remaining: u32,
    max: u32,
}

impl CountdownMode {
    /// Starts full; a maximum above the ceiling is clamped
    pub fn new(max: u32) -> Self {
        let max = if max > MAXIMUM_COUNT {
            warn!("Countdown maximum {} above {}, clamped", max, MAXIMUM_COUNT);
            MAXIMUM_COUNT
        } else {
            max
        };
        Self { remaining: max, max }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn maximum(&self) -> u32 {
        self.max
    }

    /// Returns false, changing nothing, when `n` exceeds the ceiling
    pub fn set_maximum(&mut self, n: u32) -> bool {
        if n > MAXIMUM_COUNT {
            warn!("Countdown maximum {} rejected, ceiling is {}", n, MAXIMUM_COUNT);
            return false;
        }
        self.max = n;
        self.remaining = n;
        true
    }

    /// Advance one step: count down, and after zero start again from the maximum
    pub fn step(&mut self) -> u32 {
        self.remaining = match self.remaining {
            0 => self.max,
            n => n - 1,
        };
        self.remaining
    }

    pub fn render(&mut self, display: &mut dyn DisplayDriver) -> Result<(), DisplayError> {
        let value = self.step();
        let mut numerals = ArrayString::<4>::new();
        write!(numerals, "{}", value)
            .map_err(|_| DisplayError::DrawingError(format!("{} does not fit", value)))?;

        display.clear()?;
        display.print_numeral_string(&numerals)?;
        display.write_display()
    }
}

impl Default for CountdownMode {
    fn default() -> Self {
        Self::new(MAXIMUM_COUNT)
    }
}
