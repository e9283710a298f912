/*
 *  display/components/clock.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Clock mode - time of day on the numeral surface
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
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::display::error::DisplayError;
use crate::display::traits::DisplayDriver;

const ALARM_DECIMAL: u8 = 3;
const PM_DECIMAL: u8 = 1;

/// 12 or 24 hour rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourFormat {
    /// blank padded, " 930"
    #[default]
    Twelve,
    /// zero padded, "0930"
    TwentyFour,
}

impl HourFormat {
    fn pattern(self) -> &'static str {
        match self {
            HourFormat::Twelve => "%l%M",
            HourFormat::TwentyFour => "%H%M",
        }
    }
}

/// Clock state carried between ticks
#[derive(Debug, Clone)]
pub struct ClockMode {
    format: HourFormat,
    alarm: bool,
    colon_on: bool,
}

impl ClockMode {
    pub fn new(format: HourFormat, alarm: bool) -> Self {
        Self { format, alarm, colon_on: false }
    }

    pub fn hour_format(&self) -> HourFormat {
        self.format
    }

    pub fn set_hour_format(&mut self, format: HourFormat) {
        self.format = format;
    }

    pub fn alarm(&self) -> bool {
        self.alarm
    }

    pub fn set_alarm(&mut self, alarm: bool) {
        self.alarm = alarm;
    }

    /// Four numeral characters for the given time
    pub fn digits(&self, now: NaiveTime) -> Result<ArrayString<8>, DisplayError> {
        let mut out = ArrayString::<8>::new();
        write!(out, "{}", now.format(self.format.pattern()))
            .map_err(|_| DisplayError::DrawingError(format!("cannot format {}", now)))?;
        Ok(out)
    }

    /// One tick: time, blinking colon, alarm and PM indicators
    pub fn render(&mut self, now: NaiveTime, display: &mut dyn DisplayDriver) -> Result<(), DisplayError> {
        let digits = self.digits(now)?;
        let colon = self.colon_on;
        self.colon_on = !self.colon_on;

        display.clear()?;
        display.print_numeral_string(&digits)?;
        display.set_colon(colon)?;
        display.set_decimal(ALARM_DECIMAL, self.alarm)?;
        if now.hour() > 11 {
            display.set_decimal(PM_DECIMAL, true)?;
        }
        display.write_display()
    }
}

impl Default for ClockMode {
    fn default() -> Self {
        Self::new(HourFormat::default(), false)
    }
}
