/*
 *  display/drivers/console.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Console display - renders frames into the log for desk testing
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

use log::{debug, info};

use crate::display::color::LedColor;
use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameBuffer;
use crate::display::traits::{BlinkRate, DisplayCapabilities, DisplayDriver, DisplayKind, MAX_BRIGHTNESS};

const DECIMALS: usize = 4;

/// A virtual panel with both surfaces that logs what it would show
///
/// Only changed content is logged, so a clock ticking at 1Hz produces a
/// line per change instead of a line per tick.
pub struct ConsoleDriver {
    capabilities: DisplayCapabilities,
    frame: FrameBuffer,
    numerals: String,
    colon: bool,
    decimals: [bool; DECIMALS],
    pixels_dirty: bool,
    last_shown: Option<String>,
}

impl ConsoleDriver {
    pub fn new(width: u32, height: u32) -> Self {
        let capabilities = DisplayCapabilities {
            width,
            height,
            kind: DisplayKind::Virtual,
            supports_brightness: true,
            supports_blink: true,
        };
        let frame = FrameBuffer::for_display(&capabilities);
        Self {
            capabilities,
            frame,
            numerals: String::new(),
            colon: false,
            decimals: [false; DECIMALS],
            pixels_dirty: false,
            last_shown: None,
        }
    }

    /// Numeral line as it would read on a segment panel, e.g. "12:34 .  ."
    fn numeral_line(&self) -> String {
        let mut line = format!("{:>4}", self.numerals);
        if self.colon && line.len() >= 2 {
            line.insert(2, ':');
        }
        let dots: String = self.decimals.iter().map(|&d| if d { '.' } else { ' ' }).collect();
        format!("[{}] [{}]", line, dots)
    }

    /// What write_display would emit right now
    fn render(&self) -> String {
        if self.pixels_dirty {
            format!("\n{}", self.frame.to_ascii())
        } else {
            self.numeral_line()
        }
    }
}

impl DisplayDriver for ConsoleDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        info!(
            "Console display {}x{} ready",
            self.capabilities.width, self.capabilities.height
        );
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        if level > MAX_BRIGHTNESS {
            return Err(DisplayError::InvalidConfiguration(format!(
                "brightness {} above {}",
                level, MAX_BRIGHTNESS
            )));
        }
        info!("Console brightness {}", level);
        Ok(())
    }

    fn set_blink_rate(&mut self, rate: BlinkRate) -> Result<(), DisplayError> {
        info!("Console blink {:?}", rate);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.frame.clear_color(LedColor::Off);
        self.numerals.clear();
        self.colon = false;
        self.decimals = [false; DECIMALS];
        self.pixels_dirty = false;
        Ok(())
    }

    fn write_display(&mut self) -> Result<(), DisplayError> {
        let shown = self.render();
        if self.last_shown.as_deref() == Some(shown.as_str()) {
            debug!("Console frame unchanged");
        } else {
            info!("{}", shown);
            self.last_shown = Some(shown);
        }
        Ok(())
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: LedColor) -> Result<(), DisplayError> {
        if x >= self.capabilities.width || y >= self.capabilities.height {
            return Err(DisplayError::OutOfBounds { x, y });
        }
        self.frame.set(x, y, color);
        self.pixels_dirty = true;
        Ok(())
    }

    fn set_image(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        if frame.width() != self.frame.width() || frame.height() != self.frame.height() {
            return Err(DisplayError::BufferSizeMismatch {
                expected: self.frame.as_slice().len(),
                actual: frame.as_slice().len(),
            });
        }
        self.frame = frame.clone();
        self.pixels_dirty = true;
        Ok(())
    }

    fn print_numeral_string(&mut self, s: &str) -> Result<(), DisplayError> {
        self.numerals = s.to_string();
        Ok(())
    }

    fn set_colon(&mut self, on: bool) -> Result<(), DisplayError> {
        self.colon = on;
        Ok(())
    }

    fn set_decimal(&mut self, index: u8, on: bool) -> Result<(), DisplayError> {
        let slot = self
            .decimals
            .get_mut(index as usize)
            .ok_or(DisplayError::OutOfBounds { x: index as u32, y: 0 })?;
        *slot = on;
        Ok(())
    }
}
