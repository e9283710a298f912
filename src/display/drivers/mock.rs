/*
 *  display/drivers/mock.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock display driver for testing without hardware
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

use std::sync::{Arc, Mutex, MutexGuard};

use crate::display::color::LedColor;
use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameBuffer;
use crate::display::traits::{BlinkRate, DisplayCapabilities, DisplayDriver, DisplayKind, MAX_BRIGHTNESS};

/// Mock display driver for testing
///
/// Exposes both the pixel and the numeral surface. Every operation is
/// recorded in shared state so tests can inspect it after the driver has
/// been boxed and handed to a scheduler.
#[derive(Debug, Clone)]
pub struct MockDriver {
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of times write_display() succeeded
    pub write_count: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Number of set_image() calls
    pub image_count: usize,

    /// Every brightness value set, in order
    pub brightness_history: Vec<u8>,

    pub last_blink: Option<BlinkRate>,

    /// Working buffer
    pub pixels: Vec<LedColor>,

    /// Buffer as of the last write_display()
    pub shown_pixels: Vec<LedColor>,

    pub numerals: String,

    /// Numerals as of the last write_display()
    pub shown_numerals: String,

    pub colon: bool,

    pub decimals: [bool; 4],

    /// Simulate failures (for error testing)
    pub simulate_write_failure: bool,
    pub simulate_init_failure: bool,
}

impl MockDriverState {
    pub fn last_brightness(&self) -> Option<u8> {
        self.brightness_history.last().copied()
    }
}

impl MockDriver {
    /// Virtual panel supporting pixels and numerals
    pub fn new_with_size(width: u32, height: u32) -> Self {
        let capabilities = DisplayCapabilities {
            width,
            height,
            kind: DisplayKind::Virtual,
            supports_brightness: true,
            supports_blink: true,
        };
        let state = MockDriverState {
            pixels: vec![LedColor::Off; (width * height) as usize],
            shown_pixels: vec![LedColor::Off; (width * height) as usize],
            ..Default::default()
        };
        Self { capabilities, state: Arc::new(Mutex::new(state)) }
    }

    /// Same mock reporting a different panel kind
    pub fn with_kind(mut self, kind: DisplayKind) -> Self {
        self.capabilities.kind = kind;
        self
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, MockDriverState> {
        self.state.lock().unwrap()
    }

    /// Pixel as of the last write_display()
    pub fn shown_pixel(&self, x: u32, y: u32) -> Option<LedColor> {
        if x >= self.capabilities.width || y >= self.capabilities.height {
            return None;
        }
        let idx = (y * self.capabilities.width + x) as usize;
        self.lock().shown_pixels.get(idx).copied()
    }
}

impl DisplayDriver for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if state.simulate_init_failure {
            return Err(DisplayError::InitializationFailed("Simulated init failure".to_string()));
        }
        state.init_count += 1;
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        if level > MAX_BRIGHTNESS {
            return Err(DisplayError::InvalidConfiguration(format!("brightness {}", level)));
        }
        self.lock().brightness_history.push(level);
        Ok(())
    }

    fn set_blink_rate(&mut self, rate: BlinkRate) -> Result<(), DisplayError> {
        self.lock().last_blink = Some(rate);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        state.clear_count += 1;
        state.pixels.fill(LedColor::Off);
        state.numerals.clear();
        state.colon = false;
        state.decimals = [false; 4];
        Ok(())
    }

    fn write_display(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if state.simulate_write_failure {
            return Err(DisplayError::I2cError("Simulated write failure".to_string()));
        }
        state.write_count += 1;
        state.shown_pixels = state.pixels.clone();
        state.shown_numerals = state.numerals.clone();
        Ok(())
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: LedColor) -> Result<(), DisplayError> {
        if x >= self.capabilities.width || y >= self.capabilities.height {
            return Err(DisplayError::OutOfBounds { x, y });
        }
        let idx = (y * self.capabilities.width + x) as usize;
        self.lock().pixels[idx] = color;
        Ok(())
    }

    fn set_image(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if frame.as_slice().len() != state.pixels.len() {
            return Err(DisplayError::BufferSizeMismatch {
                expected: state.pixels.len(),
                actual: frame.as_slice().len(),
            });
        }
        state.image_count += 1;
        state.pixels.copy_from_slice(frame.as_slice());
        Ok(())
    }

    fn print_numeral_string(&mut self, s: &str) -> Result<(), DisplayError> {
        self.lock().numerals = s.to_string();
        Ok(())
    }

    fn set_colon(&mut self, on: bool) -> Result<(), DisplayError> {
        self.lock().colon = on;
        Ok(())
    }

    fn set_decimal(&mut self, index: u8, on: bool) -> Result<(), DisplayError> {
        let mut state = self.lock();
        match state.decimals.get_mut(index as usize) {
            Some(slot) => {
                *slot = on;
                Ok(())
            }
            None => Err(DisplayError::OutOfBounds { x: index as u32, y: 0 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_driver_creation() {
        let driver = MockDriver::new_with_size(8, 8);
        assert_eq!(driver.dimensions(), (8, 8));
        assert!(driver.capabilities().supports_pixels());
        assert!(driver.capabilities().supports_numerals());
    }

    #[test]
    fn test_pixels_only_shown_after_write() {
        let mut driver = MockDriver::new_with_size(8, 8);
        driver.set_pixel(1, 2, LedColor::Red).unwrap();
        assert_eq!(driver.shown_pixel(1, 2), Some(LedColor::Off));

        driver.write_display().unwrap();
        assert_eq!(driver.shown_pixel(1, 2), Some(LedColor::Red));
        assert_eq!(driver.state().lock().unwrap().write_count, 1);
    }

    #[test]
    fn test_mock_driver_bounds() {
        let mut driver = MockDriver::new_with_size(8, 8);
        assert!(driver.set_pixel(8, 0, LedColor::Red).is_err());
        assert!(driver.set_brightness(16).is_err());
        assert!(driver.set_decimal(4, true).is_err());
    }

    #[test]
    fn test_mock_driver_simulated_failure() {
        let mut driver = MockDriver::new_with_size(8, 8);
        driver.state().lock().unwrap().simulate_write_failure = true;
        assert!(driver.write_display().is_err());

        driver.state().lock().unwrap().simulate_write_failure = false;
        assert!(driver.write_display().is_ok());
    }
}
