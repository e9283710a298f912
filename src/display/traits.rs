/*
 *  display/traits.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display driver abstraction
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

use serde::{Deserialize, Serialize};

use crate::display::color::LedColor;
use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameBuffer;

/// Highest brightness step the backpacks accept
pub const MAX_BRIGHTNESS: u8 = 15;

/// Physical arrangement of the LEDs behind a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    /// Addressable grid of bicolor pixels
    /// Used by: Adafruit bicolor 8x8 backpack
    Matrix,

    /// Four numeral positions with colon and decimal points
    /// Used by: Adafruit 0.56" 4-digit 7-segment backpack
    SevenSegment,

    /// Both surfaces, no hardware behind them
    Virtual,
}

/// Hardware blink modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkRate {
    #[default]
    Off,
    TwoHz,
    OneHz,
    HalfHz,
}

impl BlinkRate {
    /// Value of the blink bits in the HT16K33 display setup command
    pub fn bits(self) -> u8 {
        match self {
            BlinkRate::Off => 0,
            BlinkRate::TwoHz => 1,
            BlinkRate::OneHz => 2,
            BlinkRate::HalfHz => 3,
        }
    }
}

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Width in pixels (matrix) or numeral positions (segment)
    pub width: u32,

    /// Height in pixels; 1 for segment displays
    pub height: u32,

    pub kind: DisplayKind,

    pub supports_brightness: bool,

    pub supports_blink: bool,
}

impl DisplayCapabilities {
    pub fn supports_pixels(&self) -> bool {
        matches!(self.kind, DisplayKind::Matrix | DisplayKind::Virtual)
    }

    pub fn supports_numerals(&self) -> bool {
        matches!(self.kind, DisplayKind::SevenSegment | DisplayKind::Virtual)
    }
}

/// The Display capability - everything the engine may ask of a panel
///
/// Every call is synchronous and assumed fast (I2C class). Drawing calls
/// only touch the driver's buffer; nothing reaches the LEDs until
/// `write_display`. Drivers leave unsupported surfaces at their defaults,
/// which return `UnsupportedOperation`.
pub trait DisplayDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Initialize the display hardware
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Set brightness, 0..=MAX_BRIGHTNESS
    ///
    /// Callers clamp; drivers may reject values above the ceiling.
    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError>;

    fn set_blink_rate(&mut self, rate: BlinkRate) -> Result<(), DisplayError> {
        let _ = rate;
        Err(DisplayError::UnsupportedOperation)
    }

    /// Blank the buffer (not flushed)
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Push the buffer to the hardware in one transfer
    fn write_display(&mut self) -> Result<(), DisplayError>;

    fn set_pixel(&mut self, x: u32, y: u32, color: LedColor) -> Result<(), DisplayError> {
        let _ = (x, y, color);
        Err(DisplayError::UnsupportedOperation)
    }

    /// Copy a whole frame into the buffer
    fn set_image(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        let (w, h) = self.dimensions();
        if frame.width() as u32 != w || frame.height() as u32 != h {
            return Err(DisplayError::BufferSizeMismatch {
                expected: (w * h) as usize,
                actual: frame.as_slice().len(),
            });
        }
        for (x, y, color) in frame.pixels() {
            self.set_pixel(x, y, color)?;
        }
        Ok(())
    }

    /// Right-justified numeral string, '.' lights the previous decimal point
    fn print_numeral_string(&mut self, s: &str) -> Result<(), DisplayError> {
        let _ = s;
        Err(DisplayError::UnsupportedOperation)
    }

    fn set_colon(&mut self, on: bool) -> Result<(), DisplayError> {
        let _ = on;
        Err(DisplayError::UnsupportedOperation)
    }

    fn set_decimal(&mut self, index: u8, on: bool) -> Result<(), DisplayError> {
        let _ = (index, on);
        Err(DisplayError::UnsupportedOperation)
    }
}
