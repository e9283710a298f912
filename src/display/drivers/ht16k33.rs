/*
 *  display/drivers/ht16k33.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  HT16K33 LED backpack driver - bicolor 8x8 matrix and 4-digit 7-segment
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

use embedded_hal::i2c::{Error as I2cErrorTrait, I2c};
use log::{debug, info};

use crate::display::color::LedColor;
use crate::display::error::DisplayError;
use crate::display::traits::{BlinkRate, DisplayCapabilities, DisplayDriver, DisplayKind, MAX_BRIGHTNESS};

const CMD_OSCILLATOR_ON: u8 = 0x21;
const CMD_DISPLAY_SETUP: u8 = 0x80;
const DISPLAY_ON: u8 = 0x01;
const CMD_BRIGHTNESS: u8 = 0xE0;
const RAM_START: u8 = 0x00;

const BUFFER_LEN: usize = 16;

/// Digit positions on the segment backpack; RAM slot 2 is the colon
const DIGITS: usize = 4;
const COLON_BYTE: usize = 4;
const COLON_BIT: u8 = 0x02;
const DECIMAL_BIT: u8 = 0x80;

/// Segment patterns, bit 0 = a ... bit 6 = g
fn segments_for(c: char) -> u8 {
    match c.to_ascii_uppercase() {
        ' ' => 0x00,
        '-' => 0x40,
        '0' => 0x3F,
        '1' => 0x06,
        '2' => 0x5B,
        '3' => 0x4F,
        '4' => 0x66,
        '5' => 0x6D,
        '6' => 0x7D,
        '7' => 0x07,
        '8' => 0x7F,
        '9' => 0x6F,
        'A' => 0x77,
        'B' => 0x7C,
        'C' => 0x39,
        'D' => 0x5E,
        'E' => 0x79,
        'F' => 0x71,
        _ => 0x00,
    }
}

/// Which backpack is wired to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ht16k33Layout {
    BicolorMatrix,
    SevenSegment,
}

/// HT16K33 over any embedded-hal 1.0 I2C bus
pub struct Ht16k33Driver<I2C> {
    i2c: I2C,
    address: u8,
    layout: Ht16k33Layout,
    capabilities: DisplayCapabilities,
    buffer: [u8; BUFFER_LEN],
}

fn bus_error<E: I2cErrorTrait>(err: E) -> DisplayError {
    DisplayError::I2cError(format!("{:?}", err.kind()))
}

impl<I2C: I2c> Ht16k33Driver<I2C> {
    pub fn new(i2c: I2C, address: u8, layout: Ht16k33Layout) -> Self {
        let capabilities = match layout {
            Ht16k33Layout::BicolorMatrix => DisplayCapabilities {
                width: 8,
                height: 8,
                kind: DisplayKind::Matrix,
                supports_brightness: true,
                supports_blink: true,
            },
            Ht16k33Layout::SevenSegment => DisplayCapabilities {
                width: DIGITS as u32,
                height: 1,
                kind: DisplayKind::SevenSegment,
                supports_brightness: true,
                supports_blink: true,
            },
        };
        Self { i2c, address, layout, capabilities, buffer: [0; BUFFER_LEN] }
    }

    /// Give the bus back (tests use this to verify the transcript)
    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn buffer(&self) -> &[u8; BUFFER_LEN] {
        &self.buffer
    }

    fn command(&mut self, cmd: u8) -> Result<(), DisplayError> {
        self.i2c.write(self.address, &[cmd]).map_err(bus_error)
    }

    fn require(&self, layout: Ht16k33Layout) -> Result<(), DisplayError> {
        if self.layout == layout {
            Ok(())
        } else {
            Err(DisplayError::UnsupportedOperation)
        }
    }

    /// RAM byte for a digit position, skipping the colon slot
    fn digit_byte(pos: usize) -> usize {
        let slot = if pos >= 2 { pos + 1 } else { pos };
        slot * 2
    }

    fn set_digit(&mut self, pos: usize, c: char) {
        if pos < DIGITS {
            self.buffer[Self::digit_byte(pos)] = segments_for(c);
        }
    }

    fn set_decimal_bit(&mut self, pos: usize, on: bool) {
        if pos < DIGITS {
            let byte = &mut self.buffer[Self::digit_byte(pos)];
            if on {
                *byte |= DECIMAL_BIT;
            } else {
                *byte &= !DECIMAL_BIT;
            }
        }
    }
}

impl<I2C: I2c + Send> DisplayDriver for Ht16k33Driver<I2C> {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.command(CMD_OSCILLATOR_ON)
            .map_err(|e| DisplayError::InitializationFailed(e.to_string()))?;
        self.set_blink_rate(BlinkRate::Off)?;
        self.set_brightness(MAX_BRIGHTNESS)?;
        info!("HT16K33 {:?} ready at 0x{:02X}", self.layout, self.address);
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        self.command(CMD_BRIGHTNESS | level.min(MAX_BRIGHTNESS))
    }

    fn set_blink_rate(&mut self, rate: BlinkRate) -> Result<(), DisplayError> {
        self.command(CMD_DISPLAY_SETUP | DISPLAY_ON | (rate.bits() << 1))
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.buffer = [0; BUFFER_LEN];
        Ok(())
    }

    fn write_display(&mut self) -> Result<(), DisplayError> {
        let mut frame = [0u8; BUFFER_LEN + 1];
        frame[0] = RAM_START;
        frame[1..].copy_from_slice(&self.buffer);
        self.i2c.write(self.address, &frame).map_err(bus_error)
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: LedColor) -> Result<(), DisplayError> {
        self.require(Ht16k33Layout::BicolorMatrix)?;
        if x >= 8 || y >= 8 {
            return Err(DisplayError::OutOfBounds { x, y });
        }
        // row y: green die in byte 2y, red die in byte 2y+1, column x is the bit
        let (green, red) = (y as usize * 2, y as usize * 2 + 1);
        let bit = 1u8 << x;
        self.buffer[green] &= !bit;
        self.buffer[red] &= !bit;
        if color.green() {
            self.buffer[green] |= bit;
        }
        if color.red() {
            self.buffer[red] |= bit;
        }
        Ok(())
    }

    fn print_numeral_string(&mut self, s: &str) -> Result<(), DisplayError> {
        self.require(Ht16k33Layout::SevenSegment)?;
        let length = s.chars().filter(|&c| c != '.').count();
        if length > DIGITS {
            debug!("'{}' does not fit in {} digits", s, DIGITS);
            return self.print_numeral_string("----");
        }
        let mut pos = DIGITS - length;
        for c in s.chars() {
            if c == '.' {
                if let Some(prev) = pos.checked_sub(1) {
                    self.set_decimal_bit(prev, true);
                }
            } else {
                self.set_digit(pos, c);
                pos += 1;
            }
        }
        Ok(())
    }

    fn set_colon(&mut self, on: bool) -> Result<(), DisplayError> {
        self.require(Ht16k33Layout::SevenSegment)?;
        if on {
            self.buffer[COLON_BYTE] |= COLON_BIT;
        } else {
            self.buffer[COLON_BYTE] &= !COLON_BIT;
        }
        Ok(())
    }

    fn set_decimal(&mut self, index: u8, on: bool) -> Result<(), DisplayError> {
        self.require(Ht16k33Layout::SevenSegment)?;
        if index as usize >= DIGITS {
            return Err(DisplayError::OutOfBounds { x: index as u32, y: 0 });
        }
        self.set_decimal_bit(index as usize, on);
        Ok(())
    }
}
