/*
 *  display/color.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bicolor LED palette
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

use embedded_graphics::pixelcolor::PixelColor;
use embedded_graphics::pixelcolor::raw::RawU2;
use log::warn;

/// Colors a red/green bicolor LED can show
///
/// Index values match the backpack convention: green and red are separate
/// dies, yellow is both lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LedColor {
    #[default]
    Off,
    Green,
    Red,
    Yellow,
}

impl LedColor {
    pub const MAX_INDEX: u8 = 3;

    /// Palette lookup; out-of-range indexes clamp to the last entry
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => LedColor::Off,
            1 => LedColor::Green,
            2 => LedColor::Red,
            3 => LedColor::Yellow,
            _ => {
                warn!("Color index {} out of range, clamped to {}", index, Self::MAX_INDEX);
                LedColor::Yellow
            }
        }
    }

    pub fn index(self) -> u8 {
        match self {
            LedColor::Off => 0,
            LedColor::Green => 1,
            LedColor::Red => 2,
            LedColor::Yellow => 3,
        }
    }

    pub fn green(self) -> bool {
        self.index() & 0x01 != 0
    }

    pub fn red(self) -> bool {
        self.index() & 0x02 != 0
    }

    pub fn is_on(self) -> bool {
        self != LedColor::Off
    }

    /// Single character used by the console driver
    pub fn glyph(self) -> char {
        match self {
            LedColor::Off => '.',
            LedColor::Green => 'G',
            LedColor::Red => 'R',
            LedColor::Yellow => 'Y',
        }
    }
}

impl PixelColor for LedColor {
    type Raw = RawU2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip_and_clamp() {
        for i in 0..=LedColor::MAX_INDEX {
            assert_eq!(LedColor::from_index(i).index(), i);
        }
        assert_eq!(LedColor::from_index(7), LedColor::Yellow);
        assert_eq!(LedColor::from_index(255), LedColor::Yellow);
    }

    #[test]
    fn test_dies() {
        assert!(LedColor::Yellow.red() && LedColor::Yellow.green());
        assert!(LedColor::Red.red() && !LedColor::Red.green());
        assert!(!LedColor::Green.red() && LedColor::Green.green());
        assert!(!LedColor::Off.is_on());
    }
}
