/*
 *  display/framebuffer.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  LED matrix framebuffer
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

use crate::display::color::LedColor;
use crate::display::traits::DisplayCapabilities;
use crate::vframebuf::VarFrameBuf;

/// In-memory frame drawn by renderers and pushed with `set_image`
pub type FrameBuffer = VarFrameBuf<LedColor>;

impl VarFrameBuf<LedColor> {
    /// Blank frame sized for the display
    pub fn for_display(capabilities: &DisplayCapabilities) -> Self {
        VarFrameBuf::new(capabilities.width, capabilities.height, LedColor::Off)
    }

    /// Every pixel as (x, y, color), row-major
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, LedColor)> + '_ {
        let w = self.width();
        self.as_slice()
            .iter()
            .enumerate()
            .map(move |(i, &c)| ((i % w) as u32, (i / w) as u32, c))
    }

    pub fn count_lit(&self) -> usize {
        self.as_slice().iter().filter(|c| c.is_on()).count()
    }

    /// One line per row, '.' for off (handy in logs and test failures)
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width() + 1) * self.height());
        for row in self.as_slice().chunks(self.width().max(1)) {
            out.extend(row.iter().map(|c| c.glyph()));
            out.push('\n');
        }
        out
    }
}
