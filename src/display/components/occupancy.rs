/*
 *  display/components/occupancy.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Occupancy mode - zone tiers drawn as colored footprints
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

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::PrimitiveStyle;

use crate::display::color::LedColor;
use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameBuffer;
use crate::display::traits::{DisplayCapabilities, DisplayDriver};
use crate::zones::{Tier, ZoneDecayTable};

pub fn tier_color(tier: Tier) -> LedColor {
    match tier {
        Tier::Fresh => LedColor::Red,
        Tier::Recent => LedColor::Yellow,
        Tier::Stale => LedColor::Green,
        Tier::Inactive => LedColor::Off,
    }
}

/// Draws every zone into a private frame and pushes it in one write
#[derive(Debug, Clone)]
pub struct OccupancyRenderer {
    frame: FrameBuffer,
}

impl OccupancyRenderer {
    pub fn new(capabilities: &DisplayCapabilities) -> Self {
        Self { frame: FrameBuffer::for_display(capabilities) }
    }

    /// Frame from the last render
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Redraw the frame from the table without touching a display
    pub fn compose(&mut self, table: &ZoneDecayTable) -> &FrameBuffer {
        self.frame.clear_color(LedColor::Off);
        for zone in table.zones() {
            let color = tier_color(zone.tier());
            if !color.is_on() {
                continue;
            }
            let Ok(()) = zone
                .footprint()
                .rect()
                .into_styled(PrimitiveStyle::with_fill(color))
                .draw(&mut self.frame);
        }
        &self.frame
    }

    pub fn render(&mut self, table: &ZoneDecayTable, display: &mut dyn DisplayDriver) -> Result<(), DisplayError> {
        self.compose(table);
        display.set_image(&self.frame)?;
        display.write_display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockDriver;
    use crate::zones::{Footprint, ZoneSpec};

    fn table() -> ZoneDecayTable {
        ZoneDecayTable::new([
            ZoneSpec::new("front", Footprint::new(0, 3, 1, 2), 60),
            ZoneSpec::new("garage", Footprint::new(6, 0, 2, 2), 60),
            ZoneSpec::new("study", Footprint::new(6, 6, 2, 2), 60),
        ])
    }

    #[test]
    fn test_tier_colors() {
        assert_eq!(tier_color(Tier::Fresh), LedColor::Red);
        assert_eq!(tier_color(Tier::Recent), LedColor::Yellow);
        assert_eq!(tier_color(Tier::Stale), LedColor::Green);
        assert_eq!(tier_color(Tier::Inactive), LedColor::Off);
    }

    #[test]
    fn test_footprints_drawn_in_tier_color() {
        let mut zones = table();
        zones.refresh("front");
        zones.refresh("garage");
        for _ in 0..20 {
            zones.tick();
        }
        zones.refresh("front");

        let mut mock = MockDriver::new_with_size(8, 8);
        let state = mock.state();
        let mut renderer = OccupancyRenderer::new(mock.capabilities());
        renderer.render(&zones, &mut mock).unwrap();

        assert_eq!(mock.shown_pixel(0, 3), Some(LedColor::Red));
        assert_eq!(mock.shown_pixel(0, 4), Some(LedColor::Red));
        assert_eq!(mock.shown_pixel(1, 3), Some(LedColor::Off));
        for (x, y) in [(6, 0), (7, 0), (6, 1), (7, 1)] {
            assert_eq!(mock.shown_pixel(x, y), Some(LedColor::Yellow));
        }
        assert_eq!(mock.shown_pixel(6, 6), Some(LedColor::Off));
        assert_eq!(renderer.frame().count_lit(), 6);

        let s = state.lock().unwrap();
        assert_eq!(s.image_count, 1);
        assert_eq!(s.write_count, 1);
    }

    #[test]
    fn test_faded_zone_is_cleared_on_next_render() {
        let mut zones = table();
        zones.refresh("study");
        let caps = MockDriver::new_with_size(8, 8).capabilities().clone();
        let mut renderer = OccupancyRenderer::new(&caps);

        assert_eq!(renderer.compose(&zones).count_lit(), 4);
        for _ in 0..60 {
            zones.tick();
        }
        assert_eq!(renderer.compose(&zones).count_lit(), 0);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let zones = table();
        let mut mock = MockDriver::new_with_size(8, 8);
        mock.state().lock().unwrap().simulate_write_failure = true;
        let mut renderer = OccupancyRenderer::new(mock.capabilities());
        assert!(renderer.render(&zones, &mut mock).is_err());
    }
}
