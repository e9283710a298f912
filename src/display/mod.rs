/*
 *  display/mod.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - one physical panel shared by several modes
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod framebuffer;
pub mod factory;
pub mod color;

// Display drivers
pub mod drivers;

// Display modes
pub mod components;

// Display mode scheduler
pub mod mode_controller;

// Re-exports for convenience
pub use traits::{BlinkRate, DisplayCapabilities, DisplayDriver, DisplayKind, MAX_BRIGHTNESS};
pub use error::{DisplayError, DisplayFactoryError};
pub use framebuffer::FrameBuffer;
pub use factory::{BoxedDriver, DisplayDriverFactory};
pub use color::LedColor;
pub use mode_controller::{ModeScheduler, SchedulerConfig};

/// Display mode enum - controls what content is shown on the display
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Clock,     // time of day
    Identity,  // host address, a segment at a time
    Countdown, // wrapping down-counter
    Occupancy, // zone tiers on the matrix
}

impl DisplayMode {
    /// Whether a panel of `kind` has the surface this mode draws on
    pub fn renders_on(self, kind: DisplayKind) -> bool {
        match kind {
            DisplayKind::Virtual => true,
            DisplayKind::Matrix => self == DisplayMode::Occupancy,
            DisplayKind::SevenSegment => self != DisplayMode::Occupancy,
        }
    }

    /// `self` if the panel can draw it, else the panel's default mode
    pub fn fit_to(self, kind: DisplayKind) -> DisplayMode {
        if self.renders_on(kind) {
            self
        } else if kind == DisplayKind::Matrix {
            DisplayMode::Occupancy
        } else {
            DisplayMode::Clock
        }
    }
}
