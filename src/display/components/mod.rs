/*
 *  display/components/mod.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display modes sharing one panel
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

pub mod clock;
pub mod countdown;
pub mod identity;
pub mod occupancy;

// Re-exports
pub use clock::{ClockMode, HourFormat};
pub use countdown::{CountdownMode, MAXIMUM_COUNT};
pub use identity::IdentityMode;
pub use occupancy::{tier_color, OccupancyRenderer};
