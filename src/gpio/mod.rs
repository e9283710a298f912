/*
 *  gpio/mod.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Digital input capability - edge-triggered signal sources
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
use thiserror::Error;

pub mod simulated;

#[cfg(feature = "rpi")]
pub mod rpi;

pub use simulated::{SimulatedInput, SimulatedInputHandle};

#[cfg(feature = "rpi")]
pub use rpi::RppalInput;

/// Errors raised by a digital input backend
#[derive(Debug, Error)]
pub enum GpioError {
    #[error("GPIO setup failed on pin {pin}: {reason}")]
    Setup { pin: u8, reason: String },
    #[error("GPIO read failed on pin {pin}: {reason}")]
    Read { pin: u8, reason: String },
    #[error("GPIO backend unavailable: {0}")]
    Unavailable(String),
}

/// Input bias resistor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pull {
    Up,
    #[default]
    Down,
}

/// Callback invoked from the platform's interrupt thread with the pin level
pub type EdgeHandler = Box<dyn FnMut(bool) + Send + 'static>;

/// Edge-triggered digital input
///
/// Handlers run on whatever thread the platform delivers interrupts on;
/// they must not block.
pub trait DigitalInput: Send {
    fn configure_as_input(&mut self, pin: u8, pull: Pull) -> Result<(), GpioError>;

    /// Register `handler` for rising-edge notifications on `pin`
    fn register_rising_edge_callback(
        &mut self,
        pin: u8,
        handler: EdgeHandler,
    ) -> Result<(), GpioError>;

    /// Register `handler` for both rising and falling edges on `pin`
    ///
    /// The handler sees every level change, which is what edge
    /// deduplication downstream needs to notice the next pulse.
    fn register_edge_callback(&mut self, pin: u8, handler: EdgeHandler) -> Result<(), GpioError>;

    fn read_level(&self, pin: u8) -> Result<bool, GpioError>;
}
