/*
 *  error.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fatal setup errors - anything that stops the engine from starting
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

use thiserror::Error;

use crate::config::ConfigError;
use crate::display::error::{DisplayError, DisplayFactoryError};
use crate::gpio::GpioError;

/// Capability registration or configuration failure at construction time
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("GPIO setup failed: {0}")]
    Gpio(#[from] GpioError),
    #[error("display setup failed: {0}")]
    Display(#[from] DisplayError),
    #[error("display factory failed: {0}")]
    Factory(#[from] DisplayFactoryError),
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),
}
