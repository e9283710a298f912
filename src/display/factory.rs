/*
 *  display/factory.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display driver construction from configuration
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

use crate::config::{BusConfig, DisplayConfig, DriverKind};
use crate::display::drivers::{ConsoleDriver, Ht16k33Driver, Ht16k33Layout};
use crate::display::error::DisplayFactoryError;
use crate::display::traits::DisplayDriver;
use linux_embedded_hal::I2cdev;
use log::{debug, info};

/// Type alias for boxed display driver trait objects
pub type BoxedDriver = Box<dyn DisplayDriver>;

/// Factory for creating display drivers from configuration
pub struct DisplayDriverFactory;

impl DisplayDriverFactory {
    /// Create and initialize a display driver from configuration
    ///
    /// The console driver needs no bus; the HT16K33 layouts need an I2C bus.
    ///
    /// ```ignore
    /// let config = DisplayConfig {
    ///     driver: Some(DriverKind::Ht16k33Matrix),
    ///     bus: Some(BusConfig::I2c {
    ///         bus: "/dev/i2c-1".to_string(),
    ///         address: 0x70,
    ///     }),
    ///     ..Default::default()
    /// };
    ///
    /// let driver = DisplayDriverFactory::create_from_config(&config)?;
    /// ```
    pub fn create_from_config(config: &DisplayConfig) -> Result<BoxedDriver, DisplayFactoryError> {
        let mut driver = Self::build(config)?;
        driver.init()?;
        let (w, h) = driver.dimensions();
        info!("Display {:?} {}x{} initialized", config.driver(), w, h);
        Ok(driver)
    }

    fn build(config: &DisplayConfig) -> Result<BoxedDriver, DisplayFactoryError> {
        let layout = match config.driver() {
            DriverKind::Console => {
                let (w, h) = config.geometry();
                return Ok(Box::new(ConsoleDriver::new(w, h)));
            }
            DriverKind::Ht16k33Matrix => Ht16k33Layout::BicolorMatrix,
            DriverKind::Ht16k33Segment => Ht16k33Layout::SevenSegment,
        };

        let BusConfig::I2c { bus, address } = config
            .bus
            .as_ref()
            .ok_or(DisplayFactoryError::NoBusConfiguration)?;

        debug!("Opening {} for HT16K33 at 0x{:02X}", bus, address);
        let i2c = I2cdev::new(bus).map_err(|e| DisplayFactoryError::BusOpenFailed {
            bus: bus.clone(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(Ht16k33Driver::new(i2c, *address, layout)))
    }
}
