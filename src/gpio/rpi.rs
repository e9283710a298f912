/*
 *  gpio/rpi.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Raspberry Pi GPIO input via rppal asynchronous interrupts
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

use std::collections::HashMap;

use log::debug;
use rppal::gpio::{Gpio, InputPin, Level, Trigger};

use super::{DigitalInput, EdgeHandler, GpioError, Pull};

/// BCM-numbered inputs on the Pi header
///
/// rppal runs interrupt callbacks on its own thread, one per pin.
pub struct RppalInput {
    gpio: Gpio,
    pins: HashMap<u8, InputPin>,
}

impl RppalInput {
    pub fn new() -> Result<Self, GpioError> {
        let gpio = Gpio::new().map_err(|e| GpioError::Unavailable(e.to_string()))?;
        Ok(Self { gpio, pins: HashMap::new() })
    }

    fn pin_mut(&mut self, pin: u8) -> Result<&mut InputPin, GpioError> {
        self.pins.get_mut(&pin).ok_or_else(|| GpioError::Setup {
            pin,
            reason: "pin not configured as input".to_string(),
        })
    }
}

impl DigitalInput for RppalInput {
    fn configure_as_input(&mut self, pin: u8, pull: Pull) -> Result<(), GpioError> {
        let raw = self
            .gpio
            .get(pin)
            .map_err(|e| GpioError::Setup { pin, reason: e.to_string() })?;
        let input = match pull {
            Pull::Down => raw.into_input_pulldown(),
            Pull::Up => raw.into_input_pullup(),
        };
        debug!("GPIO{} configured as input ({:?})", pin, pull);
        self.pins.insert(pin, input);
        Ok(())
    }

    fn register_rising_edge_callback(
        &mut self,
        pin: u8,
        mut handler: EdgeHandler,
    ) -> Result<(), GpioError> {
        self.pin_mut(pin)?
            .set_async_interrupt(Trigger::RisingEdge, move |level: Level| {
                handler(level == Level::High)
            })
            .map_err(|e| GpioError::Setup { pin, reason: e.to_string() })
    }

    fn register_edge_callback(&mut self, pin: u8, mut handler: EdgeHandler) -> Result<(), GpioError> {
        self.pin_mut(pin)?
            .set_async_interrupt(Trigger::Both, move |level: Level| handler(level == Level::High))
            .map_err(|e| GpioError::Setup { pin, reason: e.to_string() })
    }

    fn read_level(&self, pin: u8) -> Result<bool, GpioError> {
        self.pins
            .get(&pin)
            .map(|input| input.is_high())
            .ok_or_else(|| GpioError::Read { pin, reason: "pin not configured as input".to_string() })
    }
}
