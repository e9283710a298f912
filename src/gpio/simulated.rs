/*
 *  gpio/simulated.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  In-process digital input for tests and hardware-free runs
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
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{DigitalInput, EdgeHandler, GpioError, Pull};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edges {
    Rising,
    Both,
}

#[derive(Default)]
struct SimPin {
    pull: Option<Pull>,
    level: bool,
    handlers: Vec<(Edges, EdgeHandler)>,
}

#[derive(Default)]
struct SimState {
    pins: HashMap<u8, SimPin>,
    fail_configure: bool,
    fail_registration: bool,
}

/// Digital input backed by memory
///
/// Keep a [`SimulatedInputHandle`] to drive levels after the input has been
/// handed to a `MotionSource`.
pub struct SimulatedInput {
    state: Arc<Mutex<SimState>>,
}

/// Test-side view of a [`SimulatedInput`]
#[derive(Clone)]
pub struct SimulatedInputHandle {
    state: Arc<Mutex<SimState>>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SimulatedInput {
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(SimState::default())) }
    }

    pub fn handle(&self) -> SimulatedInputHandle {
        SimulatedInputHandle { state: Arc::clone(&self.state) }
    }
}

impl Default for SimulatedInput {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedInputHandle {
    /// Deliver an interrupt carrying `level` regardless of the previous level
    ///
    /// Models a bouncing contact, where the platform reports the edge but the
    /// level read inside the handler may not have changed.
    pub fn fire(&self, pin: u8, level: bool) {
        self.dispatch(pin, level, |_| true);
    }

    fn dispatch(&self, pin: u8, level: bool, wants: impl Fn(Edges) -> bool) {
        let mut handlers = {
            let mut state = lock(&self.state);
            let sim = state.pins.entry(pin).or_default();
            sim.level = level;
            std::mem::take(&mut sim.handlers)
        };

        for (edges, handler) in handlers.iter_mut() {
            if wants(*edges) {
                handler(level);
            }
        }

        // handlers registered while we were dispatching stay after ours
        let mut state = lock(&self.state);
        let sim = state.pins.entry(pin).or_default();
        handlers.append(&mut sim.handlers);
        sim.handlers = handlers;
    }

    /// Drive the pin level
    ///
    /// Any change fires both-edge handlers; low to high also fires
    /// rising-edge handlers.
    pub fn set_level(&self, pin: u8, level: bool) {
        let changed = {
            let mut state = lock(&self.state);
            let sim = state.pins.entry(pin).or_default();
            let changed = sim.level != level;
            sim.level = level;
            changed
        };
        if changed {
            self.dispatch(pin, level, |edges| level || edges == Edges::Both);
        }
    }

    pub fn registration_count(&self, pin: u8) -> usize {
        lock(&self.state).pins.get(&pin).map_or(0, |p| p.handlers.len())
    }

    pub fn pull(&self, pin: u8) -> Option<Pull> {
        lock(&self.state).pins.get(&pin).and_then(|p| p.pull)
    }

    pub fn fail_configure(&self, fail: bool) {
        lock(&self.state).fail_configure = fail;
    }

    pub fn fail_registration(&self, fail: bool) {
        lock(&self.state).fail_registration = fail;
    }
}

impl DigitalInput for SimulatedInput {
    fn configure_as_input(&mut self, pin: u8, pull: Pull) -> Result<(), GpioError> {
        let mut state = lock(&self.state);
        if state.fail_configure {
            return Err(GpioError::Setup { pin, reason: "simulated configure failure".into() });
        }
        let sim = state.pins.entry(pin).or_default();
        sim.pull = Some(pull);
        sim.level = pull == Pull::Up;
        Ok(())
    }

    fn register_rising_edge_callback(
        &mut self,
        pin: u8,
        handler: EdgeHandler,
    ) -> Result<(), GpioError> {
        let mut state = lock(&self.state);
        if state.fail_registration {
            return Err(GpioError::Setup { pin, reason: "simulated registration failure".into() });
        }
        state.pins.entry(pin).or_default().handlers.push((Edges::Rising, handler));
        Ok(())
    }

    fn register_edge_callback(&mut self, pin: u8, handler: EdgeHandler) -> Result<(), GpioError> {
        let mut state = lock(&self.state);
        if state.fail_registration {
            return Err(GpioError::Setup { pin, reason: "simulated registration failure".into() });
        }
        state.pins.entry(pin).or_default().handlers.push((Edges::Both, handler));
        Ok(())
    }

    fn read_level(&self, pin: u8) -> Result<bool, GpioError> {
        lock(&self.state)
            .pins
            .get(&pin)
            .map(|p| p.level)
            .ok_or_else(|| GpioError::Read { pin, reason: "pin not configured".into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_configure_sets_pull_and_idle_level() {
        let mut input = SimulatedInput::new();
        let handle = input.handle();

        input.configure_as_input(17, Pull::Down).unwrap();
        assert_eq!(handle.pull(17), Some(Pull::Down));
        assert!(!input.read_level(17).unwrap());

        input.configure_as_input(18, Pull::Up).unwrap();
        assert!(input.read_level(18).unwrap());
    }

    #[test]
    fn test_read_unconfigured_pin_fails() {
        let input = SimulatedInput::new();
        assert!(input.read_level(4).is_err());
    }

    #[test]
    fn test_set_level_fires_only_on_rising_edge() {
        let mut input = SimulatedInput::new();
        let handle = input.handle();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        input.configure_as_input(17, Pull::Down).unwrap();
        input
            .register_rising_edge_callback(17, Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        handle.set_level(17, true);
        handle.set_level(17, true);
        handle.set_level(17, false);
        handle.set_level(17, true);

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(handle.registration_count(17), 1);
    }

    #[test]
    fn test_edge_callback_sees_both_directions() {
        let mut input = SimulatedInput::new();
        let handle = input.handle();
        let levels = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&levels);

        input.configure_as_input(17, Pull::Down).unwrap();
        input
            .register_edge_callback(17, Box::new(move |level| seen.lock().unwrap().push(level)))
            .unwrap();

        handle.set_level(17, true);
        handle.set_level(17, true);
        handle.set_level(17, false);
        handle.set_level(17, true);

        assert_eq!(*levels.lock().unwrap(), vec![true, false, true]);
    }

    #[test]
    fn test_simulated_registration_failure() {
        let mut input = SimulatedInput::new();
        input.handle().fail_registration(true);
        assert!(input.register_rising_edge_callback(17, Box::new(|_| {})).is_err());
    }
}
