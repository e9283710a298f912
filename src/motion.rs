/*
 *  motion.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  PIR motion source - interrupt-fed, edge-deduplicated event producer
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

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use crate::edge_queue::{EdgeEvent, EdgeQueue};
use crate::error::SetupError;
use crate::gpio::{DigitalInput, GpioError, Pull};

/// State touched from the interrupt thread
#[derive(Debug)]
struct EdgeState {
    pin: u8,
    last_state: AtomicBool,
    queue: Arc<EdgeQueue>,
}

impl EdgeState {
    /// Queue `new_state` only when it differs from the last reported level
    fn on_edge(&self, new_state: bool) {
        // swap records the new level unconditionally and hands back the old one
        let previous = self.last_state.swap(new_state, Ordering::AcqRel);
        if previous != new_state {
            debug!("GPIO{} edge: {} -> {}", self.pin, previous as u8, new_state as u8);
            self.queue.push(EdgeEvent::new(new_state));
        }
    }
}

/// Motion detector bound to one input pin
///
/// Repeated callbacks reporting an unchanged level are dropped here, so the
/// queue only ever carries real transitions. The initial level is low.
pub struct MotionSource<I: DigitalInput> {
    input: I,
    state: Arc<EdgeState>,
    enabled: bool,
}

impl<I: DigitalInput> MotionSource<I> {
    /// Configure `pin` as an input and prepare an empty queue
    pub fn new(mut input: I, pin: u8, pull: Pull) -> Result<Self, SetupError> {
        input.configure_as_input(pin, pull)?;
        Ok(Self {
            input,
            state: Arc::new(EdgeState {
                pin,
                last_state: AtomicBool::new(false),
                queue: Arc::new(EdgeQueue::new()),
            }),
            enabled: false,
        })
    }

    pub fn pin(&self) -> u8 {
        self.state.pin
    }

    /// Interrupt entry point; also callable directly to replay a level
    pub fn on_edge(&self, new_state: bool) {
        self.state.on_edge(new_state);
    }

    /// Register the edge callback for both directions; calling again is a no-op
    ///
    /// Falling edges must arrive too, otherwise the level stays high after
    /// the first pulse and every later rising edge reads as a repeat.
    pub fn enable(&mut self) -> Result<(), SetupError> {
        if self.enabled {
            debug!("GPIO{} motion interrupts already enabled", self.state.pin);
            return Ok(());
        }
        let state = Arc::clone(&self.state);
        self.input.register_edge_callback(
            self.state.pin,
            Box::new(move |level| state.on_edge(level)),
        )?;
        self.enabled = true;
        info!("Motion interrupts enabled on GPIO{}", self.state.pin);
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Has any transition been queued and not yet consumed?
    pub fn detected(&self) -> bool {
        !self.state.queue.is_empty()
    }

    pub fn get_motion(&self) -> Option<EdgeEvent> {
        self.state.queue.pop_nonblocking()
    }

    /// Blocking wait for the next transition
    pub fn wait_for_motion(&self) -> EdgeEvent {
        self.state.queue.pop_blocking()
    }

    /// Consumer side of the queue, shared with exactly one reader
    pub fn queue(&self) -> Arc<EdgeQueue> {
        Arc::clone(&self.state.queue)
    }

    pub fn last_state(&self) -> bool {
        self.state.last_state.load(Ordering::Acquire)
    }

    pub fn read_level(&self) -> Result<bool, GpioError> {
        self.input.read_level(self.state.pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::SimulatedInput;

    const PIN: u8 = 17;

    fn drain(source: &MotionSource<SimulatedInput>) -> Vec<bool> {
        let mut out = Vec::new();
        while let Some(event) = source.get_motion() {
            out.push(event.high);
        }
        out
    }

    #[test]
    fn test_new_configures_pin() {
        let input = SimulatedInput::new();
        let handle = input.handle();
        let source = MotionSource::new(input, PIN, Pull::Down).unwrap();

        assert_eq!(handle.pull(PIN), Some(Pull::Down));
        assert!(!source.last_state());
        assert!(!source.detected());
        assert!(!source.read_level().unwrap());
    }

    #[test]
    fn test_configure_failure_is_setup_error() {
        let input = SimulatedInput::new();
        input.handle().fail_configure(true);
        let result = MotionSource::new(input, PIN, Pull::Down);
        assert!(matches!(result, Err(SetupError::Gpio(_))));
    }

    #[test]
    fn test_chatter_is_suppressed() {
        let source = MotionSource::new(SimulatedInput::new(), PIN, Pull::Down).unwrap();

        for level in [false, false, true, true, true, false] {
            source.on_edge(level);
        }

        assert_eq!(drain(&source), vec![true, false]);
        assert!(!source.last_state());
    }

    #[test]
    fn test_every_real_transition_is_queued() {
        let source = MotionSource::new(SimulatedInput::new(), PIN, Pull::Down).unwrap();

        for level in [true, false, true, false] {
            source.on_edge(level);
        }

        assert_eq!(drain(&source), vec![true, false, true, false]);
    }

    #[test]
    fn test_enable_is_idempotent() {
        let input = SimulatedInput::new();
        let handle = input.handle();
        let mut source = MotionSource::new(input, PIN, Pull::Down).unwrap();

        source.enable().unwrap();
        source.enable().unwrap();
        assert!(source.is_enabled());
        assert_eq!(handle.registration_count(PIN), 1);

        handle.set_level(PIN, true);
        assert_eq!(drain(&source), vec![true]);
    }

    #[test]
    fn test_interrupt_bounce_reporting_same_level() {
        let input = SimulatedInput::new();
        let handle = input.handle();
        let mut source = MotionSource::new(input, PIN, Pull::Down).unwrap();
        source.enable().unwrap();

        handle.fire(PIN, true);
        handle.fire(PIN, true);
        handle.fire(PIN, false);
        handle.fire(PIN, false);

        assert_eq!(drain(&source), vec![true, false]);
    }

    #[test]
    fn test_each_pir_pulse_is_queued() {
        let input = SimulatedInput::new();
        let handle = input.handle();
        let mut source = MotionSource::new(input, PIN, Pull::Down).unwrap();
        source.enable().unwrap();

        for _ in 0..3 {
            handle.set_level(PIN, true);
            handle.set_level(PIN, false);
        }

        let rising = drain(&source).into_iter().filter(|&high| high).count();
        assert_eq!(rising, 3);
        assert!(!source.last_state());
    }

    #[test]
    fn test_registration_failure_is_fatal_and_not_retried() {
        let input = SimulatedInput::new();
        let handle = input.handle();
        let mut source = MotionSource::new(input, PIN, Pull::Down).unwrap();

        handle.fail_registration(true);
        assert!(matches!(source.enable(), Err(SetupError::Gpio(_))));
        assert!(!source.is_enabled());
        assert_eq!(handle.registration_count(PIN), 0);
    }

    #[test]
    fn test_wait_for_motion_from_interrupt_thread() {
        let input = SimulatedInput::new();
        let handle = input.handle();
        let mut source = MotionSource::new(input, PIN, Pull::Down).unwrap();
        source.enable().unwrap();

        let producer = std::thread::spawn(move || handle.set_level(PIN, true));
        assert_eq!(source.wait_for_motion(), EdgeEvent::new(true));
        producer.join().unwrap();
    }
}
