/*
 *  edge_queue.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  FIFO of edge events crossing from the interrupt thread to consumers
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

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// A recorded transition of a binary input signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    pub high: bool,
}

impl EdgeEvent {
    pub fn new(high: bool) -> Self {
        Self { high }
    }
}

/// Unbounded FIFO of edge events
///
/// One producer (the interrupt callback) pushes, one or more consumers pop.
/// Pop order is push order. `push` takes the lock for a `VecDeque::push_back`
/// only, so the producer never waits on a consumer.
#[derive(Debug, Default)]
pub struct EdgeQueue {
    events: Mutex<VecDeque<EdgeEvent>>,
    available: Condvar,
    notify: Notify,
}

impl EdgeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> MutexGuard<'_, VecDeque<EdgeEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event; never blocks on consumers and never drops
    pub fn push(&self, event: EdgeEvent) {
        self.events().push_back(event);
        self.available.notify_one();
        self.notify.notify_one();
    }

    pub fn pop_nonblocking(&self) -> Option<EdgeEvent> {
        self.events().pop_front()
    }

    /// Park the calling thread until an event is available
    ///
    /// Do not call this from an async task, use [`EdgeQueue::recv`] there.
    pub fn pop_blocking(&self) -> EdgeEvent {
        let mut events = self.events();
        loop {
            if let Some(event) = events.pop_front() {
                return event;
            }
            events = self
                .available
                .wait(events)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Async pop: suspends the task, not the runtime thread
    pub async fn recv(&self) -> EdgeEvent {
        loop {
            if let Some(event) = self.pop_nonblocking() {
                return event;
            }
            // notify_one leaves a permit when nobody is waiting, so a push
            // landing between the pop and this await is not lost
            self.notify.notified().await;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }
}
