//! One-slot blocking handoff between threads.
//!
//! [`Channel`] moves ownership of a single value from any number of producer
//! threads to one consumer. A producer blocks while the previous value is still
//! unconsumed; the consumer blocks while the slot is empty. This is the only
//! synchronization point between the scheduler thread and the rest of the
//! process.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Single-slot, multi-producer / single-consumer channel.
pub struct Channel<T> {
    slot: Mutex<Option<T>>,
    filled: Condvar,
    emptied: Condvar,
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Channel<T> {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            filled: Condvar::new(),
            emptied: Condvar::new(),
        }
    }

    /// Places `value` in the slot, waiting until the slot is free.
    pub fn send(&self, value: T) {
        let mut slot = self.slot.lock();
        while slot.is_some() {
            self.emptied.wait(&mut slot);
        }
        *slot = Some(value);
        self.filled.notify_one();
    }

    /// Places `value` in the slot only if it is free.
    ///
    /// Returns the value back when the slot is occupied.
    pub fn try_send(&self, value: T) -> Result<(), T> {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return Err(value);
        }
        *slot = Some(value);
        self.filled.notify_one();
        Ok(())
    }

    /// Like [`send`](Self::send) but gives up after `timeout`, handing the
    /// value back.
    pub fn send_timeout(&self, value: T, timeout: Duration) -> Result<(), T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        while slot.is_some() {
            if self.emptied.wait_until(&mut slot, deadline).timed_out() && slot.is_some() {
                return Err(value);
            }
        }
        *slot = Some(value);
        self.filled.notify_one();
        Ok(())
    }

    /// Places `value` in the slot without waiting, returning any value it
    /// replaced.
    pub fn send_force(&self, value: T) -> Option<T> {
        let mut slot = self.slot.lock();
        let previous = slot.replace(value);
        self.filled.notify_one();
        previous
    }

    /// Takes the value out of the slot, waiting until one arrives.
    pub fn recv(&self) -> T {
        let mut slot = self.slot.lock();
        loop {
            if let Some(value) = slot.take() {
                self.emptied.notify_one();
                return value;
            }
            self.filled.wait(&mut slot);
        }
    }

    /// Like [`recv`](Self::recv) but gives up after `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        loop {
            if let Some(value) = slot.take() {
                self.emptied.notify_one();
                return Some(value);
            }
            if self.filled.wait_until(&mut slot, deadline).timed_out() {
                let value = slot.take();
                if value.is_some() {
                    self.emptied.notify_one();
                }
                return value;
            }
        }
    }

    /// Takes the value out of the slot if there is one.
    pub fn try_recv(&self) -> Option<T> {
        let value = self.slot.lock().take();
        if value.is_some() {
            self.emptied.notify_one();
        }
        value
    }
}
