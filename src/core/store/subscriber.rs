// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::Event;
use crossbeam_channel::{Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};

/// A bounded inbox handed out by `subscribe_all`/`subscribe_stream`. Delivery
/// failure (full or disconnected) invalidates the handle rather than blocking or
/// retrying; the store drops invalid subscribers on its next delivery sweep.
pub struct Subscriber {
    sender: Sender<Event>,
    alive: AtomicBool,
}

impl Subscriber {
    pub fn new(sender: Sender<Event>) -> Self {
        Self {
            sender,
            alive: AtomicBool::new(true),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Attempt delivery; marks the subscriber dead on the first failure.
    pub fn try_deliver(&self, event: Event) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.alive.store(false, Ordering::Relaxed);
                false
            }
        }
    }
}
