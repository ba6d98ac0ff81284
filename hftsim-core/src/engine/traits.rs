//! Core engine traits

use crate::core::Message;

/// Strategy trait - fed one message at a time by the ring consumer
///
/// Implementations run on the consumer thread, on the hot path. Keep
/// `on_message` allocation-free and never block in it: a slow strategy
/// stalls draining and the ring starts dropping.
pub trait Strategy {
    /// Process one decoded market message
    fn on_message(&mut self, msg: &Message);

    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Human-readable summary of accumulated state
    fn report(&self) -> String;

    /// Reset strategy state
    fn reset(&mut self) {}
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    #[inline(always)]
    fn on_message(&mut self, msg: &Message) {
        (**self).on_message(msg)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn report(&self) -> String {
        (**self).report()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
