//! Exclusive strategy ownership for the consumer thread
//!
//! The consumer callback owns the strategy outright, so the hot path never
//! takes a lock. When the drain loop exits and drops its callback, the
//! strategy is sent back to whoever holds the [`StrategyReturn`].

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::time::Duration;

use crate::core::Message;
use crate::engine::traits::Strategy;

/// Strategy moved into the consumer callback
pub struct StrategySink<S: Strategy + Send + 'static> {
    strategy: Option<S>,
    handback: SyncSender<S>,
}

/// Receiving end for a strategy released by its [`StrategySink`]
pub struct StrategyReturn<S> {
    rx: Receiver<S>,
}

impl<S: Strategy + Send + 'static> StrategySink<S> {
    pub fn new(strategy: S) -> (Self, StrategyReturn<S>) {
        let (handback, rx) = mpsc::sync_channel(1);
        (
            Self {
                strategy: Some(strategy),
                handback,
            },
            StrategyReturn { rx },
        )
    }

    #[inline(always)]
    pub fn on_message(&mut self, msg: &Message) {
        if let Some(strategy) = self.strategy.as_mut() {
            strategy.on_message(msg);
        }
    }

    /// Wrap into a consumer callback
    pub fn into_callback(mut self) -> impl FnMut(&Message) + Send + 'static {
        move |msg: &Message| self.on_message(msg)
    }
}

impl<S: Strategy + Send + 'static> Drop for StrategySink<S> {
    fn drop(&mut self) {
        if let Some(strategy) = self.strategy.take() {
            // Receiver gone means nobody wants the final report
            let _ = self.handback.send(strategy);
        }
    }
}

impl<S> StrategyReturn<S> {
    /// Take the strategy back once its sink has been dropped
    ///
    /// The consumer drops its callback before its thread exits, so after
    /// `RingBufferConsumer::stop` this returns immediately.
    pub fn reclaim(self, timeout: Duration) -> Option<S> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RingBufferConsumer;
    use crate::perf::cpu::CoreAssignment;
    use crate::ring::SpscRingBuffer;
    use crate::testing::helpers::{add_order, wait_until};

    #[derive(Default)]
    struct Tally(u64);

    impl Strategy for Tally {
        fn on_message(&mut self, _msg: &Message) {
            self.0 += 1;
        }

        fn name(&self) -> &'static str {
            "tally"
        }

        fn report(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_strategy_returned_after_consumer_stops() {
        let (mut producer, ring) = SpscRingBuffer::<Message, 16>::new().split();
        let (sink, pending) = StrategySink::new(Tally::default());

        let mut consumer = RingBufferConsumer::new(ring, sink.into_callback());
        consumer.start(CoreAssignment::Unpinned).unwrap();
        for seq in 1..=5 {
            producer.try_push(add_order("AAPL", 100.0, 10, seq)).unwrap();
        }
        let stats = consumer.stats();
        assert!(wait_until(Duration::from_secs(2), || stats.processed() == 5));
        consumer.stop();

        let tally = pending.reclaim(Duration::from_secs(1)).unwrap();
        assert_eq!(tally.0, 5);
    }

    #[test]
    fn test_boxed_strategy_round_trip() {
        let boxed: Box<dyn Strategy + Send> = Box::new(Tally::default());
        let (sink, pending) = StrategySink::new(boxed);
        let mut callback = sink.into_callback();
        callback(&add_order("MSFT", 300.0, 1, 1));
        drop(callback);

        let strategy = pending.reclaim(Duration::from_millis(100)).unwrap();
        assert_eq!(strategy.name(), "tally");
        assert_eq!(strategy.report(), "1");
    }

    #[test]
    fn test_sink_dropped_without_receiver() {
        let (sink, pending) = StrategySink::new(Tally::default());
        drop(pending);
        drop(sink);
    }
}
