//! SPSC ring buffer behaviour
//!
//! These tests verify:
//! 1. Boundary behaviour at small capacities (usable = C - 1)
//! 2. FIFO order and drop accounting under overflow
//! 3. Model equivalence against a VecDeque for arbitrary push/pop runs
//! 4. Lossless, ordered transfer across two threads

use hftsim_core::core::Message;
use hftsim_core::ring::SpscRingBuffer;
use hftsim_core::testing::add_order;

#[cfg(test)]
mod capacity_boundaries {
    use super::*;

    fn fill_and_check<const C: usize>() {
        let mut ring = SpscRingBuffer::<u32, C>::new();
        assert!(ring.is_empty());
        assert!(!ring.is_full());

        for i in 0..(C - 1) as u32 {
            assert!(ring.try_push(i).is_ok());
            assert_eq!(ring.is_full(), i as usize + 1 == C - 1);
        }
        assert_eq!(ring.try_push(999), Err(999));
        assert_eq!(ring.len(), C - 1);
    }

    /// Test: Every supported shape reports empty, then full at C - 1
    #[test]
    fn test_fresh_and_full_across_capacities() {
        fill_and_check::<2>();
        fill_and_check::<4>();
        fill_and_check::<8>();
        fill_and_check::<64>();
        fill_and_check::<1024>();
    }

    /// Test: Capacity 2 holds exactly one item
    #[test]
    fn test_capacity_two() {
        let mut ring = SpscRingBuffer::<u8, 2>::new();
        assert_eq!(ring.usable_capacity(), 1);

        for round in 0..10u8 {
            assert!(ring.try_push(round).is_ok());
            assert!(ring.is_full());
            assert_eq!(ring.try_push(round), Err(round));
            assert_eq!(ring.try_pop(), Some(round));
            assert!(ring.is_empty());
            assert_eq!(ring.try_pop(), None);
        }
        assert_eq!(ring.dropped_count(), 10);
        assert_eq!(ring.high_water_mark(), 1);
    }
}

#[cfg(test)]
mod market_scenario {
    use super::*;

    /// Test: Capacity 4 with four symbols; the fourth is dropped
    #[test]
    fn test_aapl_goog_msft_tsla() {
        let mut ring = SpscRingBuffer::<Message, 4>::new();

        assert!(ring.try_push(add_order("AAPL", 150.0, 100, 1)).is_ok());
        assert!(ring.try_push(add_order("GOOG", 2800.0, 50, 2)).is_ok());
        assert!(ring.try_push(add_order("MSFT", 300.0, 25, 3)).is_ok());

        let rejected = ring.try_push(add_order("TSLA", 700.0, 10, 4)).unwrap_err();
        assert_eq!(rejected.symbol_str(), "TSLA");
        assert!(ring.is_full());
        assert_eq!(ring.dropped_count(), 1);

        let popped: Vec<String> = std::iter::from_fn(|| ring.try_pop())
            .map(|m| m.symbol_str().into_owned())
            .collect();
        assert_eq!(popped, vec!["AAPL", "GOOG", "MSFT"]);
        assert!(ring.try_pop().is_none());

        assert_eq!(ring.pushed_count(), 3);
        assert_eq!(ring.popped_count(), 3);
        assert_eq!(ring.high_water_mark(), 3);
    }

    /// Test: Failed pushes never disturb stored content
    #[test]
    fn test_overflow_preserves_contents() {
        let mut ring = SpscRingBuffer::<Message, 4>::new();
        for seq in 1..=3 {
            ring.try_push(add_order("AAPL", 150.0, 100, seq)).unwrap();
        }
        for seq in 4..=10 {
            assert!(ring.try_push(add_order("TSLA", 700.0, 10, seq)).is_err());
        }
        assert_eq!(ring.dropped_count(), 7);

        let seqs: Vec<u64> = std::iter::from_fn(|| ring.try_pop())
            .map(|m| m.sequence)
            .collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }
}

#[cfg(test)]
mod model_based {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    enum Op {
        Push(u32),
        Pop,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![any::<u32>().prop_map(Op::Push), Just(Op::Pop)]
    }

    proptest! {
        /// Test: Ring agrees with an unbounded queue capped at C - 1
        #[test]
        fn prop_matches_vecdeque(ops in proptest::collection::vec(op(), 0..500)) {
            let mut ring = SpscRingBuffer::<u32, 8>::new();
            let mut model = VecDeque::new();
            let mut drops = 0u64;

            for op in ops {
                match op {
                    Op::Push(v) => {
                        if model.len() < 7 {
                            prop_assert!(ring.try_push(v).is_ok());
                            model.push_back(v);
                        } else {
                            prop_assert_eq!(ring.try_push(v), Err(v));
                            drops += 1;
                        }
                    }
                    Op::Pop => prop_assert_eq!(ring.try_pop(), model.pop_front()),
                }
                prop_assert_eq!(ring.len(), model.len());
                prop_assert_eq!(ring.is_empty(), model.is_empty());
                prop_assert_eq!(ring.is_full(), model.len() == 7);
            }
            prop_assert_eq!(ring.dropped_count(), drops);
        }
    }
}

#[cfg(test)]
mod cross_thread {
    use super::*;
    use std::thread;

    /// Test: One producer thread, one consumer thread, nothing lost or reordered
    #[test]
    fn test_ordered_transfer() {
        const COUNT: u64 = 200_000;
        let (mut producer, mut consumer) = SpscRingBuffer::<Message, 1024>::new().split();
        let stats = producer.stats();

        let writer = thread::spawn(move || {
            for seq in 1..=COUNT {
                let mut msg = add_order("AAPL", 150.0, 100, seq);
                loop {
                    match producer.try_push(msg) {
                        Ok(()) => break,
                        Err(back) => {
                            msg = back;
                            std::hint::spin_loop();
                        }
                    }
                }
            }
        });

        let reader = thread::spawn(move || {
            let mut expected = 1;
            while expected <= COUNT {
                if let Some(msg) = consumer.try_pop() {
                    assert_eq!(msg.sequence, expected);
                    assert_eq!(msg.symbol_str(), "AAPL");
                    expected += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
        });

        writer.join().unwrap();
        reader.join().unwrap();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.pushed, COUNT);
        assert_eq!(snapshot.popped, COUNT);
        assert_eq!(snapshot.in_flight(), 0);
        assert!(snapshot.high_water_mark <= 1023);
    }

    /// Test: Items still queued are dropped with the ring
    #[test]
    fn test_leftovers_dropped() {
        use std::sync::Arc;

        let token = Arc::new(());
        {
            let (mut producer, _consumer) = SpscRingBuffer::<Arc<()>, 8>::new().split();
            for _ in 0..5 {
                producer.try_push(Arc::clone(&token)).unwrap();
            }
            assert_eq!(Arc::strong_count(&token), 6);
        }
        assert_eq!(Arc::strong_count(&token), 1);
    }
}
