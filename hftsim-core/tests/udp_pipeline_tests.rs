//! End-to-end loopback pipeline
//!
//! replayer -> UDP -> listener -> ring -> consumer, all on localhost with
//! an ephemeral port.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use hftsim_core::core::{wire, Message, WIRE_SIZE};
use hftsim_core::engine::RingBufferConsumer;
use hftsim_core::net::{push_or_drop, UdpListener, UdpReplayer};
use hftsim_core::perf::CoreAssignment;
use hftsim_core::ring::SpscRingBuffer;
use hftsim_core::testing::{add_order, captured, wait_until};

fn loopback(addr: SocketAddr) -> SocketAddr {
    (Ipv4Addr::LOCALHOST, addr.port()).into()
}

#[cfg(test)]
mod listener_decoding {
    use super::*;

    /// Test: Exact-size datagrams are decoded; everything else is discarded
    #[test]
    fn test_wrong_size_datagrams_dropped() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let mut listener = UdpListener::new(0, CoreAssignment::Unpinned, move |m: &Message| {
            sink.lock().push(*m)
        })
        .unwrap();
        listener.start().unwrap();
        let dest = loopback(listener.local_addr().unwrap());
        let stats = listener.stats();

        let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let msg = add_order("AAPL", 150.25, 100, 42);
        let payload = wire::encode(&msg);

        sender.send_to(&payload[..WIRE_SIZE - 1], dest).unwrap();
        sender.send_to(&[0u8; WIRE_SIZE + 1], dest).unwrap();
        sender.send_to(b"hello", dest).unwrap();
        sender.send_to(&payload, dest).unwrap();

        assert!(wait_until(Duration::from_secs(2), || stats.received() == 4));
        listener.stop();

        assert_eq!(stats.discarded(), 3);
        assert_eq!(stats.forwarded(), 1);
        let got = received.lock();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0], msg);
    }
}

#[cfg(test)]
mod full_pipeline {
    use super::*;

    /// Test: Every replayed message reaches the consumer in order
    #[test]
    fn test_replay_to_consumer() {
        const COUNT: usize = 200;

        let (producer, ring) = SpscRingBuffer::<Message, 1024>::new().split();
        let ring_stats = producer.stats();

        let mut listener =
            UdpListener::new(0, CoreAssignment::Unpinned, push_or_drop(producer)).unwrap();
        listener.start().unwrap();
        let dest = loopback(listener.local_addr().unwrap());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut consumer =
            RingBufferConsumer::new(ring, move |m: &Message| sink.lock().push(m.sequence));
        consumer.start(CoreAssignment::Unpinned).unwrap();

        // 10 µs apart at 1x: fast, but still paced
        let timestamps: Vec<u64> = (0..COUNT as u64).map(|i| i * 10_000).collect();
        let mut replayer = UdpReplayer::new(dest, 1.0, CoreAssignment::Unpinned)
            .unwrap()
            .with_messages(captured(&timestamps));
        replayer.start().unwrap();

        assert!(wait_until(Duration::from_secs(5), || replayer.finished()));
        let consumer_stats = consumer.stats();
        // Loopback UDP can still drop under load; wait for what arrived
        let listener_stats = listener.stats();
        assert!(wait_until(Duration::from_secs(2), || {
            consumer_stats.processed() == listener_stats.forwarded()
                && listener_stats.forwarded() > 0
        }));

        replayer.stop();
        listener.stop();
        consumer.stop();

        let seqs = seen.lock();
        assert!(!seqs.is_empty());
        assert!(seqs.windows(2).all(|w| w[0] < w[1]), "sequence out of order");
        assert_eq!(ring_stats.dropped(), 0);
        assert_eq!(replayer.stats().sent(), COUNT as u64);
    }
}
