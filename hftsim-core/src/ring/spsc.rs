//! Single-Producer Single-Consumer ring buffer
//!
//! Fixed-capacity, lock-free circular buffer for handing values from one
//! thread to exactly one other thread.
//!
//! ## Memory layout
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ head  (CachePadded, producer)│  written only by the producer
//! ├──────────────────────────────┤
//! │ tail  (CachePadded, consumer)│  written only by the consumer
//! ├──────────────────────────────┤
//! │ slots [Slot<T>; CAPACITY]    │  each slot 64-byte aligned
//! └──────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `head`, `tail` ∈ `[0, CAPACITY)`; wrapping uses `& (CAPACITY - 1)`
//! - occupied = `(head - tail) & (CAPACITY - 1)`
//! - full when `(head + 1) & mask == tail`: one slot is kept as a sentinel,
//!   so usable capacity is `CAPACITY - 1`
//! - a slot in `[tail, head)` is initialised and owned by the consumer side;
//!   every other slot is uninitialised and owned by the producer side
//!
//! ## Ordering
//! The slot write happens-before the `Release` store of `head`, which the
//! consumer observes with `Acquire` before reading the slot. Symmetrically
//! the slot read happens-before the `Release` store of `tail` that frees it
//! for the producer. Each side loads its own cursor `Relaxed`.
//! Statistics are `Relaxed` and advisory.
//!
//! Capacity is checked at compile time:
//!
//! ```compile_fail
//! use hftsim_core::ring::SpscRingBuffer;
//! let ring = SpscRingBuffer::<u64, 1000>::new(); // not a power of two
//! ```

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

use crate::config::constants::DEFAULT_RING_CAPACITY;
use crate::perf::metrics::{Counter, HighWaterMark};

/// One storage slot, aligned to its own cache line
#[repr(align(64))]
struct Slot<T>(UnsafeCell<MaybeUninit<T>>);

/// Advisory counters shared by every handle of one ring
#[derive(Debug)]
struct RingCounters {
    pushed: Counter,
    dropped: Counter,
    popped: Counter,
    high_water_mark: HighWaterMark,
    capacity: usize,
}

struct RingInner<T, const CAPACITY: usize> {
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    slots: Box<[Slot<T>]>,
    counters: Arc<RingCounters>,
}

// SAFETY: slots are only touched through `push` (single producer) and
// `pop` (single consumer); the public handles make a second producer or
// consumer unrepresentable. Values cross threads, hence `T: Send`.
unsafe impl<T: Send, const CAPACITY: usize> Sync for RingInner<T, CAPACITY> {}

impl<T, const CAPACITY: usize> RingInner<T, CAPACITY> {
    /// Index mask; evaluating it rejects bad capacities at compile time
    const MASK: usize = {
        assert!(
            CAPACITY >= 2 && CAPACITY.is_power_of_two(),
            "ring capacity must be a power of two and at least 2"
        );
        CAPACITY - 1
    };

    fn new() -> Self {
        let _ = Self::MASK;
        let slots = (0..CAPACITY)
            .map(|_| Slot(UnsafeCell::new(MaybeUninit::uninit())))
            .collect();
        Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            slots,
            counters: Arc::new(RingCounters {
                pushed: Counter::new(),
                dropped: Counter::new(),
                popped: Counter::new(),
                high_water_mark: HighWaterMark::new(),
                capacity: CAPACITY,
            }),
        }
    }

    /// # Safety
    /// Must only be called from the single producer.
    #[inline(always)]
    unsafe fn push(&self, item: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) & Self::MASK;
        if next == self.tail.load(Ordering::Acquire) {
            self.counters.dropped.inc();
            return Err(item);
        }

        // SAFETY: `head` is outside `[tail, head)`, so the consumer does not
        // touch this slot until the Release store below publishes it.
        unsafe { (*self.slots[head].0.get()).write(item) };
        self.head.store(next, Ordering::Release);

        self.counters.pushed.inc();
        let occupied = next.wrapping_sub(self.tail.load(Ordering::Relaxed)) & Self::MASK;
        self.counters.high_water_mark.observe(occupied);
        Ok(())
    }

    /// # Safety
    /// Must only be called from the single consumer.
    #[inline(always)]
    unsafe fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: `tail` is inside `[tail, head)`; the Acquire load above
        // synchronises with the producer's Release store after the write.
        let item = unsafe { (*self.slots[tail].0.get()).assume_init_read() };
        self.tail.store((tail + 1) & Self::MASK, Ordering::Release);

        self.counters.popped.inc();
        Some(item)
    }

    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    #[inline(always)]
    fn is_full(&self) -> bool {
        ((self.head.load(Ordering::Acquire) + 1) & Self::MASK)
            == self.tail.load(Ordering::Acquire)
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.head
            .load(Ordering::Acquire)
            .wrapping_sub(self.tail.load(Ordering::Acquire))
            & Self::MASK
    }
}

impl<T, const CAPACITY: usize> Drop for RingInner<T, CAPACITY> {
    fn drop(&mut self) {
        if !std::mem::needs_drop::<T>() {
            return;
        }
        let head = *self.head.get_mut();
        let mut tail = *self.tail.get_mut();
        while tail != head {
            // SAFETY: `[tail, head)` holds initialised values and no other
            // handle exists once the last Arc is dropped.
            unsafe { self.slots[tail].0.get_mut().assume_init_drop() };
            tail = (tail + 1) & Self::MASK;
        }
    }
}

/// Lock-free SPSC ring buffer with a compile-time power-of-two capacity
///
/// Owned form: both ends are available through `&mut self`, which is
/// convenient on a single thread. Call [`split`](Self::split) to obtain a
/// [`RingProducer`] and a [`RingConsumer`] for two different threads.
///
/// # Example
/// ```
/// use hftsim_core::ring::SpscRingBuffer;
///
/// let mut ring = SpscRingBuffer::<u32, 4>::new();
/// assert!(ring.try_push(1).is_ok());
/// assert_eq!(ring.try_pop(), Some(1));
/// assert_eq!(ring.try_pop(), None);
/// ```
pub struct SpscRingBuffer<T, const CAPACITY: usize = DEFAULT_RING_CAPACITY> {
    inner: Arc<RingInner<T, CAPACITY>>,
}

impl<T: Send, const CAPACITY: usize> SpscRingBuffer<T, CAPACITY> {
    /// Allocate all slots up front; nothing is allocated afterwards
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RingInner::new()),
        }
    }

    /// Store `item` at the head
    ///
    /// On a full buffer the item is handed back in `Err`, the dropped
    /// counter is incremented and nothing else changes. Never blocks.
    #[inline(always)]
    pub fn try_push(&mut self, item: T) -> Result<(), T> {
        // SAFETY: `&mut self` makes this the only producer.
        unsafe { self.inner.push(item) }
    }

    /// Take the value at the tail, or `None` when empty. Never blocks.
    #[inline(always)]
    pub fn try_pop(&mut self) -> Option<T> {
        // SAFETY: `&mut self` makes this the only consumer.
        unsafe { self.inner.pop() }
    }

    /// Separate the two ends for use on two threads
    pub fn split(self) -> (RingProducer<T, CAPACITY>, RingConsumer<T, CAPACITY>) {
        (
            RingProducer {
                inner: Arc::clone(&self.inner),
            },
            RingConsumer { inner: self.inner },
        )
    }
}

impl<T, const CAPACITY: usize> SpscRingBuffer<T, CAPACITY> {
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// True when one more push would fail
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Occupied slots
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Number of slots, including the sentinel
    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    /// Maximum number of values held at once (`CAPACITY - 1`)
    pub const fn usable_capacity(&self) -> usize {
        CAPACITY - 1
    }

    pub fn dropped_count(&self) -> u64 {
        self.inner.counters.dropped.get()
    }

    pub fn pushed_count(&self) -> u64 {
        self.inner.counters.pushed.get()
    }

    pub fn popped_count(&self) -> u64 {
        self.inner.counters.popped.get()
    }

    pub fn high_water_mark(&self) -> usize {
        self.inner.counters.high_water_mark.get()
    }

    /// Read-only statistics handle usable from any thread
    pub fn stats(&self) -> RingStats {
        RingStats {
            counters: Arc::clone(&self.inner.counters),
        }
    }
}

impl<T: Send, const CAPACITY: usize> Default for SpscRingBuffer<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> fmt::Debug for SpscRingBuffer<T, CAPACITY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpscRingBuffer")
            .field("capacity", &CAPACITY)
            .field("len", &self.len())
            .finish()
    }
}

/// Producing end of a split ring. Not `Clone`: there is exactly one.
pub struct RingProducer<T, const CAPACITY: usize = DEFAULT_RING_CAPACITY> {
    inner: Arc<RingInner<T, CAPACITY>>,
}

impl<T: Send, const CAPACITY: usize> RingProducer<T, CAPACITY> {
    /// See [`SpscRingBuffer::try_push`]
    #[inline(always)]
    pub fn try_push(&mut self, item: T) -> Result<(), T> {
        // SAFETY: the producer handle is unique and `&mut self` is exclusive.
        unsafe { self.inner.push(item) }
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn stats(&self) -> RingStats {
        RingStats {
            counters: Arc::clone(&self.inner.counters),
        }
    }
}

/// Consuming end of a split ring. Not `Clone`: there is exactly one.
pub struct RingConsumer<T, const CAPACITY: usize = DEFAULT_RING_CAPACITY> {
    inner: Arc<RingInner<T, CAPACITY>>,
}

impl<T: Send, const CAPACITY: usize> RingConsumer<T, CAPACITY> {
    /// See [`SpscRingBuffer::try_pop`]
    #[inline(always)]
    pub fn try_pop(&mut self) -> Option<T> {
        // SAFETY: the consumer handle is unique and `&mut self` is exclusive.
        unsafe { self.inner.pop() }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn stats(&self) -> RingStats {
        RingStats {
            counters: Arc::clone(&self.inner.counters),
        }
    }
}

/// Cloneable view of a ring's counters
///
/// Safe to read from any thread; values are approximate while the ring is
/// in use.
#[derive(Debug, Clone)]
pub struct RingStats {
    counters: Arc<RingCounters>,
}

impl RingStats {
    pub fn pushed(&self) -> u64 {
        self.counters.pushed.get()
    }

    pub fn dropped(&self) -> u64 {
        self.counters.dropped.get()
    }

    pub fn popped(&self) -> u64 {
        self.counters.popped.get()
    }

    pub fn high_water_mark(&self) -> usize {
        self.counters.high_water_mark.get()
    }

    pub fn capacity(&self) -> usize {
        self.counters.capacity
    }

    pub fn snapshot(&self) -> RingSnapshot {
        RingSnapshot {
            pushed: self.pushed(),
            popped: self.popped(),
            dropped: self.dropped(),
            high_water_mark: self.high_water_mark(),
            capacity: self.capacity(),
        }
    }
}

/// Point-in-time copy of ring statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingSnapshot {
    pub pushed: u64,
    pub popped: u64,
    pub dropped: u64,
    pub high_water_mark: usize,
    pub capacity: usize,
}

impl RingSnapshot {
    /// Values pushed but not yet popped
    pub fn in_flight(&self) -> u64 {
        self.pushed.saturating_sub(self.popped)
    }

    /// High-water mark as a fraction of usable capacity
    pub fn peak_utilization(&self) -> f64 {
        let usable = self.capacity.saturating_sub(1);
        if usable == 0 {
            0.0
        } else {
            self.high_water_mark as f64 / usable as f64
        }
    }
}
