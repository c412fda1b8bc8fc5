//! Lock-free bounded SPSC channel
//!
//! Fixed-capacity single-producer single-consumer queue used for all
//! cross-thread messaging (commands, events, chat). Push and pop never
//! block and never allocate, which is what lets the real-time and UI
//! sides talk to the session thread without priority inversion.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free SPSC ring with power-of-two capacity.
///
/// Thread safety contract:
///   - exactly one thread calls [`try_push`](Self::try_push) (producer)
///   - exactly one thread calls [`try_pop`](Self::try_pop) /
///     [`drain`](Self::drain) (consumer)
///   - producer and consumer may run concurrently
///
/// Any second producer or consumer violates the contract. One slot is kept
/// empty to distinguish full from empty, so a channel of capacity `N`
/// holds at most `N - 1` elements.
pub struct BoundedChannel<T, const N: usize> {
    slots: [UnsafeCell<MaybeUninit<T>>; N],
    /// Producer cursor: next slot to write.
    head: CachePadded<AtomicUsize>,
    /// Consumer cursor: next slot to read.
    tail: CachePadded<AtomicUsize>,
    /// Pushes rejected because the channel was full.
    rejected: AtomicUsize,
}

// Safe under the one-producer/one-consumer contract: each slot is written
// by the producer before the head store (Release) and read by the consumer
// after the head load (Acquire).
unsafe impl<T: Send, const N: usize> Send for BoundedChannel<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for BoundedChannel<T, N> {}

impl<T, const N: usize> BoundedChannel<T, N> {
    const CAPACITY_VALID: () = assert!(
        N.is_power_of_two() && N > 1,
        "BoundedChannel capacity must be a power of two >= 2"
    );
    const MASK: usize = N - 1;

    pub fn new() -> Self {
        // Forces the compile-time capacity check for this instantiation.
        let () = Self::CAPACITY_VALID;
        Self {
            slots: std::array::from_fn(|_| UnsafeCell::new(MaybeUninit::uninit())),
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            rejected: AtomicUsize::new(0),
        }
    }

    /// Push an element (producer only).
    ///
    /// Returns false and drops the value if the channel is full. Never
    /// blocks, never allocates.
    pub fn try_push(&self, value: T) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) & Self::MASK;

        // Full when advancing head would catch up to tail.
        if next == self.tail.load(Ordering::Acquire) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        unsafe {
            (*self.slots[head].get()).write(value);
        }
        self.head.store(next, Ordering::Release);
        true
    }

    /// Pop an element (consumer only).
    pub fn try_pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);

        // Empty when cursors are equal.
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        let value = unsafe { (*self.slots[tail].get()).assume_init_read() };
        self.tail.store((tail + 1) & Self::MASK, Ordering::Release);
        Some(value)
    }

    /// Drain all available elements in FIFO order (consumer only).
    ///
    /// Invokes the visitor once per element and returns the count drained.
    pub fn drain<F: FnMut(T)>(&self, mut visitor: F) -> usize {
        let mut count = 0;
        while let Some(value) = self.try_pop() {
            visitor(value);
            count += 1;
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Current number of queued elements.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail) & Self::MASK
    }

    /// Slot count. Usable capacity is one less (one slot stays empty to
    /// disambiguate full from empty).
    pub const fn capacity() -> usize {
        N
    }

    /// Number of pushes rejected because the channel was full.
    pub fn rejected_count(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl<T, const N: usize> Default for BoundedChannel<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for BoundedChannel<T, N> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}
