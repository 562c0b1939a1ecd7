//! Fixed-capacity FIFO over a ring of `MaybeUninit<T>` slots.
//!
//! # Design
//!
//! The ring keeps four indices:
//!
//! - `first`: slot the next pop reads from (consumer side only)
//! - `last`: slot the next push writes to (producer side only)
//! - `pushed` / `popped`: total pushes and pops since construction
//!
//! The size is `pushed - popped` computed with wrapping arithmetic, so the
//! counters may wrap past `usize::MAX` as long as the real size never exceeds
//! the capacity. `last` and `pushed` share one cache line and `first` and
//! `popped` another, so the two sides never contend on a line they both
//! write. `first` and `last` are kept separately instead of being
//! derived as `counter % capacity`, because that mapping breaks on a counter
//! wrap when the capacity is not a power of two.
//!
//! # Ordering
//!
//! ```text
//! Producer writes slot, then Release-stores pushed  →  consumer Acquire-loads pushed, then reads slot
//! Consumer reads slot, then Release-stores popped   →  producer Acquire-loads popped, then writes slot
//! ```
//!
//! # Roles
//!
//! [`RingFifo`] methods take `&mut self` for anything that mutates, so a
//! single owner can use every operation. [`RingFifo::split`] hands out one
//! [`Producer`] and one [`Consumer`] that can live on two different threads.
//! `forced_push` both pops and pushes and is only available on the owner.
//!
//! # Storage
//!
//! Slots either borrow a caller-supplied `&mut [MaybeUninit<T>]` or are
//! allocated by the FIFO. Remaining elements are dropped when the FIFO is
//! dropped in both cases, and borrowed memory is never freed.

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;
use log::trace;

use crate::{UtilError, UtilResult};

type Slot<T> = UnsafeCell<MaybeUninit<T>>;

/// Backing memory of a ring.
enum Storage<'a, T> {
    /// Caller-supplied slots, never freed by the ring.
    Borrowed(&'a [Slot<T>]),
    /// Slots allocated and freed by the ring.
    Owned(Box<[Slot<T>]>),
}

impl<T> Storage<'_, T> {
    fn slots(&self) -> &[Slot<T>] {
        match self {
            Storage::Borrowed(slots) => slots,
            Storage::Owned(slots) => slots,
        }
    }
}

/// Views a uniquely borrowed slice as a slice of cells.
fn slots_from_mut<T>(buffer: &mut [MaybeUninit<T>]) -> &[Slot<T>] {
    let len = buffer.len();
    let ptr = buffer.as_mut_ptr().cast::<Slot<T>>();
    // SAFETY: `UnsafeCell<U>` has the same in-memory representation as `U`.
    // The unique borrow is consumed here, so nothing else can access the
    // memory while the returned shared borrow is alive.
    unsafe { std::slice::from_raw_parts(ptr, len) }
}

/// Shared ring state behind [`RingFifo`], [`Producer`] and [`Consumer`].
///
/// # Invariants
///
/// - `capacity == storage.slots().len()` and `capacity > 0`.
/// - `0 <= pushed - popped <= capacity` (wrapping).
/// - The `pushed - popped` slots starting at `first` (mod capacity) are
///   initialized. All other slots are uninitialized.
/// - `last == (first + pushed - popped) % capacity`.
struct Ring<'a, T> {
    storage: Storage<'a, T>,
    capacity: usize,
    producer: CachePadded<ProducerIndices>,
    consumer: CachePadded<ConsumerIndices>,
}

/// Written only by the producer side.
#[derive(Default)]
struct ProducerIndices {
    last: AtomicUsize,
    pushed: AtomicUsize,
}

/// Written only by the consumer side.
#[derive(Default)]
struct ConsumerIndices {
    first: AtomicUsize,
    popped: AtomicUsize,
}

impl<'a, T> Ring<'a, T> {
    fn new(storage: Storage<'a, T>) -> Self {
        let capacity = storage.slots().len();
        debug_assert!(capacity > 0);
        Ring {
            storage,
            capacity,
            producer: CachePadded::default(),
            consumer: CachePadded::default(),
        }
    }

    fn len(&self) -> usize {
        let popped = self.consumer.popped.load(Ordering::Acquire);
        let pushed = self.producer.pushed.load(Ordering::Acquire);
        pushed.wrapping_sub(popped)
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Clones `item` into the slot at `last`.
    ///
    /// # Safety
    ///
    /// At most one thread may call producer-side methods at a time.
    unsafe fn push(&self, item: &T) -> bool
    where
        T: Clone,
    {
        let pushed = self.producer.pushed.load(Ordering::Relaxed);
        let popped = self.consumer.popped.load(Ordering::Acquire);
        if pushed.wrapping_sub(popped) >= self.capacity {
            return false;
        }

        let last = self.producer.last.load(Ordering::Relaxed);
        let value = item.clone();
        // SAFETY: the ring is not full, so `last` lies outside the initialized
        // range and the consumer does not read it until `pushed` advances.
        unsafe { (*self.storage.slots()[last].get()).write(value) };

        self.producer.last.store((last + 1) % self.capacity, Ordering::Relaxed);
        self.producer.pushed.store(pushed.wrapping_add(1), Ordering::Release);
        true
    }

    /// Returns the oldest element without removing it.
    ///
    /// # Safety
    ///
    /// No consumer-side method may remove elements while the returned
    /// reference is alive.
    unsafe fn first(&self) -> Option<&T> {
        let popped = self.consumer.popped.load(Ordering::Relaxed);
        let pushed = self.producer.pushed.load(Ordering::Acquire);
        if pushed == popped {
            return None;
        }

        let first = self.consumer.first.load(Ordering::Relaxed);
        // SAFETY: the ring is not empty, so the slot at `first` is initialized
        // and the producer does not overwrite it until `popped` advances.
        Some(unsafe { (*self.storage.slots()[first].get()).assume_init_ref() })
    }

    /// Moves the oldest element out of the ring.
    ///
    /// # Safety
    ///
    /// At most one thread may call consumer-side methods at a time.
    unsafe fn take(&self) -> Option<T> {
        let popped = self.consumer.popped.load(Ordering::Relaxed);
        let pushed = self.producer.pushed.load(Ordering::Acquire);
        if pushed == popped {
            return None;
        }

        let first = self.consumer.first.load(Ordering::Relaxed);
        // SAFETY: see `first`. The slot is treated as uninitialized from here
        // on because `popped` is advanced right after the read.
        let value = unsafe { (*self.storage.slots()[first].get()).assume_init_read() };

        self.consumer.first.store((first + 1) % self.capacity, Ordering::Relaxed);
        self.consumer.popped.store(popped.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    /// Visits elements from oldest to newest until `f` returns false.
    ///
    /// # Safety
    ///
    /// Same as [`Ring::first`].
    unsafe fn for_each<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&T, usize) -> bool,
    {
        let popped = self.consumer.popped.load(Ordering::Relaxed);
        let pushed = self.producer.pushed.load(Ordering::Acquire);
        let size = pushed.wrapping_sub(popped);
        let first = self.consumer.first.load(Ordering::Relaxed);
        let slots = self.storage.slots();

        let mut visited = 0;
        while visited < size {
            let index = (first + visited) % self.capacity;
            // SAFETY: `index` lies within the initialized range observed above.
            let item = unsafe { (*slots[index].get()).assume_init_ref() };
            visited += 1;
            if !f(item, visited - 1) {
                break;
            }
        }
        visited
    }

    fn clear(&mut self) {
        // SAFETY: `&mut self` rules out any concurrent producer or consumer.
        while unsafe { self.take() }.is_some() {}
    }

    #[cfg(test)]
    fn with_counters(self, start: usize) -> Self {
        self.producer.pushed.store(start, Ordering::Relaxed);
        self.consumer.popped.store(start, Ordering::Relaxed);
        self
    }
}

impl<T> Drop for Ring<'_, T> {
    fn drop(&mut self) {
        self.clear();
    }
}

/// A bounded first-in, first-out queue over a fixed ring of slots.
///
/// Pushing into a full FIFO and popping from an empty one are ordinary
/// outcomes reported as `false` / `None`, never errors.
///
/// ```
/// use std::mem::MaybeUninit;
///
/// use libutils::fifo::RingFifo;
///
/// let mut backing = [MaybeUninit::<u32>::uninit(); 4];
/// let mut fifo = RingFifo::with_buffer(&mut backing).unwrap();
/// assert!(fifo.push(&7));
/// assert_eq!(fifo.peek_first(), Some(&7));
/// assert_eq!(fifo.get_and_pop(), 7);
/// assert!(fifo.is_empty());
/// ```
pub struct RingFifo<'a, T> {
    ring: Ring<'a, T>,
}

// SAFETY: the FIFO owns its elements and the only shared state is atomics, so
// moving it to another thread moves the elements with it.
unsafe impl<T: Send> Send for RingFifo<'_, T> {}

// SAFETY: every `&self` method either reads atomics or hands out `&T`.
unsafe impl<T: Sync> Sync for RingFifo<'_, T> {}

impl<'a, T> RingFifo<'a, T> {
    /// Creates an empty FIFO over caller-supplied slots.
    ///
    /// The capacity is `buffer.len()`. Fails with [`UtilError::NoBackingStore`]
    /// if the buffer has no slots.
    pub fn with_buffer(buffer: &'a mut [MaybeUninit<T>]) -> UtilResult<Self> {
        if buffer.is_empty() {
            return Err(UtilError::NoBackingStore);
        }
        Ok(RingFifo {
            ring: Ring::new(Storage::Borrowed(slots_from_mut(buffer))),
        })
    }

    /// Returns true if the FIFO holds no elements.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Returns true if the FIFO holds `capacity()` elements.
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Number of elements currently queued.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Maximum number of elements, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }

    /// Appends a clone of `item`.
    ///
    /// Returns false and leaves the FIFO unchanged if it is full.
    pub fn push(&mut self, item: &T) -> bool
    where
        T: Clone,
    {
        // SAFETY: `&mut self` makes this the only producer.
        unsafe { self.ring.push(item) }
    }

    /// Appends a clone of `item`, dropping the oldest element first if the
    /// FIFO is full.
    ///
    /// Returns true if an element was dropped to make room.
    ///
    /// # Panics
    ///
    /// Panics if the push fails right after room was made, which would mean
    /// the ring invariants are broken.
    pub fn forced_push(&mut self, item: &T) -> bool
    where
        T: Clone,
    {
        let dropped = self.is_full() && self.pop();
        if dropped {
            trace!("fifo full at {} elements, dropped oldest", self.capacity());
        }
        let inserted = self.push(item);
        assert!(inserted, "push into a ring with a free slot failed");
        dropped
    }

    /// Removes and drops the oldest element.
    ///
    /// Returns false if the FIFO is empty.
    pub fn pop(&mut self) -> bool {
        self.pop_first().is_some()
    }

    /// Removes the oldest element and returns it, or `None` if empty.
    pub fn pop_first(&mut self) -> Option<T> {
        // SAFETY: `&mut self` makes this the only consumer.
        unsafe { self.ring.take() }
    }

    /// Removes the oldest element and returns it.
    ///
    /// # Panics
    ///
    /// Panics if the FIFO is empty. Check [`RingFifo::is_empty`] first.
    pub fn get_and_pop(&mut self) -> T {
        match self.pop_first() {
            Some(item) => item,
            None => panic!("get_and_pop called on an empty fifo"),
        }
    }

    /// Returns the oldest element without removing it.
    pub fn peek_first(&self) -> Option<&T> {
        // SAFETY: removal requires `&mut self`, which the borrow excludes.
        unsafe { self.ring.first() }
    }

    /// Calls `f` with each element and its position, oldest first.
    ///
    /// Stops early when `f` returns false. Returns the number of elements
    /// visited, including the one that stopped the iteration.
    pub fn for_each<F>(&self, f: F) -> usize
    where
        F: FnMut(&T, usize) -> bool,
    {
        // SAFETY: removal requires `&mut self`, which the borrow excludes.
        unsafe { self.ring.for_each(f) }
    }

    /// Drops every queued element, leaving the FIFO empty.
    pub fn clear(&mut self) {
        self.ring.clear();
    }

    /// Splits the FIFO into a producer and a consumer handle.
    ///
    /// Both handles may be sent to different threads. The FIFO stays
    /// borrowed until both are dropped.
    pub fn split(&mut self) -> (Producer<'_, 'a, T>, Consumer<'_, 'a, T>) {
        (
            Producer { ring: &self.ring },
            Consumer { ring: &self.ring },
        )
    }
}

impl<T> RingFifo<'static, T> {
    /// Creates an empty FIFO with its own storage for `capacity` elements.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let slots = (0..capacity.get())
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        RingFifo {
            ring: Ring::new(Storage::Owned(slots)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RingFifo<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        self.for_each(|item, _| {
            list.entry(item);
            true
        });
        list.finish()
    }
}

/// Producer half of a split [`RingFifo`].
pub struct Producer<'r, 'a, T> {
    ring: &'r Ring<'a, T>,
}

// SAFETY: the producer only writes slots outside the initialized range and
// publishes them with a Release store.
unsafe impl<T: Send> Send for Producer<'_, '_, T> {}

impl<T> Producer<'_, '_, T> {
    /// Appends a clone of `item`. Returns false if the FIFO is full.
    pub fn push(&mut self, item: &T) -> bool
    where
        T: Clone,
    {
        // SAFETY: `split` creates exactly one producer and `&mut self`
        // prevents it from being used from two threads at once.
        unsafe { self.ring.push(item) }
    }

    /// Returns true if the FIFO is full.
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Number of elements currently queued.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true if the FIFO holds no elements.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Maximum number of elements.
    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }
}

/// Consumer half of a split [`RingFifo`].
pub struct Consumer<'r, 'a, T> {
    ring: &'r Ring<'a, T>,
}

// SAFETY: the consumer only reads initialized slots observed through an
// Acquire load and releases them with a Release store.
unsafe impl<T: Send> Send for Consumer<'_, '_, T> {}

impl<T> Consumer<'_, '_, T> {
    /// Removes and drops the oldest element. Returns false if empty.
    pub fn pop(&mut self) -> bool {
        self.pop_first().is_some()
    }

    /// Removes the oldest element and returns it, or `None` if empty.
    pub fn pop_first(&mut self) -> Option<T> {
        // SAFETY: `split` creates exactly one consumer and `&mut self`
        // prevents it from being used from two threads at once.
        unsafe { self.ring.take() }
    }

    /// Removes the oldest element and returns it.
    ///
    /// # Panics
    ///
    /// Panics if the FIFO is empty.
    pub fn get_and_pop(&mut self) -> T {
        match self.pop_first() {
            Some(item) => item,
            None => panic!("get_and_pop called on an empty fifo"),
        }
    }

    /// Returns the oldest element without removing it.
    pub fn peek_first(&self) -> Option<&T> {
        // SAFETY: removal goes through `&mut self` on the only consumer.
        unsafe { self.ring.first() }
    }

    /// Calls `f` with each element and its position, oldest first.
    ///
    /// Elements pushed while the iteration runs are not visited.
    pub fn for_each<F>(&self, f: F) -> usize
    where
        F: FnMut(&T, usize) -> bool,
    {
        // SAFETY: removal goes through `&mut self` on the only consumer.
        unsafe { self.ring.for_each(f) }
    }

    /// Returns true if the FIFO holds no elements.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Number of elements currently queued.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Maximum number of elements.
    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }
}
