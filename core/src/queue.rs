//! The bounded, overwrite-on-full queue used as the Input Buffer's output
//! slot (§4.5): capacity 2, FIFO, the oldest item dropped once a third
//! write arrives. A small hand-rolled `Mutex`-guarded ring: readers poll,
//! they never block on empty.

use ::std::collections::VecDeque;
use ::std::sync::Mutex;

pub struct SlotQueue<T> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> SlotQueue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "a slot queue needs at least one slot");
        SlotQueue {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Pushes `item`, dropping the oldest queued item if this would
    /// exceed capacity.
    pub fn push(&self, item: T) {
        let mut queue = self.inner.lock().unwrap();
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(item);
    }

    /// Non-blocking pop of the oldest queued item, if any.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().unwrap().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
