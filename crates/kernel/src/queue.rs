use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// FIFO of requests shared between the kernel (producer) and a worker pool
/// (consumers).
pub struct RequestQueue<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
}

impl<T> RequestQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    pub fn push(&self, item: T) {
        lock(&self.inner).items.push_back(item);
        self.available.notify_one();
    }

    /// Waits for the next request. Returns None once the queue is closed.
    pub fn pop_blocking(&self) -> Option<T> {
        let mut inner = lock(&self.inner);
        loop {
            if inner.closed {
                return None;
            }
            if let Some(item) = inner.items.pop_front() {
                return Some(item);
            }
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn try_pop(&self) -> Option<T> {
        lock(&self.inner).items.pop_front()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wakes every waiting worker and makes further `pop_blocking` calls return None.
    pub fn close(&self) {
        lock(&self.inner).closed = true;
        self.available.notify_all();
    }
}

impl<T: Clone> RequestQueue<T> {
    pub fn snapshot(&self) -> Vec<T> {
        lock(&self.inner).items.iter().cloned().collect()
    }
}

impl<T> fmt::Debug for RequestQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("RequestQueue")
            .field("pending", &inner.items.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

impl<T> Default for RequestQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_order() {
        let q = RequestQueue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.snapshot(), vec![1, 2, 3]);
        assert_eq!(q.try_pop(), Some(1));
        assert_eq!(q.pop_blocking(), Some(2));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn close_wakes_waiting_worker() {
        let q = Arc::new(RequestQueue::<u32>::new());
        let worker = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop_blocking())
        };
        q.close();
        assert_eq!(worker.join().ok().flatten(), None);
    }

    #[test]
    fn worker_receives_pushed_item() {
        let q = Arc::new(RequestQueue::new());
        let worker = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop_blocking())
        };
        q.push(7);
        assert_eq!(worker.join().ok().flatten(), Some(7));
    }
}
