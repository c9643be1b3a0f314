//! A recycle pool for reader iterators.
//!
//! Decoding many short streams churns through iterator allocations (the
//! annotation buffer in particular); a pool lets closed iterators be revived
//! with [`ReaderIterator::reset`] instead. The pool is a thread-safe sink:
//! iterators drawn from it return themselves on `close`.

use std::io::Read;
use std::sync::{Arc, Mutex};

use crate::decoder::ReaderIterator;
use crate::options::Options;

/// A bounded, thread-safe pool of recycled [`ReaderIterator`]s.
pub struct ReaderIteratorPool<R: Read> {
    options: Options,
    capacity: usize,
    idle: Mutex<Vec<ReaderIterator<R>>>,
}

impl<R: Read> ReaderIteratorPool<R> {
    /// Creates a pool holding at most `capacity` idle iterators, all
    /// configured with `options`.
    pub fn new(options: Options, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            options,
            capacity,
            idle: Mutex::new(Vec::with_capacity(capacity)),
        })
    }

    /// Returns an iterator decoding `reader`: a recycled one when available,
    /// freshly constructed otherwise. Either way the iterator is wired back
    /// to this pool, so `close` returns it here.
    pub fn get(self: &Arc<Self>, reader: R) -> ReaderIterator<R> {
        let recycled = self.idle.lock().unwrap().pop();
        match recycled {
            Some(mut it) => {
                it.reset(reader);
                it
            }
            None => ReaderIterator::new_pooled(
                reader,
                self.options.clone(),
                Arc::downgrade(self),
            ),
        }
    }

    /// Number of idle iterators currently held.
    pub fn idle(&self) -> usize {
        self.idle.lock().unwrap().len()
    }

    /// Accepts a closed iterator back; beyond capacity it is dropped.
    pub(crate) fn put(&self, it: ReaderIterator<R>) {
        let mut idle = self.idle.lock().unwrap();
        if idle.len() < self.capacity {
            idle.push(it);
        }
    }
}
