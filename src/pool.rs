//! Bounded free-list of scratch blocks.
//!
//! Guards must be handed back with [`PooledBlock::release`]. A guard that is
//! simply dropped is counted as leaked and its block is freed rather than
//! returned, so a missing `release` shows up in [`BlockPool::leaked`] instead
//! of being silently repaired.

use core::fmt;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

/// Pool of up to `capacity` reusable blocks.
pub struct BlockPool<B> {
    free: Mutex<Vec<B>>,
    template: B,
    capacity: usize,
    leaked: AtomicUsize,
}

impl<B: Default + Clone> BlockPool<B> {
    /// Creates an empty pool that retains at most `capacity` released blocks.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(capacity)),
            template: B::default(),
            capacity,
            leaked: AtomicUsize::new(0),
        }
    }

    /// Creates a pool already holding `capacity` default blocks.
    pub fn prefilled(capacity: usize) -> Self {
        let pool = Self::new(capacity);
        pool.free.lock().resize(capacity, B::default());
        pool
    }

    /// Takes a block out of the pool, or makes a new one if none is free.
    ///
    /// The block is reset to `B::default()` either way.
    pub fn acquire(&self) -> PooledBlock<'_, B> {
        let block = match self.free.lock().pop() {
            Some(mut block) => {
                block.clone_from(&self.template);
                block
            }
            None => B::default(),
        };
        PooledBlock {
            pool: self,
            block,
            released: false,
        }
    }

    /// Number of blocks waiting to be reused.
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Maximum number of blocks the pool retains.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of guards dropped without [`PooledBlock::release`].
    pub fn leaked(&self) -> usize {
        self.leaked.load(Ordering::Relaxed)
    }

    fn give_back(&self, block: B) {
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(block);
        }
    }
}

impl<B> fmt::Debug for BlockPool<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockPool")
            .field("available", &self.free.lock().len())
            .field("capacity", &self.capacity)
            .field("leaked", &self.leaked.load(Ordering::Relaxed))
            .finish()
    }
}

/// A block borrowed from a [`BlockPool`].
///
/// Dereferences to the block. Return it with [`release`](Self::release).
#[must_use = "a pooled block must be released back to its pool"]
pub struct PooledBlock<'a, B: Default + Clone> {
    pool: &'a BlockPool<B>,
    block: B,
    released: bool,
}

impl<B: Default + Clone> PooledBlock<'_, B> {
    /// Returns the block to its pool. A full pool drops it instead.
    pub fn release(mut self) {
        let block = core::mem::take(&mut self.block);
        self.released = true;
        self.pool.give_back(block);
    }
}

impl<B: Default + Clone> Deref for PooledBlock<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.block
    }
}

impl<B: Default + Clone> DerefMut for PooledBlock<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut self.block
    }
}

impl<B: Default + Clone> Drop for PooledBlock<'_, B> {
    fn drop(&mut self) {
        if !self.released {
            let total = self.pool.leaked.fetch_add(1, Ordering::Relaxed) + 1;
            log::warn!("zenblock: pooled block dropped without release ({total} leaked so far)");
        }
    }
}
