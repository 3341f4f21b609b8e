//! Provides a queue of blocks of ray indices for the worker threads.
//! The queue itself is not changed after creation we simply work
//! through it with an atomic counter to track the index of the next
//! block to work on.

// std
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

// see github/tray_rust/src/sampler/block_queue.rs

/// The queue of blocks to be worked on shared immutably between worker threads.
#[derive(Debug)]
pub struct BlockQueue {
    /// Total number of items split into blocks
    n_items: usize,
    /// Number of items in every block but maybe the last one
    block_size: usize,
    /// Index of the next block to be worked on
    next: AtomicUsize,
}

impl BlockQueue {
    /// Create a block queue handing out `0..n_items` in ranges of
    /// `block_size` items; the last block may be shorter.
    /// Panics if `block_size` is zero.
    pub fn new(n_items: usize, block_size: usize) -> BlockQueue {
        assert!(block_size > 0, "block size has to be at least one");
        if n_items == 0 {
            warn!("This block queue is empty!");
        }
        BlockQueue {
            n_items,
            block_size,
            next: AtomicUsize::new(0),
        }
    }
    /// Get the number of items in a full block
    pub fn block_size(&self) -> usize {
        self.block_size
    }
    /// Get an iterator to work through the queue
    pub fn iter(&self) -> BlockQueueIterator<'_> {
        BlockQueueIterator { queue: self }
    }
    /// Get the next block in the queue or None if the queue is finished
    pub fn next(&self) -> Option<Range<usize>> {
        let i = self.next.fetch_add(1, Ordering::AcqRel);
        if i >= self.len() {
            None
        } else {
            let start: usize = i * self.block_size;
            Some(start..std::cmp::min(start + self.block_size, self.n_items))
        }
    }
    /// Get the number of blocks in the queue
    pub fn len(&self) -> usize {
        (self.n_items + self.block_size - 1) / self.block_size
    }
    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.next.load(Ordering::Acquire) >= self.len()
    }
}

/// Iterator to work through the queue safely
pub struct BlockQueueIterator<'a> {
    queue: &'a BlockQueue,
}

impl<'a> Iterator for BlockQueueIterator<'a> {
    type Item = Range<usize>;
    fn next(&mut self) -> Option<Range<usize>> {
        self.queue.next()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blocks_cover_all_items_once() {
        let queue = BlockQueue::new(10, 4);
        assert_eq!(queue.len(), 3);
        let blocks: Vec<Range<usize>> = queue.iter().collect();
        assert_eq!(blocks, vec![0..4, 4..8, 8..10]);
        assert!(queue.is_empty());
        assert_eq!(queue.next(), None);
    }

    #[test]
    fn shared_between_threads() {
        let queue = BlockQueue::new(1000, 7);
        let queue = &queue;
        let mut counts = vec![0_usize; 1000];
        let ranges: Vec<Vec<Range<usize>>> = crossbeam::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(move |_| queue.iter().collect::<Vec<Range<usize>>>()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
        .unwrap();
        for range in ranges.into_iter().flatten() {
            for i in range {
                counts[i] += 1;
            }
        }
        assert!(counts.iter().all(|&c| c == 1));
    }

    #[test]
    fn empty_queue() {
        let queue = BlockQueue::new(0, 16);
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert_eq!(queue.iter().count(), 0);
    }
}
