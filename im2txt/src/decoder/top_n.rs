use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::state::Hypothesis;

pub trait Scored {
    fn score(&self) -> f32;
}

impl<S> Scored for Hypothesis<S> {
    fn score(&self) -> f32 {
        Hypothesis::score(self)
    }
}

struct Entry<T> {
    score: f32,
    seq: u64,
    item: T,
}

// The heap's maximum is the next element to evict: lowest score first, and
// among equal scores the most recent insertion.
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

/// Keeps the `capacity` highest-scoring items pushed into it.
pub struct TopN<T> {
    heap: BinaryHeap<Entry<T>>,
    capacity: usize,
    next_seq: u64,
}

impl<T: Scored> TopN<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity + 1),
            capacity,
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Lowest score currently held, the next eviction candidate.
    pub fn min_score(&self) -> Option<f32> {
        self.heap.peek().map(|entry| entry.score)
    }

    /// Held items in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.heap.iter().map(|entry| &entry.item)
    }

    pub fn insert(&mut self, item: T) {
        let entry = Entry {
            score: item.score(),
            seq: self.next_seq,
            item,
        };
        self.next_seq += 1;
        self.heap.push(entry);
        if self.heap.len() > self.capacity {
            self.heap.pop();
        }
    }

    /// Empties the container, best score first (ties in insertion order).
    pub fn drain(&mut self) -> Vec<T> {
        std::mem::take(&mut self.heap)
            .into_sorted_vec()
            .into_iter()
            .map(|entry| entry.item)
            .collect()
    }
}

impl<T: Scored> Extend<T> for TopN<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}
