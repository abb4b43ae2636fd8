//! VADRing: fixed-capacity ring buffer of f32 samples, overwrite-on-full.

use std::collections::VecDeque;

#[derive(Debug)]
pub struct VadRing {
    capacity: usize,
    data: VecDeque<f32>,
}

impl VadRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            data: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends `samples`, overwriting the oldest resident samples if capacity is exceeded.
    /// If `samples.len() >= capacity`, only its last `capacity` samples are retained.
    pub fn append(&mut self, samples: &[f32]) {
        if samples.len() >= self.capacity {
            self.data.clear();
            self.data.extend(&samples[samples.len() - self.capacity..]);
            return;
        }
        let overflow = (self.data.len() + samples.len()).saturating_sub(self.capacity);
        for _ in 0..overflow {
            self.data.pop_front();
        }
        self.data.extend(samples);
    }

    /// Reads up to `len` samples starting `offset` positions from the logical head,
    /// truncating to whatever is actually resident.
    pub fn get(&self, offset: usize, len: usize) -> Vec<f32> {
        if offset >= self.data.len() {
            return Vec::new();
        }
        let end = (offset + len).min(self.data.len());
        self.data.range(offset..end).copied().collect()
    }

    /// Advances the head by `min(n, len())`, returning the dropped samples.
    pub fn pop_front(&mut self, n: usize) -> Vec<f32> {
        let n = n.min(self.data.len());
        self.data.drain(..n).collect()
    }
}
