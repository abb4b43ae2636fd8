//! FrameBuffer: unbounded FIFO of f32 samples dispensing fixed-size chunks.

use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct FrameBuffer {
    chunks: VecDeque<Vec<f32>>,
    len: usize,
    /// Read offset into the front chunk, so `pop_front` can split a chunk without
    /// reallocating the remainder.
    front_offset: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, samples: Vec<f32>) {
        if samples.is_empty() {
            return;
        }
        self.len += samples.len();
        self.chunks.push_back(samples);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns exactly `n` samples in FIFO order. Callers must check `len() >= n` first.
    pub fn pop_front(&mut self, n: usize) -> Vec<f32> {
        assert!(
            n <= self.len,
            "pop_front({n}) requested more samples than available ({})",
            self.len
        );
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            let front = self.chunks.front().expect("len tracked chunks must exist");
            let available = front.len() - self.front_offset;
            let take = available.min(n - out.len());
            out.extend_from_slice(&front[self.front_offset..self.front_offset + take]);
            self.front_offset += take;
            self.len -= take;
            if self.front_offset == front.len() {
                self.chunks.pop_front();
                self.front_offset = 0;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved_across_chunk_boundaries() {
        let mut buf = FrameBuffer::new();
        buf.append(vec![1.0, 2.0, 3.0]);
        buf.append(vec![4.0, 5.0]);
        assert_eq!(buf.len(), 5);

        let first = buf.pop_front(2);
        assert_eq!(first, vec![1.0, 2.0]);

        let second = buf.pop_front(3);
        assert_eq!(second, vec![3.0, 4.0, 5.0]);
        assert_eq!(buf.len(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn pop_front_can_split_a_single_chunk_across_calls() {
        let mut buf = FrameBuffer::new();
        buf.append(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buf.pop_front(1), vec![1.0]);
        assert_eq!(buf.pop_front(1), vec![2.0]);
        assert_eq!(buf.pop_front(2), vec![3.0, 4.0]);
    }

    #[test]
    #[should_panic]
    fn pop_front_more_than_available_panics() {
        let mut buf = FrameBuffer::new();
        buf.append(vec![1.0]);
        buf.pop_front(2);
    }
}
