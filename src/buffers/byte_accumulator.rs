//! ByteAccumulator: turns arbitrary byte pushes into aligned little-endian int16 PCM
//! samples, converted to normalized f32.
//!
//! Inbound bytes can split a sample across two pushes; this is the single place that
//! absorbs that, so `FrameBuffer` downstream never sees a partial sample.

/// Holds at most one trailing byte between pushes — the odd byte that can't yet form a
/// full int16 sample.
#[derive(Debug, Default)]
pub struct ByteAccumulator {
    pending: Option<u8>,
    samples_emitted: u64,
}

impl ByteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes `bytes`, returning the f32 samples it completed. Any odd trailing byte is
    /// retained for the next call.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<f32> {
        let mut combined;
        let data: &[u8] = if let Some(leftover) = self.pending.take() {
            combined = Vec::with_capacity(bytes.len() + 1);
            combined.push(leftover);
            combined.extend_from_slice(bytes);
            &combined
        } else {
            bytes
        };

        let usable = data.len() - (data.len() % 2);
        if data.len() > usable {
            self.pending = Some(data[usable]);
        }

        let samples: Vec<f32> = data[..usable]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32767.0)
            .collect();
        self.samples_emitted += samples.len() as u64;
        samples
    }

    /// Total samples ever emitted by this accumulator, for byte-alignment property testing.
    pub fn samples_emitted(&self) -> u64 {
        self.samples_emitted
    }
}
