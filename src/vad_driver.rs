//! VADDriver: turns frame-level VAD transitions into well-formed speech segments against
//! a drifting time base.
//!
//! Each chunk updates a begin/end cursor from the VAD's boundary reports, resolves that
//! cursor into a ring-buffer window once both sides are set, and retains a short overlap
//! after cutting a segment so the next one doesn't lose context at the edge.

use crate::buffers::VadRing;
use crate::capability::{Vad, WorkerPool};
use crate::config::Config;
use std::sync::Arc;
use tracing::{debug, warn};

/// An owned span of VADRing samples plus its boundaries on the VAD's own clock.
/// Short-lived: released after Diarizer/ASR hand-off.
#[derive(Debug, Clone)]
pub struct SpeechSegment {
    pub samples: Vec<f32>,
    pub beg_ms: i64,
    pub end_ms: i64,
}

pub struct VadDriver {
    config: Arc<Config>,
    ring: VadRing,
    last_beg: i64,
    last_end: i64,
    offset_ms: i64,
    total_processed_samples: u64,
    last_activity_samples: u64,
    cleanup_count: u64,
}

impl VadDriver {
    pub fn new(config: Arc<Config>) -> Self {
        let capacity = config.vad_ring_capacity();
        Self {
            config,
            ring: VadRing::new(capacity),
            last_beg: -1,
            last_end: -1,
            offset_ms: 0,
            total_processed_samples: 0,
            last_activity_samples: 0,
            cleanup_count: 0,
        }
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    pub fn ring_len(&self) -> usize {
        self.ring.len()
    }

    pub fn cleanup_count(&self) -> u64 {
        self.cleanup_count
    }

    fn samples_to_ms(&self, samples: usize) -> i64 {
        (samples as i64 * 1000) / self.config.sample_rate as i64
    }

    /// Runs one chunk through the driver. Returns `Some(segment)` when the VAD cursor
    /// resolves to a well-formed window this step; `None` otherwise (including on a
    /// recovered capability error, which leaves the cursor untouched).
    pub async fn step<V: Vad>(
        &mut self,
        chunk: &[f32],
        vad: &V,
        cache: &mut V::Cache,
        pool: &WorkerPool,
    ) -> Option<SpeechSegment> {
        self.ring.append(chunk);
        self.total_processed_samples += chunk.len() as u64;

        self.cleanup_gate();

        let boundaries = {
            let fut = vad.step(chunk, cache);
            pool.run(fut).await
        };
        match boundaries {
            Ok(boundaries) => {
                for boundary in boundaries {
                    if boundary.beg_ms != -1 {
                        self.last_beg = boundary.beg_ms;
                    }
                    if boundary.end_ms != -1 {
                        self.last_end = boundary.end_ms;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "VAD capability error on chunk; cursor left unchanged");
                return None;
            }
        }

        self.silence_reset();

        if self.last_beg == -1 || self.last_end == -1 {
            return None;
        }

        self.resolve_segment()
    }

    fn cleanup_gate(&mut self) {
        let capacity = self.ring.capacity();
        let threshold = (capacity as f64 * self.config.vad_buffer_cleanup_threshold as f64) as usize;
        if self.ring.len() > threshold {
            let drop_n = (capacity as f64 * self.config.vad_buffer_cleanup_ratio as f64) as usize;
            let dropped = self.ring.pop_front(drop_n);
            self.offset_ms += self.samples_to_ms(dropped.len());
            self.cleanup_count += 1;
            debug!(dropped = dropped.len(), offset_ms = self.offset_ms, "VADRing cleanup");
        }
    }

    fn silence_reset(&mut self) {
        let idle_samples = self
            .total_processed_samples
            .saturating_sub(self.last_activity_samples);
        let idle_seconds = idle_samples as f64 / self.config.sample_rate as f64;
        if idle_seconds > self.config.silence_reset_seconds as f64 {
            let keep = self.config.keep_audio_samples().min(self.ring.len());
            let drop_n = self.ring.len() - keep;
            let dropped = self.ring.pop_front(drop_n);
            self.offset_ms += self.samples_to_ms(dropped.len());
            self.last_activity_samples = self.total_processed_samples;
            debug!(dropped = dropped.len(), "VADRing silence reset");
        }
    }

    fn resolve_segment(&mut self) -> Option<SpeechSegment> {
        let sr = self.config.sample_rate as i64;
        let beg = ((self.last_beg - self.offset_ms) * sr) / 1000;
        let end = ((self.last_end - self.offset_ms) * sr) / 1000;

        if beg < 0 || end <= beg || end as usize > self.ring.len() {
            warn!(beg, end, ring_len = self.ring.len(), "discarding invalid VAD cursor window");
            self.last_beg = -1;
            self.last_end = -1;
            return None;
        }

        let samples = self.ring.get(beg as usize, (end - beg) as usize);
        let beg_ms = self.last_beg;
        let end_ms = self.last_end;
        self.last_activity_samples = self.total_processed_samples;

        let overlap_samples = self.config.overlap_samples();
        let drop_n = (end as usize).saturating_sub(overlap_samples);
        let dropped = self.ring.pop_front(drop_n);
        self.offset_ms += self.samples_to_ms(dropped.len());

        self.last_beg = -1;
        self.last_end = -1;

        Some(SpeechSegment {
            samples,
            beg_ms,
            end_ms,
        })
    }
}
