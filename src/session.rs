//! Session: per-connection state and the main processing loop.
//!
//! One owned `Session` value is driven by a single async task per connection: bytes in,
//! chunks out through VAD, diarization and ASR run concurrently on each resolved
//! segment, and the result is folded into zero or one outbound event.

use crate::buffers::{ByteAccumulator, FrameBuffer};
use crate::capability::{Asr, Sv, Vad, WorkerPool};
use crate::config::{Config, SessionOpts};
use crate::diarizer::{self, DiarizerState};
use crate::eventer::SegmentEventer;
use crate::gallery::SPEAKER_LABEL_PREFIX;
use crate::text_norm;
use crate::vad_driver::{SpeechSegment, VadDriver};
use crate::wire::TranscriptionEvent;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;
use uuid::Uuid;

fn now_wall_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// All per-connection state, owned by the task driving one session. Mutated only
/// through `push_bytes`.
pub struct Session<V: Vad, A: Asr, S: Sv> {
    session_id: Uuid,
    config: Arc<Config>,
    opts: SessionOpts,
    vad: Arc<V>,
    asr: Arc<A>,
    sv: Arc<S>,
    pool: WorkerPool,

    byte_acc: ByteAccumulator,
    frame_buffer: FrameBuffer,
    vad_driver: VadDriver,
    vad_cache: V::Cache,
    asr_cache: A::Cache,
    diarizer_state: DiarizerState,
    eventer: SegmentEventer,
}

impl<V: Vad, A: Asr, S: Sv> Session<V, A, S> {
    pub fn new(
        config: Arc<Config>,
        opts: SessionOpts,
        vad: Arc<V>,
        asr: Arc<A>,
        sv: Arc<S>,
        pool: WorkerPool,
    ) -> Self {
        let vad_driver = VadDriver::new(config.clone());
        Self {
            session_id: Uuid::new_v4(),
            config,
            opts,
            vad,
            asr,
            sv,
            pool,
            byte_acc: ByteAccumulator::new(),
            frame_buffer: FrameBuffer::new(),
            vad_driver,
            vad_cache: V::Cache::default(),
            asr_cache: A::Cache::default(),
            diarizer_state: DiarizerState::default(),
            eventer: SegmentEventer::new(),
        }
    }

    /// Identifier for this connection's session, carried into every tracing span this
    /// session emits so its log lines can be correlated.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Current gallery size, exposed for testing the monotonicity property:
    /// `gallery_len() == speaker_counter` after every diarization call.
    pub fn gallery_len(&self) -> usize {
        self.diarizer_state.gallery.len()
    }

    /// Current VADRing occupancy, in samples.
    pub fn vad_ring_len(&self) -> usize {
        self.vad_driver.ring_len()
    }

    /// Cumulative time-base advance, in milliseconds.
    pub fn offset_ms(&self) -> i64 {
        self.vad_driver.offset_ms()
    }

    /// Number of cleanup-gate triggers observed so far.
    pub fn cleanup_count(&self) -> u64 {
        self.vad_driver.cleanup_count()
    }

    /// Feeds one inbound binary frame through the full pipeline. A single frame can
    /// complete zero, one, or several chunks (and therefore zero or more segments); all
    /// resulting events are returned in emission order.
    #[tracing::instrument(skip(self, bytes), fields(session_id = %self.session_id))]
    pub async fn push_bytes(&mut self, bytes: &[u8]) -> Vec<TranscriptionEvent> {
        let samples = self.byte_acc.push(bytes);
        self.frame_buffer.append(samples);

        let chunk_size = self.config.chunk_size_samples();
        let mut events = Vec::new();
        while self.frame_buffer.len() >= chunk_size {
            let chunk = self.frame_buffer.pop_front(chunk_size);
            let segment = self
                .vad_driver
                .step(&chunk, self.vad.as_ref(), &mut self.vad_cache, &self.pool)
                .await;
            if let Some(segment) = segment {
                if let Some(event) = self.handle_segment(segment).await {
                    events.push(event);
                }
            }
        }
        events
    }

    async fn handle_segment(&mut self, segment: SpeechSegment) -> Option<TranscriptionEvent> {
        let SpeechSegment {
            samples,
            beg_ms,
            end_ms,
        } = segment;
        let now = now_wall_seconds();
        let lang = self.opts.language.clone();
        let enable_diarization = self.opts.enable_diarization;

        let pool = &self.pool;
        let asr = self.asr.as_ref();
        let sv = self.sv.as_ref();
        let config = self.config.as_ref();
        let asr_cache = &mut self.asr_cache;
        let diarizer_state = &mut self.diarizer_state;

        let asr_call = pool.run(asr.recognize(&samples, &lang, asr_cache, true));
        let diar_call = async {
            if enable_diarization {
                Some(diarizer::diarize(&samples, config, sv, pool, diarizer_state, now).await)
            } else {
                None
            }
        };

        let (asr_result, diarized_label) = tokio::join!(asr_call, diar_call);

        let candidates = match asr_result {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, "ASR capability error; suppressing this segment's event");
                return None;
            }
        };
        let first = candidates.first()?;

        let raw_json = serde_json::to_string(first).unwrap_or_default();
        let normalized = text_norm::normalize(&first.text);
        if !text_norm::contains_chinese_english_number(&normalized) {
            return None;
        }

        let speaker_id = diarized_label.unwrap_or_else(|| SPEAKER_LABEL_PREFIX.to_owned());

        let classification = self
            .eventer
            .classify(&self.config, &speaker_id, beg_ms, end_ms);

        Some(TranscriptionEvent::ok(
            normalized,
            Some(speaker_id),
            classification.is_new_line,
            classification.segment_type.as_wire_str(),
            now,
            raw_json,
        ))
    }
}
