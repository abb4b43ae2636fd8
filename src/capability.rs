//! Pluggable external capabilities.
//!
//! The core never chooses or loads a model: it only requires three capabilities —
//! voice-activity detection, speech recognition, and speaker verification — expressed as
//! traits. This mirrors a pluggable transcription backend behind a trait, with an owned
//! per-call cache, generalized to three smaller capabilities instead of one.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A single VAD boundary transition reported on one step. `-1` on either field means
/// "no boundary on this side this step".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VadBoundary {
    pub beg_ms: i64,
    pub end_ms: i64,
}

/// Voice-activity detection. Maintains no state of its own; all continuity lives in the
/// caller-owned `Cache`.
#[async_trait]
pub trait Vad: Send + Sync {
    /// Opaque per-session cache, single-owner, never shared between sessions.
    type Cache: Default + Send;

    async fn step(
        &self,
        chunk: &[f32],
        cache: &mut Self::Cache,
    ) -> anyhow::Result<Vec<VadBoundary>>;
}

/// One candidate utterance returned by ASR. Only `text` is read by the core; the
/// rest is opaque diagnostic payload forwarded verbatim in the outbound `msg` field.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AsrCandidate {
    pub text: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Automatic speech recognition.
#[async_trait]
pub trait Asr: Send + Sync {
    /// Opaque per-session cache, single-owner, never shared between sessions.
    type Cache: Default + Send;

    async fn recognize(
        &self,
        audio: &[f32],
        lang: &str,
        cache: &mut Self::Cache,
        use_itn: bool,
    ) -> anyhow::Result<Vec<AsrCandidate>>;
}

/// Speaker verification: an open similarity metric between two audio segments.
#[async_trait]
pub trait Sv: Send + Sync {
    async fn score(&self, a: &[f32], b: &[f32]) -> anyhow::Result<f32>;
}

/// Shared fixed-size worker pool that model capability calls are offloaded to and
/// awaited through. Bounds how many capability invocations run concurrently across all
/// sessions sharing this pool, independent of how many sessions exist.
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Run `fut` once a worker slot is free. The session task yields at this suspension
    /// point.
    pub async fn run<F, T>(&self, fut: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("worker pool semaphore is never closed");
        fut.await
    }
}
