//! Deterministic mock VAD/ASR/SV capabilities for tests, and for exercising the HTTP/WS
//! wiring end-to-end without a bundled ML model.
//!
//! Each mock is backed by a pre-programmed, per-call plan rather than a real model, so
//! a test can assert on exact outputs without any model in the loop.

use crate::capability::{Asr, AsrCandidate, Sv, Vad, VadBoundary};
use async_trait::async_trait;

/// A VAD whose boundary reports are scripted call-by-call. Each session's `Cache` is just
/// the index of the next scripted call; unscripted calls beyond the plan's length report
/// no boundaries.
#[derive(Debug, Clone, Default)]
pub struct MockVad {
    plan: Vec<Vec<VadBoundary>>,
}

impl MockVad {
    pub fn new(plan: Vec<Vec<VadBoundary>>) -> Self {
        Self { plan }
    }
}

#[async_trait]
impl Vad for MockVad {
    type Cache = usize;

    async fn step(
        &self,
        _chunk: &[f32],
        cache: &mut Self::Cache,
    ) -> anyhow::Result<Vec<VadBoundary>> {
        let out = self.plan.get(*cache).cloned().unwrap_or_default();
        *cache += 1;
        Ok(out)
    }
}

impl AsrCandidate {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// An ASR whose responses (or failures) are scripted call-by-call, exactly like
/// [`MockVad`]. Used to exercise capability-failure recovery deterministically.
#[derive(Debug, Clone, Default)]
pub struct MockAsr {
    plan: Vec<Result<Vec<AsrCandidate>, String>>,
}

impl MockAsr {
    pub fn new(plan: Vec<Result<Vec<AsrCandidate>, String>>) -> Self {
        Self { plan }
    }
}

#[async_trait]
impl Asr for MockAsr {
    type Cache = usize;

    async fn recognize(
        &self,
        _audio: &[f32],
        _lang: &str,
        cache: &mut Self::Cache,
        _use_itn: bool,
    ) -> anyhow::Result<Vec<AsrCandidate>> {
        let idx = *cache;
        *cache += 1;
        match self.plan.get(idx) {
            None => Ok(Vec::new()),
            Some(Ok(candidates)) => Ok(candidates.clone()),
            Some(Err(msg)) => anyhow::bail!(msg.clone()),
        }
    }
}

/// A speaker-verification mock backed by a plain scoring closure, so tests can express
/// "score high against the matching reference, low otherwise" directly.
pub struct MockSv<F>
where
    F: Fn(&[f32], &[f32]) -> f32 + Send + Sync,
{
    scorer: F,
}

impl<F> MockSv<F>
where
    F: Fn(&[f32], &[f32]) -> f32 + Send + Sync,
{
    pub fn new(scorer: F) -> Self {
        Self { scorer }
    }
}

impl MockSv<fn(&[f32], &[f32]) -> f32> {
    /// Every comparison returns the same score, regardless of input.
    pub fn constant(score: f32) -> MockSv<impl Fn(&[f32], &[f32]) -> f32 + Send + Sync> {
        MockSv::new(move |_, _| score)
    }

    /// Scores `1.0` when the two buffers are byte-identical, `0.0` otherwise — useful when
    /// gallery reference audio is a literal copy of the matching segment's samples.
    pub fn exact_match() -> MockSv<impl Fn(&[f32], &[f32]) -> f32 + Send + Sync> {
        MockSv::new(|a: &[f32], b: &[f32]| if a == b { 1.0 } else { 0.0 })
    }
}

#[async_trait]
impl<F> Sv for MockSv<F>
where
    F: Fn(&[f32], &[f32]) -> f32 + Send + Sync,
{
    async fn score(&self, a: &[f32], b: &[f32]) -> anyhow::Result<f32> {
        Ok((self.scorer)(a, b))
    }
}
