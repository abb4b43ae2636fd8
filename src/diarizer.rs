//! Diarizer: the online speaker-diarization algorithm, including the audio quality gate
//! that precedes any scoring.
//!
//! Each segment is scored against every gallery entry in parallel, then assigned with a
//! dynamic threshold and two-band hysteresis so a speaker in the middle of a sentence
//! isn't bounced to a new label by a single noisy score.

use crate::capability::{Sv, WorkerPool};
use crate::config::Config;
use crate::gallery::{VoiceprintGallery, SPEAKER_LABEL_PREFIX};
use futures_util::future::join_all;
use tracing::warn;

const MIN_ENERGY: f32 = 0.005;
const MIN_VARIANCE: f32 = 0.0005;

/// Duration/energy/variance gate applied before any SV scoring. A segment that fails
/// this gate never reaches the gallery.
pub fn quality_gate(samples: &[f32], sample_rate: u32, min_audio_ms: u32, max_audio_ms: u32) -> bool {
    if samples.is_empty() {
        return false;
    }
    let duration_ms = (samples.len() as f64 * 1000.0) / sample_rate as f64;
    if duration_ms < min_audio_ms as f64 || duration_ms > max_audio_ms as f64 {
        return false;
    }

    let n = samples.len() as f32;
    let mean_abs = samples.iter().map(|s| s.abs()).sum::<f32>() / n;
    if mean_abs < MIN_ENERGY {
        return false;
    }

    let mean = samples.iter().sum::<f32>() / n;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;
    if variance < MIN_VARIANCE {
        return false;
    }

    true
}

/// Mutable diarization state threaded through a session: the gallery plus the currently
/// assigned speaker. Owned by `SessionState`.
#[derive(Debug, Default)]
pub struct DiarizerState {
    pub gallery: VoiceprintGallery,
    pub current_speaker: Option<String>,
}

/// Runs the quality gate, then the diarization algorithm, against `segment_samples`.
/// Returns the committed speaker label. Mutates `state` in every commit path.
pub async fn diarize<S: Sv>(
    segment_samples: &[f32],
    config: &Config,
    sv: &S,
    pool: &WorkerPool,
    state: &mut DiarizerState,
    now_secs: f64,
) -> String {
    if !quality_gate(
        segment_samples,
        config.sample_rate,
        config.min_audio_length_ms,
        config.max_audio_length_ms,
    ) {
        return state
            .current_speaker
            .clone()
            .unwrap_or_else(|| SPEAKER_LABEL_PREFIX.to_owned());
    }

    if state.gallery.is_empty() {
        let label = state.gallery.insert_new(segment_samples.to_vec());
        state.current_speaker = Some(label.clone());
        state.gallery.push_history(label.clone(), 1.0, now_secs);
        return label;
    }

    let scored = join_all(state.gallery.iter().map(|(label, reference)| {
        let label = label.to_owned();
        async move {
            let result = pool.run(sv.score(segment_samples, reference)).await;
            (label, result)
        }
    }))
    .await;

    let mut scores: Vec<(String, f32)> = Vec::with_capacity(scored.len());
    for (label, result) in scored {
        match result {
            Ok(score) => scores.push((label, score)),
            Err(err) => warn!(error = %err, %label, "SV scoring failed for gallery entry; skipping"),
        }
    }

    let tau = config.sv_thr;

    let best = scores
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .cloned();

    let (best_label, best_score) = match best {
        Some(b) => b,
        None => {
            // No entry scored successfully: behaves like "all scores below the new-speaker
            // floor" since there is nothing to be continuous or ambiguous with.
            let label = state.gallery.insert_new(segment_samples.to_vec());
            state.current_speaker = Some(label.clone());
            state.gallery.push_history(label.clone(), 0.8, now_secs);
            return label;
        }
    };

    let current_score = state
        .current_speaker
        .as_ref()
        .and_then(|cur| scores.iter().find(|(l, _)| l == cur).map(|(_, s)| *s));
    let effective_tau = match current_score {
        Some(score) if score > 0.8 * tau => 1.1 * tau,
        _ => tau,
    };

    let is_current_best = state
        .current_speaker
        .as_ref()
        .is_some_and(|cur| *cur == best_label);

    if is_current_best && best_score >= 0.6 * tau {
        let label = state.current_speaker.clone().expect("checked above");
        let confidence = best_score.min(1.0);
        state.gallery.push_history(label.clone(), confidence, now_secs);
        return label;
    }

    if best_score >= effective_tau {
        state.current_speaker = Some(best_label.clone());
        let confidence = best_score.min(1.0);
        state
            .gallery
            .push_history(best_label.clone(), confidence, now_secs);
        return best_label;
    }

    if scores.iter().all(|(_, s)| *s < 0.7 * tau) {
        let label = state.gallery.insert_new(segment_samples.to_vec());
        state.current_speaker = Some(label.clone());
        state.gallery.push_history(label.clone(), 0.8, now_secs);
        return label;
    }

    let confidence = best_score.min(0.7);
    state
        .gallery
        .push_history(best_label.clone(), confidence, now_secs);
    best_label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSv;

    fn cfg() -> Config {
        Config::default()
    }

    fn loud_segment(sample_rate: u32, ms: u32) -> Vec<f32> {
        let n = (sample_rate as usize * ms as usize) / 1000;
        (0..n)
            .map(|i| 0.3 * ((i as f32 * 0.3).sin()))
            .collect()
    }

    #[tokio::test]
    async fn empty_gallery_bootstraps_first_speaker() {
        let config = cfg();
        let sv = MockSv::constant(0.0);
        let pool = WorkerPool::new(4);
        let mut state = DiarizerState::default();
        let segment = loud_segment(config.sample_rate, 1000);

        let label = diarize(&segment, &config, &sv, &pool, &mut state, 0.0).await;
        assert_eq!(label, "发言人1");
        assert_eq!(state.gallery.len(), 1);
        assert_eq!(state.current_speaker.as_deref(), Some("发言人1"));
    }

    #[tokio::test]
    async fn quality_gate_failure_returns_current_speaker_without_mutating_gallery() {
        let config = cfg();
        let sv = MockSv::constant(0.9);
        let pool = WorkerPool::new(4);
        let mut state = DiarizerState::default();
        state.current_speaker = Some("发言人1".to_owned());

        let silent = vec![0.0f32; config.sample_rate as usize]; // energy gate fails
        let label = diarize(&silent, &config, &sv, &pool, &mut state, 0.0).await;
        assert_eq!(label, "发言人1");
        assert_eq!(state.gallery.len(), 0);
    }

    #[tokio::test]
    async fn quality_gate_failure_with_no_current_speaker_returns_sentinel() {
        let config = cfg();
        let sv = MockSv::constant(0.9);
        let pool = WorkerPool::new(4);
        let mut state = DiarizerState::default();

        let silent = vec![0.0f32; config.sample_rate as usize];
        let label = diarize(&silent, &config, &sv, &pool, &mut state, 0.0).await;
        assert_eq!(label, "发言人");
    }

    #[tokio::test]
    async fn continuity_keeps_current_speaker_in_hysteresis_band() {
        let config = cfg();
        // score sits in [0.6τ, τ): continuity keeps current speaker rather than minting new.
        let sv = MockSv::constant(config.sv_thr * 0.65);
        let pool = WorkerPool::new(4);
        let mut state = DiarizerState::default();
        let seg1 = loud_segment(config.sample_rate, 1000);
        let first = diarize(&seg1, &config, &sv, &pool, &mut state, 0.0).await;
        assert_eq!(first, "发言人1");

        let seg2 = loud_segment(config.sample_rate, 1000);
        let second = diarize(&seg2, &config, &sv, &pool, &mut state, 1.0).await;
        assert_eq!(second, "发言人1");
        assert_eq!(state.gallery.len(), 1);
    }

    #[tokio::test]
    async fn low_score_against_sole_speaker_mints_new_speaker() {
        let config = cfg();
        let sv = MockSv::constant(config.sv_thr * 0.2); // well below 0.7τ
        let pool = WorkerPool::new(4);
        let mut state = DiarizerState::default();
        let seg1 = loud_segment(config.sample_rate, 1000);
        diarize(&seg1, &config, &sv, &pool, &mut state, 0.0).await;

        let seg2 = loud_segment(config.sample_rate, 1000);
        let second = diarize(&seg2, &config, &sv, &pool, &mut state, 1.0).await;
        assert_eq!(second, "发言人2");
        assert_eq!(state.gallery.len(), 2);
    }
}
