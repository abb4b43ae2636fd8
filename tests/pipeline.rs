//! End-to-end scenarios for the streaming pipeline, driven through mock capabilities:
//! silence, a single utterance, alternating speakers, a same-speaker pause, a recovered
//! capability failure, and sustained speech that forces ring cleanup.

use meetscribe::capability::{AsrCandidate, Sv, VadBoundary, WorkerPool};
use meetscribe::config::{Config, SessionOpts};
use meetscribe::mock::{MockAsr, MockSv, MockVad};
use meetscribe::session::Session;
use std::sync::Arc;

fn pcm16_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

fn speaker_sample(i: usize, seed: f32) -> f32 {
    seed * ((i as f32) * 0.013).sin() * 0.3
}

/// One "group" is exactly 4 chunks (4 * 4800 = 19200 samples @16kHz/300ms). Its first
/// 16000 samples (1000ms) carry a deterministic per-speaker waveform; the remainder is
/// low-energy filler that never ends up inside a resolved segment window in these tests.
fn group_bytes(seed: f32) -> Vec<u8> {
    let mut samples = Vec::with_capacity(19_200);
    for i in 0..16_000 {
        samples.push(speaker_sample(i, seed));
    }
    for _ in 0..3_200 {
        samples.push(0.01);
    }
    pcm16_bytes(&samples)
}

fn new_session<S: Sv>(
    vad: MockVad,
    asr: MockAsr,
    sv: S,
    opts: SessionOpts,
) -> Session<MockVad, MockAsr, S> {
    Session::new(
        Arc::new(Config::default()),
        opts,
        Arc::new(vad),
        Arc::new(asr),
        Arc::new(sv),
        WorkerPool::new(4),
    )
}

fn boundary_group(beg_ms: i64, end_ms: i64) -> Vec<Vec<VadBoundary>> {
    vec![vec![], vec![], vec![], vec![VadBoundary { beg_ms, end_ms }]]
}

#[tokio::test]
async fn silent_input_emits_no_events() {
    let plan: Vec<Vec<VadBoundary>> = (0..33).map(|_| vec![]).collect(); // ~10s @300ms/chunk
    let vad = MockVad::new(plan);
    let asr = MockAsr::new(vec![]);
    let mut session = new_session(vad, asr, MockSv::exact_match(), SessionOpts::default());

    let mut total_events = 0;
    for _ in 0..33 {
        let events = session.push_bytes(&pcm16_bytes(&vec![0.0f32; 4_800])).await;
        total_events += events.len();
    }

    assert_eq!(total_events, 0);
    assert!(session.vad_ring_len() <= Config::default().vad_ring_capacity());
}

#[tokio::test]
async fn single_utterance_emits_normalized_text() {
    let vad = MockVad::new(boundary_group(100, 1200));
    let asr = MockAsr::new(vec![Ok(vec![AsrCandidate::text("<|zh|><|HAPPY|>你好")])]);
    let mut session = new_session(vad, asr, MockSv::exact_match(), SessionOpts::default());

    let events = session.push_bytes(&group_bytes(1.0)).await;
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.data, "你好😊");
    assert_eq!(event.speaker_id.as_deref(), Some("发言人"));
    assert!(event.is_new_line);
    assert_eq!(event.segment_type, "new_speaker");
}

#[tokio::test]
async fn two_speakers_alternating_get_stable_labels() {
    let mut plan = Vec::new();
    plan.extend(boundary_group(0, 1000));
    plan.extend(boundary_group(1200, 2200));
    plan.extend(boundary_group(2400, 3400));
    plan.extend(boundary_group(3600, 4600));
    let vad = MockVad::new(plan);

    let asr = MockAsr::new(vec![
        Ok(vec![AsrCandidate::text("<|zh|>一")]),
        Ok(vec![AsrCandidate::text("<|zh|>二")]),
        Ok(vec![AsrCandidate::text("<|zh|>三")]),
        Ok(vec![AsrCandidate::text("<|zh|>四")]),
    ]);

    let opts = SessionOpts {
        enable_diarization: true,
        ..SessionOpts::default()
    };
    let mut session = new_session(vad, asr, MockSv::exact_match(), opts);

    let groups = [1.0f32, -1.0, 1.0, -1.0];
    let mut labels = Vec::new();
    let mut segment_types = Vec::new();
    for seed in groups {
        let events = session.push_bytes(&group_bytes(seed)).await;
        assert_eq!(events.len(), 1);
        labels.push(events[0].speaker_id.clone().unwrap());
        segment_types.push(events[0].segment_type.clone());
    }

    assert_eq!(labels, vec!["发言人1", "发言人2", "发言人1", "发言人2"]);
    assert!(segment_types.iter().all(|t| t == "new_speaker"));
    assert_eq!(session.gallery_len(), 2);
}

#[tokio::test]
async fn same_speaker_long_pause_is_pause_not_new_speaker() {
    // Segment 1 resolves at (0, 1000ms) out of the first speech group, same as the
    // alternating-speakers test's first segment; five silent chunks (1500ms) of non-speech
    // padding follow, then segment 2
    // resolves out of a second speech group using the same per-speaker waveform so the
    // mock SV's exact-match scoring reports continuity. The 1700ms gap between segment
    // ends exceeds pause_threshold_ms (1500).
    let mut plan = Vec::new();
    plan.extend(boundary_group(0, 1000));
    plan.extend(vec![vec![]; 5]);
    plan.extend(boundary_group(2700, 3700));
    let vad = MockVad::new(plan);

    let asr = MockAsr::new(vec![
        Ok(vec![AsrCandidate::text("<|zh|>一")]),
        Ok(vec![AsrCandidate::text("<|zh|>二")]),
    ]);

    let opts = SessionOpts {
        enable_diarization: true,
        ..SessionOpts::default()
    };
    let mut session = new_session(vad, asr, MockSv::exact_match(), opts);

    let first = session.push_bytes(&group_bytes(1.0)).await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].speaker_id.as_deref(), Some("发言人1"));
    assert_eq!(first[0].segment_type, "new_speaker");

    let padding = session.push_bytes(&pcm16_bytes(&vec![0.0f32; 5 * 4_800])).await;
    assert!(padding.is_empty());

    let second = session.push_bytes(&group_bytes(1.0)).await;
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].speaker_id.as_deref(), Some("发言人1"));
    assert_eq!(second[0].segment_type, "pause");

    assert_eq!(session.gallery_len(), 1);
}

#[tokio::test]
async fn capability_failure_recovers_without_fatal_disconnect() {
    let mut plan = Vec::new();
    plan.extend(boundary_group(0, 500));
    plan.extend(boundary_group(600, 1100));
    plan.extend(boundary_group(1200, 1700));
    let vad = MockVad::new(plan);

    let asr = MockAsr::new(vec![
        Ok(vec![AsrCandidate::text("<|zh|>一")]),
        Err("capability unavailable".to_owned()),
        Ok(vec![AsrCandidate::text("<|zh|>三")]),
    ]);
    let mut session = new_session(vad, asr, MockSv::exact_match(), SessionOpts::default());

    let first = session.push_bytes(&group_bytes(1.0)).await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].data, "一");

    let second = session.push_bytes(&group_bytes(1.0)).await;
    assert!(second.is_empty(), "segment 2's event must be suppressed, not fatal");

    let third = session.push_bytes(&group_bytes(1.0)).await;
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].data, "三");
}

#[tokio::test]
async fn sustained_speech_triggers_cleanup_without_exceeding_capacity() {
    // 200 chunks * 300ms = 60s of continuous audio with no VAD boundary ever reported.
    const CHUNK_COUNT: usize = 200;
    let plan: Vec<Vec<VadBoundary>> = (0..CHUNK_COUNT).map(|_| vec![]).collect();
    let vad = MockVad::new(plan);
    let asr = MockAsr::new(vec![]);
    let mut session = new_session(vad, asr, MockSv::exact_match(), SessionOpts::default());

    let capacity = Config::default().vad_ring_capacity();
    let starting_offset = session.offset_ms();

    for _ in 0..CHUNK_COUNT {
        session.push_bytes(&pcm16_bytes(&vec![0.3f32; 4_800])).await;
        assert!(session.vad_ring_len() <= capacity);
    }

    assert!(session.cleanup_count() > 0, "expected at least one cleanup to have fired");
    assert!(session.offset_ms() > starting_offset);
}
