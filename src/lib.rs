//! `meetscribe` — the per-session streaming pipeline behind a real-time speech-analysis
//! service: voice-activity segmentation, online speaker diarization, and line-break-aware
//! transcription events.
//!
//! The core never loads or chooses a model. It consumes three pluggable capabilities
//! (`Vad`, `Asr`, `Sv`, see [`capability`]) and turns an unbounded PCM byte stream into an
//! ordered stream of [`wire::TranscriptionEvent`]s via [`session::Session`].

pub mod buffers;
pub mod capability;
pub mod config;
pub mod diarizer;
pub mod error;
pub mod eventer;
pub mod gallery;
pub mod logging;
pub mod session;
pub mod text_norm;
pub mod vad_driver;
pub mod wire;

/// Deterministic mock VAD/ASR/SV capabilities for tests and for smoke-testing the wire
/// layer without a real model.
#[cfg(feature = "test-util")]
pub mod mock;

pub use error::{Error, Result};
