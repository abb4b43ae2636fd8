//! Wire types: inbound query parameters and the outbound transcription event.

use crate::config::SessionOpts;
use serde::{Deserialize, Serialize};

/// Raw `/ws/transcribe` query parameters, exactly as an HTTP framework would deserialize
/// them — string-typed so truthy synonyms (`1`, `yes`, ...) parse the same way the
/// original source accepts them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsQueryParams {
    pub sv: Option<String>,
    pub lang: Option<String>,
}

impl WsQueryParams {
    pub fn into_session_opts(self) -> SessionOpts {
        let defaults = SessionOpts::default();
        SessionOpts {
            enable_diarization: self
                .sv
                .as_deref()
                .map(SessionOpts::parse_truthy)
                .unwrap_or(defaults.enable_diarization),
            language: self.lang.unwrap_or(defaults.language),
        }
    }
}

/// One outbound JSON event per committed segment.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionEvent {
    pub code: i32,
    pub msg: String,
    pub data: String,
    pub speaker_id: Option<String>,
    pub is_new_line: bool,
    pub segment_type: String,
    pub timestamp: f64,
}

impl TranscriptionEvent {
    pub fn ok(
        data: String,
        speaker_id: Option<String>,
        is_new_line: bool,
        segment_type: &str,
        timestamp: f64,
        msg: String,
    ) -> Self {
        Self {
            code: 0,
            msg,
            data,
            speaker_id,
            is_new_line,
            segment_type: segment_type.to_owned(),
            timestamp,
        }
    }

    /// A single error event sent before the connection closes on a fatal session error.
    pub fn fatal(code: i32, msg: impl Into<String>, timestamp: f64) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: String::new(),
            speaker_id: None,
            is_new_line: false,
            segment_type: "traditional".to_owned(),
            timestamp,
        }
    }
}
