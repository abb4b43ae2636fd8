//! VoiceprintGallery: in-session mapping from speaker label to reference audio.
//!
//! Append-only: a label's reference audio is set once, on first assignment, and never
//! averaged or overwritten by later segments from the same speaker.

/// Sentinel label for "speaker present but unidentified" (used when the quality gate
/// rejects a segment and no current speaker is set yet) and the prefix for numbered
/// labels (`发言人1`, `发言人2`, ...).
pub const SPEAKER_LABEL_PREFIX: &str = "发言人";

pub fn numbered_label(n: u32) -> String {
    format!("{SPEAKER_LABEL_PREFIX}{n}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerHistoryEntry {
    pub label: String,
    pub confidence: f32,
    pub wall_time_secs: f64,
}

/// `label -> reference audio`, append-only within a session. `speaker_counter` is the
/// monotonic source of new labels; `gallery.len() == speaker_counter` always holds.
#[derive(Debug, Default)]
pub struct VoiceprintGallery {
    entries: Vec<(String, Vec<f32>)>,
    speaker_counter: u32,
    history: Vec<SpeakerHistoryEntry>,
}

impl VoiceprintGallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speaker_counter(&self) -> u32 {
        self.speaker_counter
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.entries.iter().map(|(l, a)| (l.as_str(), a.as_slice()))
    }

    pub fn history(&self) -> &[SpeakerHistoryEntry] {
        &self.history
    }

    /// Mints the next numbered label, inserting its reference audio. Never overwrites an
    /// existing entry — labels are never removed or renumbered.
    pub fn insert_new(&mut self, reference_audio: Vec<f32>) -> String {
        self.speaker_counter += 1;
        let label = numbered_label(self.speaker_counter);
        self.entries.push((label.clone(), reference_audio));
        label
    }

    pub fn push_history(&mut self, label: String, confidence: f32, wall_time_secs: f64) {
        self.history.push(SpeakerHistoryEntry {
            label,
            confidence,
            wall_time_secs,
        });
    }
}
