//! SegmentEventer: line-break classification against prior session state.
//!
//! Decides whether a newly committed segment starts a new line and why: the first
//! segment of a session, a speaker change, or a pause long enough to break the current
//! speaker's line. Traditional mode disables the classifier and always starts a new line.

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    NewSpeaker,
    Pause,
    Continue,
    Traditional,
}

impl SegmentType {
    pub fn as_wire_str(self) -> &'static str {
        match self {
            SegmentType::NewSpeaker => "new_speaker",
            SegmentType::Pause => "pause",
            SegmentType::Continue => "continue",
            SegmentType::Traditional => "traditional",
        }
    }
}

pub struct SegmentEvent {
    pub is_new_line: bool,
    pub segment_type: SegmentType,
}

/// Holds `last_speaker`/`last_end_ms` across calls for one session.
#[derive(Debug, Default)]
pub struct SegmentEventer {
    last_speaker: Option<String>,
    last_end_ms: Option<i64>,
}

impl SegmentEventer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(
        &mut self,
        config: &Config,
        speaker: &str,
        cur_beg_ms: i64,
        cur_end_ms: i64,
    ) -> SegmentEvent {
        let event = if !config.enable_smart_line_break {
            SegmentEvent {
                is_new_line: true,
                segment_type: SegmentType::Traditional,
            }
        } else if self.last_speaker.is_none() {
            SegmentEvent {
                is_new_line: true,
                segment_type: SegmentType::NewSpeaker,
            }
        } else if self.last_speaker.as_deref() != Some(speaker) {
            SegmentEvent {
                is_new_line: true,
                segment_type: SegmentType::NewSpeaker,
            }
        } else if cur_beg_ms - self.last_end_ms.unwrap_or(0) > config.pause_threshold_ms as i64 {
            SegmentEvent {
                is_new_line: true,
                segment_type: SegmentType::Pause,
            }
        } else {
            SegmentEvent {
                is_new_line: false,
                segment_type: SegmentType::Continue,
            }
        };

        self.last_speaker = Some(speaker.to_owned());
        self.last_end_ms = Some(cur_end_ms);
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_event_is_always_new_speaker() {
        let config = Config::default();
        let mut eventer = SegmentEventer::new();
        let event = eventer.classify(&config, "发言人1", 0, 500);
        assert!(event.is_new_line);
        assert_eq!(event.segment_type, SegmentType::NewSpeaker);
    }

    #[test]
    fn speaker_change_forces_new_line() {
        let config = Config::default();
        let mut eventer = SegmentEventer::new();
        eventer.classify(&config, "发言人1", 0, 500);
        let event = eventer.classify(&config, "发言人2", 600, 1000);
        assert!(event.is_new_line);
        assert_eq!(event.segment_type, SegmentType::NewSpeaker);
    }

    #[test]
    fn long_pause_same_speaker_is_pause_not_new_speaker() {
        let config = Config::default();
        let mut eventer = SegmentEventer::new();
        eventer.classify(&config, "发言人1", 0, 500);
        let event = eventer.classify(&config, "发言人1", 2500, 3000);
        assert!(event.is_new_line);
        assert_eq!(event.segment_type, SegmentType::Pause);
    }

    #[test]
    fn short_gap_same_speaker_continues() {
        let config = Config::default();
        let mut eventer = SegmentEventer::new();
        eventer.classify(&config, "发言人1", 0, 500);
        let event = eventer.classify(&config, "发言人1", 700, 1000);
        assert!(!event.is_new_line);
        assert_eq!(event.segment_type, SegmentType::Continue);
    }

    #[test]
    fn traditional_mode_always_new_line() {
        let mut config = Config::default();
        config.enable_smart_line_break = false;
        let mut eventer = SegmentEventer::new();
        eventer.classify(&config, "发言人1", 0, 500);
        let event = eventer.classify(&config, "发言人1", 550, 1000);
        assert!(event.is_new_line);
        assert_eq!(event.segment_type, SegmentType::Traditional);
    }

    #[test]
    fn alternating_speakers_under_pause_threshold_are_all_new_speaker() {
        let config = Config::default();
        let mut eventer = SegmentEventer::new();
        let mut types = Vec::new();
        for (i, speaker) in ["发言人1", "发言人2", "发言人1", "发言人2"].into_iter().enumerate() {
            let beg = i as i64 * 1200;
            let end = beg + 1000;
            let event = eventer.classify(&config, speaker, beg, end);
            types.push(event.segment_type);
        }
        assert!(types.iter().all(|t| *t == SegmentType::NewSpeaker));
    }
}
