//! Text normalization: strips ASR control tokens, renders emotion/event tokens as emoji,
//! and dedups adjacent emoji runs.
//!
//! ASR output carries inline tokens for language, emotion, and background events
//! (`<|zh|>`, `<|HAPPY|>`, `<|Applause|>`, ...). The token table below is the single
//! source of truth for how each one renders.

const EMO_DICT: &[(&str, &str)] = &[
    ("<|HAPPY|>", "😊"),
    ("<|SAD|>", "😔"),
    ("<|ANGRY|>", "😡"),
    ("<|NEUTRAL|>", ""),
    ("<|FEARFUL|>", "😰"),
    ("<|DISGUSTED|>", "🤢"),
    ("<|SURPRISED|>", "😮"),
];

const EVENT_DICT: &[(&str, &str)] = &[
    ("<|BGM|>", "🎼"),
    ("<|Speech|>", ""),
    ("<|Applause|>", "👏"),
    ("<|Laughter|>", "😀"),
    ("<|Cry|>", "😭"),
    ("<|Sneeze|>", "🤧"),
    ("<|Breath|>", ""),
    ("<|Cough|>", "🤧"),
];

const EMOJI_DICT: &[(&str, &str)] = &[
    ("<|nospeech|><|Event_UNK|>", "❓"),
    ("<|zh|>", ""),
    ("<|en|>", ""),
    ("<|yue|>", ""),
    ("<|ja|>", ""),
    ("<|ko|>", ""),
    ("<|nospeech|>", ""),
    ("<|HAPPY|>", "😊"),
    ("<|SAD|>", "😔"),
    ("<|ANGRY|>", "😡"),
    ("<|NEUTRAL|>", ""),
    ("<|BGM|>", "🎼"),
    ("<|Speech|>", ""),
    ("<|Applause|>", "👏"),
    ("<|Laughter|>", "😀"),
    ("<|FEARFUL|>", "😰"),
    ("<|DISGUSTED|>", "🤢"),
    ("<|SURPRISED|>", "😮"),
    ("<|Cry|>", "😭"),
    ("<|EMO_UNKNOWN|>", ""),
    ("<|Sneeze|>", "🤧"),
    ("<|Breath|>", ""),
    ("<|Cough|>", "😷"),
    ("<|Sing|>", ""),
    ("<|Speech_Noise|>", ""),
    ("<|withitn|>", ""),
    ("<|woitn|>", ""),
    ("<|GBG|>", ""),
    ("<|Event_UNK|>", ""),
];

const LANG_TOKENS: &[&str] = &["<|zh|>", "<|en|>", "<|yue|>", "<|ja|>", "<|ko|>", "<|nospeech|>"];
const LANG_MARKER: &str = "<|lang|>";

const EMO_SET: &[&str] = &["😊", "😔", "😡", "😰", "🤢", "😮"];
const EVENT_SET: &[&str] = &["🎼", "👏", "😀", "😭", "🤧", "😷"];

fn last_char(s: &str) -> Option<char> {
    s.chars().next_back()
}

fn first_char(s: &str) -> Option<char> {
    s.chars().next()
}

fn get_emo(s: &str) -> Option<char> {
    last_char(s).filter(|c| EMO_SET.iter().any(|e| e.chars().next() == Some(*c)))
}

fn get_event(s: &str) -> Option<char> {
    first_char(s).filter(|c| EVENT_SET.iter().any(|e| e.chars().next() == Some(*c)))
}

fn drop_last_char(s: &str) -> String {
    let mut chars = s.chars();
    chars.next_back();
    chars.as_str().to_owned()
}

fn drop_first_char(s: &str) -> String {
    let mut chars = s.chars();
    chars.next();
    chars.as_str().to_owned()
}

/// Strips control tokens, prepends event emoji, appends the mode-emotion emoji, and dedups
/// adjacent emoji/space runs. Operates on a single language-homogeneous span.
fn format_v2(s: &str) -> String {
    let mut s = s.to_owned();
    let mut counts = std::collections::HashMap::new();
    for (token, _) in EMOJI_DICT {
        counts.insert(*token, s.matches(token).count());
        s = s.replace(token, "");
    }

    let mut mode_emo = "<|NEUTRAL|>";
    for (token, _) in EMO_DICT {
        if counts.get(token).copied().unwrap_or(0) > counts.get(mode_emo).copied().unwrap_or(0) {
            mode_emo = token;
        }
    }

    for (token, emoji) in EVENT_DICT {
        if counts.get(token).copied().unwrap_or(0) > 0 {
            s = format!("{emoji}{s}");
        }
    }

    let emo_emoji = EMO_DICT.iter().find(|(t, _)| *t == mode_emo).map(|(_, e)| *e).unwrap_or("");
    s.push_str(emo_emoji);

    for emoji in EMO_SET.iter().chain(EVENT_SET.iter()) {
        s = s.replace(&format!(" {emoji}"), emoji);
        s = s.replace(&format!("{emoji} "), emoji);
    }

    s.trim().to_owned()
}

/// Full transform: language-token splitting, per-span `format_v2`, and cross-span emoji
/// dedup across adjacent normalized segments.
pub fn normalize(raw: &str) -> String {
    let mut s = raw.replace("<|nospeech|><|Event_UNK|>", "❓");
    for lang in LANG_TOKENS {
        s = s.replace(lang, LANG_MARKER);
    }

    let mut spans: Vec<String> = s.split(LANG_MARKER).map(|span| format_v2(span).trim().to_owned()).collect();
    if spans.is_empty() {
        return String::new();
    }

    let mut new_s = format!(" {}", spans[0]);
    let mut cur_event = get_event(&new_s);

    for i in 1..spans.len() {
        if spans[i].is_empty() {
            continue;
        }
        if get_event(&spans[i]) == cur_event && get_event(&spans[i]).is_some() {
            spans[i] = drop_first_char(&spans[i]);
        }
        cur_event = get_event(&spans[i]);
        if get_emo(&spans[i]).is_some() && get_emo(&spans[i]) == get_emo(&new_s) {
            new_s = drop_last_char(&new_s);
        }
        new_s.push_str(spans[i].trim());
    }

    new_s.trim().to_owned()
}

/// True if `s` contains a CJK unified ideograph, ASCII letter, or digit — used to suppress
/// ASR output that normalized down to only emoji/punctuation.
pub fn contains_chinese_english_number(s: &str) -> bool {
    s.chars()
        .any(|c| matches!(c, '\u{4e00}'..='\u{9fff}' | 'A'..='Z' | 'a'..='z' | '0'..='9'))
}
