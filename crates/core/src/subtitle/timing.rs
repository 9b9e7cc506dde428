//! Cue timestamp parsing and fixed-offset shifting.

use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};

use super::convert::CUE_ARROW;

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+):(\d{2}):(\d{2})([,.])(\d{3})").expect("timestamp regex is valid")
});

/// A cue timestamp in milliseconds, remembering its decimal separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub millis: i64,
    pub separator: char,
}

impl Timestamp {
    /// Parses `HH:MM:SS,mmm` (or with a dot separator).
    pub fn parse(s: &str) -> Option<Self> {
        let caps = TIMESTAMP.captures(s.trim())?;
        Self::from_captures(&caps)
    }

    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let hours: i64 = caps.get(1)?.as_str().parse().ok()?;
        let minutes: i64 = caps.get(2)?.as_str().parse().ok()?;
        let seconds: i64 = caps.get(3)?.as_str().parse().ok()?;
        let separator = caps.get(4)?.as_str().chars().next()?;
        let millis: i64 = caps.get(5)?.as_str().parse().ok()?;

        Some(Self {
            millis: ((hours * 60 + minutes) * 60 + seconds) * 1000 + millis,
            separator,
        })
    }

    /// Shifts by `offset_ms`, clamping at zero.
    pub fn shifted(self, offset_ms: i64) -> Self {
        Self {
            millis: self.millis.saturating_add(offset_ms).max(0),
            separator: self.separator,
        }
    }

    pub fn format(&self) -> String {
        let total = self.millis.max(0);
        let ms = total % 1000;
        let secs = total / 1000;
        format!(
            "{:02}:{:02}:{:02}{}{:03}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            self.separator,
            ms
        )
    }
}

/// Shifts every timestamp on a timing line; other lines pass through.
pub fn shift_line(line: &str, offset_ms: i64) -> String {
    if !line.contains(CUE_ARROW) {
        return line.to_string();
    }
    TIMESTAMP
        .replace_all(line, |caps: &Captures<'_>| match Timestamp::from_captures(caps) {
            Some(ts) => ts.shifted(offset_ms).format(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Shifts every cue in a subtitle document by `offset_ms`.
///
/// Negative results are clamped to `00:00:00,000`, so shifting back and forth
/// only round-trips when no cue hit zero. Line endings (`\n` or `\r\n`) are
/// kept as they are.
pub fn shift_cues(text: &str, offset_ms: i64) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let body = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
        out.push_str(&shift_line(body, offset_ms));
        out.push_str(&line[body.len()..]);
    }
    out
}
