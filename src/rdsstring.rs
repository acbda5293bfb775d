//! Positional character accumulators for PS, RadioText, PTY names and the
//! other segmented strings RDS transmits a few characters at a time.
//!
//! Characters arrive out of order and with losses, so the buffer tracks which
//! positions were filled *sequentially* (adjacent to the previous update) and
//! only then counts them as received. A 0x0D carriage return terminates the
//! string early; completion snapshots the text so later updates cannot tear
//! an already-reported message.

use crate::tables::decode_rds_char;

/// The string terminator used by RadioText and friends.
const TERMINATOR: u8 = 0x0D;

/// One received character and whether it arrived adjacent to the previous
/// update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RdsChar {
    pub code: u8,
    pub is_sequential: bool,
}

impl RdsChar {
    pub fn new(code: u8) -> Self {
        Self {
            code,
            is_sequential: false,
        }
    }
}

/// A fixed-capacity segmented string buffer.
pub struct RdsString {
    chars: Vec<RdsChar>,
    last_complete_chars: Vec<RdsChar>,
    last_complete_string: String,
    prev_pos: Option<usize>,
    has_previously_received_terminators: bool,
}

impl RdsString {
    pub fn new(capacity: usize) -> Self {
        Self {
            chars: vec![RdsChar::default(); capacity],
            last_complete_chars: Vec::new(),
            last_complete_string: String::new(),
            prev_pos: None,
            has_previously_received_terminators: false,
        }
    }

    /// Store one character at `pos`.
    pub fn set(&mut self, pos: usize, mut chr: RdsChar) {
        if pos >= self.chars.len() {
            return;
        }

        chr.is_sequential = pos == 0
            || (self.prev_pos == Some(pos - 1) && self.chars[pos - 1].is_sequential);
        self.chars[pos] = chr;

        if chr.code == TERMINATOR {
            self.has_previously_received_terminators = true;
        }

        if self.is_complete() {
            let expected = self.expected_length();
            self.last_complete_chars = self.chars[..expected].to_vec();
            self.last_complete_string = self.render(&self.chars[..expected]);
        }

        self.prev_pos = Some(pos);
    }

    /// Store two adjacent characters starting at `pos`.
    pub fn set_pair(&mut self, pos: usize, chr1: RdsChar, chr2: RdsChar) {
        self.set(pos, chr1);
        self.set(pos + 1, chr2);
    }

    /// Number of characters received in unbroken sequence from position 0.
    pub fn received_length(&self) -> usize {
        self.chars
            .iter()
            .take_while(|chr| chr.is_sequential)
            .count()
    }

    /// Length the string is expected to reach: the position of the first
    /// terminator if one was stored, otherwise the full capacity.
    pub fn expected_length(&self) -> usize {
        self.chars
            .iter()
            .position(|chr| chr.code == TERMINATOR)
            .unwrap_or(self.chars.len())
    }

    pub fn is_complete(&self) -> bool {
        self.received_length() >= self.expected_length()
    }

    /// Whether a terminator has ever been stored in this buffer, across
    /// clears. Backs the RadioText random-length heuristic.
    pub fn has_previously_received_terminators(&self) -> bool {
        self.has_previously_received_terminators
    }

    /// The current buffer contents up to the expected length, unreceived
    /// positions rendered as spaces.
    pub fn string(&self) -> String {
        self.render(&self.chars[..self.expected_length()])
    }

    /// The snapshot taken at the last completion.
    pub fn last_complete_string(&self) -> &str {
        &self.last_complete_string
    }

    /// A slice of the last-complete snapshot, or an empty string if the
    /// requested range was never part of a completed message.
    pub fn last_complete_substring(&self, start: usize, len: usize) -> String {
        if start + len > self.last_complete_chars.len() {
            return String::new();
        }
        self.render(&self.last_complete_chars[start..start + len])
    }

    /// Whether the last-complete snapshot covers `len` characters starting at
    /// `start`.
    pub fn has_chars(&self, start: usize, len: usize) -> bool {
        start + len <= self.last_complete_chars.len()
    }

    /// Raw characters up to the expected length.
    pub fn chars(&self) -> &[RdsChar] {
        &self.chars[..self.expected_length()]
    }

    /// Change the capacity, keeping existing characters where they fit.
    /// RadioText is 64 characters in version-A groups but 32 in version B.
    pub fn resize(&mut self, capacity: usize) {
        self.chars.resize(capacity, RdsChar::default());
    }

    /// Wipe the buffer and its completion snapshot. The terminator-history
    /// flag survives: a station that terminates its messages once is known to
    /// use terminators.
    pub fn clear(&mut self) {
        for chr in &mut self.chars {
            *chr = RdsChar::default();
        }
        self.last_complete_chars.clear();
        self.last_complete_string.clear();
        self.prev_pos = None;
    }

    fn render(&self, chars: &[RdsChar]) -> String {
        chars.iter().map(|chr| decode_rds_char(chr.code)).collect()
    }
}

/// An [`RdsString`] paired with the A/B toggle latch and the cache used by
/// the RadioText repeat heuristic.
///
/// RadioText, PTY names and RadioText+ all share the same pattern: a toggle
/// bit is latched, and a change requests a buffer wipe because the message
/// contents are about to change.
pub struct TextBuffer {
    pub text: RdsString,
    ab_flag: Option<bool>,
    pub previous_potentially_complete_message: String,
}

impl TextBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            text: RdsString::new(capacity),
            ab_flag: None,
            previous_potentially_complete_message: String::new(),
        }
    }

    /// Latch the A/B bit; true when it differs from the previous group's.
    pub fn ab_changed(&mut self, ab: bool) -> bool {
        let changed = self.ab_flag.is_some_and(|prev| prev != ab);
        self.ab_flag = Some(ab);
        changed
    }

    pub fn update_pair(&mut self, pos: usize, chr1: RdsChar, chr2: RdsChar) {
        self.text.set_pair(pos, chr1, chr2);
    }

    pub fn update_quad(
        &mut self,
        pos: usize,
        chr1: RdsChar,
        chr2: RdsChar,
        chr3: RdsChar,
        chr4: RdsChar,
    ) {
        self.text.set_pair(pos, chr1, chr2);
        self.text.set_pair(pos + 2, chr3, chr4);
    }
}
