//! `key=value` line encoding and decoding
//!
//! A line is a tag word followed by space-separated `key=value` pairs.
//! Keys and values are bare ASCII tokens: printable, no whitespace, no
//! `=`. Multi-word values are not representable; callers use
//! underscores (`dog_name=Blue_Merle`).

use core::fmt::Write;

use heapless::String;

/// Maximum encoded line length, excluding the terminator
pub const MAX_LINE_LEN: usize = 192;

/// Errors from line encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Encoded line would exceed [`MAX_LINE_LEN`]
    LineTooLong,
    /// Key or value contains whitespace, `=`, or non-printable bytes
    InvalidToken,
    /// A required key is absent
    MissingField,
    /// A numeric value failed to parse
    BadNumber,
    /// The leading tag word is not recognized
    UnknownTag,
}

/// Check that a token is safe to embed in a line
pub fn is_valid_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_graphic() && b != b'=')
}

/// Incremental writer for one `key=value` line
///
/// Appends pairs after a leading tag word. Values are validated before
/// being written; an invalid or overlong pair leaves the line unchanged
/// and returns an error.
pub struct KvWriter {
    line: String<MAX_LINE_LEN>,
}

impl KvWriter {
    /// Start a line with the given tag word
    pub fn new(tag: &str) -> Result<Self, LineError> {
        if !is_valid_token(tag) {
            return Err(LineError::InvalidToken);
        }
        let mut line = String::new();
        line.push_str(tag).map_err(|_| LineError::LineTooLong)?;
        Ok(Self { line })
    }

    /// Append one `key=value` pair
    pub fn pair(&mut self, key: &str, value: &str) -> Result<(), LineError> {
        if !is_valid_token(key) || !is_valid_token(value) {
            return Err(LineError::InvalidToken);
        }
        let len_before = self.line.len();
        if write!(self.line, " {}={}", key, value).is_err() {
            self.line.truncate(len_before);
            return Err(LineError::LineTooLong);
        }
        Ok(())
    }

    /// Append a `key=value` pair with a `u32` value
    pub fn pair_u32(&mut self, key: &str, value: u32) -> Result<(), LineError> {
        let len_before = self.line.len();
        if write!(self.line, " {}={}", key, value).is_err() {
            self.line.truncate(len_before);
            return Err(LineError::LineTooLong);
        }
        Ok(())
    }

    /// Append a pair only when the value is present
    pub fn pair_opt(&mut self, key: &str, value: Option<&str>) -> Result<(), LineError> {
        match value {
            Some(v) => self.pair(key, v),
            None => Ok(()),
        }
    }

    /// Append a numeric pair only when the value is present
    pub fn pair_opt_u32(&mut self, key: &str, value: Option<u32>) -> Result<(), LineError> {
        match value {
            Some(v) => self.pair_u32(key, v),
            None => Ok(()),
        }
    }

    /// Append an `on`/`off` flag pair
    pub fn pair_flag(&mut self, key: &str, value: bool) -> Result<(), LineError> {
        self.pair(key, if value { "on" } else { "off" })
    }

    /// Finish the line
    pub fn finish(self) -> String<MAX_LINE_LEN> {
        self.line
    }
}

/// Split a line into its tag word and the remainder
///
/// Returns `(tag, rest)` where `rest` may be empty.
pub fn split_tag(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((tag, rest)) => (tag, rest.trim_start()),
        None => (line, ""),
    }
}

/// Iterate over the well-formed `key=value` pairs of a line body
///
/// Tokens without `=` are silently skipped; strict callers count what
/// they consumed and decide for themselves whether the line was usable.
pub fn pairs(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.split_ascii_whitespace()
        .filter_map(|tok| tok.split_once('='))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
}

/// Parse a `u32` value, mapping failure to [`LineError::BadNumber`]
pub fn parse_u32(value: &str) -> Result<u32, LineError> {
    value.parse::<u32>().map_err(|_| LineError::BadNumber)
}

/// Parse an `on`/`off` flag value
pub fn parse_flag(value: &str) -> Result<bool, LineError> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(LineError::InvalidToken),
    }
}
