//! Result log tail reading
//!
//! The result log is append-only; readers only ever want the most
//! recent entries. [`TailReader`] consumes the log line by line, front
//! to back, and keeps a bounded tail, so a full scan needs one record
//! of look-back per retained slot and no knowledge of the log length up
//! front. The storage backend stays out of this module: the firmware
//! storage task owns the flash queue and feeds lines in write order.

use heapless::{Deque, Vec};

use photogate_protocol::{ResultRecord, MAX_RESULTS_PAGE};

/// One page of results read from the log
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResultPage {
    /// The retained tail, oldest first
    pub records: Vec<ResultRecord, MAX_RESULTS_PAGE>,
    /// Records successfully parsed over the whole scan
    pub total: u32,
    /// Lines that failed to parse and were dropped
    pub skipped: u32,
}

/// Streaming reader for the newest `limit` records of the log
#[derive(Debug)]
pub struct TailReader {
    tail: Deque<ResultRecord, MAX_RESULTS_PAGE>,
    limit: usize,
    total: u32,
    skipped: u32,
}

impl TailReader {
    /// Create a reader keeping at most `limit` records
    ///
    /// The limit is clamped to `1..=MAX_RESULTS_PAGE`; `None` asks for
    /// a full page.
    pub fn new(limit: Option<usize>) -> Self {
        let limit = limit.unwrap_or(MAX_RESULTS_PAGE).clamp(1, MAX_RESULTS_PAGE);
        Self {
            tail: Deque::new(),
            limit,
            total: 0,
            skipped: 0,
        }
    }

    /// Feed one raw log line, in write order
    ///
    /// Corrupt lines are counted and dropped; a partially torn write at
    /// the log tail must not hide the intact records before it.
    pub fn push_line(&mut self, line: &str) {
        match ResultRecord::parse_line(line) {
            Ok(record) => {
                self.total += 1;
                if self.tail.len() == self.limit {
                    self.tail.pop_front();
                }
                // Cannot fail: limit never exceeds the deque capacity
                let _ = self.tail.push_back(record);
            }
            Err(_) => self.skipped += 1,
        }
    }

    /// Finish the scan and hand back the page, oldest first
    pub fn finish(mut self) -> ResultPage {
        let mut records = Vec::new();
        while let Some(record) = self.tail.pop_front() {
            // Cannot fail: the deque and the vec share their capacity
            let _ = records.push(record);
        }
        ResultPage {
            records,
            total: self.total,
            skipped: self.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    fn line(n: u32) -> String<64> {
        let mut s = String::new();
        core::fmt::Write::write_fmt(
            &mut s,
            format_args!("run device=gate-01 elapsed_ms={n} received_ms={n}"),
        )
        .unwrap();
        s
    }

    #[test]
    fn test_tail_keeps_newest_in_write_order() {
        let mut reader = TailReader::new(Some(2));
        for n in 1..=5 {
            reader.push_line(&line(n));
        }
        let page = reader.finish();
        assert_eq!(page.total, 5);
        assert_eq!(page.skipped, 0);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].elapsed_ms, Some(4));
        assert_eq!(page.records[1].elapsed_ms, Some(5));
    }

    #[test]
    fn test_short_log_returns_everything() {
        let mut reader = TailReader::new(Some(10));
        reader.push_line(&line(1));
        reader.push_line(&line(2));
        let page = reader.finish();
        assert_eq!(page.total, 2);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].elapsed_ms, Some(1));
    }

    #[test]
    fn test_corrupt_lines_skipped_not_fatal() {
        let mut reader = TailReader::new(None);
        reader.push_line(&line(1));
        reader.push_line("run device=gate-01 received_ms=garbage");
        reader.push_line("\u{0}\u{0}\u{0}\u{0}");
        reader.push_line(&line(2));
        let page = reader.finish();
        assert_eq!(page.total, 2);
        assert_eq!(page.skipped, 2);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[1].elapsed_ms, Some(2));
    }

    #[test]
    fn test_limit_is_clamped() {
        let mut reader = TailReader::new(Some(0));
        reader.push_line(&line(1));
        reader.push_line(&line(2));
        let page = reader.finish();
        // A zero limit still returns the single newest record
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].elapsed_ms, Some(2));

        let mut reader = TailReader::new(Some(1_000));
        for n in 0..40 {
            reader.push_line(&line(n));
        }
        let page = reader.finish();
        assert_eq!(page.records.len(), MAX_RESULTS_PAGE);
        assert_eq!(page.total, 40);
    }

    #[test]
    fn test_empty_log() {
        let page = TailReader::new(None).finish();
        assert_eq!(page.total, 0);
        assert_eq!(page.skipped, 0);
        assert!(page.records.is_empty());
    }
}
