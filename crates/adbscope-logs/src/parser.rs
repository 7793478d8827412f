use regex::Regex;
use tracing::trace;

use adbscope_types::{FieldSpan, LogRecord, RecordSpans};

/// Grammar of one logcat line in the threadtime layout: date, time, pid,
/// tid, priority, tag, then ": " and the message. The tag may contain
/// spaces but never a colon; it is matched lazily so the first colon
/// followed by a space ends it.
const LINE_PATTERN: &str = r"^(\S+)\s+(\S+)\s+(\d+)\s+(\d+)\s+(\S+)\s+([^:]+?)\s*:\s(.+)$";

/// Splits raw logcat lines into field spans
pub struct LineParser {
    pattern: Regex,
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(LINE_PATTERN).expect("line pattern is valid"),
        }
    }

    /// Parse one line. Lines off the grammar yield None, as do pid fields
    /// that do not fit in an i32.
    pub fn parse(&self, raw: &str) -> Option<LogRecord> {
        let caps = self.pattern.captures(raw)?;
        let span = |i: usize| caps.get(i).map(|m| FieldSpan::new(m.start(), m.end()));
        let spans = RecordSpans {
            date: span(1)?,
            time: span(2)?,
            pid: span(3)?,
            tid: span(4)?,
            priority: span(5)?,
            tag: span(6)?,
            message: span(7)?,
        };
        let pid = match spans.pid.slice(raw).parse::<i32>() {
            Ok(pid) => pid,
            Err(_) => {
                trace!("pid out of range in line: {raw}");
                return None;
            }
        };
        Some(LogRecord::new(raw.to_string(), pid, spans))
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> LineParser {
        LineParser::new()
    }

    #[test]
    fn parses_a_plain_line() {
        let rec = parser()
            .parse("2020-01-01 10:00:00.000 111 222 I MyTag: hello")
            .unwrap();
        assert_eq!(rec.date(), "2020-01-01");
        assert_eq!(rec.time(), "10:00:00.000");
        assert_eq!(rec.pid(), 111);
        assert_eq!(rec.pid_text(), "111");
        assert_eq!(rec.tid(), "222");
        assert_eq!(rec.priority(), "I");
        assert_eq!(rec.tag(), "MyTag");
        assert_eq!(rec.message(), "hello");
    }

    #[test]
    fn parses_device_output_with_wide_padding() {
        let raw = "01-02 03:04:05.678  1234  5678 W ActivityManager: Slow operation";
        let rec = parser().parse(raw).unwrap();
        assert_eq!(rec.date(), "01-02");
        assert_eq!(rec.pid(), 1234);
        assert_eq!(rec.tid(), "5678");
        assert_eq!(rec.priority(), "W");
        assert_eq!(rec.tag(), "ActivityManager");
        assert_eq!(rec.message(), "Slow operation");
    }

    #[test]
    fn tag_may_contain_spaces() {
        let rec = parser()
            .parse("01-02 03:04:05.678 1 2 D my tag : spaced out")
            .unwrap();
        assert_eq!(rec.tag(), "my tag");
        assert_eq!(rec.message(), "spaced out");
    }

    #[test]
    fn first_separator_ends_the_tag() {
        let rec = parser()
            .parse("01-02 03:04:05.678 1 2 I a: b: hello")
            .unwrap();
        assert_eq!(rec.tag(), "a");
        assert_eq!(rec.message(), "b: hello");
    }

    #[test]
    fn rejects_lines_off_grammar() {
        let p = parser();
        assert!(p.parse("").is_none());
        assert!(p.parse("--------- beginning of main").is_none());
        assert!(p.parse(" 01-02 03:04:05.678 1 2 I Tag: indented").is_none());
        assert!(p.parse("01-02 03:04:05.678 1 2 I MyTag:nospace").is_none());
        assert!(p.parse("01-02 03:04:05.678 one 2 I Tag: hi").is_none());
        assert!(p.parse("01-02 03:04:05.678 1 2 I MyTag: ").is_none());
    }

    #[test]
    fn rejects_pid_beyond_i32() {
        assert!(
            parser()
                .parse("01-02 03:04:05.678 99999999999 2 I Tag: big")
                .is_none()
        );
    }

    #[test]
    fn spans_cover_the_raw_line() {
        let raw = "2020-01-01 10:00:01.000 333 444 E OtherTag: boom";
        let rec = parser().parse(raw).unwrap();
        let rebuilt = format!(
            "{} {} {} {} {} {}: {}",
            rec.date(),
            rec.time(),
            rec.pid_text(),
            rec.tid(),
            rec.priority(),
            rec.tag(),
            rec.message()
        );
        assert_eq!(rebuilt, raw);
    }
}
