//! Shared types for adbscope
//!
//! This crate contains data structures used across multiple adbscope crates.

use ratatui::style::Color;

// ============================================================================
// Record Types
// ============================================================================

/// Half-open byte range into a raw line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpan {
    start: usize,
    end: usize,
}

impl FieldSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Zero-width span at the given position
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Materialize the field from the line the span was built against
    pub fn slice<'a>(&self, raw: &'a str) -> &'a str {
        &raw[self.start..self.end]
    }
}

/// Byte spans of the seven logcat fields within one raw line
#[derive(Clone, Copy, Debug)]
pub struct RecordSpans {
    pub date: FieldSpan,
    pub time: FieldSpan,
    pub pid: FieldSpan,
    pub tid: FieldSpan,
    pub priority: FieldSpan,
    pub tag: FieldSpan,
    pub message: FieldSpan,
}

/// One parsed logcat line
///
/// Immutable once created. Field accessors slice the stored line through
/// their spans instead of holding copies.
#[derive(Clone, Debug)]
pub struct LogRecord {
    raw: String,
    pid: i32,
    spans: RecordSpans,
}

impl LogRecord {
    /// Build a record from a matched line. The pid must be the parsed value
    /// of the pid span; spans must be ordered and lie within the line.
    pub fn new(raw: String, pid: i32, spans: RecordSpans) -> Self {
        debug_assert!(spans.date.end() <= spans.time.start());
        debug_assert!(spans.time.end() <= spans.pid.start());
        debug_assert!(spans.pid.end() <= spans.tid.start());
        debug_assert!(spans.tid.end() <= spans.priority.start());
        debug_assert!(spans.priority.end() <= spans.tag.start());
        debug_assert!(spans.tag.end() <= spans.message.start());
        debug_assert!(spans.message.end() <= raw.len());
        Self { raw, pid, spans }
    }

    /// The line exactly as it arrived from the stream
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Numeric pid, parsed once at construction
    pub fn pid(&self) -> i32 {
        self.pid
    }

    pub fn date(&self) -> &str {
        self.spans.date.slice(&self.raw)
    }

    pub fn time(&self) -> &str {
        self.spans.time.slice(&self.raw)
    }

    /// The pid field as it appears in the line
    pub fn pid_text(&self) -> &str {
        self.spans.pid.slice(&self.raw)
    }

    pub fn tid(&self) -> &str {
        self.spans.tid.slice(&self.raw)
    }

    pub fn priority(&self) -> &str {
        self.spans.priority.slice(&self.raw)
    }

    pub fn tag(&self) -> &str {
        self.spans.tag.slice(&self.raw)
    }

    pub fn message(&self) -> &str {
        self.spans.message.slice(&self.raw)
    }
}

/// One process table entry: user, pid, parent pid, and process name,
/// stored as spans into the reported line
#[derive(Clone, Debug)]
pub struct ProcessRecord {
    raw: String,
    pid: i32,
    user: FieldSpan,
    pid_span: FieldSpan,
    ppid: FieldSpan,
    name: FieldSpan,
}

impl ProcessRecord {
    pub fn new(
        raw: String,
        pid: i32,
        user: FieldSpan,
        pid_span: FieldSpan,
        ppid: FieldSpan,
        name: FieldSpan,
    ) -> Self {
        debug_assert!(name.end() <= raw.len());
        Self {
            raw,
            pid,
            user,
            pid_span,
            ppid,
            name,
        }
    }

    /// Synthetic entry for a pid the process table never reported.
    /// The name is empty so lookups resolve to "" until a refresh fills it in.
    pub fn placeholder(pid: i32) -> Self {
        let pid_text = pid.to_string();
        let raw = format!("unknown {pid_text} 0");
        let pid_start = "unknown ".len();
        let pid_end = pid_start + pid_text.len();
        let ppid_start = pid_end + 1;
        let end = raw.len();
        Self {
            pid,
            user: FieldSpan::new(0, 7),
            pid_span: FieldSpan::new(pid_start, pid_end),
            ppid: FieldSpan::new(ppid_start, ppid_start + 1),
            name: FieldSpan::empty(end),
            raw,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    pub fn user(&self) -> &str {
        self.user.slice(&self.raw)
    }

    pub fn pid_text(&self) -> &str {
        self.pid_span.slice(&self.raw)
    }

    pub fn parent_id(&self) -> &str {
        self.ppid.slice(&self.raw)
    }

    pub fn name(&self) -> &str {
        self.name.slice(&self.raw)
    }
}

// ============================================================================
// Filter Types
// ============================================================================

/// The record fields a filter can match on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterField {
    Pid,
    ParentId,
    Name,
    Priority,
    Tag,
}

impl FilterField {
    pub const ALL: [FilterField; 5] = [
        FilterField::Pid,
        FilterField::ParentId,
        FilterField::Name,
        FilterField::Priority,
        FilterField::Tag,
    ];

    /// Get display label for this field
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pid => "pid",
            Self::ParentId => "ppid",
            Self::Name => "name",
            Self::Priority => "priority",
            Self::Tag => "tag",
        }
    }
}

impl std::fmt::Display for FilterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One field predicate: a regex pattern plus an invert flag.
/// An empty pattern matches every value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldFilter {
    pub pattern: String,
    pub invert: bool,
}

impl FieldFilter {
    pub fn new(pattern: impl Into<String>, invert: bool) -> Self {
        Self {
            pattern: pattern.into(),
            invert,
        }
    }
}

/// A full filter: one predicate per filterable field, combined with AND
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub pid: FieldFilter,
    pub parent_id: FieldFilter,
    pub name: FieldFilter,
    pub priority: FieldFilter,
    pub tag: FieldFilter,
}

impl FilterSpec {
    pub fn field(&self, field: FilterField) -> &FieldFilter {
        match field {
            FilterField::Pid => &self.pid,
            FilterField::ParentId => &self.parent_id,
            FilterField::Name => &self.name,
            FilterField::Priority => &self.priority,
            FilterField::Tag => &self.tag,
        }
    }

    pub fn field_mut(&mut self, field: FilterField) -> &mut FieldFilter {
        match field {
            FilterField::Pid => &mut self.pid,
            FilterField::ParentId => &mut self.parent_id,
            FilterField::Name => &mut self.name,
            FilterField::Priority => &mut self.priority,
            FilterField::Tag => &mut self.tag,
        }
    }

    /// True when no pattern or invert flag is set.
    /// An empty pattern with invert set matches nothing, not everything.
    pub fn is_empty(&self) -> bool {
        FilterField::ALL.iter().all(|&f| {
            let filter = self.field(f);
            filter.pattern.is_empty() && !filter.invert
        })
    }
}

// ============================================================================
// Display Types
// ============================================================================

/// Logcat priority, one letter per record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    Verbose,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
    Silent,
    Unknown,
}

impl Priority {
    /// Parse the single-letter priority field
    pub fn from_letter(s: &str) -> Self {
        match s.chars().next() {
            Some('V') => Self::Verbose,
            Some('D') => Self::Debug,
            Some('I') => Self::Info,
            Some('W') => Self::Warn,
            Some('E') => Self::Error,
            Some('F') => Self::Fatal,
            Some('S') => Self::Silent,
            _ => Self::Unknown,
        }
    }

    /// Get display color for this priority
    pub fn color(&self) -> Color {
        match self {
            Self::Verbose => Color::DarkGray,
            Self::Debug => Color::Cyan,
            Self::Info => Color::Green,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
            Self::Fatal => Color::Magenta,
            Self::Silent => Color::DarkGray,
            Self::Unknown => Color::White,
        }
    }

    /// The letter as logcat prints it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verbose => "V",
            Self::Debug => "D",
            Self::Info => "I",
            Self::Warn => "W",
            Self::Error => "E",
            Self::Fatal => "F",
            Self::Silent => "S",
            Self::Unknown => "?",
        }
    }
}

/// The nine table columns, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    Date,
    Time,
    Pid,
    Tid,
    Ppid,
    Name,
    Priority,
    Tag,
    Message,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Date,
        Column::Time,
        Column::Pid,
        Column::Tid,
        Column::Ppid,
        Column::Name,
        Column::Priority,
        Column::Tag,
        Column::Message,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Pid => "PID",
            Self::Tid => "TID",
            Self::Ppid => "PPID",
            Self::Name => "Name",
            Self::Priority => "Priority",
            Self::Tag => "Tag",
            Self::Message => "Message",
        }
    }
}
