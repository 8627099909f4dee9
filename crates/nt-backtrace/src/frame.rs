//! Frame and backtrace types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A structured frame as supplied by a caller or produced by stack capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Source file path.
    pub file: String,

    /// Line number within the file.
    #[serde(default, alias = "number")]
    pub line: Option<u32>,

    /// Method or function name.
    #[serde(default, alias = "function")]
    pub method: Option<String>,
}

impl FrameRecord {
    /// Create a record with all three parts.
    pub fn new(file: impl Into<String>, line: u32, method: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            method: Some(method.into()),
        }
    }
}

/// One entry of a raw trace, before parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFrame {
    /// A single text line, e.g. `lib/foo.rb:10:in 'bar'`.
    Line(String),
    /// An already-structured frame.
    Record(FrameRecord),
}

impl From<&str> for RawFrame {
    fn from(line: &str) -> Self {
        RawFrame::Line(line.to_string())
    }
}

impl From<String> for RawFrame {
    fn from(line: String) -> Self {
        RawFrame::Line(line)
    }
}

impl From<FrameRecord> for RawFrame {
    fn from(record: FrameRecord) -> Self {
        RawFrame::Record(record)
    }
}

/// A parsed stack frame.
///
/// Entries that could not be parsed keep their original text in `raw` with
/// `parsed == false` and no file, line or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// The original text of the entry.
    pub raw: String,

    /// Parsed file path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Parsed line number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// Parsed method name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Whether the entry matched a recognized shape.
    pub parsed: bool,
}

impl Frame {
    /// A frame that did not match any recognized shape.
    pub fn unparsed(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            file: None,
            line: None,
            method: None,
            parsed: false,
        }
    }

    /// A successfully parsed frame.
    pub fn parsed(
        raw: impl Into<String>,
        file: impl Into<String>,
        line: Option<u32>,
        method: Option<String>,
    ) -> Self {
        Self {
            raw: raw.into(),
            file: Some(file.into()),
            line,
            method,
            parsed: true,
        }
    }

    /// Build a frame from a structured record.
    ///
    /// A record without a file name carries nothing to locate, so it is kept
    /// as an unparsed frame.
    pub fn from_record(record: &FrameRecord) -> Self {
        let raw = render_line(&record.file, record.line, record.method.as_deref());
        if record.file.trim().is_empty() {
            return Self::unparsed(raw);
        }
        Self::parsed(raw, record.file.clone(), record.line, record.method.clone())
    }

    /// File as reported on the wire: the parsed file, or the raw text for
    /// unparsed frames.
    pub fn wire_file(&self) -> &str {
        self.file.as_deref().unwrap_or(&self.raw)
    }

    /// Method as reported on the wire (empty when unknown).
    pub fn wire_method(&self) -> &str {
        self.method.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.parsed) {
            (Some(file), true) => write!(
                f,
                "{}",
                render_line(file, self.line, self.method.as_deref())
            ),
            _ => write!(f, "{}", self.raw),
        }
    }
}

fn render_line(file: &str, line: Option<u32>, method: Option<&str>) -> String {
    let mut out = file.to_string();
    if let Some(line) = line {
        out.push_str(&format!(":{}", line));
    }
    if let Some(method) = method {
        out.push_str(&format!(":in '{}'", method));
    }
    out
}

/// An ordered sequence of frames, most recent call first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Backtrace {
    frames: Vec<Frame>,
}

impl Backtrace {
    /// Create a backtrace from already-parsed frames.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// An empty backtrace.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The frames in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate over the frames.
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Consume the backtrace, returning its frames.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl<'a> IntoIterator for &'a Backtrace {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl fmt::Display for Backtrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, frame) in self.frames.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", frame)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_frame_deserialize_line() {
        let raw: RawFrame = serde_json::from_str(r#""foo.rb:10:in 'bar'""#).unwrap();
        assert_eq!(raw, RawFrame::Line("foo.rb:10:in 'bar'".to_string()));
    }

    #[test]
    fn test_raw_frame_deserialize_record_aliases() {
        let raw: RawFrame =
            serde_json::from_str(r#"{"file": "src/main.rs", "number": 7, "function": "main"}"#)
                .unwrap();
        assert_eq!(raw, RawFrame::Record(FrameRecord::new("src/main.rs", 7, "main")));
    }

    #[test]
    fn test_frame_from_record() {
        let frame = Frame::from_record(&FrameRecord::new("src/lib.rs", 42, "run"));
        assert!(frame.parsed);
        assert_eq!(frame.file.as_deref(), Some("src/lib.rs"));
        assert_eq!(frame.raw, "src/lib.rs:42:in 'run'");
    }

    #[test]
    fn test_frame_from_record_without_file() {
        let record = FrameRecord {
            file: "  ".to_string(),
            line: None,
            method: Some("anon".to_string()),
        };
        let frame = Frame::from_record(&record);
        assert!(!frame.parsed);
        assert!(frame.file.is_none());
    }

    #[test]
    fn test_wire_file_falls_back_to_raw() {
        let frame = Frame::unparsed("garbage-line");
        assert_eq!(frame.wire_file(), "garbage-line");
        assert_eq!(frame.wire_method(), "");
    }

    #[test]
    fn test_backtrace_display() {
        let bt = Backtrace::new(vec![
            Frame::parsed("a", "a.rb", Some(1), Some("x".to_string())),
            Frame::unparsed("???"),
        ]);
        assert_eq!(bt.to_string(), "a.rb:1:in 'x'\n???");
    }
}
