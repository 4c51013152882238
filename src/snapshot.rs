//! Point-in-time copies of the reservoir and their renderings.
//!
//! A [`Snapshot`] is always sorted ascending by sequence index. It can be
//! rendered three ways:
//!
//! - JSON: `{"lines": [...], "lineNumbers": [...], "seen": N}` with parallel arrays.
//! - numbered text: `<lineNumber>\t<content>\n` per record.
//! - plain text: `<content>\n` per record.

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use crate::reservoir::Entry;
use crate::Result;

/// A consistent, stream-ordered copy of the reservoir.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<Entry>,
    seen: u64,
}

impl Snapshot {
    /// Build a snapshot from entries in slot order; `seen` must be captured
    /// together with them.
    pub fn from_unordered(mut entries: Vec<Entry>, seen: u64) -> Self {
        // Sequence indices are unique, so an unstable sort is deterministic.
        entries.sort_unstable_by_key(|entry| entry.sequence_index);
        Self { entries, seen }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Records observed by the reservoir when the copy was taken.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&SampleBody::from(self))
    }

    /// Write `<sequenceIndex>\t<content>\n` for every entry.
    pub fn write_numbered<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        for entry in &self.entries {
            writeln!(out, "{}\t{}", entry.sequence_index, entry.content)?;
        }
        Ok(())
    }

    /// Write `<content>\n` for every entry.
    pub fn write_plain<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        for entry in &self.entries {
            writeln!(out, "{}", entry.content)?;
        }
        Ok(())
    }

    pub fn render(&self, format: OutputFormat) -> Result<Vec<u8>> {
        let body = match format {
            OutputFormat::Json => self.to_json()?,
            OutputFormat::Numbered => {
                let mut body = Vec::new();
                self.write_numbered(&mut body)?;
                body
            }
            OutputFormat::Plain => {
                let mut body = Vec::new();
                self.write_plain(&mut body)?;
                body
            }
        };
        Ok(body)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SampleBody<'a> {
    lines: Vec<&'a str>,
    line_numbers: Vec<u64>,
    seen: u64,
}

impl<'a> From<&'a Snapshot> for SampleBody<'a> {
    fn from(snapshot: &'a Snapshot) -> Self {
        let (lines, line_numbers) = snapshot
            .entries
            .iter()
            .map(|entry| (entry.content.as_str(), entry.sequence_index))
            .unzip();
        Self {
            lines,
            line_numbers,
            seen: snapshot.seen,
        }
    }
}

/// Wire format of a rendered snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    /// `<lineNumber>\t<content>` lines.
    Numbered,
    /// `<content>` lines.
    Plain,
}

impl OutputFormat {
    /// Pick a format from the `t` (numbered) and `p` (plain) request
    /// parameters. Plain wins when both are truthy.
    pub fn from_params(numbered: Option<&str>, plain: Option<&str>) -> Self {
        if plain.is_some_and(truthy) {
            Self::Plain
        } else if numbered.is_some_and(truthy) {
            Self::Numbered
        } else {
            Self::Json
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Numbered | Self::Plain => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Numbered => write!(f, "numbered"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

/// Parse a loosely boolean request parameter.
///
/// False only when empty or one of `false`, `f`, `0` (any case).
pub fn truthy(value: &str) -> bool {
    !(value.is_empty()
        || value == "0"
        || value.eq_ignore_ascii_case("f")
        || value.eq_ignore_ascii_case("false"))
}
