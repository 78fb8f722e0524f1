//! Locating a `[section]` block and merging managed keys into it.
//!
//! # Section boundaries
//!
//! A section starts at the first line whose trimmed text is `[name]` and
//! ends at the next line beginning with `[` (or at the end of the document).
//! The blank lines sitting directly above that next header are *padding*:
//! they are counted separately so the merge can put the same padding back.
//!
//! ```text
//! 0  [DEFAULT]
//! 1  debug = true
//! 2
//! 3  [workarounds]        <- start = 3
//! 4  foo = bar            <- body
//! 5                       <- padding (trailing_blank = 2)
//! 6
//! 7  [libvirt]            <- end = 7
//! ```
//!
//! A section that runs to end-of-file has `end == len`; blank lines at the
//! end of the file count as its padding.
//!
//! # Duplicate headers
//!
//! Only the first `[name]` block is merged.  Managed keys found in any later
//! block with the same header are removed, so the merged block is the only
//! place a reader can pick them up.
//!
//! # Line endings
//!
//! Lines written by the merge use the terminator of the section header, or
//! the document's first terminator when the section is appended.  A CRLF
//! file stays CRLF.

use std::ops::Range;

use super::document::{is_blank, terminated, terminator, ConfigDocument};

/// Location of one section inside a [`ConfigDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    /// Index of the `[name]` header line.
    pub start: usize,
    /// Index of the next header, or the document length.
    pub end: usize,
    /// Contiguous blank lines directly above the next header (or end-of-file).
    pub trailing_blank: usize,
}

impl SectionSpan {
    /// Line indices between the header and the padding.
    pub fn body(&self) -> Range<usize> {
        self.start + 1..self.end - self.trailing_blank
    }

    /// Line indices of the padding before the next header.
    pub fn padding(&self) -> Range<usize> {
        self.end - self.trailing_blank..self.end
    }
}

/// A key the merge is authoritative over, with its desired value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedSetting {
    pub key: String,
    pub value: String,
}

impl ManagedSetting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A boolean setting, rendered as lowercase `true` / `false`.
    pub fn flag(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, if value { "true" } else { "false" })
    }

    /// The canonical `key = value` line, terminated by `eol`.
    pub fn line(&self, eol: &str) -> String {
        format!("{} = {}{eol}", self.key, self.value)
    }
}

/// Finds the first `[name]` section in `doc`.
///
/// Returns `None` when no header matches.
pub fn find_section(doc: &ConfigDocument, name: &str) -> Option<SectionSpan> {
    let lines = doc.lines();
    let header = format!("[{name}]");

    let start = lines.iter().position(|line| line.trim() == header)?;
    let end = lines[start + 1..]
        .iter()
        .position(|line| line.starts_with('['))
        .map_or(lines.len(), |offset| start + 1 + offset);

    let trailing_blank = lines[start + 1..end]
        .iter()
        .rev()
        .take_while(|line| is_blank(line))
        .count();

    Some(SectionSpan {
        start,
        end,
        trailing_blank,
    })
}

/// Returns `true` if the key part of `line` (text before the first `=`,
/// trimmed) equals one of the managed keys.
fn is_managed_line(line: &str, settings: &[ManagedSetting]) -> bool {
    match line.split_once('=') {
        Some((key, _)) => {
            let key = key.trim();
            settings.iter().any(|s| s.key == key)
        }
        None => false,
    }
}

/// Merges `settings` into section `name` of `doc` and returns the new document.
///
/// When the section exists, its non-blank lines that are not managed keys
/// are kept verbatim and in order, followed by one line per managed setting
/// in the order given.  The padding before the next header (or at the end of
/// the file) and everything outside the section are copied unchanged.  Blank
/// lines inside the body are not carried over.
///
/// When the section is missing it is appended at the end of the document,
/// separated from non-blank content by one blank line and followed by one
/// trailing blank line.
pub fn merge_section(
    doc: &ConfigDocument,
    name: &str,
    settings: &[ManagedSetting],
) -> ConfigDocument {
    let Some(span) = find_section(doc, name) else {
        return append_section(doc, name, settings);
    };

    let lines = doc.lines();
    let eol = terminator(&lines[span.start]).unwrap_or_else(|| doc.line_ending());
    let mut merged = ConfigDocument::from_lines(lines[..span.start].iter().cloned());
    merged.push_line(terminated(&lines[span.start], eol));

    for line in &lines[span.body()] {
        if is_blank(line) || is_managed_line(line, settings) {
            continue;
        }
        merged.push_line(terminated(line, eol));
    }
    merged.extend_lines(settings.iter().map(|s| s.line(eol)));

    merged.extend_lines(lines[span.padding()].iter().cloned());
    let header = format!("[{name}]");
    merged.extend_lines(without_duplicate_keys(&lines[span.end..], &header, settings).cloned());
    merged
}

/// Yields `lines` minus the managed-key lines of every block headed by
/// `header`.
fn without_duplicate_keys<'a>(
    lines: &'a [String],
    header: &'a str,
    settings: &'a [ManagedSetting],
) -> impl Iterator<Item = &'a String> + 'a {
    let mut in_duplicate = false;
    lines.iter().filter(move |line| {
        if line.starts_with('[') || line.trim() == header {
            in_duplicate = line.trim() == header;
            return true;
        }
        !(in_duplicate && is_managed_line(line, settings))
    })
}

fn append_section(
    doc: &ConfigDocument,
    name: &str,
    settings: &[ManagedSetting],
) -> ConfigDocument {
    let eol = doc.line_ending();
    let mut merged = doc.clone();
    merged.terminate_last_line();
    if !merged.is_empty() && !merged.ends_with_blank_line() {
        merged.push_line(eol);
    }
    merged.push_line(format!("[{name}]{eol}"));
    merged.extend_lines(settings.iter().map(|s| s.line(eol)));
    merged.push_line(eol);
    merged
}

// ── Tests ─────────────────────────────────────────────────────────────────────
