//! [`ConfigDocument`]: an INI-style file held as an ordered list of lines.
//!
//! Each stored line keeps its own terminator (`\n` or `\r\n`), and the last
//! line may have none.  Rendering is plain concatenation, so a document that
//! is parsed and rendered without edits reproduces the input byte for byte.
//! Lines the merge never touches are therefore written back exactly as they
//! were read.

use std::fmt;

/// Ordered sequence of text lines making up a whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    lines: Vec<String>,
}

impl ConfigDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `text` into lines, keeping every terminator.
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_owned).collect(),
        }
    }

    /// Builds a document from already-split lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// All lines, terminators included.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Appends a line as-is.  The caller supplies the terminator.
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Appends every line from `lines`.
    pub fn extend_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
    }

    /// Returns `true` when the final line is blank (whitespace only).
    ///
    /// An empty document has no final line and reports `false`.
    pub fn ends_with_blank_line(&self) -> bool {
        self.lines.last().is_some_and(|line| is_blank(line))
    }

    /// Terminator of the first terminated line, or `\n` if there is none.
    pub fn line_ending(&self) -> &'static str {
        self.lines
            .iter()
            .find_map(|line| terminator(line))
            .unwrap_or("\n")
    }

    /// Adds [`line_ending`](Self::line_ending) to the final line if it has no
    /// terminator.
    pub fn terminate_last_line(&mut self) {
        let eol = self.line_ending();
        if let Some(last) = self.lines.last_mut() {
            if !last.ends_with('\n') {
                last.push_str(eol);
            }
        }
    }

    /// Concatenates all lines into the file contents.
    pub fn render(&self) -> String {
        self.lines.concat()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// A line is blank when it contains nothing but whitespace.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// The terminator `line` ends with, if any.
pub fn terminator(line: &str) -> Option<&'static str> {
    if line.ends_with("\r\n") {
        Some("\r\n")
    } else if line.ends_with('\n') {
        Some("\n")
    } else {
        None
    }
}

/// Returns `line` with `eol` appended if it lacks a terminator.
pub fn terminated(line: &str, eol: &str) -> String {
    if line.ends_with('\n') {
        line.to_owned()
    } else {
        format!("{line}{eol}")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
