/*!
 * Context window around the line being annotated.
 */

use std::fmt;

/// Marker placed in front of the current line
pub const CURRENT_LINE_MARKER: &str = "[CURRENT LINE]: ";

/// A slice of the story around one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    /// Lines in story order
    lines: Vec<String>,
    /// Position of the current line inside `lines`
    current: usize,
    /// Index of the first window line in the whole story
    start: usize,
}

impl ContextWindow {
    /// Window of up to `before` lines before and `after` lines after `index`.
    ///
    /// Returns `None` when `index` is out of range.
    pub fn build(lines: &[String], index: usize, before: usize, after: usize) -> Option<Self> {
        if index >= lines.len() {
            return None;
        }
        let start = index.saturating_sub(before);
        let end = index.saturating_add(after).saturating_add(1).min(lines.len());

        Some(Self {
            lines: lines[start..end].to_vec(),
            current: index - start,
            start,
        })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line being annotated
    pub fn current_line(&self) -> &str {
        &self.lines[self.current]
    }

    /// Story index of the line being annotated
    pub fn current_index(&self) -> usize {
        self.start + self.current
    }

    /// Story index of the first line in the window
    pub fn start_index(&self) -> usize {
        self.start
    }

    /// Window text with the current line marked
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ContextWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (offset, line) in self.lines.iter().enumerate() {
            if offset > 0 {
                writeln!(f)?;
            }
            // Marked by position so a repeated line is only marked once
            if offset == self.current {
                write!(f, "{}{}", CURRENT_LINE_MARKER, line)?;
            } else {
                write!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}
