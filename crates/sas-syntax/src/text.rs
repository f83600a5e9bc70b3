//! Line/column addressed text buffer.
//!
//! Everything in this crate addresses source text by [`Position`]: a zero-based
//! line and a zero-based column counted in UTF-8 bytes of that line. Lines are
//! split on `\n`; a trailing `\r` stays part of the line and scans as blank.

use std::cmp::Ordering;
use std::fmt;

/// A zero-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub struct Position {
    /// Line index.
    pub line: u32,
    /// Byte column within the line.
    pub column: u32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open range of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub struct Range {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl Range {
    /// Creates a new range.
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Returns `true` if `pos` lies in `[start, end)`.
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Returns `true` if `pos` lies in `[start, end]`.
    #[must_use]
    pub fn contains_inclusive(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Returns `true` if `other` lies entirely inside this range.
    #[must_use]
    pub fn covers(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if the two ranges share at least one position.
    ///
    /// Touching ranges (`a.end == b.start`) count as intersecting so that an
    /// insertion at a boundary is attributed to both sides.
    #[must_use]
    pub fn intersects(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Returns `true` if the range is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A single text edit in both pre-edit and post-edit coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDescriptor {
    /// Range replaced by the edit, in pre-edit coordinates.
    pub removed_range: Range,
    /// Range occupied by the inserted text, in post-edit coordinates.
    pub inserted_range: Range,
    /// The inserted text.
    pub inserted_text: String,
    /// The removed text.
    pub removed_text: String,
}

impl EditDescriptor {
    /// Builds the descriptor for replacing `range` of `model` with `text`.
    ///
    /// The range is clamped to the document.
    #[must_use]
    pub fn replace(model: &TextModel, range: Range, text: &str) -> Self {
        let start = model.clamp(range.start);
        let end = model.clamp(range.end).max(start);
        let removed_text = model.slice(Range::new(start, end));
        let inserted_end = advance_position(start, text);
        Self {
            removed_range: Range::new(start, end),
            inserted_range: Range::new(start, inserted_end),
            inserted_text: text.to_string(),
            removed_text,
        }
    }

    /// Builds the descriptor for inserting `text` at `pos`.
    #[must_use]
    pub fn insert(model: &TextModel, pos: Position, text: &str) -> Self {
        Self::replace(model, Range::new(pos, pos), text)
    }

    /// Builds the descriptor for deleting `range`.
    #[must_use]
    pub fn delete(model: &TextModel, range: Range) -> Self {
        Self::replace(model, range, "")
    }

    /// Number of lines added (positive) or removed (negative) by the edit.
    #[must_use]
    pub fn line_delta(&self) -> i64 {
        i64::from(self.inserted_range.end.line) - i64::from(self.removed_range.end.line)
    }

    /// Maps a pre-edit position at or after the removed range to its post-edit
    /// position.
    ///
    /// Positions before the removed range are returned unchanged; positions
    /// inside it collapse onto the end of the inserted text.
    #[must_use]
    pub fn shift(&self, pos: Position) -> Position {
        let removed = self.removed_range;
        if pos < removed.start {
            return pos;
        }
        if pos < removed.end {
            return self.inserted_range.end;
        }
        if pos.line == removed.end.line {
            let offset = pos.column - removed.end.column;
            Position::new(
                self.inserted_range.end.line,
                self.inserted_range.end.column + offset,
            )
        } else {
            let line = i64::from(pos.line) + self.line_delta();
            Position::new(u32::try_from(line).unwrap_or(0), pos.column)
        }
    }

    /// Maps a post-edit position after the inserted range back to pre-edit
    /// coordinates. Inverse of [`EditDescriptor::shift`] for such positions.
    #[must_use]
    pub fn unshift(&self, pos: Position) -> Position {
        let inserted = self.inserted_range;
        if pos < inserted.start {
            return pos;
        }
        if pos < inserted.end {
            return self.removed_range.end;
        }
        if pos.line == inserted.end.line {
            let offset = pos.column - inserted.end.column;
            Position::new(
                self.removed_range.end.line,
                self.removed_range.end.column + offset,
            )
        } else {
            let line = i64::from(pos.line) - self.line_delta();
            Position::new(u32::try_from(line).unwrap_or(0), pos.column)
        }
    }
}

/// Returns the position reached after appending `text` at `start`.
#[must_use]
pub fn advance_position(start: Position, text: &str) -> Position {
    let mut pos = start;
    let mut segments = text.split('\n');
    if let Some(first) = segments.next() {
        pos.column += len_u32(first);
    }
    for segment in segments {
        pos.line += 1;
        pos.column = len_u32(segment);
    }
    pos
}

fn len_u32(text: &str) -> u32 {
    u32::try_from(text.len()).unwrap_or(u32::MAX)
}

/// The document buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextModel {
    lines: Vec<String>,
}

impl TextModel {
    /// Creates a model from source text. A leading byte-order mark is kept as
    /// part of the first line so that columns match the host buffer.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    /// Number of lines (always at least one).
    #[must_use]
    pub fn line_count(&self) -> u32 {
        u32::try_from(self.lines.len()).unwrap_or(u32::MAX)
    }

    /// Returns the text of line `line`, without its line break.
    #[must_use]
    pub fn line(&self, line: u32) -> Option<&str> {
        self.lines.get(line as usize).map(String::as_str)
    }

    /// Length of line `line` in bytes, `0` past the end.
    #[must_use]
    pub fn line_len(&self, line: u32) -> u32 {
        self.line(line).map_or(0, len_u32)
    }

    /// The position just past the last character of the document.
    #[must_use]
    pub fn end(&self) -> Position {
        let last = self.line_count().saturating_sub(1);
        Position::new(last, self.line_len(last))
    }

    /// Clamps `pos` to a valid character boundary inside the document.
    #[must_use]
    pub fn clamp(&self, pos: Position) -> Position {
        let end = self.end();
        if pos > end {
            return end;
        }
        let Some(text) = self.line(pos.line) else {
            return end;
        };
        let mut column = (pos.column as usize).min(text.len());
        while column > 0 && !text.is_char_boundary(column) {
            column -= 1;
        }
        Position::new(pos.line, len_u32(&text[..column]))
    }

    /// Returns the character at `pos`, treating the end of a line as `'\n'`.
    #[must_use]
    pub fn char_at(&self, pos: Position) -> Option<char> {
        let text = self.line(pos.line)?;
        match text.get(pos.column as usize..) {
            Some(rest) => match rest.chars().next() {
                Some(ch) => Some(ch),
                None if pos.line + 1 < self.line_count() => Some('\n'),
                None => None,
            },
            None => None,
        }
    }

    /// Returns the text in `range`, joining lines with `'\n'`.
    #[must_use]
    pub fn slice(&self, range: Range) -> String {
        let start = self.clamp(range.start);
        let end = self.clamp(range.end);
        if end <= start {
            return String::new();
        }
        let mut out = String::new();
        for line in start.line..=end.line {
            let text = self.line(line).unwrap_or("");
            let from = if line == start.line { start.column as usize } else { 0 };
            let to = if line == end.line { end.column as usize } else { text.len() };
            out.push_str(text.get(from..to).unwrap_or(""));
            if line != end.line {
                out.push('\n');
            }
        }
        out
    }

    /// Returns the whole document text.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Applies an edit in place.
    ///
    /// The removed range is clamped to the document; the descriptor is assumed
    /// to have been built against this model.
    pub fn apply(&mut self, edit: &EditDescriptor) {
        let start = self.clamp(edit.removed_range.start);
        let end = self.clamp(edit.removed_range.end).max(start);
        let head = self
            .line(start.line)
            .and_then(|text| text.get(..start.column as usize))
            .unwrap_or("")
            .to_string();
        let tail = self
            .line(end.line)
            .and_then(|text| text.get(end.column as usize..))
            .unwrap_or("")
            .to_string();
        let replacement = format!("{head}{}{tail}", edit.inserted_text);
        let new_lines: Vec<String> = replacement.split('\n').map(str::to_string).collect();
        self.lines
            .splice(start.line as usize..=end.line as usize, new_lines);
    }
}

impl fmt::Display for TextModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_spans_lines() {
        let model = TextModel::new("data a;\nset b;\nrun;");
        let text = model.slice(Range::new(Position::new(0, 5), Position::new(1, 3)));
        assert_eq!(text, "a;\nset");
        assert_eq!(model.end(), Position::new(2, 4));
    }

    #[test]
    fn apply_insert_and_delete() {
        let mut model = TextModel::new("proc print;\nrun;");
        let edit = EditDescriptor::insert(&model, Position::new(0, 10), " data=a");
        model.apply(&edit);
        assert_eq!(model.text(), "proc print data=a;\nrun;");

        let edit = EditDescriptor::delete(
            &model,
            Range::new(Position::new(0, 17), Position::new(1, 0)),
        );
        assert_eq!(edit.removed_text, ";\n");
        model.apply(&edit);
        assert_eq!(model.text(), "proc print data=arun;");
    }

    #[test]
    fn shift_follows_edit() {
        let model = TextModel::new("abc\ndef\nghi");
        let edit = EditDescriptor::replace(
            &model,
            Range::new(Position::new(0, 1), Position::new(1, 1)),
            "X\nYY\nZ",
        );
        assert_eq!(edit.inserted_range.end, Position::new(2, 1));
        assert_eq!(edit.shift(Position::new(1, 2)), Position::new(2, 2));
        assert_eq!(edit.shift(Position::new(2, 0)), Position::new(3, 0));
        assert_eq!(edit.shift(Position::new(0, 0)), Position::new(0, 0));
        assert_eq!(edit.unshift(Position::new(3, 1)), Position::new(2, 1));
    }

    #[test]
    fn char_at_reports_line_breaks() {
        let model = TextModel::new("a\nb");
        assert_eq!(model.char_at(Position::new(0, 0)), Some('a'));
        assert_eq!(model.char_at(Position::new(0, 1)), Some('\n'));
        assert_eq!(model.char_at(Position::new(1, 1)), None);
    }
}
