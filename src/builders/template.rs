//! SQL text with structurally tracked placeholder positions.
//!
//! Caller-supplied fragments are split into text and markers once, when they
//! are appended, so that a `?` inside a quoted literal is never mistaken for a
//! placeholder. Rendering then only has to walk the segments.

use crate::dialect::Dialect;
use crate::error::{DbalError, Result};
use crate::types::SqlValue;

/// The reserved placeholder character.
pub const BIND_MARKER: char = '?';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Marker,
}

/// Assembled SQL as a list of text and placeholder segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlTemplate {
    segments: Vec<Segment>,
}

impl SqlTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses caller-supplied SQL. Markers inside single-quoted literals are
    /// kept as text; an unterminated quote is treated as ordinary text.
    pub fn parse(sql: &str) -> Self {
        let mut template = Self::new();
        let mut rest = sql;
        while let Some(pos) = rest.find(|c: char| c == '\'' || c == BIND_MARKER) {
            let (before, tail) = rest.split_at(pos);
            if tail.starts_with(BIND_MARKER) {
                template.push_text(before);
                template.push_marker();
                rest = &tail[BIND_MARKER.len_utf8()..];
                continue;
            }
            // Opening quote: copy the whole literal when it is closed.
            match tail[1..].find('\'') {
                Some(close) => {
                    let end = pos + close + 2;
                    template.push_text(&rest[..end]);
                    rest = &rest[end..];
                }
                None => {
                    template.push_text(&rest[..pos + 1]);
                    rest = &rest[pos + 1..];
                }
            }
        }
        template.push_text(rest);
        template
    }

    /// Appends literal SQL text that contains no placeholders.
    pub fn push_text(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        match self.segments.last_mut() {
            Some(Segment::Text(last)) => last.push_str(text),
            _ => self.segments.push(Segment::Text(text.to_string())),
        }
        self
    }

    /// Appends caller-supplied SQL, tracking any placeholders it contains.
    pub fn push_sql(&mut self, sql: &str) -> &mut Self {
        let parsed = Self::parse(sql);
        self.append(&parsed)
    }

    pub fn push_marker(&mut self) -> &mut Self {
        self.segments.push(Segment::Marker);
        self
    }

    /// Appends `count` markers separated by `separator`.
    pub fn push_markers(&mut self, count: usize, separator: &str) -> &mut Self {
        for i in 0..count {
            if i > 0 {
                self.push_text(separator);
            }
            self.push_marker();
        }
        self
    }

    pub fn append(&mut self, other: &SqlTemplate) -> &mut Self {
        for segment in &other.segments {
            match segment {
                Segment::Text(text) => {
                    self.push_text(text);
                }
                Segment::Marker => {
                    self.push_marker();
                }
            }
        }
        self
    }

    /// Number of real placeholders.
    pub fn marker_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Marker))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The template text with markers left in place.
    pub fn sql(&self) -> String {
        let mut sql = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => sql.push_str(text),
                Segment::Marker => sql.push(BIND_MARKER),
            }
        }
        sql
    }

    /// Replaces every placeholder, in order, with the escaped bind value.
    ///
    /// Fails with [`DbalError::PlaceholderMismatch`] when the number of
    /// placeholders differs from the number of binds.
    pub fn render(&self, binds: &[SqlValue], dialect: &dyn Dialect) -> Result<String> {
        let markers = self.marker_count();
        if markers != binds.len() {
            return Err(DbalError::PlaceholderMismatch {
                markers,
                binds: binds.len(),
            });
        }
        let mut sql = String::new();
        let mut values = binds.iter();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => sql.push_str(text),
                Segment::Marker => {
                    if let Some(value) = values.next() {
                        sql.push_str(&dialect.escape(value));
                    }
                }
            }
        }
        Ok(sql)
    }
}
