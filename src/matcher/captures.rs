//! Capture spans recorded during one match attempt

use crate::error::Span;
use crate::parser::NameId;

/// One captured `[start, end)` range of the input, in chars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub marker: NameId,
    pub span: Span,
}

impl Capture {
    pub fn text(&self, input: &[char]) -> String {
        input
            .get(self.span.clone())
            .map(|chars| chars.iter().collect())
            .unwrap_or_default()
    }
}

/// Ordered capture list. Truncation on a failed sequence discards every
/// capture taken since that sequence started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    spans: Vec<Capture>,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, marker: NameId, span: Span) {
        self.spans.push(Capture { marker, span });
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.spans.truncate(len);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capture> {
        self.spans.iter()
    }

    /// Captures of one marker, in match order
    pub fn of(&self, marker: NameId) -> Vec<&Capture> {
        self.spans.iter().filter(|c| c.marker == marker).collect()
    }

    /// Captured texts of one marker, in match order
    pub fn texts(&self, marker: NameId, input: &[char]) -> Vec<String> {
        self.of(marker).iter().map(|c| c.text(input)).collect()
    }
}
