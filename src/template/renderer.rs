//! Template tree walker

use std::collections::HashMap;

use tracing::trace;

use crate::error::SyntaxError;
use crate::matcher::Captures;
use crate::parser::{Lexeme, NameId, SyntaxNode};
use crate::template::values::{OutputSink, Value, ValueShaper};

pub struct Renderer<'r> {
    shaper: &'r dyn ValueShaper,
}

/// Per-render bookkeeping: how many captures of each marker were read, and
/// the values of the statement being built
struct RenderState<'a> {
    input: &'a [char],
    captures: &'a Captures,
    cursors: HashMap<NameId, usize>,
    pending: Vec<Value>,
}

impl RenderState<'_> {
    fn unread(&self, id: NameId) -> bool {
        let read = self.cursors.get(&id).copied().unwrap_or(0);
        read < self.captures.of(id).len()
    }

    fn consumed(&self) -> usize {
        self.cursors.values().sum()
    }

    /// Next unread capture of `id`; once all are read, the last one again
    fn take(&mut self, id: NameId) -> Option<String> {
        let spans = self.captures.of(id);
        let read = self.cursors.entry(id).or_insert(0);
        let capture = match spans.get(*read) {
            Some(capture) => {
                *read += 1;
                Some(capture)
            }
            None => spans.last(),
        };
        capture.map(|c| c.text(self.input))
    }

    /// An optional alternative renders only if it refers to some marker and
    /// every marker it refers to still has unread captures.
    fn ready(&self, alternative: &SyntaxNode) -> bool {
        let ids = alternative.marker_ids();
        !ids.is_empty() && ids.iter().all(|id| self.unread(*id))
    }

    fn flush(&mut self, sink: &mut dyn OutputSink) -> Result<(), SyntaxError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        trace!(values = self.pending.len(), "statement");
        let values = std::mem::take(&mut self.pending);
        sink.process(&values)
    }
}

impl<'r> Renderer<'r> {
    pub fn new(shaper: &'r dyn ValueShaper) -> Self {
        Self { shaper }
    }

    /// Render `template` with `captures` taken from `input`.
    ///
    /// Each `;` in the template ends one statement; the rest is flushed at
    /// the end. A sink error stops rendering.
    pub fn render(
        &self,
        template: &SyntaxNode,
        input: &[char],
        captures: &Captures,
        sink: &mut dyn OutputSink,
    ) -> Result<(), SyntaxError> {
        let mut state = RenderState {
            input,
            captures,
            cursors: HashMap::new(),
            pending: Vec::new(),
        };
        self.render_node(template, &mut state, sink)?;
        state.flush(sink)
    }

    fn render_node(
        &self,
        node: &SyntaxNode,
        state: &mut RenderState<'_>,
        sink: &mut dyn OutputSink,
    ) -> Result<(), SyntaxError> {
        match node {
            SyntaxNode::Mandatory(lexeme) => self.render_lexeme(lexeme, state, sink),
            SyntaxNode::Sequence(items) => {
                for item in items {
                    self.render_node(item, state, sink)?;
                }
                Ok(())
            }
            SyntaxNode::Optional(alternatives) => loop {
                let Some(chosen) = alternatives.iter().find(|alt| state.ready(alt)) else {
                    return Ok(());
                };
                let before = state.consumed();
                self.render_node(chosen, state, sink)?;
                if state.consumed() == before {
                    return Ok(());
                }
            },
            SyntaxNode::Root(halves) => self.render_node(&halves[1], state, sink),
        }
    }

    fn render_lexeme(
        &self,
        lexeme: &Lexeme,
        state: &mut RenderState<'_>,
        sink: &mut dyn OutputSink,
    ) -> Result<(), SyntaxError> {
        match lexeme {
            Lexeme::Char(text) | Lexeme::Keyword { text, .. } => {
                state.pending.push(Value::Text(text.clone()));
            }
            Lexeme::Result { kind, id } => {
                let text = state.take(*id);
                let value = self.shaper.shape(*kind, text.as_deref());
                state.pending.push(value);
            }
            Lexeme::Continuation => state.flush(sink)?,
            _ => {}
        }
        Ok(())
    }
}
