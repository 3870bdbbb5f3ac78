//! Matching compiled patterns against input lines
//!
//! Input is a slice of chars; every offset is a char index, and the end of
//! the slice counts as the end of the line.

mod captures;
mod engine;
pub mod expression;
pub mod scanner;

pub use captures::{Capture, Captures};
pub use engine::{MatchOutcome, Matcher};
pub use expression::{ExpressionGrammar, OperatorExpression};
pub use scanner::{BalancedScanner, BracketScanner, Terminator};

pub(crate) fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0C')
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub(crate) fn skip_blank(input: &[char], from: usize) -> usize {
    let mut pos = from;
    while input.get(pos).is_some_and(|c| is_blank(*c)) {
        pos += 1;
    }
    pos
}

/// `end` moved back over trailing blanks, never before `start`
pub(crate) fn trim_blank_end(input: &[char], start: usize, end: usize) -> usize {
    let mut end = end;
    while end > start && input.get(end - 1).is_some_and(|c| is_blank(*c)) {
        end -= 1;
    }
    end
}

pub(crate) fn line_end(input: &[char], from: usize) -> usize {
    let mut pos = from;
    while input.get(pos).is_some_and(|c| *c != '\n' && *c != '\r') {
        pos += 1;
    }
    pos
}

/// End of the identifier starting at `from`, or `from` if there is none
pub(crate) fn word_end(input: &[char], from: usize) -> usize {
    if !input.get(from).is_some_and(|c| c.is_alphabetic()) {
        return from;
    }
    let mut pos = from + 1;
    while input.get(pos).is_some_and(|c| is_word_char(*c)) {
        pos += 1;
    }
    pos
}
