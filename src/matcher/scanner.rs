//! Balanced bracket and quote scanning for extended and list markers

use crate::error::SyntaxError;
use crate::matcher::is_word_char;

/// Where a balanced capture must stop at nesting depth zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    /// Exact text
    Text(Vec<char>),
    /// Whole word, any letter case
    Word(Vec<char>),
}

impl Terminator {
    pub fn text(text: &str) -> Self {
        Terminator::Text(text.chars().collect())
    }

    pub fn word(word: &str) -> Self {
        Terminator::Word(word.chars().collect())
    }

    pub fn matches_at(&self, input: &[char], at: usize) -> bool {
        match self {
            Terminator::Text(text) => {
                !text.is_empty() && input.get(at..at + text.len()) == Some(&text[..])
            }
            Terminator::Word(word) => {
                let Some(candidate) = input.get(at..at + word.len()) else {
                    return false;
                };
                !word.is_empty()
                    && candidate
                        .iter()
                        .zip(word)
                        .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
                    && (at == 0 || !is_word_char(input[at - 1]))
                    && input.get(at + word.len()).map_or(true, |c| !is_word_char(*c))
            }
        }
    }
}

/// Finds the end of a balanced expression.
///
/// Implementations return the offset of the first character not part of
/// the expression, and fail on unbalanced brackets or quotes. They are
/// shared between threads and must not keep per-call state.
pub trait BalancedScanner: Send + Sync {
    fn extract_balanced(
        &self,
        input: &[char],
        from: usize,
        terminators: &[Terminator],
    ) -> Result<usize, SyntaxError>;
}

/// Default scanner: `()`, `[]` and `{}` nest, `"` and `'` quote, and a
/// line end or an unmatched closing bracket ends the expression.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketScanner;

impl BalancedScanner for BracketScanner {
    fn extract_balanced(
        &self,
        input: &[char],
        from: usize,
        terminators: &[Terminator],
    ) -> Result<usize, SyntaxError> {
        scan(input, from, terminators)
    }
}

fn scan(input: &[char], from: usize, terminators: &[Terminator]) -> Result<usize, SyntaxError> {
    let mut pos = from;
    loop {
        let Some(&c) = input.get(pos) else {
            return Ok(pos);
        };
        if c == '\n' || c == '\r' || terminators.iter().any(|t| t.matches_at(input, pos)) {
            return Ok(pos);
        }
        pos = match c {
            ']' | ')' | '}' => return Ok(pos),
            '"' | '\'' => skip_quoted(input, pos)?,
            '[' | '(' | '{' => {
                let close = closing(c);
                let inner = scan(input, pos + 1, &[])?;
                if input.get(inner) != Some(&close) {
                    return Err(SyntaxError::new(inner, format!("missing '{}'", close)));
                }
                inner + 1
            }
            _ => pos + 1,
        };
    }
}

fn closing(open: char) -> char {
    match open {
        '[' => ']',
        '(' => ')',
        _ => '}',
    }
}

/// Offset just past the quoted string starting at `at`
pub(crate) fn skip_quoted(input: &[char], at: usize) -> Result<usize, SyntaxError> {
    let quote = input[at];
    let mut pos = at + 1;
    loop {
        match input.get(pos) {
            None | Some('\n') | Some('\r') => {
                return Err(SyntaxError::new(at, "unterminated string"));
            }
            Some('\\') => pos += 2,
            Some(&c) if c == quote => return Ok(pos + 1),
            Some(_) => pos += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn extract(s: &str, terminators: &[Terminator]) -> Result<usize, SyntaxError> {
        BracketScanner.extract_balanced(&chars(s), 0, terminators)
    }

    #[test]
    fn test_runs_to_end_of_line() {
        assert_eq!(extract("a + b\nrest", &[]), Ok(5));
        assert_eq!(extract("a + b", &[]), Ok(5));
    }

    #[test]
    fn test_nested_brackets() {
        assert_eq!(extract("f(a, [1, 2]) x", &[]), Ok(14));
        assert_eq!(extract("[1,2,3]", &[]), Ok(7));
    }

    #[test]
    fn test_stops_at_unmatched_close() {
        assert_eq!(extract("a + b) c", &[]), Ok(5));
    }

    #[test]
    fn test_terminators_only_at_depth_zero() {
        let comma = [Terminator::text(",")];
        assert_eq!(extract("f(a, b), c", &comma), Ok(7));
        assert_eq!(extract("\"a, b\", c", &comma), Ok(6));
    }

    #[test]
    fn test_word_terminator() {
        let to = [Terminator::word("to")];
        assert_eq!(extract("a tomato TO b", &to), Ok(9));
    }

    #[test]
    fn test_unbalanced_input() {
        let err = extract("f(a, b", &[]).expect_err("Should fail");
        assert_eq!(err.offset, 6);
        assert_eq!(err.message, "missing ')'");
        assert!(extract("(a]", &[]).is_err());
        assert!(extract("'abc", &[]).is_err());
    }

    #[test]
    fn test_escaped_quote() {
        assert_eq!(extract(r#""a\"b" c"#, &[]), Ok(8));
    }
}
