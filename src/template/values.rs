//! Rendered values, value shaping and output sinks

use std::fmt;

use crate::config::RenderConfig;
use crate::error::SyntaxError;
use crate::parser::ResultKind;

/// One rendered item of an output statement
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Literal text from the template
    Text(String),
    /// Capture as matched
    Raw(String),
    /// Capture with whitespace runs collapsed
    Dumb(String),
    /// Capture as a quoted string literal
    Quoted(String),
    /// Capture as an expression
    Expression(String),
    /// Capture split into statements
    Block(Vec<String>),
    /// Whether the marker captured anything
    Bool(bool),
    /// Referenced marker captured nothing
    Absent,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s)
            | Value::Raw(s)
            | Value::Dumb(s)
            | Value::Quoted(s)
            | Value::Expression(s) => f.write_str(s),
            Value::Block(lines) => f.write_str(&lines.join("; ")),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Absent => Ok(()),
        }
    }
}

/// Turns captured text into the value a result marker emits.
///
/// `text` is `None` when the marker captured nothing.
pub trait ValueShaper: Send + Sync {
    fn shape(&self, kind: ResultKind, text: Option<&str>) -> Value;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultShaper {
    config: RenderConfig,
}

impl DefaultShaper {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }
}

impl ValueShaper for DefaultShaper {
    fn shape(&self, kind: ResultKind, text: Option<&str>) -> Value {
        let Some(text) = text else {
            return match kind {
                ResultKind::Bool => Value::Bool(false),
                _ => Value::Absent,
            };
        };
        match kind {
            ResultKind::Regular => Value::Raw(text.to_string()),
            ResultKind::Dumb if self.config.collapse_whitespace => {
                Value::Dumb(text.split_whitespace().collect::<Vec<_>>().join(" "))
            }
            ResultKind::Dumb => Value::Dumb(text.to_string()),
            ResultKind::Normal => Value::Quoted(quote(text, self.config.quote)),
            ResultKind::Smart => Value::Expression(text.trim().to_string()),
            ResultKind::Block => Value::Block(split_block(text, self.config.block_separator)),
            ResultKind::Bool => Value::Bool(!text.is_empty()),
        }
    }
}

/// Wrap in `quote`, escaping embedded quotes and backslashes. Text that is
/// already quoted is kept.
fn quote(text: &str, quote: char) -> String {
    let already = text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote);
    if already {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        if c == quote || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(quote);
    out
}

/// Statements of a block, split on `separator` outside brackets and quotes.
/// One outer pair of braces is removed.
fn split_block(text: &str, separator: char) -> Vec<String> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed);

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quote: Option<char> = None;
    let mut escaped = false;

    for c in body.chars() {
        if let Some(q) = in_quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                in_quote = None;
            }
            current.push(c);
            continue;
        }
        match c {
            '"' | '\'' => in_quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                statements.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    statements.push(current);

    statements
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Receives one output statement at a time
pub trait OutputSink {
    fn process(&mut self, values: &[Value]) -> Result<(), SyntaxError>;
}

impl<F> OutputSink for F
where
    F: FnMut(&[Value]) -> Result<(), SyntaxError>,
{
    fn process(&mut self, values: &[Value]) -> Result<(), SyntaxError> {
        self(values)
    }
}

/// Sink that keeps every statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectingSink {
    pub statements: Vec<Vec<Value>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each statement as its values joined by single spaces
    pub fn lines(&self) -> Vec<String> {
        self.statements
            .iter()
            .map(|values| {
                values
                    .iter()
                    .map(Value::to_string)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl OutputSink for CollectingSink {
    fn process(&mut self, values: &[Value]) -> Result<(), SyntaxError> {
        self.statements.push(values.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(kind: ResultKind, text: Option<&str>) -> Value {
        DefaultShaper::default().shape(kind, text)
    }

    #[test]
    fn test_default_shapes() {
        assert_eq!(shape(ResultKind::Regular, Some(" a ")), Value::Raw(" a ".into()));
        assert_eq!(
            shape(ResultKind::Dumb, Some("a  +\tb")),
            Value::Dumb("a + b".into())
        );
        assert_eq!(
            shape(ResultKind::Normal, Some("say \"hi\"")),
            Value::Quoted("\"say \\\"hi\\\"\"".into())
        );
        assert_eq!(
            shape(ResultKind::Normal, Some("\"done\"")),
            Value::Quoted("\"done\"".into())
        );
        assert_eq!(
            shape(ResultKind::Smart, Some("x + 1 ")),
            Value::Expression("x + 1".into())
        );
        assert_eq!(shape(ResultKind::Bool, Some("x")), Value::Bool(true));
        assert_eq!(shape(ResultKind::Bool, Some("")), Value::Bool(false));
    }

    #[test]
    fn test_missing_capture() {
        assert_eq!(shape(ResultKind::Bool, None), Value::Bool(false));
        assert_eq!(shape(ResultKind::Regular, None), Value::Absent);
        assert_eq!(shape(ResultKind::Block, None), Value::Absent);
    }

    #[test]
    fn test_block_split() {
        assert_eq!(
            shape(ResultKind::Block, Some("{ a = 1; f(b; c); \"x;y\" ; }")),
            Value::Block(vec!["a = 1".into(), "f(b; c)".into(), "\"x;y\"".into()])
        );
    }

    #[test]
    fn test_configured_shaper() {
        let shaper = DefaultShaper::new(RenderConfig {
            quote: '\'',
            block_separator: '|',
            collapse_whitespace: false,
        });
        assert_eq!(
            shaper.shape(ResultKind::Normal, Some("it's")),
            Value::Quoted("'it\\'s'".into())
        );
        assert_eq!(
            shaper.shape(ResultKind::Dumb, Some("a  b")),
            Value::Dumb("a  b".into())
        );
        assert_eq!(
            shaper.shape(ResultKind::Block, Some("a|b")),
            Value::Block(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        let mut sink = |values: &[Value]| -> Result<(), SyntaxError> {
            seen.push(values.len());
            Ok(())
        };
        sink.process(&[Value::Absent]).expect("Should accept");
        assert_eq!(seen, vec![1]);
    }
}
