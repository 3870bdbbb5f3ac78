//! Error types for rule compilation and matching

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::ast::Lexeme;

/// Character range in source text
pub type Span = std::ops::Range<usize>;

/// A rule failed to compile. Never accompanied by a partial tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl CompileError {
    pub(crate) fn syntax(span: Span, message: impl Into<String>) -> Self {
        CompileError::Syntax {
            span,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    /// Location of the offending text, in characters
    pub fn span(&self) -> &Span {
        match self {
            CompileError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            CompileError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8(buf).unwrap_or_else(|_| self.to_string())
    }
}

impl<'a> From<chumsky::error::Rich<'a, Lexeme>> for CompileError {
    fn from(err: chumsky::error::Rich<'a, Lexeme>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(lexeme) => format!("Unexpected {}", lexeme.describe()),
                None => "Unexpected end of input".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(tok.describe()),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any lexeme".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        CompileError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Malformed input reported while matching or rendering.
///
/// Raised by collaborators (balanced scanner, expression grammar, output
/// sink) and propagated unchanged to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at offset {offset}: {message}")]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_points_at_span() {
        let err = CompileError::syntax(5..7, "unterminated marker");
        let report = err.format("go <x => y", "rule");
        assert!(report.contains("unterminated marker"));
        assert!(report.contains("rule"));
    }

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::new(3, "missing ')'");
        assert_eq!(err.to_string(), "syntax error at offset 3: missing ')'");
    }
}
