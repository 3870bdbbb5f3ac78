//! rulematch - rule-based text pattern compiler and matcher
//!
//! A rule is one line of the form `pattern => template`. The pattern is
//! matched against raw input text, capturing the spans of its markers, and
//! the template is rendered from those captures into output statements.
//!
//! # Example
//!
//! ```rust
//! use rulematch::{compile, CollectingSink};
//!
//! let rule = compile("go <(dir)> => move <(dir)>").unwrap();
//! let input: Vec<char> = "go north".chars().collect();
//! let mut sink = CollectingSink::new();
//!
//! let end = rule.match_and_render(&input, 0, &mut sink).unwrap();
//! assert_eq!(end, 8);
//! assert_eq!(sink.lines(), vec!["move north"]);
//! ```

pub mod config;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod rule;
pub mod ruleset;
pub mod template;

pub use config::{ConfigError, EngineConfig, MatcherConfig, RenderConfig};
pub use error::{CompileError, Span, SyntaxError};
pub use matcher::{
    BalancedScanner, BracketScanner, Capture, Captures, ExpressionGrammar, MatchOutcome,
    OperatorExpression, Terminator,
};
pub use parser::{NameId, SymbolTable, SyntaxNode};
pub use rule::{CompiledRule, RuleCompiler};
pub use ruleset::{RuleHit, RuleSet, RuleSetError};
pub use template::{CollectingSink, DefaultShaper, OutputSink, Value, ValueShaper};

/// Compile one rule with a fresh compiler and default collaborators
///
/// # Example
///
/// ```rust
/// use rulematch::compile;
///
/// let rule = compile("START STOP => DONE").unwrap();
/// assert_eq!(rule.leading_keyword(), Some("START"));
/// assert!(compile("START STOP").is_err());
/// ```
pub fn compile(source: &str) -> Result<CompiledRule, CompileError> {
    RuleCompiler::new().compile(source, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_compile_simple_rule() {
        let rule = compile("a => b").expect("Should compile");
        assert_eq!(rule.source(), "a => b");
    }

    #[test]
    fn test_compile_error_has_span() {
        let err = compile("go <x").expect_err("Should fail");
        assert_eq!(err.span(), &(3..5));
    }

    #[test]
    fn test_match_and_render() {
        let rule = compile("go <(x)> => moved <(x)>").expect("Should compile");
        let mut sink = CollectingSink::new();
        let end = rule
            .match_and_render(&chars("go [1,2,3]"), 0, &mut sink)
            .expect("Should render");
        assert_eq!(end, 10);
        assert_eq!(
            sink.statements,
            vec![vec![
                Value::Text("moved".into()),
                Value::Expression("[1,2,3]".into())
            ]]
        );
    }
}
