//! Rule compiler and compiled rules

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::{EngineConfig, MatcherConfig};
use crate::error::{CompileError, SyntaxError};
use crate::matcher::{
    BalancedScanner, BracketScanner, Captures, ExpressionGrammar, MatchOutcome, Matcher,
    OperatorExpression,
};
use crate::parser::{parse_rule, Lexeme, SymbolTable, SyntaxNode};
use crate::template::{DefaultShaper, OutputSink, Renderer, ValueShaper};

/// Compiles rules against one symbol table with one set of collaborators.
///
/// Rules compiled by the same compiler share marker and keyword ids.
pub struct RuleCompiler {
    names: SymbolTable,
    scanner: Arc<dyn BalancedScanner>,
    expression: Arc<dyn ExpressionGrammar>,
    shaper: Arc<dyn ValueShaper>,
    config: EngineConfig,
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl RuleCompiler {
    /// Create a compiler with the default collaborators
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            names: SymbolTable::new(),
            scanner: Arc::new(BracketScanner),
            expression: Arc::new(OperatorExpression),
            shaper: Arc::new(DefaultShaper::new(config.render.clone())),
            config,
        }
    }

    /// Replace the balanced expression scanner
    pub fn with_scanner(mut self, scanner: Arc<dyn BalancedScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Replace the expression grammar used by regular markers
    pub fn with_expression_grammar(mut self, grammar: Arc<dyn ExpressionGrammar>) -> Self {
        self.expression = grammar;
        self
    }

    /// Replace the value shaper used by result markers
    pub fn with_shaper(mut self, shaper: Arc<dyn ValueShaper>) -> Self {
        self.shaper = shaper;
        self
    }

    /// Start from an existing symbol table
    pub fn with_names(mut self, names: SymbolTable) -> Self {
        self.names = names;
        self
    }

    pub fn names(&self) -> &SymbolTable {
        &self.names
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile the rule starting at char offset `from` of `source`.
    ///
    /// The rule ends at the first line terminator. On failure no rule is
    /// produced, though names seen before the error stay registered.
    pub fn compile(&mut self, source: &str, from: usize) -> Result<CompiledRule, CompileError> {
        let tree = parse_rule(source, from, &mut self.names)?;
        let text: String = source
            .chars()
            .skip(from)
            .take_while(|c| *c != '\n' && *c != '\r')
            .collect();

        let rule = CompiledRule {
            source: text.trim().to_string(),
            tree,
            names: Arc::new(self.names.clone()),
            scanner: Arc::clone(&self.scanner),
            expression: Arc::clone(&self.expression),
            shaper: Arc::clone(&self.shaper),
            matcher: self.config.matcher.clone(),
        };
        debug!(rule = %rule.source, keyword = ?rule.leading_keyword(), "compiled rule");
        Ok(rule)
    }
}

/// An immutable compiled rule, safe to share between threads
#[derive(Clone)]
pub struct CompiledRule {
    source: String,
    tree: SyntaxNode,
    names: Arc<SymbolTable>,
    scanner: Arc<dyn BalancedScanner>,
    expression: Arc<dyn ExpressionGrammar>,
    shaper: Arc<dyn ValueShaper>,
    matcher: MatcherConfig,
}

impl CompiledRule {
    /// Rule text as compiled
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node; its children are the pattern and the template
    pub fn tree(&self) -> &SyntaxNode {
        &self.tree
    }

    pub fn names(&self) -> &SymbolTable {
        &self.names
    }

    /// The pattern's first item when it is a keyword, as written in the rule
    pub fn leading_keyword(&self) -> Option<&str> {
        let (pattern, _) = self.tree.sides()?;
        match pattern.children().first()?.lexeme()? {
            Lexeme::Keyword { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Run the pattern only
    pub fn match_at(
        &self,
        input: &[char],
        from: usize,
    ) -> Result<Option<MatchOutcome>, SyntaxError> {
        Matcher::new(
            &self.names,
            self.scanner.as_ref(),
            self.expression.as_ref(),
            &self.matcher,
        )
        .match_pattern(&self.tree, input, from)
    }

    /// Run the template only, with captures from an earlier match
    pub fn render(
        &self,
        input: &[char],
        captures: &Captures,
        sink: &mut dyn OutputSink,
    ) -> Result<(), SyntaxError> {
        Renderer::new(self.shaper.as_ref()).render(&self.tree, input, captures, sink)
    }

    /// Match at `from` and render on success.
    ///
    /// Returns the offset after the match, or `from` unchanged when the
    /// pattern does not match.
    pub fn match_and_render(
        &self,
        input: &[char],
        from: usize,
        sink: &mut dyn OutputSink,
    ) -> Result<usize, SyntaxError> {
        match self.match_at(input, from)? {
            Some(outcome) => {
                self.render(input, &outcome.captures, sink)?;
                Ok(outcome.end)
            }
            None => Ok(from),
        }
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("source", &self.source)
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}

/// Canonical rule text rebuilt from the tree
impl fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree.display(&self.names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{CollectingSink, Value};

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_leading_keyword() {
        let mut compiler = RuleCompiler::new();
        let rule = compiler.compile("Print <x> => out <x>", 0).expect("Should compile");
        assert_eq!(rule.leading_keyword(), Some("Print"));
        let rule = compiler.compile("[a] b => c", 0).expect("Should compile");
        assert_eq!(rule.leading_keyword(), None);
        let rule = compiler.compile(": x => c", 0).expect("Should compile");
        assert_eq!(rule.leading_keyword(), None);
    }

    #[test]
    fn test_no_match_returns_from() {
        let rule = RuleCompiler::new()
            .compile("go <(x)> => moved <(x)>", 0)
            .expect("Should compile");
        let mut sink = CollectingSink::new();
        let input = chars("  stop");
        assert_eq!(rule.match_and_render(&input, 2, &mut sink), Ok(2));
        assert!(sink.statements.is_empty());
    }

    #[test]
    fn test_offset_past_end_returns_from() {
        let rule = RuleCompiler::new().compile("go => went", 0).expect("Should compile");
        let mut sink = CollectingSink::new();
        assert_eq!(rule.match_at(&chars("go"), 5), Ok(None));
        assert_eq!(rule.match_and_render(&chars("go"), 5, &mut sink), Ok(5));
        assert!(sink.statements.is_empty());
    }

    #[test]
    fn test_match_from_offset() {
        let rule = RuleCompiler::new()
            .compile("go <(x)> => moved <(x)>", 0)
            .expect("Should compile");
        let mut sink = CollectingSink::new();
        let input = chars("10: go north");
        assert_eq!(rule.match_and_render(&input, 3, &mut sink), Ok(12));
        assert_eq!(sink.lines(), vec!["moved north"]);
    }

    #[test]
    fn test_compile_from_offset_stops_at_line_end() {
        let mut compiler = RuleCompiler::new();
        let rule = compiler
            .compile("skip\ngo => went\nnext => x", 5)
            .expect("Should compile");
        assert_eq!(rule.source(), "go => went");
        assert_eq!(compiler.names().seek_name("next"), None);
    }

    #[test]
    fn test_display_round_trips_rule_text() {
        let rule = RuleCompiler::new()
            .compile("set <m:a,&> [to <(v)>] => #<m> <\"v\"> ; <{v}> <.m.>", 0)
            .expect("Should compile");
        assert_eq!(
            rule.to_string(),
            "set <m:a,&> [to <(v)>] => #<m> <\"v\"> ; <{v}> <.m.>"
        );
    }

    struct Upper;

    impl ValueShaper for Upper {
        fn shape(&self, _kind: crate::parser::ResultKind, text: Option<&str>) -> Value {
            Value::Raw(text.unwrap_or_default().to_uppercase())
        }
    }

    struct Rejecting;

    impl ExpressionGrammar for Rejecting {
        fn parse(&self, _input: &[char], from: usize) -> Result<usize, SyntaxError> {
            Err(SyntaxError::new(from, "no expressions here"))
        }
    }

    #[test]
    fn test_injected_collaborators() {
        let mut compiler = RuleCompiler::new()
            .with_shaper(Arc::new(Upper))
            .with_expression_grammar(Arc::new(Rejecting));

        let rule = compiler.compile("say <(x)> => <x>", 0).expect("Should compile");
        let mut sink = CollectingSink::new();
        rule.match_and_render(&chars("say hi there"), 0, &mut sink)
            .expect("Should render");
        assert_eq!(sink.lines(), vec!["HI THERE"]);

        let rule = compiler.compile("eval <x> => <x>", 0).expect("Should compile");
        let err = rule
            .match_and_render(&chars("eval 1"), 0, &mut sink)
            .expect_err("Should fail");
        assert_eq!(err, SyntaxError::new(5, "no expressions here"));
    }

    #[test]
    fn test_compiled_rule_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledRule>();
    }
}
