//! Many rules dispatched by their leading keyword

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::error::{CompileError, SyntaxError};
use crate::matcher::{skip_blank, word_end};
use crate::rule::{CompiledRule, RuleCompiler};
use crate::template::OutputSink;

/// Errors that can occur when loading a rules file
#[derive(Error, Debug)]
pub enum RuleSetError {
    #[error("Failed to read rules file: {0}")]
    IoError(#[from] std::io::Error),

    /// A rule failed to compile; `text` is the offending line
    #[error("line {line}: {source}")]
    Rule {
        line: usize,
        text: String,
        source: CompileError,
    },
}

/// The rule that handled a line and where its match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleHit {
    pub rule: usize,
    pub end: usize,
}

/// Ordered rules sharing one compiler.
///
/// Rules that start with a keyword are only tried on lines whose first
/// identifier begins with it; the others are tried on every line. Among
/// the candidates, declaration order decides.
pub struct RuleSet {
    compiler: RuleCompiler,
    rules: Vec<CompiledRule>,
    by_keyword: HashMap<String, Vec<usize>>,
    unkeyed: Vec<usize>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(RuleCompiler::default())
    }
}

impl RuleSet {
    pub fn new(compiler: RuleCompiler) -> Self {
        Self {
            compiler,
            rules: Vec::new(),
            by_keyword: HashMap::new(),
            unkeyed: Vec::new(),
        }
    }

    /// One rule per line; blank lines and `//` comments are skipped
    pub fn from_source(source: &str, compiler: RuleCompiler) -> Result<Self, RuleSetError> {
        let mut set = Self::new(compiler);
        for (index, line) in source.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            set.add_rule(line).map_err(|source| RuleSetError::Rule {
                line: index + 1,
                text: line.to_string(),
                source,
            })?;
        }
        Ok(set)
    }

    pub fn from_file(path: impl AsRef<Path>, compiler: RuleCompiler) -> Result<Self, RuleSetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_source(&content, compiler)
    }

    /// Compile and append one rule, returning its index
    pub fn add_rule(&mut self, source: &str) -> Result<usize, CompileError> {
        let rule = self.compiler.compile(source, 0)?;
        let index = self.rules.len();
        match rule.leading_keyword() {
            Some(keyword) => self
                .by_keyword
                .entry(keyword.to_lowercase())
                .or_default()
                .push(index),
            None => self.unkeyed.push(index),
        }
        self.rules.push(rule);
        Ok(index)
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Indices of the rules worth trying at `from`, in declaration order
    pub fn candidates(&self, input: &[char], from: usize) -> Vec<usize> {
        let start = skip_blank(input, from);
        let run = input.get(start..word_end(input, start)).unwrap_or_default();

        let mut indices: Vec<usize> = (1..=run.len())
            .filter_map(|len| {
                let prefix: String = run[..len].iter().collect();
                self.by_keyword.get(&prefix.to_lowercase())
            })
            .flatten()
            .chain(&self.unkeyed)
            .copied()
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Apply the first candidate rule that matches at `from`.
    ///
    /// Returns `None` when no rule matches. Errors from collaborators or
    /// the sink abort the line.
    pub fn process_line(
        &self,
        input: &[char],
        from: usize,
        sink: &mut dyn OutputSink,
    ) -> Result<Option<RuleHit>, SyntaxError> {
        for index in self.candidates(input, from) {
            let rule = &self.rules[index];
            if let Some(outcome) = rule.match_at(input, from)? {
                debug!(rule = index, end = outcome.end, "rule matched");
                rule.render(input, &outcome.captures, sink)?;
                return Ok(Some(RuleHit {
                    rule: index,
                    end: outcome.end,
                }));
            }
        }
        debug!(from, "no rule matched");
        Ok(None)
    }
}
