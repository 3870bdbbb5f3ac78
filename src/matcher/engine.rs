//! Pattern tree walker

use tracing::trace;

use crate::config::MatcherConfig;
use crate::error::SyntaxError;
use crate::matcher::captures::Captures;
use crate::matcher::expression::ExpressionGrammar;
use crate::matcher::scanner::{BalancedScanner, Terminator};
use crate::matcher::{line_end, skip_blank, trim_blank_end, word_end};
use crate::parser::{Alternative, Lexeme, MarkerKind, NameId, SymbolTable, SyntaxNode};

/// A successful match: where it ended and what it captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub end: usize,
    pub captures: Captures,
}

/// Walks a pattern tree over one input buffer.
///
/// Matching is greedy: a failed mandatory item never causes an earlier
/// optional group to give back what it consumed.
pub struct Matcher<'r> {
    names: &'r SymbolTable,
    scanner: &'r dyn BalancedScanner,
    expression: &'r dyn ExpressionGrammar,
    config: &'r MatcherConfig,
}

/// One match attempt: the input and the keywords of the pattern being run
struct Scan<'a> {
    input: &'a [char],
    keywords: Vec<NameId>,
}

impl<'r> Matcher<'r> {
    pub fn new(
        names: &'r SymbolTable,
        scanner: &'r dyn BalancedScanner,
        expression: &'r dyn ExpressionGrammar,
        config: &'r MatcherConfig,
    ) -> Self {
        Self {
            names,
            scanner,
            expression,
            config,
        }
    }

    /// Match `pattern` at `from`. `Ok(None)` means no match, including when
    /// `from` lies past the end of `input`.
    pub fn match_pattern(
        &self,
        pattern: &SyntaxNode,
        input: &[char],
        from: usize,
    ) -> Result<Option<MatchOutcome>, SyntaxError> {
        if from > input.len() {
            return Ok(None);
        }
        let pattern = pattern.sides().map_or(pattern, |(pattern, _)| pattern);
        let mut keywords = Vec::new();
        collect_keywords(pattern, &mut keywords);
        let scan = Scan { input, keywords };

        let mut captures = Captures::new();
        let end = self.match_node(pattern, &[], &scan, from, &mut captures)?;
        trace!(from, ?end, captures = captures.len(), "pattern attempt");
        Ok(end.map(|end| MatchOutcome { end, captures }))
    }

    fn match_node(
        &self,
        node: &SyntaxNode,
        follow: &[Terminator],
        scan: &Scan<'_>,
        from: usize,
        captures: &mut Captures,
    ) -> Result<Option<usize>, SyntaxError> {
        match node {
            SyntaxNode::Mandatory(lexeme) => self.match_lexeme(lexeme, follow, scan, from, captures),
            SyntaxNode::Optional(alternatives) => self
                .match_optional(alternatives, scan, from, captures)
                .map(Some),
            SyntaxNode::Sequence(items) => self.match_sequence(items, scan, from, captures),
            SyntaxNode::Root(halves) => self.match_node(&halves[0], follow, scan, from, captures),
        }
    }

    fn match_sequence(
        &self,
        items: &[SyntaxNode],
        scan: &Scan<'_>,
        from: usize,
        captures: &mut Captures,
    ) -> Result<Option<usize>, SyntaxError> {
        let mark = captures.len();
        let mut cursor = from;
        for (index, item) in items.iter().enumerate() {
            let follow = self.follow_terminators(items.get(index + 1));
            match self.match_node(item, &follow, scan, cursor, captures)? {
                Some(next) => cursor = next,
                None => {
                    captures.truncate(mark);
                    return Ok(None);
                }
            }
        }
        Ok(Some(cursor))
    }

    /// Repeat the first alternative that matches with progress until a
    /// whole round makes none. Always succeeds.
    fn match_optional(
        &self,
        alternatives: &[SyntaxNode],
        scan: &Scan<'_>,
        from: usize,
        captures: &mut Captures,
    ) -> Result<usize, SyntaxError> {
        let mut cursor = from;
        'rounds: loop {
            for alternative in alternatives {
                let mark = captures.len();
                match self.match_node(alternative, &[], scan, cursor, captures)? {
                    Some(end) if end > cursor => {
                        cursor = end;
                        continue 'rounds;
                    }
                    // zero-width success is not a repetition
                    Some(_) => captures.truncate(mark),
                    None => {}
                }
            }
            return Ok(cursor);
        }
    }

    fn follow_terminators(&self, next: Option<&SyntaxNode>) -> Vec<Terminator> {
        if !self.config.follow_terminators {
            return Vec::new();
        }
        match next.and_then(SyntaxNode::lexeme) {
            Some(Lexeme::Char(text)) => text
                .chars()
                .next()
                .map(|c| Terminator::Text(vec![c]))
                .into_iter()
                .collect(),
            Some(Lexeme::Keyword { text, .. }) => vec![Terminator::word(text)],
            _ => Vec::new(),
        }
    }

    fn match_lexeme(
        &self,
        lexeme: &Lexeme,
        follow: &[Terminator],
        scan: &Scan<'_>,
        from: usize,
        captures: &mut Captures,
    ) -> Result<Option<usize>, SyntaxError> {
        let start = skip_blank(scan.input, from);
        match lexeme {
            Lexeme::Char(text) => Ok(match_chars(text, scan.input, start)),
            Lexeme::Keyword { id, .. } => Ok(self.match_keyword(*id, scan, start)),
            Lexeme::Marker { kind, id } => {
                self.match_marker(kind, *id, follow, scan.input, start, captures)
            }
            _ => Ok(None),
        }
    }

    /// The identifier run at `start` must spell the keyword, ignoring case.
    /// A longer run is split after the keyword only when the rest starts
    /// with another keyword of the same pattern, so `START STOP` accepts
    /// `STARTSTOP` but `go` never matches inside `gone`.
    fn match_keyword(&self, expected: NameId, scan: &Scan<'_>, start: usize) -> Option<usize> {
        let run = scan.input.get(start..word_end(scan.input, start))?;
        let keyword = self.names.name(expected)?;
        let len = spelled_at(run, keyword)?;
        if len == run.len() {
            return Some(start + len);
        }
        let rest = &run[len..];
        scan.keywords
            .iter()
            .filter_map(|id| self.names.name(*id))
            .any(|other| spelled_at(rest, other).is_some())
            .then_some(start + len)
    }

    fn match_marker(
        &self,
        kind: &MarkerKind,
        id: NameId,
        follow: &[Terminator],
        input: &[char],
        start: usize,
        captures: &mut Captures,
    ) -> Result<Option<usize>, SyntaxError> {
        match kind {
            MarkerKind::Extended => {
                let end = self.scanner.extract_balanced(input, start, follow)?;
                let end = trim_blank_end(input, start, end);
                if end == start {
                    return Ok(None);
                }
                captures.push(id, start..end);
                Ok(Some(end))
            }
            MarkerKind::List => self.match_list(id, follow, input, start, captures),
            MarkerKind::Regular => {
                let end = self.expression.parse(input, start)?;
                captures.push(id, start..end);
                Ok(Some(end))
            }
            MarkerKind::Restricted(alternatives) => {
                let end = word_end(input, start);
                let word: String = input.get(start..end).unwrap_or_default().iter().collect();
                let accepted = end > start
                    && self
                        .names
                        .seek_name(&word)
                        .is_some_and(|found| alternatives.contains(&Alternative::Name(found)));
                if accepted {
                    captures.push(id, start..end);
                    Ok(Some(end))
                } else if alternatives.contains(&Alternative::Empty) {
                    captures.push(id, start..start);
                    Ok(Some(start))
                } else {
                    Ok(None)
                }
            }
            MarkerKind::Wild => {
                let end = line_end(input, start);
                captures.push(id, start..trim_blank_end(input, start, end));
                Ok(Some(end))
            }
        }
    }

    fn match_list(
        &self,
        id: NameId,
        follow: &[Terminator],
        input: &[char],
        start: usize,
        captures: &mut Captures,
    ) -> Result<Option<usize>, SyntaxError> {
        let separator = self.config.list_separator;
        let mut terminators = follow.to_vec();
        terminators.push(Terminator::Text(vec![separator]));

        let mut element = start;
        let mut taken = 0;
        loop {
            let end = self.scanner.extract_balanced(input, element, &terminators)?;
            let trimmed = trim_blank_end(input, element, end);
            let next = skip_blank(input, end);
            if input.get(next) == Some(&separator) {
                captures.push(id, element..trimmed);
                taken += 1;
                element = skip_blank(input, next + 1);
            } else if trimmed > element || taken > 0 {
                captures.push(id, element..trimmed);
                return Ok(Some(trimmed));
            } else {
                return Ok(Some(start));
            }
        }
    }
}

/// Length of `word` when `run` starts with it, ignoring case
fn spelled_at(run: &[char], word: &str) -> Option<usize> {
    let len = word.chars().count();
    let prefix: String = run.get(..len)?.iter().collect();
    (prefix.to_lowercase() == word.to_lowercase()).then_some(len)
}

fn collect_keywords(node: &SyntaxNode, keywords: &mut Vec<NameId>) {
    match node.lexeme() {
        Some(Lexeme::Keyword { id, .. }) => keywords.push(*id),
        Some(_) => {}
        None => node
            .children()
            .iter()
            .for_each(|child| collect_keywords(child, keywords)),
    }
}

/// Literal characters, each optionally preceded by blanks
fn match_chars(text: &str, input: &[char], from: usize) -> Option<usize> {
    let mut pos = from;
    for c in text.chars() {
        pos = skip_blank(input, pos);
        if input.get(pos) != Some(&c) {
            return None;
        }
        pos += 1;
    }
    Some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{BracketScanner, OperatorExpression};
    use crate::parser::parse_rule;

    struct Fixture {
        names: SymbolTable,
        pattern: SyntaxNode,
        config: MatcherConfig,
    }

    fn fixture(rule: &str) -> Fixture {
        let mut names = SymbolTable::new();
        let root = parse_rule(rule, 0, &mut names).expect("Should compile");
        let pattern = root.sides().map(|(p, _)| p.clone()).expect("root");
        Fixture {
            names,
            pattern,
            config: MatcherConfig::default(),
        }
    }

    impl Fixture {
        fn run(&self, input: &str) -> Result<Option<MatchOutcome>, SyntaxError> {
            let chars: Vec<char> = input.chars().collect();
            Matcher::new(
                &self.names,
                &BracketScanner,
                &OperatorExpression,
                &self.config,
            )
            .match_pattern(&self.pattern, &chars, 0)
        }

        fn end(&self, input: &str) -> Option<usize> {
            self.run(input).expect("Should not fail").map(|m| m.end)
        }

        fn texts(&self, input: &str, marker: &str) -> Vec<String> {
            let chars: Vec<char> = input.chars().collect();
            let id = self.names.seek_name(marker).expect("marker");
            self.run(input)
                .expect("Should not fail")
                .map(|m| m.captures.texts(id, &chars))
                .unwrap_or_default()
        }
    }

    #[test]
    fn test_keyword_ignores_case_and_blanks() {
        let f = fixture(" x => y");
        assert_eq!(f.end(" X "), Some(2));
        assert_eq!(f.end("x"), Some(1));
        assert_eq!(f.end("y"), None);
    }

    #[test]
    fn test_chars_tolerate_blanks_between() {
        let f = fixture(" : , => y");
        assert_eq!(f.end(":,"), Some(2));
        assert_eq!(f.end(" :  ,"), Some(5));
        assert_eq!(f.end(";,"), None);
    }

    #[test]
    fn test_literal_prefix_match() {
        let f = fixture("1 => y");
        assert_eq!(f.end(" 13"), Some(2));
    }

    #[test]
    fn test_regular_marker() {
        let f = fixture("<x> => y");
        let outcome = f.run("2 + 3").expect("ok").expect("match");
        assert_eq!(outcome.end, 5);
        assert_eq!(outcome.captures.len(), 1);
    }

    #[test]
    fn test_regular_between_literals() {
        let f = fixture("1<x>3 => y");
        assert_eq!(f.end(" 1 2 3"), Some(6));
        assert_eq!(f.texts(" 1 2 3", "x"), vec!["2"]);
    }

    #[test]
    fn test_regular_escalates_grammar_errors() {
        let f = fixture("go <x> => y");
        let err = f.run("go )").expect_err("Should fail");
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_extended_stops_at_following_keyword() {
        let f = fixture("move <(a)> to <(b)> => y");
        assert_eq!(f.texts("move x + 1 TO f(to)", "a"), vec!["x + 1"]);
        assert_eq!(f.texts("move x + 1 TO f(to)", "b"), vec!["f(to)"]);
    }

    #[test]
    fn test_extended_without_follow_terminators() {
        let mut f = fixture("move <(a)> to <(b)> => y");
        f.config.follow_terminators = false;
        assert_eq!(f.end("move x to y"), None);
    }

    #[test]
    fn test_empty_extended_is_no_match() {
        let f = fixture("go <(x)> => y");
        assert_eq!(f.end("go   "), None);
    }

    #[test]
    fn test_list_marker() {
        let f = fixture("print <items,...> => y");
        assert_eq!(
            f.texts("print a, f(b, c) ,  \"x,y\"", "items"),
            vec!["a", "f(b, c)", "\"x,y\""]
        );
        assert!(f.texts("print", "items").is_empty());
        assert_eq!(f.end("print"), Some(5));
    }

    #[test]
    fn test_list_stops_at_following_char() {
        let f = fixture("call <args,...> ) => y");
        assert_eq!(f.texts("call 1, 2 )", "args"), vec!["1", "2"]);
    }

    #[test]
    fn test_restricted_marker() {
        let f = fixture("set <mode:fast,slow> => y");
        assert_eq!(f.texts("set SLOW", "mode"), vec!["SLOW"]);
        assert_eq!(f.end("set medium"), None);
        assert_eq!(f.end("set"), None);
    }

    #[test]
    fn test_restricted_marker_with_empty_alternative() {
        let f = fixture("set <mode:fast,&> => y");
        assert_eq!(f.texts("set", "mode"), vec![""]);
        assert_eq!(f.texts("set fast", "mode"), vec!["fast"]);
        assert_eq!(f.end("set slow"), Some(4));
    }

    #[test]
    fn test_wild_consumes_line() {
        let f = fixture("note <*rest*> => y");
        assert_eq!(f.texts("note anything (goes  ", "rest"), vec!["anything (goes"]);
        assert_eq!(f.end("note a\nb"), Some(6));
    }

    #[test]
    fn test_wild_followed_by_mandatory_never_matches() {
        let f = fixture("<*rest*> END => y");
        assert_eq!(f.end("foo END"), None);
        assert_eq!(f.end("END"), None);
    }

    #[test]
    fn test_optional_repeats_alternatives() {
        let f = fixture("[a][b] => y");
        assert_eq!(f.end("aabba"), Some(5));
        assert_eq!(f.end("ab"), Some(2));
        assert_eq!(f.end("c"), Some(0));
        assert_eq!(f.end("aXb"), Some(0));
    }

    #[test]
    fn test_zero_width_alternative_ends_repetition() {
        let f = fixture("[<m:a,&>] x => y");
        let outcome = f.run("x").expect("ok").expect("match");
        assert_eq!(outcome.end, 1);
        assert!(outcome.captures.is_empty());
        assert_eq!(f.end("a x"), Some(3));

        let f = fixture("[[a]] b => y");
        assert_eq!(f.end("b"), Some(1));
        assert_eq!(f.end("a a b"), Some(5));
    }

    #[test]
    fn test_keyword_does_not_match_inside_longer_word() {
        let f = fixture("go <(x)> => y");
        assert_eq!(f.end("gone fishing"), None);
        assert_eq!(f.end("go2 x"), None);
        assert_eq!(f.end("GO fishing"), Some(10));
    }

    #[test]
    fn test_keyword_split_only_before_own_keyword() {
        let f = fixture("START STOP => y");
        assert_eq!(f.end("STARTSTOP"), Some(9));
        assert_eq!(f.end("STARTS STOP"), None);
        assert_eq!(f.end("startstopper"), None);
    }

    #[test]
    fn test_keywords_of_other_rules_do_not_split_words() {
        let mut names = SymbolTable::new();
        parse_rule("gone => y", 0, &mut names).expect("Should compile");
        let split = parse_rule("go ne => y", 0, &mut names).expect("Should compile");
        let whole = parse_rule("go <(x)> => y", 0, &mut names).expect("Should compile");
        let config = MatcherConfig::default();
        let matcher = Matcher::new(&names, &BracketScanner, &OperatorExpression, &config);
        let input: Vec<char> = "gone".chars().collect();

        let outcome = matcher.match_pattern(&split, &input, 0).expect("ok");
        assert_eq!(outcome.map(|m| m.end), Some(4));
        let outcome = matcher.match_pattern(&whole, &input, 0).expect("ok");
        assert_eq!(outcome, None);
    }

    #[test]
    fn test_offset_past_end_is_no_match() {
        let f = fixture("go => y");
        let input: Vec<char> = "go".chars().collect();
        let config = MatcherConfig::default();
        let outcome = Matcher::new(&f.names, &BracketScanner, &OperatorExpression, &config)
            .match_pattern(&f.pattern, &input, 5)
            .expect("ok");
        assert_eq!(outcome, None);
        assert_eq!(f.end("  "), None);
    }

    #[test]
    fn test_chars_start_after_leading_blanks() {
        let f = fixture(": x => y");
        assert_eq!(f.end("   :x"), Some(5));
        assert_eq!(f.end("\t: x"), Some(4));
    }

    #[test]
    fn test_failed_sequence_discards_captures() {
        let f = fixture("go [<(x)> now] <(y)> => z");
        let outcome = f.run("go later").expect("ok").expect("match");
        let x = f.names.seek_name("x").expect("x");
        let y = f.names.seek_name("y").expect("y");
        assert!(outcome.captures.of(x).is_empty());
        assert_eq!(outcome.captures.of(y).len(), 1);
    }

    #[test]
    fn test_no_backtracking_into_optional() {
        let f = fixture("[a] a => y");
        assert_eq!(f.end("a"), None);
        assert_eq!(f.end("aa"), None);
    }
}
