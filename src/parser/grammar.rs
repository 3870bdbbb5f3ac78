//! Tree builder over lexemes using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::CompileError;
use crate::parser::ast::{Lexeme, Spanned, SyntaxNode};

/// Build the Root tree of one rule from its lexemes.
///
/// Every error is reported; a failed build never yields a partial tree.
pub fn build_tree(lexemes: &[Spanned<Lexeme>]) -> Result<SyntaxNode, Vec<CompileError>> {
    let end = lexemes.last().map(|l| l.span.end).unwrap_or(0);

    let token_iter = lexemes
        .iter()
        .map(|l| (l.node.clone(), SimpleSpan::from(l.span.clone())));

    let token_stream = Stream::from_iter(token_iter).map((end..end).into(), |(t, s): (_, _)| (t, s));

    rule_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn rule_parser<'a, I>() -> impl Parser<'a, I, SyntaxNode, extra::Err<Rich<'a, Lexeme>>> + Clone
where
    I: ValueInput<'a, Token = Lexeme, Span = SimpleSpan>,
{
    side_parser(Lexeme::is_pattern_item)
        .then_ignore(just(Lexeme::Separator))
        .then(side_parser(Lexeme::is_template_item))
        .then_ignore(just(Lexeme::Eof))
        .then_ignore(end())
        .map(|(pattern, template)| SyntaxNode::root(pattern, template))
}

/// One side of the rule: leaves admitted by `admits` become Mandatory
/// nodes, and each run of bracket groups becomes one Optional node.
fn side_parser<'a, I>(
    admits: fn(&Lexeme) -> bool,
) -> impl Parser<'a, I, SyntaxNode, extra::Err<Rich<'a, Lexeme>>> + Clone
where
    I: ValueInput<'a, Token = Lexeme, Span = SimpleSpan>,
{
    recursive(move |sequence| {
        let leaf = any()
            .filter(move |lexeme: &Lexeme| admits(lexeme))
            .map(SyntaxNode::Mandatory);

        let group = sequence.delimited_by(just(Lexeme::OpenGroup), just(Lexeme::CloseGroup));

        let optional = group
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .map(SyntaxNode::Optional);

        choice((leaf, optional))
            .repeated()
            .collect::<Vec<_>>()
            .map(SyntaxNode::Sequence)
            .boxed()
    })
}
