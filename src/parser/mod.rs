//! Rule compilation: lexer, symbol table and tree builder

pub mod ast;
mod grammar;
pub mod lexer;
pub mod symbols;

use std::collections::HashSet;

pub use ast::*;
pub use grammar::build_tree;
pub use symbols::{NameId, SymbolTable};

use crate::error::CompileError;

/// Lex and build the tree of one rule, registering names in `names`.
///
/// Only the first error is returned; a rule either compiles completely or
/// not at all.
pub fn parse_rule(
    source: &str,
    from: usize,
    names: &mut SymbolTable,
) -> Result<SyntaxNode, CompileError> {
    let lexemes = lexer::lex(source, from, names)?;
    check_result_markers(&lexemes, names)?;
    build_tree(&lexemes).map_err(|mut errors| {
        if errors.is_empty() {
            CompileError::syntax(from..from, "Invalid rule")
        } else {
            errors.swap_remove(0)
        }
    })
}

/// Every result marker must name a marker of the pattern
fn check_result_markers(
    lexemes: &[Spanned<Lexeme>],
    names: &SymbolTable,
) -> Result<(), CompileError> {
    let captured: HashSet<NameId> = lexemes
        .iter()
        .filter_map(|lexeme| match &lexeme.node {
            Lexeme::Marker { id, .. } => Some(*id),
            _ => None,
        })
        .collect();

    for lexeme in lexemes {
        if let Lexeme::Result { id, .. } = &lexeme.node {
            if !captured.contains(id) {
                let name = names.name(*id).map_or_else(|| id.to_string(), str::to_string);
                return Err(CompileError::syntax(
                    lexeme.span.clone(),
                    format!("Unknown marker '{}'", name),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error(input: &str) -> CompileError {
        let mut names = SymbolTable::new();
        parse_rule(input, 0, &mut names).expect_err("Should fail")
    }

    #[test]
    fn test_result_marker_must_be_captured() {
        let err = parse_error("go <(x)> => moved <(y)>");
        assert_eq!(err.span(), &(18..23));
        assert_eq!(
            err,
            CompileError::Syntax {
                span: 18..23,
                message: "Unknown marker 'y'".to_string(),
                expected: Vec::new(),
            }
        );
    }

    #[test]
    fn test_result_marker_reported_with_first_spelling() {
        let err = parse_error("go <(x)> => <.X.> <Dir>");
        assert_eq!(err.span(), &(18..23));
        assert!(err.to_string().contains("Unknown marker 'Dir'"));
    }

    #[test]
    fn test_keyword_named_like_marker_is_not_a_capture() {
        let err = parse_error("to x => <x>");
        assert_eq!(err.span(), &(8..11));
    }

    #[test]
    fn test_captured_markers_compile() {
        let mut names = SymbolTable::new();
        assert!(parse_rule("set <m:a,&> [<(v)>] => <m> #<v> <.v.>", 0, &mut names).is_ok());
    }
}
