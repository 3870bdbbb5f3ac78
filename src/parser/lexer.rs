//! Lexer for rule text using logos
//!
//! Tokenization runs in two steps: logos splits the line into raw tokens,
//! then [`lex`] resolves each marker against the side of `=>` it appears on
//! and registers names in the symbol table.

use logos::{Lexer, Logos};

use crate::error::CompileError;
use crate::parser::ast::{Alternative, Lexeme, MarkerKind, ResultKind, Spanned};
use crate::parser::symbols::SymbolTable;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\x0C]+")]
pub enum Token {
    #[token("=>")]
    Separator,
    #[token("[")]
    OpenGroup,
    #[token("]")]
    CloseGroup,
    #[token(";")]
    Continuation,
    #[regex(r"[\r\n]")]
    LineEnd,

    // Markers
    #[regex(r"<[A-Za-z][A-Za-z0-9_]*>", marker_name)]
    Angle(String),
    #[regex(r"<\([A-Za-z][A-Za-z0-9_]*\)>", marker_name)]
    Paren(String),
    #[regex(r"<\*[A-Za-z][A-Za-z0-9_]*\*>", marker_name)]
    Star(String),
    #[regex(r#"<"[A-Za-z][A-Za-z0-9_]*">"#, marker_name)]
    Quote(String),
    #[regex(r"<\{[A-Za-z][A-Za-z0-9_]*\}>", marker_name)]
    Brace(String),
    #[regex(r"<\.[A-Za-z][A-Za-z0-9_]*\.>", marker_name)]
    Dot(String),
    #[regex(r"#<[A-Za-z][A-Za-z0-9_]*>", marker_name)]
    Hash(String),
    #[regex(r"<[A-Za-z][A-Za-z0-9_]*,\.\.\.>", list_name)]
    List(String),
    #[regex(
        r"<[A-Za-z][A-Za-z0-9_]*:[ \t]*([A-Za-z][A-Za-z0-9_]*|&)([ \t]*,[ \t]*([A-Za-z][A-Za-z0-9_]*|&))*[ \t]*>",
        restricted
    )]
    Restricted((String, Vec<String>)),

    // Broken marker prefixes
    #[regex(r#"#?<[(*"{.]?[A-Za-z][A-Za-z0-9_]*"#)]
    Unterminated,
    #[regex(r#"#?<[(*"{.]?"#)]
    MissingName,

    #[regex(r"\\[^\r\n]", |lex| lex.slice()[1..].to_string())]
    Escaped(String),
    #[regex(r"[A-Za-z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
    #[regex(r"[^\x00-\x20A-Za-z\[\];\\=<>#]+", |lex| lex.slice().to_string())]
    #[token("=", |lex| lex.slice().to_string())]
    #[token("#", |lex| lex.slice().to_string())]
    #[token(">", |lex| lex.slice().to_string())]
    Chars(String),
}

fn marker_name(lex: &mut Lexer<Token>) -> String {
    lex.slice()
        .trim_start_matches('#')
        .trim_start_matches('<')
        .trim_start_matches(['(', '*', '"', '{', '.'])
        .trim_end_matches('>')
        .trim_end_matches([')', '*', '"', '}', '.'])
        .to_string()
}

fn list_name(lex: &mut Lexer<Token>) -> String {
    lex.slice()
        .trim_start_matches('<')
        .trim_end_matches(",...>")
        .to_string()
}

fn restricted(lex: &mut Lexer<Token>) -> (String, Vec<String>) {
    let body = lex.slice().trim_start_matches('<').trim_end_matches('>');
    let (name, alternatives) = body.split_once(':').unwrap_or((body, ""));
    let alternatives = alternatives
        .split(',')
        .map(|alt| alt.trim().to_string())
        .collect();
    (name.to_string(), alternatives)
}

/// Tokenize one rule starting at character offset `from`.
///
/// The result always ends with [`Lexeme::Eof`], placed at the first line
/// terminator or at the end of `source`. Spans are character offsets into
/// `source`.
pub fn lex(
    source: &str,
    from: usize,
    names: &mut SymbolTable,
) -> Result<Vec<Spanned<Lexeme>>, CompileError> {
    let text = match source.char_indices().nth(from) {
        Some((byte, _)) => &source[byte..],
        None => "",
    };
    let to_chars = |byte: usize| from + text[..byte].chars().count();

    let mut lexemes = Vec::new();
    let mut past_separator = false;

    for (token, range) in Token::lexer(text).spanned() {
        let span = to_chars(range.start)..to_chars(range.end);
        let token =
            token.map_err(|_| CompileError::syntax(span.clone(), "Illegal character in rule"))?;

        let pattern_only = |what: &str| {
            CompileError::syntax(span.clone(), format!("{} is only allowed before '=>'", what))
        };
        let template_only = |what: &str| {
            CompileError::syntax(span.clone(), format!("{} is only allowed after '=>'", what))
        };

        let lexeme = match token {
            Token::LineEnd => {
                lexemes.push(Spanned::new(Lexeme::Eof, span.start..span.start));
                return Ok(lexemes);
            }
            Token::Separator => {
                past_separator = true;
                Lexeme::Separator
            }
            Token::OpenGroup => Lexeme::OpenGroup,
            Token::CloseGroup => Lexeme::CloseGroup,
            Token::Continuation if past_separator => Lexeme::Continuation,
            Token::Continuation => return Err(template_only("';'")),
            Token::Angle(name) => {
                let id = names.place_name(&name);
                if past_separator {
                    Lexeme::Result {
                        kind: ResultKind::Regular,
                        id,
                    }
                } else {
                    Lexeme::Marker {
                        kind: MarkerKind::Regular,
                        id,
                    }
                }
            }
            Token::Paren(name) => {
                let id = names.place_name(&name);
                if past_separator {
                    Lexeme::Result {
                        kind: ResultKind::Smart,
                        id,
                    }
                } else {
                    Lexeme::Marker {
                        kind: MarkerKind::Extended,
                        id,
                    }
                }
            }
            Token::Star(_) if past_separator => return Err(pattern_only("Wild marker")),
            Token::Star(name) => Lexeme::Marker {
                kind: MarkerKind::Wild,
                id: names.place_name(&name),
            },
            Token::List(_) if past_separator => return Err(pattern_only("List marker")),
            Token::List(name) => Lexeme::Marker {
                kind: MarkerKind::List,
                id: names.place_name(&name),
            },
            Token::Restricted(_) if past_separator => {
                return Err(pattern_only("Restricted marker"))
            }
            Token::Restricted((name, alternatives)) => {
                let id = names.place_name(&name);
                let alternatives = alternatives
                    .iter()
                    .map(|alt| match alt.as_str() {
                        "&" => Alternative::Empty,
                        alt => Alternative::Name(names.place_name(alt)),
                    })
                    .collect();
                Lexeme::Marker {
                    kind: MarkerKind::Restricted(alternatives),
                    id,
                }
            }
            Token::Quote(name) if past_separator => Lexeme::Result {
                kind: ResultKind::Normal,
                id: names.place_name(&name),
            },
            Token::Brace(name) if past_separator => Lexeme::Result {
                kind: ResultKind::Block,
                id: names.place_name(&name),
            },
            Token::Dot(name) if past_separator => Lexeme::Result {
                kind: ResultKind::Bool,
                id: names.place_name(&name),
            },
            Token::Hash(name) if past_separator => Lexeme::Result {
                kind: ResultKind::Dumb,
                id: names.place_name(&name),
            },
            Token::Quote(_) => return Err(template_only("Normal result marker")),
            Token::Brace(_) => return Err(template_only("Block result marker")),
            Token::Dot(_) => return Err(template_only("Bool result marker")),
            Token::Hash(_) => return Err(template_only("Dumb result marker")),
            Token::Unterminated => {
                return Err(CompileError::syntax(
                    span.clone(),
                    "Unterminated marker, missing '>'",
                ))
            }
            Token::MissingName => {
                return Err(CompileError::syntax(span.clone(), "Missing marker name"))
            }
            Token::Ident(text) => Lexeme::Keyword {
                id: names.place_name(&text),
                text,
            },
            Token::Escaped(text) | Token::Chars(text) => Lexeme::Char(text),
        };
        lexemes.push(Spanned::new(lexeme, span));
    }

    let end = from + text.chars().count();
    lexemes.push(Spanned::new(Lexeme::Eof, end..end));
    Ok(lexemes)
}
