//! Expression sub-grammar used by regular markers

use crate::error::SyntaxError;
use crate::matcher::scanner::skip_quoted;
use crate::matcher::skip_blank;

/// Recognizes one expression starting at `from` and returns its end offset
/// (trailing blanks excluded). Must be reentrant.
pub trait ExpressionGrammar: Send + Sync {
    fn parse(&self, input: &[char], from: usize) -> Result<usize, SyntaxError>;
}

/// Default grammar: operands with prefix, postfix and binary operators.
///
/// Operands are numbers, identifiers, quoted strings, parenthesised
/// expressions and bracketed lists. Operator precedence is irrelevant since
/// only the extent of the expression is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorExpression;

impl ExpressionGrammar for OperatorExpression {
    fn parse(&self, input: &[char], from: usize) -> Result<usize, SyntaxError> {
        let mut cursor = Cursor { input, pos: from };
        cursor.expression()?;
        Ok(cursor.pos)
    }
}

const PREFIX: [char; 4] = ['-', '+', '!', '~'];
const BINARY_2: [&str; 8] = ["==", "!=", "<=", ">=", "&&", "||", "<<", ">>"];
const BINARY_1: [char; 10] = ['+', '-', '*', '/', '%', '<', '>', '&', '|', '^'];

struct Cursor<'i> {
    input: &'i [char],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn skip_blank(&mut self) {
        self.pos = skip_blank(self.input, self.pos);
    }

    fn expect(&mut self, c: char) -> Result<(), SyntaxError> {
        self.skip_blank();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(SyntaxError::new(self.pos, format!("missing '{}'", c)))
        }
    }

    fn expression(&mut self) -> Result<(), SyntaxError> {
        self.unary()?;
        loop {
            let end = self.pos;
            self.skip_blank();
            match self.binary_operator() {
                Some(len) => {
                    self.pos += len;
                    self.unary()?;
                }
                None => {
                    self.pos = end;
                    return Ok(());
                }
            }
        }
    }

    fn binary_operator(&self) -> Option<usize> {
        let two: String = self.input.iter().skip(self.pos).take(2).collect();
        if BINARY_2.contains(&two.as_str()) {
            Some(2)
        } else {
            self.peek().filter(|c| BINARY_1.contains(c)).map(|_| 1)
        }
    }

    fn unary(&mut self) -> Result<(), SyntaxError> {
        self.skip_blank();
        while self.peek().is_some_and(|c| PREFIX.contains(&c)) {
            self.pos += 1;
            self.skip_blank();
        }
        self.primary()?;
        self.postfix()
    }

    fn primary(&mut self) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                self.number();
                Ok(())
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                self.identifier();
                Ok(())
            }
            Some('"') | Some('\'') => {
                self.pos = skip_quoted(self.input, self.pos)?;
                Ok(())
            }
            Some('(') => {
                self.pos += 1;
                self.expression()?;
                self.expect(')')
            }
            Some('[') => {
                self.pos += 1;
                self.arguments(']')
            }
            _ => Err(SyntaxError::new(self.pos, "expression expected")),
        }
    }

    fn postfix(&mut self) -> Result<(), SyntaxError> {
        loop {
            match self.peek() {
                Some('(') => {
                    self.pos += 1;
                    self.arguments(')')?;
                }
                Some('[') => {
                    self.pos += 1;
                    self.expression()?;
                    self.expect(']')?;
                }
                Some('.')
                    if self
                        .input
                        .get(self.pos + 1)
                        .is_some_and(|c| c.is_alphabetic() || *c == '_') =>
                {
                    self.pos += 1;
                    self.identifier();
                }
                _ => return Ok(()),
            }
        }
    }

    /// Comma-separated expressions up to `close`, possibly none
    fn arguments(&mut self, close: char) -> Result<(), SyntaxError> {
        self.skip_blank();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(());
        }
        self.expression()?;
        loop {
            self.skip_blank();
            if self.peek() == Some(',') {
                self.pos += 1;
                self.expression()?;
            } else {
                return self.expect(close);
            }
        }
    }

    fn number(&mut self) {
        self.digits();
        if self.peek() == Some('.') && self.input.get(self.pos + 1).is_some_and(char::is_ascii_digit)
        {
            self.pos += 1;
            self.digits();
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut exponent = self.pos + 1;
            if matches!(self.input.get(exponent), Some('+') | Some('-')) {
                exponent += 1;
            }
            if self.input.get(exponent).is_some_and(char::is_ascii_digit) {
                self.pos = exponent;
                self.digits();
            }
        }
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
    }
}
