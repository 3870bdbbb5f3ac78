//! Lexemes and syntax tree types for compiled rules

use std::fmt;

use crate::parser::symbols::{NameId, SymbolTable};

/// Character range in source text
pub type Span = std::ops::Range<usize>;

/// A node with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// One accepted value of a restricted marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alternative {
    Name(NameId),
    /// `&`: the marker may capture nothing
    Empty,
}

/// Capturing markers, only legal before `=>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// `<(name)>` balanced expression
    Extended,
    /// `<name,...>` comma-separated balanced expressions
    List,
    /// `<name>` expression sub-grammar
    Regular,
    /// `<name:a,b,&>` one identifier out of a closed set
    Restricted(Vec<Alternative>),
    /// `<*name*>` rest of line
    Wild,
}

/// Rendering markers, only legal after `=>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// `<name>`
    Regular,
    /// `#<name>`
    Dumb,
    /// `<"name">`
    Normal,
    /// `<(name)>`
    Smart,
    /// `<{name}>`
    Block,
    /// `<.name.>`
    Bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
    Eof,
    /// Literal text; blanks are never part of it
    Char(String),
    /// Identifier; `text` keeps the source spelling for rendering
    Keyword { id: NameId, text: String },
    OpenGroup,
    CloseGroup,
    Separator,
    Continuation,
    Marker { kind: MarkerKind, id: NameId },
    Result { kind: ResultKind, id: NameId },
}

impl Lexeme {
    pub fn is_pattern_item(&self) -> bool {
        matches!(
            self,
            Lexeme::Char(_) | Lexeme::Keyword { .. } | Lexeme::Marker { .. }
        )
    }

    pub fn is_template_item(&self) -> bool {
        matches!(
            self,
            Lexeme::Char(_) | Lexeme::Keyword { .. } | Lexeme::Result { .. } | Lexeme::Continuation
        )
    }

    /// Marker or result id, if this lexeme refers to a capture
    pub fn marker_id(&self) -> Option<NameId> {
        match self {
            Lexeme::Marker { id, .. } | Lexeme::Result { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Human-readable form for error messages
    pub fn describe(&self) -> String {
        match self {
            Lexeme::Eof => "end of rule".to_string(),
            Lexeme::Char(text) => format!("'{}'", text),
            Lexeme::Keyword { text, .. } => format!("keyword '{}'", text),
            Lexeme::OpenGroup => "'['".to_string(),
            Lexeme::CloseGroup => "']'".to_string(),
            Lexeme::Separator => "'=>'".to_string(),
            Lexeme::Continuation => "';'".to_string(),
            Lexeme::Marker { kind, id } => format!("{} marker {}", marker_label(kind), id),
            Lexeme::Result { kind, id } => format!("{} result {}", result_label(*kind), id),
        }
    }
}

fn marker_label(kind: &MarkerKind) -> &'static str {
    match kind {
        MarkerKind::Extended => "extended",
        MarkerKind::List => "list",
        MarkerKind::Regular => "regular",
        MarkerKind::Restricted(_) => "restricted",
        MarkerKind::Wild => "wild",
    }
}

fn result_label(kind: ResultKind) -> &'static str {
    match kind {
        ResultKind::Regular => "regular",
        ResultKind::Dumb => "dumb",
        ResultKind::Normal => "normal",
        ResultKind::Smart => "smart",
        ResultKind::Block => "block",
        ResultKind::Bool => "bool",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mandatory,
    Optional,
    Sequence,
    Root,
}

/// Compiled rule tree.
///
/// `Optional` children are the alternative sequences of one run of
/// bracket groups, so `[a][b]` is a single node with two children.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxNode {
    Mandatory(Lexeme),
    Optional(Vec<SyntaxNode>),
    Sequence(Vec<SyntaxNode>),
    /// Pattern and template, in that order
    Root(Box<[SyntaxNode; 2]>),
}

impl SyntaxNode {
    pub fn root(pattern: SyntaxNode, template: SyntaxNode) -> Self {
        SyntaxNode::Root(Box::new([pattern, template]))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            SyntaxNode::Mandatory(_) => NodeKind::Mandatory,
            SyntaxNode::Optional(_) => NodeKind::Optional,
            SyntaxNode::Sequence(_) => NodeKind::Sequence,
            SyntaxNode::Root(_) => NodeKind::Root,
        }
    }

    pub fn children(&self) -> &[SyntaxNode] {
        match self {
            SyntaxNode::Mandatory(_) => &[],
            SyntaxNode::Optional(children) | SyntaxNode::Sequence(children) => children,
            SyntaxNode::Root(halves) => &halves[..],
        }
    }

    pub fn lexeme(&self) -> Option<&Lexeme> {
        match self {
            SyntaxNode::Mandatory(lexeme) => Some(lexeme),
            _ => None,
        }
    }

    /// Pattern and template of a root node
    pub fn sides(&self) -> Option<(&SyntaxNode, &SyntaxNode)> {
        match self {
            SyntaxNode::Root(halves) => Some((&halves[0], &halves[1])),
            _ => None,
        }
    }

    /// Same node kinds and lexemes, ignoring name ids.
    ///
    /// Two rules compiled against different symbol tables compare equal
    /// here even though their ids differ.
    pub fn same_shape(&self, other: &SyntaxNode) -> bool {
        match (self, other) {
            (SyntaxNode::Mandatory(a), SyntaxNode::Mandatory(b)) => same_lexeme_shape(a, b),
            _ => {
                self.kind() == other.kind()
                    && self.children().len() == other.children().len()
                    && self
                        .children()
                        .iter()
                        .zip(other.children())
                        .all(|(a, b)| a.same_shape(b))
            }
        }
    }

    /// Every capture id referenced below this node, in tree order
    pub fn marker_ids(&self) -> Vec<NameId> {
        let mut ids = Vec::new();
        self.collect_marker_ids(&mut ids);
        ids
    }

    fn collect_marker_ids(&self, ids: &mut Vec<NameId>) {
        match self {
            SyntaxNode::Mandatory(lexeme) => ids.extend(lexeme.marker_id()),
            _ => self
                .children()
                .iter()
                .for_each(|child| child.collect_marker_ids(ids)),
        }
    }

    /// Rule-syntax rendering of the tree, resolving ids through `names`
    pub fn display<'a>(&'a self, names: &'a SymbolTable) -> TreeDisplay<'a> {
        TreeDisplay { node: self, names }
    }
}

fn same_lexeme_shape(a: &Lexeme, b: &Lexeme) -> bool {
    match (a, b) {
        (Lexeme::Keyword { text: x, .. }, Lexeme::Keyword { text: y, .. }) => {
            x.eq_ignore_ascii_case(y)
        }
        (
            Lexeme::Marker { kind: MarkerKind::Restricted(x), .. },
            Lexeme::Marker { kind: MarkerKind::Restricted(y), .. },
        ) => x.len() == y.len(),
        (Lexeme::Marker { kind: x, .. }, Lexeme::Marker { kind: y, .. }) => x == y,
        (Lexeme::Result { kind: x, .. }, Lexeme::Result { kind: y, .. }) => x == y,
        _ => a == b,
    }
}

pub struct TreeDisplay<'a> {
    node: &'a SyntaxNode,
    names: &'a SymbolTable,
}

impl TreeDisplay<'_> {
    fn name(&self, id: NameId) -> String {
        match self.names.name(id) {
            Some(name) => name.to_string(),
            None => id.to_string(),
        }
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, node: &SyntaxNode) -> fmt::Result {
        match node {
            SyntaxNode::Mandatory(lexeme) => self.write_lexeme(f, lexeme),
            SyntaxNode::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    self.write_node(f, item)?;
                }
                Ok(())
            }
            SyntaxNode::Optional(alternatives) => {
                for alternative in alternatives {
                    f.write_str("[")?;
                    self.write_node(f, alternative)?;
                    f.write_str("]")?;
                }
                Ok(())
            }
            SyntaxNode::Root(halves) => {
                self.write_node(f, &halves[0])?;
                f.write_str(" =>")?;
                if !halves[1].children().is_empty() {
                    f.write_str(" ")?;
                }
                self.write_node(f, &halves[1])
            }
        }
    }

    fn write_lexeme(&self, f: &mut fmt::Formatter<'_>, lexeme: &Lexeme) -> fmt::Result {
        match lexeme {
            Lexeme::Eof => Ok(()),
            Lexeme::Char(text) => {
                for c in text.chars() {
                    if matches!(c, '[' | ']' | ';' | '\\' | '<') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                Ok(())
            }
            Lexeme::Keyword { text, .. } => f.write_str(text),
            Lexeme::OpenGroup => f.write_str("["),
            Lexeme::CloseGroup => f.write_str("]"),
            Lexeme::Separator => f.write_str("=>"),
            Lexeme::Continuation => f.write_str(";"),
            Lexeme::Marker { kind, id } => {
                let name = self.name(*id);
                match kind {
                    MarkerKind::Extended => write!(f, "<({})>", name),
                    MarkerKind::List => write!(f, "<{},...>", name),
                    MarkerKind::Regular => write!(f, "<{}>", name),
                    MarkerKind::Wild => write!(f, "<*{}*>", name),
                    MarkerKind::Restricted(alternatives) => {
                        let list: Vec<String> = alternatives
                            .iter()
                            .map(|alt| match alt {
                                Alternative::Name(alt) => self.name(*alt),
                                Alternative::Empty => "&".to_string(),
                            })
                            .collect();
                        write!(f, "<{}:{}>", name, list.join(","))
                    }
                }
            }
            Lexeme::Result { kind, id } => {
                let name = self.name(*id);
                match kind {
                    ResultKind::Regular => write!(f, "<{}>", name),
                    ResultKind::Dumb => write!(f, "#<{}>", name),
                    ResultKind::Normal => write!(f, "<\"{}\">", name),
                    ResultKind::Smart => write!(f, "<({})>", name),
                    ResultKind::Block => write!(f, "<{{{}}}>", name),
                    ResultKind::Bool => write!(f, "<.{}.>", name),
                }
            }
        }
    }
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_node(text: &str) -> SyntaxNode {
        SyntaxNode::Mandatory(Lexeme::Char(text.to_string()))
    }

    #[test]
    fn test_children_by_kind() {
        let seq = SyntaxNode::Sequence(vec![char_node("1"), char_node("2")]);
        assert_eq!(seq.kind(), NodeKind::Sequence);
        assert_eq!(seq.children().len(), 2);
        assert!(char_node("1").children().is_empty());

        let root = SyntaxNode::root(seq.clone(), SyntaxNode::Sequence(vec![]));
        assert_eq!(root.kind(), NodeKind::Root);
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.sides().map(|(p, _)| p), Some(&seq));
    }

    #[test]
    fn test_same_shape_ignores_ids() {
        let a = SyntaxNode::Mandatory(Lexeme::Marker {
            kind: MarkerKind::Regular,
            id: NameId(0),
        });
        let b = SyntaxNode::Mandatory(Lexeme::Marker {
            kind: MarkerKind::Regular,
            id: NameId(7),
        });
        let c = SyntaxNode::Mandatory(Lexeme::Marker {
            kind: MarkerKind::Wild,
            id: NameId(0),
        });
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
        assert_ne!(a, b);
    }

    #[test]
    fn test_marker_ids_in_order() {
        let tree = SyntaxNode::Sequence(vec![
            SyntaxNode::Mandatory(Lexeme::Result {
                kind: ResultKind::Regular,
                id: NameId(2),
            }),
            SyntaxNode::Optional(vec![SyntaxNode::Sequence(vec![SyntaxNode::Mandatory(
                Lexeme::Result {
                    kind: ResultKind::Bool,
                    id: NameId(1),
                },
            )])]),
        ]);
        assert_eq!(tree.marker_ids(), vec![NameId(2), NameId(1)]);
    }

    #[test]
    fn test_display_escapes_group_chars() {
        let names = SymbolTable::new();
        let node = char_node("[;");
        assert_eq!(node.display(&names).to_string(), "\\[\\;");
    }
}
