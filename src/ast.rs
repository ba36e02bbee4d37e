//! Syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! [`Node`] is a closed set of value-level variants matched exhaustively by
//! the processor. Members, sections and the document itself are structural
//! and live in their own types. Nodes are built once per parse and are
//! read-only afterwards.

use crate::error::Error;
use crate::position::PositionRange;
use crate::token::{Token, TokenKind};
use std::fmt;

/// A value-level syntax node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Token(TokenNode),
    Object(ObjectNode),
    Array(ArrayNode),
    Collection(CollectionNode),
    Error(ErrorNode),
}

impl Node {
    #[must_use]
    pub fn range(&self) -> PositionRange {
        match self {
            Node::Token(t) => t.token.range,
            Node::Object(o) => o.range,
            Node::Array(a) => a.range,
            Node::Collection(c) => c.range,
            Node::Error(e) => e.range,
        }
    }

    #[must_use]
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(t) => Some(&t.token),
            _ => None,
        }
    }

    /// `true` for a `@name` reference token.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, Node::Token(t) if t.token.kind == TokenKind::Variable)
    }

    /// Short description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Node::Token(t) => t.token.kind.to_string(),
            Node::Object(_) => "object".to_string(),
            Node::Array(_) => "array".to_string(),
            Node::Collection(_) => "collection".to_string(),
            Node::Error(_) => "error".to_string(),
        }
    }
}

/// Renders the node back to Internet Object text from the raw lexemes.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Token(t) => f.write_str(&t.token.raw),
            Node::Object(o) => {
                f.write_str("{")?;
                write_members(f, &o.members)?;
                f.write_str("}")
            }
            Node::Array(a) => {
                f.write_str("[")?;
                for (i, element) in a.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
            Node::Collection(c) => {
                for (i, item) in c.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "~ {}", item)?;
                }
                Ok(())
            }
            Node::Error(_) => Ok(()),
        }
    }
}

fn write_members(f: &mut fmt::Formatter<'_>, members: &[MemberNode]) -> fmt::Result {
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if let Some(key) = &member.key {
            write!(f, "{}: ", key.raw)?;
        }
        if let Some(value) = &member.value {
            write!(f, "{}", value)?;
        }
    }
    Ok(())
}

/// A scalar value or reference.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenNode {
    pub token: Token,
}

/// An object member, positional (`value`) or keyed (`key: value`).
///
/// `value` is `None` for an empty member such as the middle of `a, , c`.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberNode {
    pub key: Option<Token>,
    pub value: Option<Node>,
    pub range: PositionRange,
}

impl MemberNode {
    /// The member name for keyed members.
    #[must_use]
    pub fn key_text(&self) -> Option<&str> {
        self.key
            .as_ref()
            .and_then(|k| k.text().or(Some(k.raw.as_str())))
    }
}

/// Ordered members, either braced or the implicit top-level object of a
/// section or collection item.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectNode {
    pub members: Vec<MemberNode>,
    pub range: PositionRange,
}

impl ObjectNode {
    /// Index of the first keyed member, if any.
    #[must_use]
    pub fn first_keyed_index(&self) -> Option<usize> {
        self.members.iter().position(|m| m.key.is_some())
    }

    /// Looks up a keyed member by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MemberNode> {
        self.members.iter().find(|m| m.key_text() == Some(key))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayNode {
    pub elements: Vec<Node>,
    pub range: PositionRange,
}

/// `~`-prefixed items. An item that failed to parse is an [`ErrorNode`].
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionNode {
    pub items: Vec<Node>,
    pub range: PositionRange,
}

/// A recovered error standing in for the text it replaces.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorNode {
    pub error: Error,
    pub range: PositionRange,
}

/// A block of the document after a `---` separator (or the whole document
/// when there is none).
#[derive(Clone, Debug, PartialEq)]
pub struct SectionNode {
    /// Section name from `--- name` or `--- name: $schema`.
    pub name: Option<String>,
    /// Schema reference from `--- $schema` or `--- name: $schema`.
    pub schema: Option<String>,
    /// `None` for an empty section.
    pub child: Option<Node>,
    pub range: PositionRange,
}

/// The parsed document: an optional header followed by data sections.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DocumentNode {
    pub header: Option<SectionNode>,
    pub sections: Vec<SectionNode>,
    /// Syntax errors recovered at collection-item boundaries.
    pub errors: Vec<Error>,
}
