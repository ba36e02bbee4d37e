//! Recursive-descent parser: token stream to [`DocumentNode`].
//!
//! ## Recovery
//!
//! The synchronization boundaries are the collection-item marker `~`, the
//! section separator `---`, and end of input. A syntax error inside a
//! collection item becomes an [`ErrorNode`] for that item; the parser then
//! skips to the next boundary and carries on, so one malformed item never
//! discards its siblings. Any other error in a section (or in the header)
//! turns the whole section into an [`ErrorNode`] and parsing resumes at the
//! next `---`. Only when no separator follows is the error returned as
//! fatal.
//!
//! When an object or array is not closed, the error span runs from the
//! opening bracket to the last token consumed before the next boundary.
//!
//! ## Members
//!
//! Members are positional (`value`) or keyed (`key: value`). Once a keyed
//! member appears, every later member of the same object must be keyed.
//!
//! ```rust
//! use internet_object::parser::parse_document;
//! use internet_object::ParseOptions;
//!
//! let doc = parse_document("~ a, b\n~ {c\n~ d", &ParseOptions::default()).unwrap();
//! assert_eq!(doc.errors.len(), 1);
//! ```

use crate::ast::{
    ArrayNode, CollectionNode, DocumentNode, ErrorNode, MemberNode, Node, ObjectNode,
    SectionNode, TokenNode,
};
use crate::error_range;
use crate::options::ParseOptions;
use crate::position::{Position, PositionRange};
use crate::token::{Token, TokenKind};
use crate::tokenizer::tokenize;
use crate::{Error, ErrorCode, Result};

/// Tokenizes and parses `input`.
///
/// # Errors
///
/// Returns the tokenizer's fatal error, or a syntax error with no later
/// boundary to resume at.
pub fn parse_document(input: &str, options: &ParseOptions) -> Result<DocumentNode> {
    let tokens = tokenize(input)?;
    Parser::new(tokens, options).parse_document()
}

/// Parses a single value (used for schema definitions and header values).
///
/// The text is read as one implicit object; a lone braced object or array is
/// returned unwrapped.
pub fn parse_value(input: &str, options: &ParseOptions) -> Result<Node> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens, options);
    let node = parser.parse_top_object()?;
    match parser.peek() {
        None => Ok(node),
        Some(token) => Err(unexpected(token)),
    }
}

/// Parser over an owned token vector.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    max_depth: usize,
    strict: bool,
    errors: Vec<Error>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, options: &ParseOptions) -> Self {
        Parser {
            tokens,
            current: 0,
            depth: 0,
            max_depth: options.max_depth,
            strict: options.strict,
            errors: Vec::new(),
        }
    }

    /// Parses the whole token stream.
    ///
    /// With at least one `---`, everything before the first separator is the
    /// header. Without one the whole input is a single unnamed section.
    pub fn parse_document(mut self) -> Result<DocumentNode> {
        let mut doc = DocumentNode::default();
        let has_separator = self.tokens.iter().any(|t| t.is(TokenKind::SectionSep));

        if !has_separator {
            if !self.at_end() {
                doc.sections.push(self.parse_section_body(None, None, None)?);
            }
        } else {
            if !self.at(TokenKind::SectionSep) {
                doc.header = Some(self.parse_section_body(None, None, None)?);
            }
            while self.at(TokenKind::SectionSep) {
                let sep = self.advance_cloned();
                let (name, schema) = self.parse_section_header(&sep)?;
                doc.sections
                    .push(self.parse_section_body(name, schema, Some(&sep))?);
            }
        }

        tracing::debug!(
            sections = doc.sections.len(),
            header = doc.header.is_some(),
            recovered = self.errors.len(),
            "parsed document"
        );
        doc.errors = self.errors;
        Ok(doc)
    }

    // --- cursor helpers -------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().map_or(false, |t| t.kind == kind)
    }

    fn at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    /// At `~`, `---` or end of input.
    fn at_boundary(&self) -> bool {
        self.peek().map_or(true, |t| t.kind.is_boundary())
    }

    fn advance_cloned(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        self.current += 1;
        token
    }

    fn last_consumed(&self) -> Option<&Token> {
        self.current.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    /// End of the last consumed token, or the start of input.
    fn scan_position(&self) -> Position {
        self.last_consumed()
            .map_or_else(Position::start, |t| t.range.end)
    }

    fn enter(&mut self, opener: &Token) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::syntax(
                ErrorCode::MaxDepthExceeded,
                format!("nesting exceeds the maximum depth of {}", self.max_depth),
                error_range::token_range(opener),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Skips to the next `~`, `---` or end of input.
    fn synchronize(&mut self) {
        while !self.at_boundary() {
            self.current += 1;
        }
        self.depth = 0;
    }

    // --- sections -------------------------------------------------------

    /// Reads `name`, `$schema` or `name: $schema` on the separator's row.
    fn parse_section_header(&mut self, sep: &Token) -> Result<(Option<String>, Option<String>)> {
        let row = sep.range.end.row;
        let on_row = |t: &Token| t.range.start.row == row;

        let Some(first) = self.peek().filter(|t| on_row(t)).cloned() else {
            return Ok((None, None));
        };

        match first.kind {
            TokenKind::SchemaRef => {
                self.current += 1;
                let schema = first.text().unwrap_or_default().to_string();
                let name = schema.trim_start_matches('$').to_string();
                Ok((Some(name), Some(schema)))
            }
            TokenKind::String => {
                let colon_follows = self
                    .peek_at(1)
                    .map_or(false, |t| t.kind == TokenKind::Colon && on_row(t));
                let comma_follows = self
                    .peek_at(1)
                    .map_or(false, |t| t.kind == TokenKind::Comma && on_row(t));
                if comma_follows {
                    // Data starts on the separator line.
                    return Ok((None, None));
                }
                self.current += 1;
                let name = first.text().unwrap_or_default().to_string();
                if !colon_follows {
                    return Ok((Some(name), None));
                }
                self.current += 1;
                match self.peek().filter(|t| on_row(t)).cloned() {
                    Some(t) if t.kind == TokenKind::SchemaRef => {
                        self.current += 1;
                        Ok((Some(name), t.text().map(str::to_string)))
                    }
                    Some(t) => Err(Error::syntax(
                        ErrorCode::UnexpectedToken,
                        format!("expected a schema reference after section name, found {}", t.kind),
                        t.range,
                    )),
                    None => Err(Error::syntax(
                        ErrorCode::UnexpectedEndOfInput,
                        "expected a schema reference after section name",
                        PositionRange::point(self.scan_position()),
                    )),
                }
            }
            _ => Ok((None, None)),
        }
    }

    fn parse_section_body(
        &mut self,
        name: Option<String>,
        schema: Option<String>,
        sep: Option<&Token>,
    ) -> Result<SectionNode> {
        let start = sep
            .map(|t| t.range.start)
            .or_else(|| self.peek().map(|t| t.range.start))
            .unwrap_or_else(|| self.scan_position());

        let child = match self.parse_section_child() {
            Ok(child) => child,
            Err(err) => Some(self.recover_section(start, err)?),
        };

        let end = self.scan_position().max_pos(start);
        Ok(SectionNode {
            name,
            schema,
            child,
            range: error_range::between(start, end),
        })
    }

    fn parse_section_child(&mut self) -> Result<Option<Node>> {
        let child = if self.at_end() || self.at(TokenKind::SectionSep) {
            None
        } else if self.at(TokenKind::Tilde) {
            Some(Node::Collection(self.parse_collection()?))
        } else {
            Some(self.parse_top_object()?)
        };

        // A collection always runs to a separator; an implicit object stops
        // early only at a stray `~`.
        match self.peek() {
            Some(token) if token.kind != TokenKind::SectionSep => Err(unexpected(token)),
            _ => Ok(child),
        }
    }

    /// Records a section-level error and resumes at the next `---`. Without
    /// a later separator there is nowhere to resume and `err` is returned.
    fn recover_section(&mut self, start: Position, err: Error) -> Result<Node> {
        let resumable = self
            .tokens
            .iter()
            .skip(self.current)
            .any(|t| t.is(TokenKind::SectionSep));
        if self.strict || !resumable {
            return Err(err);
        }
        while !self.at(TokenKind::SectionSep) {
            self.current += 1;
        }
        self.depth = 0;
        let range = error_range::between(start, self.scan_position().max_pos(start));
        tracing::debug!(code = %err.code(), at = %range, "recovered section");
        self.errors.push(err.clone());
        Ok(Node::Error(ErrorNode { error: err, range }))
    }

    fn parse_collection(&mut self) -> Result<CollectionNode> {
        let start = self.peek().map_or_else(|| self.scan_position(), |t| t.range.start);
        let mut items = Vec::new();

        while self.at(TokenKind::Tilde) {
            let tilde = self.advance_cloned();
            match self.parse_top_object() {
                Ok(node) => items.push(node),
                Err(err) => items.push(self.recover(&tilde, err)?),
            }
        }

        Ok(CollectionNode {
            items,
            range: error_range::between(start, self.scan_position().max_pos(start)),
        })
    }

    /// Records `err` for the item started by `tilde` and resumes at the next
    /// boundary.
    fn recover(&mut self, tilde: &Token, err: Error) -> Result<Node> {
        if self.strict {
            return Err(err);
        }
        self.synchronize();
        let range = match self.last_consumed() {
            Some(last) => error_range::token_to_token(tilde, last),
            None => error_range::token_range(tilde),
        };
        tracing::debug!(code = %err.code(), at = %range, "recovered collection item");
        self.errors.push(err.clone());
        Ok(Node::Error(ErrorNode { error: err, range }))
    }

    // --- objects, members, arrays ---------------------------------------

    /// Parses the braceless object of a section or collection item. A lone
    /// positional `{…}` or `[…]` member is returned unwrapped.
    fn parse_top_object(&mut self) -> Result<Node> {
        let start = self.peek().map_or_else(|| self.scan_position(), |t| t.range.start);
        let mut members = self.parse_members(false)?;
        let end = self.scan_position().max_pos(start);

        let lone_container = members.len() == 1
            && members[0].key.is_none()
            && matches!(members[0].value, Some(Node::Object(_) | Node::Array(_)));
        if lone_container {
            if let Some(value) = members.pop().and_then(|m| m.value) {
                return Ok(value);
            }
        }

        Ok(Node::Object(ObjectNode {
            members,
            range: error_range::between(start, end),
        }))
    }

    fn at_members_end(&self, braced: bool) -> bool {
        self.at_boundary() || (braced && self.at(TokenKind::CurlyClose))
    }

    fn parse_members(&mut self, braced: bool) -> Result<Vec<MemberNode>> {
        let mut members = Vec::new();
        if self.at_members_end(braced) {
            return Ok(members);
        }

        let mut seen_keyed = false;
        loop {
            let member = self.parse_member(braced)?;
            if member.key.is_some() {
                seen_keyed = true;
                members.push(member);
            } else if seen_keyed {
                if member.value.is_some() {
                    return Err(Error::syntax(
                        ErrorCode::PositionalMemberAfterKeywordMember,
                        "positional member cannot follow a keyed member",
                        member.range,
                    ));
                }
            } else {
                members.push(member);
            }

            if self.at(TokenKind::Comma) {
                self.current += 1;
                continue;
            }
            if self.at_members_end(braced) {
                break;
            }
            if let Some(token) = self.peek() {
                return Err(unexpected(token));
            }
        }
        Ok(members)
    }

    fn parse_member(&mut self, braced: bool) -> Result<MemberNode> {
        if self.at(TokenKind::Comma) || self.at_members_end(braced) {
            let at = self
                .peek()
                .map_or_else(|| self.scan_position(), |t| t.range.start);
            return Ok(MemberNode {
                key: None,
                value: None,
                range: PositionRange::point(at),
            });
        }

        let keyed = self
            .peek_at(1)
            .map_or(false, |t| t.kind == TokenKind::Colon);
        if !keyed {
            let value = self.parse_value()?;
            return Ok(MemberNode {
                key: None,
                range: value.range(),
                value: Some(value),
            });
        }

        let key = self.advance_cloned();
        match key.kind {
            TokenKind::Invalid(_) => {
                return Err(Error::syntax(
                    ErrorCode::InvalidKey,
                    format!("'{}' cannot be used as a key", key.raw),
                    key.range,
                ))
            }
            kind if kind.is_scalar() => {}
            _ => return Err(unexpected(&key)),
        }
        self.current += 1; // ':'

        if self.at(TokenKind::Comma) || self.at_members_end(braced) {
            let range = error_range::between(key.range.start, self.scan_position());
            return Ok(MemberNode {
                key: Some(key),
                value: None,
                range,
            });
        }

        let value = self.parse_value()?;
        let range = error_range::between(key.range.start, value.range().end);
        Ok(MemberNode {
            key: Some(key),
            value: Some(value),
            range,
        })
    }

    fn parse_value(&mut self) -> Result<Node> {
        let Some(token) = self.peek() else {
            return Err(Error::syntax(
                ErrorCode::UnexpectedEndOfInput,
                "expected a value",
                PositionRange::point(self.scan_position()),
            ));
        };

        match token.kind {
            TokenKind::CurlyOpen => self.parse_braced_object(),
            TokenKind::BracketOpen => self.parse_array(),
            TokenKind::Invalid(code) => Err(Error::syntax(
                code,
                format!("invalid literal {}", token.raw),
                token.range,
            )),
            kind if kind.is_scalar() => Ok(Node::Token(TokenNode {
                token: self.advance_cloned(),
            })),
            _ => Err(unexpected(token)),
        }
    }

    fn parse_braced_object(&mut self) -> Result<Node> {
        let open = self.advance_cloned();
        self.enter(&open)?;
        let members = self.parse_members(true)?;

        if self.at(TokenKind::CurlyClose) {
            let close = self.advance_cloned();
            self.leave();
            return Ok(Node::Object(ObjectNode {
                members,
                range: error_range::token_to_token(&open, &close),
            }));
        }
        Err(self.unclosed(&open, "}"))
    }

    fn parse_array(&mut self) -> Result<Node> {
        let open = self.advance_cloned();
        self.enter(&open)?;
        let mut elements = Vec::new();

        loop {
            if self.at(TokenKind::BracketClose) || self.at_boundary() {
                break;
            }
            if let Some(comma) = self.peek().filter(|t| t.kind == TokenKind::Comma) {
                return Err(Error::syntax(
                    ErrorCode::EmptyArrayElement,
                    "array elements cannot be empty",
                    comma.range,
                ));
            }
            elements.push(self.parse_value()?);

            if self.at(TokenKind::Comma) {
                self.current += 1;
                continue;
            }
            if self.at(TokenKind::BracketClose) || self.at_boundary() {
                break;
            }
            if let Some(token) = self.peek() {
                return Err(unexpected(token));
            }
        }

        if self.at(TokenKind::BracketClose) {
            let close = self.advance_cloned();
            self.leave();
            return Ok(Node::Array(ArrayNode {
                elements,
                range: error_range::token_to_token(&open, &close),
            }));
        }
        Err(self.unclosed(&open, "]"))
    }

    /// `expectingBracket` spanning the opener to the last token consumed
    /// before the boundary the parser stopped at.
    fn unclosed(&self, open: &Token, closer: &str) -> Error {
        let range = if self.at_end() {
            error_range::unclosed(open, self.scan_position())
        } else {
            match self.last_consumed() {
                Some(last) => error_range::token_to_token(open, last),
                None => error_range::token_range(open),
            }
        };
        Error::syntax(
            ErrorCode::ExpectingBracket,
            format!("expecting '{}' to close {}", closer, open.raw),
            range,
        )
    }
}

fn unexpected(token: &Token) -> Error {
    Error::syntax(
        ErrorCode::UnexpectedToken,
        format!("unexpected {} '{}'", token.kind, token.raw),
        token.range,
    )
}

trait MaxPos {
    fn max_pos(self, other: Position) -> Position;
}

impl MaxPos for Position {
    /// Guards zero-width ranges where nothing was consumed after `other`.
    fn max_pos(self, other: Position) -> Position {
        if self.pos < other.pos {
            other
        } else {
            self
        }
    }
}
