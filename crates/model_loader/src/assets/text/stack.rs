//! Parse stack shared by the assemblers and the reduction engine

use std::collections::VecDeque;

use super::reduce::Record;
use super::span::SourceSpan;
use super::token::Token;

/// A record recognised by a reduction, waiting to be applied
#[derive(Debug, Clone, PartialEq)]
pub struct Nonterminal {
    /// The derived value
    pub record: Record,
    /// Source range the record was reduced from
    pub span: SourceSpan,
}

/// Stack entry: a raw token or a derived value
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// Shifted token
    Terminal(Token),
    /// Result of a reduction
    Nonterminal(Nonterminal),
}

impl Symbol {
    /// Source location of the entry
    pub const fn span(&self) -> &SourceSpan {
        match self {
            Self::Terminal(token) => &token.span,
            Self::Nonterminal(nonterminal) => &nonterminal.span,
        }
    }

    /// The token, if this is a terminal
    pub const fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Terminal(token) => Some(token),
            Self::Nonterminal(_) => None,
        }
    }
}

/// Double-ended symbol sequence with a processing cursor
///
/// Everything below the cursor has been reduced and is waiting to be taken by the
/// assembler; everything from the cursor up is an unreduced suffix. Offsets taken
/// by [`ParseStack::peek_from_bottom`] and the truncation methods are relative to
/// the cursor.
#[derive(Debug, Default, Clone)]
pub struct ParseStack {
    symbols: VecDeque<Symbol>,
    cursor: usize,
}

impl ParseStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift a token on top
    pub fn push(&mut self, token: Token) {
        self.symbols.push_back(Symbol::Terminal(token));
    }

    /// Number of entries, processed or not
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the stack holds nothing
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of unreduced entries
    pub fn unprocessed_len(&self) -> usize {
        self.symbols.len() - self.cursor
    }

    /// Entry `offset` places above the bottom-most unprocessed one
    pub fn peek_from_bottom(&self, offset: usize) -> Option<&Symbol> {
        self.symbols.get(self.cursor + offset)
    }

    /// Token `offset` places above the bottom-most unprocessed one
    pub fn token_at(&self, offset: usize) -> Option<&Token> {
        self.peek_from_bottom(offset).and_then(Symbol::as_token)
    }

    /// Unreduced entries from the bottom up
    pub fn unprocessed(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().skip(self.cursor)
    }

    /// Drop every unprocessed entry before `end`, keeping `end` and above
    pub fn truncate_from_bottom(&mut self, end: usize) {
        let end = (self.cursor + end).min(self.symbols.len());
        self.symbols.drain(self.cursor..end);
    }

    /// Drop every entry at `start` and above
    pub fn truncate_from_top(&mut self, start: usize) {
        self.symbols.truncate(self.cursor + start);
    }

    /// Replace the unprocessed entries before `end` with a reduced record
    pub fn reduce_to(&mut self, end: usize, nonterminal: Nonterminal) {
        self.truncate_from_bottom(end);
        self.symbols.insert(self.cursor, Symbol::Nonterminal(nonterminal));
        self.cursor += 1;
    }

    /// Remove and return every reduced record, oldest first
    pub fn take_processed(&mut self) -> Vec<Nonterminal> {
        let processed = self
            .symbols
            .drain(..self.cursor)
            .filter_map(|symbol| match symbol {
                Symbol::Nonterminal(nonterminal) => Some(nonterminal),
                Symbol::Terminal(_) => None,
            })
            .collect();
        self.cursor = 0;
        processed
    }

    /// Merged span of the unprocessed entries before `end`
    pub fn span_until(&self, end: usize) -> Option<SourceSpan> {
        let mut symbols = self.unprocessed().take(end.max(1));
        let first = symbols.next()?.span().clone();
        Some(symbols.fold(first, |span, symbol| &span + symbol.span()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::text::token::{TokenKind, Value};
    use std::sync::Arc;

    fn token(kind: TokenKind, col: u32) -> Token {
        let span = SourceSpan::single_line(Arc::from("t.obj"), 1, col, col, Arc::from("g a b c"));
        Token::new(kind, span)
    }

    fn filled() -> ParseStack {
        let mut stack = ParseStack::new();
        for col in 1..=4 {
            stack.push(token(TokenKind::Name, col));
        }
        stack
    }

    #[test]
    fn test_truncate_from_bottom_keeps_disqualifier() {
        let mut stack = filled();
        stack.truncate_from_bottom(2);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.token_at(0).unwrap().span.start().col, 3);
    }

    #[test]
    fn test_truncate_from_top() {
        let mut stack = filled();
        stack.truncate_from_top(1);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.token_at(0).unwrap().span.start().col, 1);
    }

    #[test]
    fn test_reduce_moves_cursor() {
        let mut stack = filled();
        let span = stack.span_until(2).unwrap();
        assert_eq!((span.start().col, span.end().col), (1, 2));

        stack.reduce_to(2, Nonterminal { record: Record::Group("a".into()), span });
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.unprocessed_len(), 2);
        assert_eq!(stack.token_at(0).unwrap().span.start().col, 3);

        let processed = stack.take_processed();
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].record, Record::Group("a".into()));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.unprocessed_len(), 2);
    }

    #[test]
    fn test_peek_past_end() {
        let mut stack = ParseStack::new();
        assert!(stack.peek_from_bottom(0).is_none());
        stack.push(Token::with_value(TokenKind::Integer, Value::UInt(1), token(TokenKind::Integer, 1).span));
        assert!(stack.peek_from_bottom(1).is_none());
        assert!(stack.peek_from_bottom(0).is_some());
    }
}
