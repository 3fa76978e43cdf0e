//! Incremental lexer for the model and material text formats
//!
//! The lexer is an explicit finite automaton: [`transition`] maps the current
//! [`LexState`] and the next character to a new state and an [`Action`], and
//! [`Lexer::next`] runs that function in a loop until a token is finished.
//! Characters are read one line at a time from any [`BufRead`], so a token's span
//! can carry the full text of the line it came from.
//!
//! Record keywords are only recognised as the first word of a record. After a
//! keyword that takes names (`g`, `o`, `mtllib`, `usemtl`, `newmtl`) every word up to
//! the end of the line is a [`TokenKind::Name`], so `g 12` names a group "12".

use std::io::{self, BufRead};
use std::sync::Arc;

use super::diagnostics::{Diagnostic, Severity};
use super::span::SourceSpan;
use super::token::{CompositeIndex, Dialect, Token, TokenKind, Value};

/// Automaton states; each one is a partially recognised lexeme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    /// Between tokens
    Start,
    /// Inside a `#` comment
    Comment,
    /// Saw a leading `+` or `-`
    Sign,
    /// Integer digits
    Integer,
    /// Saw a `.` with no fraction digits yet
    FractionStart,
    /// Fraction digits
    Fraction,
    /// Saw `e` or `E`
    ExponentStart,
    /// Saw the exponent sign
    ExponentSign,
    /// Exponent digits
    Exponent,
    /// Saw `int/`
    TextureStart,
    /// Saw the texture component's sign
    TextureSign,
    /// Texture component digits
    Texture,
    /// Saw `int/int/` or `int//`
    NormalStart,
    /// Saw the normal component's sign
    NormalSign,
    /// Normal component digits
    Normal,
    /// Keyword or name characters
    Word,
    /// Unrecognisable lexeme, consumed up to whitespace
    Unknown,
}

impl LexState {
    /// States that can be cut short into a valid token
    const fn is_accepting(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Fraction | Self::Exponent | Self::Texture | Self::Normal | Self::Word
        )
    }

    /// States entered while reading a number or a composite index
    const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Sign
                | Self::Integer
                | Self::FractionStart
                | Self::Fraction
                | Self::ExponentStart
                | Self::ExponentSign
                | Self::Exponent
                | Self::TextureStart
                | Self::TextureSign
                | Self::Texture
                | Self::NormalStart
                | Self::NormalSign
                | Self::Normal
        )
    }
}

/// What the driving loop does with the current character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Consume the character, no token in progress
    Skip,
    /// Consume the character as the first one of a token
    Begin,
    /// Consume the character into the current lexeme
    Push,
    /// Finish the current token; the character is left for the next one
    Emit,
    /// Consume a line break and produce a record terminator
    Newline,
    /// End of input
    End,
}

/// How a word at the current position is classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordMode {
    /// First word of a record
    Keyword,
    /// Rest of a record whose keyword takes names
    Name,
    /// Operands of any other record
    Value,
}

const fn is_terminator(ch: Option<char>) -> bool {
    match ch {
        None | Some('#') => true,
        Some(c) => c.is_whitespace(),
    }
}

/// The automaton's transition function
pub fn transition(state: LexState, ch: Option<char>, mode: WordMode) -> (LexState, Action) {
    use LexState as S;

    if state == S::Start {
        return match ch {
            None => (S::Start, Action::End),
            Some('\n') => (S::Start, Action::Newline),
            Some('#') => (S::Comment, Action::Skip),
            Some(c) if c.is_whitespace() => (S::Start, Action::Skip),
            Some(_) if mode == WordMode::Name => (S::Word, Action::Begin),
            Some(c) if c.is_ascii_digit() => (S::Integer, Action::Begin),
            Some('+' | '-') => (S::Sign, Action::Begin),
            Some('.') => (S::FractionStart, Action::Begin),
            Some(c) if c.is_alphabetic() || c == '_' => (S::Word, Action::Begin),
            Some(_) => (S::Unknown, Action::Begin),
        };
    }

    if state == S::Comment {
        return match ch {
            None => (S::Start, Action::End),
            Some('\n') => (S::Start, Action::Newline),
            Some(_) => (S::Comment, Action::Skip),
        };
    }

    let Some(c) = ch.filter(|_| !is_terminator(ch)) else {
        return (state, Action::Emit);
    };

    let next = match (state, c) {
        (S::Word | S::Unknown, _) => state,
        (S::Sign | S::Integer, '0'..='9') => S::Integer,
        (S::Sign, '.') => S::FractionStart,
        (S::Integer, '.') => S::Fraction,
        (S::Integer, '/') => S::TextureStart,
        (S::Integer | S::Fraction, 'e' | 'E') => S::ExponentStart,
        (S::FractionStart | S::Fraction, '0'..='9') => S::Fraction,
        (S::ExponentStart, '+' | '-') => S::ExponentSign,
        (S::ExponentStart | S::ExponentSign | S::Exponent, '0'..='9') => S::Exponent,
        (S::TextureStart, '+' | '-') => S::TextureSign,
        (S::TextureStart, '/') | (S::Texture, '/') => S::NormalStart,
        (S::TextureStart | S::TextureSign | S::Texture, '0'..='9') => S::Texture,
        (S::NormalStart, '+' | '-') => S::NormalSign,
        (S::NormalStart | S::NormalSign | S::Normal, '0'..='9') => S::Normal,
        _ => S::Unknown,
    };
    (next, Action::Push)
}

/// Streaming lexer with a LIFO pushback buffer
pub struct Lexer<R: BufRead> {
    reader: R,
    file: Arc<str>,
    dialect: Dialect,
    line_text: Arc<str>,
    chars: Vec<char>,
    pos: usize,
    line_no: u32,
    at_record_start: bool,
    names_follow: bool,
    pushback: Vec<Token>,
    eof: Option<Token>,
    pending: Vec<Diagnostic>,
}

impl<'a> Lexer<&'a [u8]> {
    /// Lex an in-memory string
    pub fn from_source(source: &'a str, file: impl Into<Arc<str>>, dialect: Dialect) -> Self {
        Self::new(source.as_bytes(), file, dialect)
    }
}

impl<R: BufRead> Lexer<R> {
    /// Create a lexer over a character source
    pub fn new(reader: R, file: impl Into<Arc<str>>, dialect: Dialect) -> Self {
        Self {
            reader,
            file: file.into(),
            dialect,
            line_text: Arc::from(""),
            chars: Vec::new(),
            pos: 0,
            line_no: 0,
            at_record_start: true,
            names_follow: false,
            pushback: Vec::new(),
            eof: None,
            pending: Vec::new(),
        }
    }

    /// File name used in spans
    pub fn file(&self) -> &Arc<str> {
        &self.file
    }

    /// Return a token so the next call to [`Lexer::next`] yields it again
    pub fn push_back(&mut self, token: Token) {
        self.pushback.push(token);
    }

    /// Diagnostics produced while lexing, oldest first
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.pending)
    }

    /// Iterate tokens up to and including the first end-of-input token
    pub fn tokens(&mut self) -> Tokens<'_, R> {
        Tokens { lexer: self, done: false }
    }

    /// Produce the next token
    ///
    /// Once the input is exhausted every call returns an equal end-of-input token.
    /// Only I/O failures on the underlying reader are errors.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> io::Result<Token> {
        if let Some(token) = self.pushback.pop() {
            return Ok(token);
        }
        if let Some(eof) = &self.eof {
            return Ok(eof.clone());
        }

        let mut state = LexState::Start;
        let mut origin = LexState::Start;
        let mut lexeme = String::new();
        let mut start_col = 0;
        let mut end_col = 0;

        loop {
            let ch = self.peek()?;
            let (next, action) = transition(state, ch, self.word_mode());
            match (action, ch) {
                (Action::Skip, _) => self.pos += 1,
                (Action::Begin, Some(c)) => {
                    start_col = self.col();
                    end_col = start_col;
                    origin = next;
                    lexeme.push(c);
                    self.pos += 1;
                }
                (Action::Push, Some(c)) => {
                    end_col = self.col();
                    lexeme.push(c);
                    self.pos += 1;
                }
                (Action::Newline, _) => {
                    let col = self.col();
                    self.pos += 1;
                    self.at_record_start = true;
                    self.names_follow = false;
                    return Ok(Token::new(TokenKind::Newline, self.span(col, col)));
                }
                (Action::Emit, _) => {
                    let span = self.span(start_col, end_col);
                    let token = self.finish(state, origin, lexeme, span);
                    self.at_record_start = false;
                    return Ok(token);
                }
                (Action::End, _) | (Action::Begin | Action::Push, None) => {
                    return Ok(self.end_of_input());
                }
            }
            state = next;
        }
    }

    fn word_mode(&self) -> WordMode {
        if self.at_record_start {
            WordMode::Keyword
        } else if self.names_follow {
            WordMode::Name
        } else {
            WordMode::Value
        }
    }

    fn col(&self) -> u32 {
        u32::try_from(self.pos + 1).unwrap_or(u32::MAX)
    }

    fn span(&self, start_col: u32, end_col: u32) -> SourceSpan {
        SourceSpan::single_line(
            Arc::clone(&self.file),
            self.line_no.max(1),
            start_col,
            end_col,
            Arc::clone(&self.line_text),
        )
    }

    /// Look at the next character, loading the next line when needed
    fn peek(&mut self) -> io::Result<Option<char>> {
        if self.pos >= self.chars.len() {
            let mut raw = String::new();
            if self.reader.read_line(&mut raw)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            self.chars = raw.chars().collect();
            self.pos = 0;
            self.line_text = Arc::from(raw.trim_end_matches(['\n', '\r']));
        }
        Ok(self.chars.get(self.pos).copied())
    }

    fn end_of_input(&mut self) -> Token {
        let col = u32::try_from(self.line_text.chars().count() + 1).unwrap_or(u32::MAX);
        let token = Token::new(TokenKind::Eof, self.span(col, col));
        self.eof = Some(token.clone());
        token
    }

    fn finish(&mut self, state: LexState, origin: LexState, lexeme: String, span: SourceSpan) -> Token {
        if !state.is_accepting() {
            let message = if origin.is_numeric() {
                format!("malformed numeric literal `{lexeme}`")
            } else {
                format!("unrecognised token `{lexeme}`")
            };
            return self.invalid(message, lexeme, span);
        }

        match state {
            LexState::Word => self.word(lexeme, span),
            LexState::Integer => match parse_integer(&lexeme) {
                Some(value) => Token::with_value(TokenKind::Integer, value, span),
                None => self.invalid(format!("integer literal `{lexeme}` is out of range"), lexeme, span),
            },
            LexState::Fraction | LexState::Exponent => match lexeme.parse::<f64>() {
                Ok(value) => Token::with_value(TokenKind::Float, Value::Float(value), span),
                Err(_) => self.invalid(format!("malformed numeric literal `{lexeme}`"), lexeme, span),
            },
            _ => match parse_composite(&lexeme) {
                Some(index) => Token::with_value(TokenKind::Index, Value::Index(index), span),
                None => self.invalid(format!("composite index `{lexeme}` is out of range"), lexeme, span),
            },
        }
    }

    fn word(&mut self, lexeme: String, span: SourceSpan) -> Token {
        if self.word_mode() != WordMode::Keyword {
            return Token::with_value(TokenKind::Name, Value::Text(lexeme), span);
        }
        self.names_follow = true;
        match self.dialect.keyword(&lexeme) {
            Some(keyword) => {
                self.names_follow = keyword.takes_names();
                Token::with_value(TokenKind::Keyword(keyword), Value::Text(lexeme), span)
            }
            None => Token::with_value(TokenKind::Statement, Value::Text(lexeme), span),
        }
    }

    fn invalid(&mut self, message: String, lexeme: String, span: SourceSpan) -> Token {
        self.pending.push(Diagnostic::new(Severity::Error, message, span.clone()));
        Token::with_value(TokenKind::Invalid, Value::Text(lexeme), span)
    }
}

fn parse_integer(lexeme: &str) -> Option<Value> {
    if lexeme.starts_with(['+', '-']) {
        lexeme.parse::<i64>().ok().map(Value::Int)
    } else {
        lexeme.parse::<u64>().ok().map(Value::UInt)
    }
}

/// Split `v/t`, `v//n` or `v/t/n` into its components; the slash count picks the variant
fn parse_composite(lexeme: &str) -> Option<CompositeIndex> {
    let mut parts = lexeme.split('/');
    let vertex = parts.next()?.parse::<i64>().ok()?;
    let texture = match parts.next()? {
        "" => None,
        text => Some(text.parse::<i64>().ok()?),
    };
    let normal = match parts.next() {
        None => None,
        Some(text) => Some(text.parse::<i64>().ok()?),
    };
    if parts.next().is_some() || (texture.is_none() && normal.is_none()) {
        return None;
    }
    Some(CompositeIndex { vertex, texture, normal })
}

/// Iterator over a lexer's tokens, ending after the first end-of-input token
pub struct Tokens<'a, R: BufRead> {
    lexer: &'a mut Lexer<R>,
    done: bool,
}

impl<R: BufRead> Iterator for Tokens<'_, R> {
    type Item = io::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.lexer.next();
        if matches!(&token, Ok(t) if t.kind == TokenKind::Eof) || token.is_err() {
            self.done = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::text::token::Keyword;

    fn lex(source: &str, dialect: Dialect) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut lexer = Lexer::from_source(source, "test.obj", dialect);
        let tokens = lexer.tokens().collect::<io::Result<Vec<_>>>().unwrap();
        (tokens, lexer.take_diagnostics())
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source, Dialect::Model).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_vertex_record() {
        let (tokens, diagnostics) = lex("v 1.0 -2 3e2\n", Dialect::Model);
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Vertex));
        assert_eq!(tokens[1].value, Some(Value::Float(1.0)));
        assert_eq!(tokens[2].value, Some(Value::Int(-2)));
        assert_eq!(tokens[3].value, Some(Value::Float(300.0)));
        assert_eq!(tokens[4].kind, TokenKind::Newline);
        assert_eq!(tokens[5].kind, TokenKind::Eof);
    }

    #[test]
    fn test_composite_index_variants() {
        let (tokens, diagnostics) = lex("f 1 2/3 4//5 6/7/8", Dialect::Model);
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[1].kind, TokenKind::Integer);
        assert_eq!(tokens[1].value, Some(Value::UInt(1)));
        assert_eq!(
            tokens[2].value,
            Some(Value::Index(CompositeIndex { vertex: 2, texture: Some(3), normal: None }))
        );
        assert_eq!(
            tokens[3].value,
            Some(Value::Index(CompositeIndex { vertex: 4, texture: None, normal: Some(5) }))
        );
        assert_eq!(
            tokens[4].value,
            Some(Value::Index(CompositeIndex { vertex: 6, texture: Some(7), normal: Some(8) }))
        );
    }

    #[test]
    fn test_negative_composite_keeps_sign() {
        let (tokens, _) = lex("f -1/-1/-1", Dialect::Model);
        assert_eq!(
            tokens[1].value,
            Some(Value::Index(CompositeIndex { vertex: -1, texture: Some(-1), normal: Some(-1) }))
        );
    }

    #[test]
    fn test_idempotent_eof() {
        let mut lexer = Lexer::from_source("v 1 2 3", "t.obj", Dialect::Model);
        while lexer.next().unwrap().kind != TokenKind::Eof {}
        let first = lexer.next().unwrap();
        let second = lexer.next().unwrap();
        assert_eq!(first.kind, TokenKind::Eof);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input_is_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_pushback_round_trip() {
        let mut lexer = Lexer::from_source("g cube\nv 1 2 3\n", "t.obj", Dialect::Model);
        let first = lexer.next().unwrap();
        let second = lexer.next().unwrap();
        lexer.push_back(second.clone());
        lexer.push_back(first.clone());
        assert_eq!(lexer.next().unwrap(), first);
        assert_eq!(lexer.next().unwrap(), second);
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Newline);
    }

    #[test]
    fn test_names_after_group_keyword() {
        let (tokens, _) = lex("g 12 left-arm\n", Dialect::Model);
        assert_eq!(tokens[1].kind, TokenKind::Name);
        assert_eq!(tokens[1].as_text(), Some("12"));
        assert_eq!(tokens[2].as_text(), Some("left-arm"));
    }

    #[test]
    fn test_keyword_only_at_record_start() {
        let (tokens, _) = lex("s off\n", Dialect::Model);
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Smoothing));
        assert_eq!(tokens[1].kind, TokenKind::Name);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("# header\nv 1 2 3 # trailing\n"),
            vec![
                TokenKind::Newline,
                TokenKind::Keyword(Keyword::Vertex),
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_statement() {
        let (tokens, diagnostics) = lex("Ns 250.0\n", Dialect::Material);
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Statement);
        assert_eq!(tokens[1].kind, TokenKind::Name);
    }

    #[test]
    fn test_malformed_number_reports_once() {
        let (tokens, diagnostics) = lex("v 1.0 2.x 3\n", Dialect::Model);
        assert_eq!(tokens[2].kind, TokenKind::Invalid);
        assert_eq!(tokens[3].kind, TokenKind::Integer);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("malformed numeric literal `2.x`"));
        let span = diagnostics[0].span.as_ref().unwrap();
        assert_eq!((span.start().col, span.end().col), (7, 9));
    }

    #[test]
    fn test_dangling_exponent_and_slash() {
        let (tokens, diagnostics) = lex("v 1e 3/\n", Dialect::Model);
        assert_eq!(tokens[1].kind, TokenKind::Invalid);
        assert_eq!(tokens[2].kind, TokenKind::Invalid);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_unrecognised_token() {
        let (tokens, diagnostics) = lex("v 1 @@ 2\n", Dialect::Model);
        assert_eq!(tokens[2].kind, TokenKind::Invalid);
        assert!(diagnostics[0].message.starts_with("unrecognised token"));
    }

    #[test]
    fn test_spans_track_lines_and_columns() {
        let (tokens, _) = lex("v 1 2 3\n  vn 0.5 1 0\n", Dialect::Model);
        let normal = &tokens[5];
        assert_eq!(normal.kind, TokenKind::Keyword(Keyword::Normal));
        assert_eq!(normal.span.start().line, 2);
        assert_eq!(normal.span.start().col, 3);
        assert_eq!(normal.span.end().col, 4);
        assert_eq!(&*normal.span.lines()[0], "  vn 0.5 1 0");
    }

    #[test]
    fn test_crlf_line_endings() {
        let (tokens, diagnostics) = lex("v 1 2 3\r\nf 1 2 3\r\n", Dialect::Model);
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[4].kind, TokenKind::Newline);
        assert_eq!(&*tokens[0].span.lines()[0], "v 1 2 3");
    }

    #[test]
    fn test_transition_is_total_for_numbers() {
        assert_eq!(
            transition(LexState::Integer, Some('/'), WordMode::Value),
            (LexState::TextureStart, Action::Push)
        );
        assert_eq!(
            transition(LexState::TextureStart, Some('/'), WordMode::Value),
            (LexState::NormalStart, Action::Push)
        );
        assert_eq!(
            transition(LexState::Fraction, Some(' '), WordMode::Value),
            (LexState::Fraction, Action::Emit)
        );
        assert_eq!(
            transition(LexState::Exponent, Some('x'), WordMode::Value),
            (LexState::Unknown, Action::Push)
        );
    }
}
