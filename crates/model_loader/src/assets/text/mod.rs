//! Text front end shared by the model and material formats
//!
//! Lexing, diagnostics, the parse stack and the reduction rules. The two
//! assemblers drive these pieces the same way: reduce until nothing applies,
//! shift one more token, repeat until end of input.

pub mod diagnostics;
pub mod lexer;
pub mod reduce;
pub mod span;
pub mod stack;
pub mod token;

use std::io::{self, BufRead};

pub use diagnostics::{
    CollectingSink, ColorMode, Diagnostic, DiagnosticCounts, DiagnosticSink, Diagnostics, LogSink, NullSink,
    Severity, TextRenderer,
};
pub use lexer::Lexer;
pub use reduce::{Record, Reduction, ReductionEngine, Rule};
pub use span::{Position, SourceSpan};
pub use stack::{Nonterminal, ParseStack, Symbol};
pub use token::{CompositeIndex, Dialect, Keyword, Token, TokenKind, Value};

use token::TokenKind as Kind;

/// Lifecycle of an assembler run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblerState {
    /// Created, nothing read yet
    #[default]
    Idle,
    /// Consuming input
    Running,
    /// End of input reached and the final flush done
    Done,
}

/// Shift the next token, forwarding lexer diagnostics
///
/// Returns `false` without reading once end of input is on the stack.
pub(crate) fn shift<R: BufRead>(
    lexer: &mut Lexer<R>,
    stack: &mut ParseStack,
    diagnostics: &mut Diagnostics<'_>,
) -> io::Result<bool> {
    let at_end = stack
        .unprocessed()
        .any(|symbol| symbol.as_token().is_some_and(|token| token.kind == Kind::Eof));
    if at_end {
        return Ok(false);
    }

    let token = lexer.next()?;
    for diagnostic in lexer.take_diagnostics() {
        diagnostics.emit(diagnostic);
    }
    stack.push(token);
    Ok(true)
}

/// Warn about symbols still on the stack after the final reduction
pub(crate) fn report_residual(stack: &ParseStack, diagnostics: &mut Diagnostics<'_>) {
    let residual: Vec<&Symbol> = stack
        .unprocessed()
        .filter(|symbol| !symbol.as_token().is_some_and(|token| token.kind == Kind::Eof))
        .collect();
    if let Some(first) = residual.first() {
        let span = residual[1..].iter().fold(first.span().clone(), |span, symbol| &span + symbol.span());
        diagnostics.warning(format!("{} unconsumed symbol(s) at end of input", residual.len()), span);
    }
}
