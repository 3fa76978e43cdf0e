//! Diagnostics reporting
//!
//! Parsing never stops on a malformed record. Problems are reported as
//! [`Diagnostic`]s through a [`Diagnostics`] accumulator, which counts them per
//! severity and forwards them to an injected [`DiagnosticSink`]. Callers must look
//! at the counts (or the collected log) rather than only the `Result` of a load.
//!
//! The rendered text shape is stable:
//!
//! ```text
//! cube.obj:4:3: error: face mixes corner shapes
//! 4 | f 1 2/1 3
//!
//! ```

use std::fmt;
use std::io::{self, IsTerminal, Write};

use crossterm::style::{Color, Stylize};
use serde::{Deserialize, Serialize};

use super::span::SourceSpan;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Context only, never halts anything
    Note,
    /// Recoverable, the result is still complete
    Warning,
    /// One record was dropped
    Error,
    /// The whole run was aborted
    Fatal,
}

impl Severity {
    /// Lowercase label used in rendered output
    pub const fn label(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    const fn color(self) -> Color {
        match self {
            Self::Note => Color::Cyan,
            Self::Warning => Color::Yellow,
            Self::Error | Self::Fatal => Color::Red,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Human readable message
    pub message: String,
    /// Where it happened, if anywhere in particular
    pub span: Option<SourceSpan>,
}

impl Diagnostic {
    /// Create a diagnostic pointing at a span
    pub fn new(severity: Severity, message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            severity,
            message: message.into(),
            span: Some(span),
        }
    }

    /// Create a diagnostic with no source location
    pub fn detached(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            span: None,
        }
    }

    /// Render the diagnostic in plain text
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = render_to(&mut out, self, false);
        String::from_utf8_lossy(&out).into_owned()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(f, "{}: {}: {}", span, self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Write a diagnostic in the header + numbered source lines shape
pub fn render_to<W: Write>(out: &mut W, diagnostic: &Diagnostic, color: bool) -> io::Result<()> {
    let severity = diagnostic.severity;
    let Some(span) = &diagnostic.span else {
        if color {
            writeln!(
                out,
                "{}: {}",
                severity.label().with(severity.color()).bold(),
                diagnostic.message
            )?;
        } else {
            writeln!(out, "{}: {}", severity, diagnostic.message)?;
        }
        return writeln!(out);
    };

    let start = span.start();
    let end = span.end();
    if color {
        writeln!(
            out,
            "{}:{}:{}: {}: {}",
            span.file(),
            start.line,
            start.col,
            severity.label().with(severity.color()).bold(),
            diagnostic.message.as_str().bold()
        )?;
    } else {
        writeln!(
            out,
            "{}:{}:{}: {}: {}",
            span.file(),
            start.line,
            start.col,
            severity,
            diagnostic.message
        )?;
    }

    let width = end.line.to_string().len();
    for (number, text) in span.numbered_lines() {
        if text.is_empty() {
            continue;
        }
        let text = text.trim_end_matches(['\n', '\r']);
        if !color {
            writeln!(out, "{number:>width$} | {text}")?;
            continue;
        }

        let first = if number == start.line { start.col as usize } else { 1 };
        let last = if number == end.line { end.col as usize } else { usize::MAX };
        write!(out, "{} ", format!("{number:>width$} |").with(Color::DarkGrey))?;
        for (index, ch) in text.chars().enumerate() {
            let col = index + 1;
            if col >= first && col <= last {
                write!(out, "{}", ch.with(severity.color()).bold())?;
            } else {
                write!(out, "{ch}")?;
            }
        }
        writeln!(out)?;
    }
    writeln!(out)
}

/// Receiver of diagnostics, injected into the assemblers
pub trait DiagnosticSink {
    /// Handle one diagnostic
    fn emit(&mut self, diagnostic: &Diagnostic);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _diagnostic: &Diagnostic) {}
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything collected so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics of one severity
    pub fn of_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }

    /// Render everything collected in plain text
    pub fn render_all(&self) -> String {
        self.diagnostics.iter().map(Diagnostic::render).collect()
    }

    /// Take the collected diagnostics, leaving the sink empty
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

/// Forwards diagnostics to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Note => log::debug!("{diagnostic}"),
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Error | Severity::Fatal => log::error!("{diagnostic}"),
        }
    }
}

/// Renders diagnostics as text to a writer
///
/// The plain strategy is the default. [`TextRenderer::colored`] highlights the
/// severity and the offending columns using terminal colors.
pub struct TextRenderer<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> TextRenderer<W> {
    /// Plain text renderer
    pub const fn plain(out: W) -> Self {
        Self { out, color: false }
    }

    /// Colored renderer
    pub const fn colored(out: W) -> Self {
        Self { out, color: true }
    }

    /// Whether this renderer emits color
    pub const fn is_colored(&self) -> bool {
        self.color
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TextRenderer<io::Stderr> {
    /// Renderer on stderr, colored only if stderr is a terminal and `mode` allows it
    pub fn stderr(mode: ColorMode) -> Self {
        let stderr = io::stderr();
        let color = mode.enabled_for(stderr.is_terminal());
        Self { out: stderr, color }
    }
}

impl<W: Write> DiagnosticSink for TextRenderer<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        if let Err(err) = render_to(&mut self.out, diagnostic, self.color) {
            log::warn!("Failed to write diagnostic: {err}");
        }
    }
}

/// Whether rendered diagnostics use color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when writing to a terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl ColorMode {
    /// Resolve the mode against a terminal probe result
    pub const fn enabled_for(self, is_terminal: bool) -> bool {
        match self {
            Self::Auto => is_terminal,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Per-severity counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticCounts {
    /// Notes emitted
    pub notes: usize,
    /// Warnings emitted
    pub warnings: usize,
    /// Errors emitted
    pub errors: usize,
    /// Fatal diagnostics emitted
    pub fatal: usize,
}

impl DiagnosticCounts {
    /// Count for one severity
    pub const fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Note => self.notes,
            Severity::Warning => self.warnings,
            Severity::Error => self.errors,
            Severity::Fatal => self.fatal,
        }
    }

    fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Note => self.notes += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
            Severity::Fatal => self.fatal += 1,
        }
    }
}

/// Accumulates diagnostic counts and forwards to a sink
pub struct Diagnostics<'a> {
    sink: &'a mut dyn DiagnosticSink,
    counts: DiagnosticCounts,
    log_diagnostics: bool,
}

impl<'a> Diagnostics<'a> {
    /// Wrap a sink
    pub fn new(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            sink,
            counts: DiagnosticCounts::default(),
            log_diagnostics: false,
        }
    }

    /// Also mirror every diagnostic to the `log` facade
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.log_diagnostics = enabled;
        self
    }

    /// Report a diagnostic
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.counts.bump(diagnostic.severity);
        if self.log_diagnostics {
            LogSink.emit(&diagnostic);
        }
        self.sink.emit(&diagnostic);
    }

    /// Report a note
    pub fn note(&mut self, message: impl Into<String>, span: SourceSpan) {
        self.emit(Diagnostic::new(Severity::Note, message, span));
    }

    /// Report a warning
    pub fn warning(&mut self, message: impl Into<String>, span: SourceSpan) {
        self.emit(Diagnostic::new(Severity::Warning, message, span));
    }

    /// Report an error
    pub fn error(&mut self, message: impl Into<String>, span: SourceSpan) {
        self.emit(Diagnostic::new(Severity::Error, message, span));
    }

    /// Counts so far
    pub const fn counts(&self) -> DiagnosticCounts {
        self.counts
    }
}
