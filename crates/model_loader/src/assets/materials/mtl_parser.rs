//! MTL (Material Template Library) file parser
//!
//! Reads material libraries with the shared text front end. Only the diffuse
//! color is kept; every other material statement is recognised and skipped with
//! a note.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::assets::text::{
    self, AssemblerState, Dialect, Diagnostics, Lexer, ParseStack, Record, Reduction, ReductionEngine, SourceSpan,
};
use crate::foundation::math::Color;

/// Material name to diffuse color, in name order
pub type MaterialLibrary = BTreeMap<String, Color>;

/// MTL file parser
#[derive(Debug, Default)]
pub struct MtlParser {
    state: AssemblerState,
    current: Option<String>,
    library: MaterialLibrary,
}

impl MtlParser {
    /// Parse MTL file contents
    ///
    /// `name` is the file name used in diagnostics.
    pub fn parse_str(contents: &str, name: &str, diagnostics: &mut Diagnostics<'_>) -> MaterialLibrary {
        Self::parse_reader(contents.as_bytes(), name, diagnostics).unwrap_or_default()
    }

    /// Open and parse an MTL file
    pub fn load(path: impl AsRef<Path>, diagnostics: &mut Diagnostics<'_>) -> io::Result<MaterialLibrary> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let library = Self::parse_reader(reader, &path.display().to_string(), diagnostics)?;
        log::debug!("Loaded {} material(s) from {}", library.len(), path.display());
        Ok(library)
    }

    /// Parse MTL data from any buffered reader
    pub fn parse_reader<R: BufRead>(
        reader: R,
        name: &str,
        diagnostics: &mut Diagnostics<'_>,
    ) -> io::Result<MaterialLibrary> {
        let mut lexer = Lexer::new(reader, name, Dialect::Material);
        let mut parser = Self::default();
        parser.run(&mut lexer, diagnostics)?;
        Ok(parser.library)
    }

    fn run<R: BufRead>(&mut self, lexer: &mut Lexer<R>, diagnostics: &mut Diagnostics<'_>) -> io::Result<()> {
        debug_assert_eq!(self.state, AssemblerState::Idle);
        self.state = AssemblerState::Running;
        let mut stack = ParseStack::new();
        let mut engine = ReductionEngine::new();

        loop {
            match engine.reduce(&mut stack, None, diagnostics) {
                Reduction::NoChange => {
                    if !text::shift(lexer, &mut stack, diagnostics)? {
                        break;
                    }
                }
                Reduction::Applied(_) | Reduction::Error(_) => {
                    for nonterminal in stack.take_processed() {
                        self.apply(nonterminal.record, nonterminal.span, diagnostics);
                    }
                }
            }
        }

        text::report_residual(&stack, diagnostics);
        self.state = AssemblerState::Done;
        Ok(())
    }

    fn apply(&mut self, record: Record, span: SourceSpan, diagnostics: &mut Diagnostics<'_>) {
        match record {
            Record::NewMaterial(name) => {
                if self.library.contains_key(&name) {
                    diagnostics.warning(format!("material `{name}` is defined again, the later definition wins"), span);
                }
                self.library.insert(name.clone(), Color::DEFAULT_DIFFUSE);
                self.current = Some(name);
            }
            Record::Diffuse(color) => match &self.current {
                Some(name) => {
                    self.library.insert(name.clone(), color);
                }
                None => diagnostics.error("`Kd` before any `newmtl`", span),
            },
            Record::Skipped(statement) => {
                diagnostics.note(format!("ignoring unsupported statement `{statement}`"), span);
            }
            other => log::trace!("Ignoring {other:?} in material library"),
        }
    }
}
