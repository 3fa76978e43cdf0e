//! OBJ file loader for 3D models
//!
//! Drives the text front end over a model file and assembles welded, per-group
//! vertex and index buffers. Finished groups go to a [`MeshSink`]; material
//! libraries named by `mtllib` are parsed and merged into a [`MaterialTable`].
//!
//! Problems in the file are reported as diagnostics and never abort the load.
//! Only I/O failures and buffer allocation failures are returned as
//! [`ModelError`], each preceded by a fatal diagnostic.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::assets::index_resolver::IndexResolver;
use crate::assets::materials::{MaterialId, MaterialRegistry, MaterialTable, MtlParser, DEFAULT_MATERIAL_NAME};
use crate::assets::text::{
    self, AssemblerState, CollectingSink, Diagnostic, DiagnosticCounts, DiagnosticSink, Diagnostics, Dialect, Lexer,
    ParseStack, Record, Reduction, ReductionEngine, Severity, SourceSpan,
};
use crate::assets::ModelError;
use crate::core::config::{Config, LoaderConfig};
use crate::render::buffer::MeshSink;
use crate::render::mesh::MeshGroup;

/// Outcome of a successful load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Notes emitted
    pub notes: usize,
    /// Warnings emitted
    pub warnings: usize,
    /// Errors emitted
    pub errors: usize,
    /// Groups handed to the mesh sink
    pub groups: usize,
    /// Packed vertices across all groups
    pub vertices: usize,
    /// Triangle indices across all groups
    pub indices: usize,
}

impl ParseReport {
    /// No warnings and no errors
    pub const fn is_clean(&self) -> bool {
        self.warnings == 0 && self.errors == 0
    }
}

/// Everything [`ObjLoader::load_meshes`] produces
#[derive(Debug)]
pub struct LoadedModel {
    /// Finished groups in file order
    pub groups: Vec<MeshGroup>,
    /// Default material plus every material from the model's libraries
    pub materials: MaterialRegistry,
    /// Diagnostics in emission order
    pub diagnostics: Vec<Diagnostic>,
    /// Load summary
    pub report: ParseReport,
}

/// OBJ model loader
#[derive(Debug, Clone, Default)]
pub struct ObjLoader {
    config: LoaderConfig,
}

impl ObjLoader {
    /// Create a loader
    pub const fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Create a loader from a `.toml` or `.ron` configuration file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let config = LoaderConfig::load_from_file(path)?;
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Loader configuration
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a model file
    ///
    /// Material libraries are looked up relative to the model's directory.
    pub fn load(
        &self,
        path: impl AsRef<Path>,
        materials: &mut dyn MaterialTable,
        meshes: &mut dyn MeshSink,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ParseReport, ModelError> {
        let path = path.as_ref();
        let mut diagnostics = Diagnostics::new(sink).with_logging(self.config.diagnostics.log_diagnostics);

        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                diagnostics.emit(Diagnostic::detached(
                    Severity::Fatal,
                    format!("cannot open {}: {err}", path.display()),
                ));
                return Err(err.into());
            }
        };

        let name = path.display().to_string();
        self.assemble(BufReader::new(file), &name, path.parent(), materials, meshes, &mut diagnostics)
    }

    /// Load a model from any buffered reader
    ///
    /// `name` is used in diagnostics; `base_dir` anchors relative `mtllib` paths
    /// (the working directory when `None`).
    pub fn load_from_reader<R: BufRead>(
        &self,
        reader: R,
        name: &str,
        base_dir: Option<&Path>,
        materials: &mut dyn MaterialTable,
        meshes: &mut dyn MeshSink,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ParseReport, ModelError> {
        let mut diagnostics = Diagnostics::new(sink).with_logging(self.config.diagnostics.log_diagnostics);
        self.assemble(reader, name, base_dir, materials, meshes, &mut diagnostics)
    }

    /// Load a model file into host memory, collecting diagnostics
    pub fn load_meshes(&self, path: impl AsRef<Path>) -> Result<LoadedModel, ModelError> {
        let mut materials = MaterialRegistry::new();
        let mut groups: Vec<MeshGroup> = Vec::new();
        let mut sink = CollectingSink::new();
        let report = self.load(path, &mut materials, &mut groups, &mut sink)?;

        Ok(LoadedModel {
            groups,
            materials,
            diagnostics: sink.take(),
            report,
        })
    }

    fn assemble<R: BufRead>(
        &self,
        reader: R,
        name: &str,
        base_dir: Option<&Path>,
        materials: &mut dyn MaterialTable,
        meshes: &mut dyn MeshSink,
        diagnostics: &mut Diagnostics<'_>,
    ) -> Result<ParseReport, ModelError> {
        let mut lexer = Lexer::new(reader, name, Dialect::Model);
        let mut assembler = ModelAssembler::new(&self.config, base_dir, materials, meshes);

        if let Err(err) = assembler.run(&mut lexer, diagnostics) {
            diagnostics.emit(Diagnostic::detached(Severity::Fatal, format!("{name}: {err}")));
            return Err(err);
        }

        let report = assembler.report(diagnostics.counts());
        log::info!(
            "Loaded {}: {} group(s), {} vertices, {} indices ({} error(s), {} warning(s))",
            name,
            report.groups,
            report.vertices,
            report.indices,
            report.errors,
            report.warnings
        );
        Ok(report)
    }
}

/// Per-run assembly state
struct ModelAssembler<'a> {
    config: &'a LoaderConfig,
    base_dir: Option<&'a Path>,
    materials: &'a mut dyn MaterialTable,
    meshes: &'a mut dyn MeshSink,
    state: AssemblerState,
    resolver: IndexResolver,
    group: MeshGroup,
    /// Material names registered from this run's libraries
    library_materials: HashSet<String>,
    groups: usize,
    vertices: usize,
    indices: usize,
}

impl<'a> ModelAssembler<'a> {
    fn new(
        config: &'a LoaderConfig,
        base_dir: Option<&'a Path>,
        materials: &'a mut dyn MaterialTable,
        meshes: &'a mut dyn MeshSink,
    ) -> Self {
        Self {
            config,
            base_dir,
            materials,
            meshes,
            state: AssemblerState::Idle,
            resolver: IndexResolver::new(config.flip_texture_v),
            group: MeshGroup::new(config.default_group.clone(), MaterialId::DEFAULT),
            library_materials: HashSet::new(),
            groups: 0,
            vertices: 0,
            indices: 0,
        }
    }

    fn run<R: BufRead>(&mut self, lexer: &mut Lexer<R>, diagnostics: &mut Diagnostics<'_>) -> Result<(), ModelError> {
        debug_assert_eq!(self.state, AssemblerState::Idle);
        self.state = AssemblerState::Running;
        let mut stack = ParseStack::new();
        let mut engine = ReductionEngine::new();

        loop {
            match engine.reduce(&mut stack, Some(&mut self.resolver), diagnostics) {
                Reduction::NoChange => {
                    if !text::shift(lexer, &mut stack, diagnostics)? {
                        break;
                    }
                }
                Reduction::Applied(_) | Reduction::Error(_) => {
                    for nonterminal in stack.take_processed() {
                        self.apply(nonterminal.record, nonterminal.span, diagnostics)?;
                    }
                }
            }
        }

        text::report_residual(&stack, diagnostics);
        self.flush()?;
        self.state = AssemblerState::Done;
        Ok(())
    }

    fn apply(&mut self, record: Record, span: SourceSpan, diagnostics: &mut Diagnostics<'_>) -> Result<(), ModelError> {
        match record {
            Record::Position(position) => self.resolver.push_position(position),
            Record::Normal(normal) => self.resolver.push_normal(normal),
            Record::TexCoord(tex_coord) => self.resolver.push_tex_coord(tex_coord),
            Record::Triangles(indices) => self.group.indices.extend_from_slice(&indices),
            Record::Group(name) | Record::Object(name) => {
                let name = if name.is_empty() { self.config.default_group.clone() } else { name };
                self.start_group(name)?;
            }
            Record::MaterialLibrary(files) => {
                for file in files {
                    self.load_library(&file, &span, diagnostics);
                }
            }
            Record::UseMaterial(name) => match self.materials.resolve(&name) {
                Some(id) => self.bind_material(id)?,
                None => diagnostics.warning(format!("unknown material `{name}`, keeping the current one"), span),
            },
            Record::Smoothing(group) => log::trace!("Smoothing group {group:?} ignored"),
            Record::Skipped(statement) => {
                diagnostics.note(format!("ignoring unsupported statement `{statement}`"), span);
            }
            // Material records only come out of the material dialect
            Record::NewMaterial(_) | Record::Diffuse(_) => {}
        }
        Ok(())
    }

    /// Flush the current group and open `name` with the current material
    fn start_group(&mut self, name: String) -> Result<(), ModelError> {
        self.flush()?;
        self.group.name = name;
        Ok(())
    }

    /// A material change splits a group that already has faces
    fn bind_material(&mut self, id: MaterialId) -> Result<(), ModelError> {
        if id == self.group.material_id {
            return Ok(());
        }
        self.flush()?;
        self.group.material_id = id;
        Ok(())
    }

    /// Hand the current group to the sink if it has faces, leaving an empty group
    /// with the same name and material in its place
    fn flush(&mut self) -> Result<(), ModelError> {
        let vertices = self.resolver.finish_group();
        if self.group.is_empty() {
            return Ok(());
        }

        let mut group = MeshGroup::new(self.group.name.clone(), self.group.material_id);
        std::mem::swap(&mut group, &mut self.group);
        group.vertices = vertices;

        log::debug!(
            "Finished group '{}': {} vertices, {} triangles, material {:?}",
            group.name,
            group.vertices.len(),
            group.triangle_count(),
            group.material_id
        );
        self.groups += 1;
        self.vertices += group.vertices.len();
        self.indices += group.indices.len();
        self.meshes.finish_group(group)
    }

    fn load_library(&mut self, file: &str, span: &SourceSpan, diagnostics: &mut Diagnostics<'_>) {
        let path = self.base_dir.map_or_else(|| Path::new(file).to_path_buf(), |dir| dir.join(file));
        match MtlParser::load(&path, diagnostics) {
            Ok(library) => {
                for (name, color) in &library {
                    if name == DEFAULT_MATERIAL_NAME || !self.library_materials.insert(name.clone()) {
                        diagnostics.warning(
                            format!("material `{name}` from `{}` replaces an earlier definition", path.display()),
                            span.clone(),
                        );
                    }
                    self.materials.register(name, *color);
                }
            }
            Err(err) => diagnostics.warning(
                format!("cannot read material library `{}`: {err}", path.display()),
                span.clone(),
            ),
        }
    }

    fn report(&self, counts: DiagnosticCounts) -> ParseReport {
        ParseReport {
            notes: counts.notes,
            warnings: counts.warnings,
            errors: counts.errors,
            groups: self.groups,
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}
