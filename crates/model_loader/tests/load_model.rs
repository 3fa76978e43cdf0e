//! End-to-end loading of model and material files

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use approx::assert_relative_eq;
use model_loader::assets::text::{Dialect, Lexer, SourceSpan, TextRenderer, TokenKind};
use model_loader::prelude::*;
use model_loader::render::buffer::AllocationError;
use tempfile::TempDir;

const MINIMAL: &str = "v 0.0 0.0 0.0\nv 1.0 0.0 0.0\nv 0.0 1.0 0.0\nf 1 2 3\n";

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn load_str(contents: &str) -> LoadedModel {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "model.obj", contents);
    ObjLoader::default().load_meshes(path).unwrap()
}

fn messages(model: &LoadedModel, severity: Severity) -> Vec<&str> {
    model
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .map(|d| d.message.as_str())
        .collect()
}

#[test]
fn test_minimal_model() {
    let model = load_str(MINIMAL);

    assert!(model.diagnostics.is_empty());
    assert_eq!(model.groups.len(), 1);
    let group = &model.groups[0];
    assert_eq!(group.vertices.len(), 3);
    assert_eq!(group.indices, vec![0, 1, 2]);
    assert_eq!(group.vertices[1].position, [1.0, 0.0, 0.0]);
    assert_eq!(model.report.vertices, 3);
    assert_eq!(model.report.indices, 3);
}

#[test]
fn test_shared_corners_are_welded() {
    // Two triangles of a quad share the diagonal corners
    let model = load_str(
        "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\nf 1//1 3//1 4//1\n",
    );
    let group = &model.groups[0];
    assert_eq!(group.vertices.len(), 4);
    assert_eq!(group.indices, vec![0, 1, 2, 0, 2, 3]);
    assert!(group.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
}

#[test]
fn test_quad_is_split_into_two_triangles() {
    let model = load_str("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n");
    assert_eq!(model.groups[0].indices, vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(model.groups[0].triangle_count(), 2);
}

#[test]
fn test_texture_coordinates_are_flipped() {
    let model = load_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0.25\nf 1/1 2/1 3/1\n");
    let vertex = model.groups[0].vertices[0];
    assert_relative_eq!(vertex.tex_coord[1], 0.75);
}

#[test]
fn test_mixed_corner_shapes() {
    let model = load_str(&format!("{MINIMAL}vt 0 0\nf 1 2/1 3\n"));

    let errors = messages(&model, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("mixes corner shapes"));
    // Only the first face made it into the buffers
    assert_eq!(model.groups[0].indices, vec![0, 1, 2]);
}

#[test]
fn test_unknown_material_is_warning() {
    let model = load_str(&format!("usemtl ghost\n{MINIMAL}"));

    assert_eq!(messages(&model, Severity::Warning).len(), 1);
    assert_eq!(model.report.errors, 0);
    assert_eq!(model.groups[0].material_id, MaterialId::DEFAULT);
}

#[test]
fn test_negative_indices_are_unsupported() {
    let model = load_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n");

    let errors = messages(&model, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("not yet supported"));
    assert!(model.groups.is_empty());
}

#[test]
fn test_rendered_diagnostic_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "bad.obj", "v 0 0 0\nv 1 1 @\n");

    let mut renderer = TextRenderer::plain(Vec::new());
    ObjLoader::default()
        .load(&path, &mut MaterialRegistry::new(), &mut Vec::<MeshGroup>::new(), &mut renderer)
        .unwrap();
    let text = String::from_utf8(renderer.into_inner()).unwrap();

    let header = format!("{}:2:7: error: ", path.display());
    assert!(text.starts_with(&header), "unexpected rendering: {text}");
    assert!(text.contains("2 | v 1 1 @\n"));
    assert!(text.ends_with("\n\n"));
}

#[test]
fn test_malformed_literal_does_not_stop_parsing() {
    let model = load_str("v 0 0 0\nv 1 0 0.0.0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");

    let errors = messages(&model, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("malformed numeric literal"));
    assert_eq!(model.groups[0].vertices.len(), 3);
    assert_eq!(model.groups[0].vertices[2].position, [0.0, 1.0, 0.0]);
}

#[test]
fn test_material_library_binds_ids() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir, "paint.mtl", "newmtl red\nKd 1 0 0\nnewmtl blue\nKd 0 0 1\n");
    let path = write(
        &dir,
        "model.obj",
        &format!("mtllib paint.mtl\n{MINIMAL}g body\nusemtl blue\nf 1 2 3\nusemtl red\nf 3 2 1\n"),
    );

    let model = ObjLoader::default().load_meshes(path).unwrap();
    assert!(model.report.is_clean(), "{:?}", model.diagnostics);

    let blue = model.materials.resolve("blue").unwrap();
    let red = model.materials.resolve("red").unwrap();
    let bound: Vec<_> = model.groups.iter().map(|g| (g.name.as_str(), g.material_id)).collect();
    assert_eq!(bound, [("default", MaterialId::DEFAULT), ("body", blue), ("body", red)]);
    assert_eq!(model.materials.color(red), Some(Color::new(1.0, 0.0, 0.0)));
}

#[test]
fn test_material_collision_across_libraries_warns() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir, "a.mtl", "newmtl paint\nKd 1 0 0\n");
    write(&dir, "b.mtl", "newmtl paint\nKd 0 0 1\nnewmtl default\nKd 0 1 0\n");
    let path = write(&dir, "model.obj", &format!("mtllib a.mtl b.mtl\nusemtl paint\n{MINIMAL}"));

    let model = ObjLoader::default().load_meshes(path).unwrap();
    let warnings = messages(&model, Severity::Warning);
    assert_eq!(warnings.len(), 2, "{warnings:?}");
    assert!(warnings.iter().any(|w| w.contains("`paint`") && w.contains("b.mtl")));
    assert!(warnings.iter().any(|w| w.contains("`default`")));

    for diagnostic in &model.diagnostics {
        // Reported on the `mtllib` record
        assert_eq!(diagnostic.span.as_ref().unwrap().start().line, 1);
    }

    // The later library wins
    let paint = model.materials.resolve("paint").unwrap();
    assert_eq!(model.materials.color(paint), Some(Color::new(0.0, 0.0, 1.0)));
    assert_eq!(model.groups[0].material_id, paint);
}

#[test]
fn test_duplicate_material_in_library() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir, "dup.mtl", "newmtl red\nKd 1 0 0\nnewmtl red\nKd 0.5 0 0\n");
    let path = write(&dir, "model.obj", &format!("mtllib dup.mtl\nusemtl red\n{MINIMAL}"));

    let model = ObjLoader::default().load_meshes(path).unwrap();
    let warnings = messages(&model, Severity::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("defined again"));

    let red = model.materials.resolve("red").unwrap();
    assert_relative_eq!(model.materials.color(red).unwrap().r, 0.5);
    assert_eq!(model.groups[0].material_id, red);
}

#[test]
fn test_library_diagnostics_point_into_library() {
    let dir = tempfile::tempdir().unwrap();
    let library = write(&dir, "broken.mtl", "Kd 1 0 0\n");
    let path = write(&dir, "model.obj", "mtllib broken.mtl\n");

    let model = ObjLoader::default().load_meshes(path).unwrap();
    let span = model.diagnostics[0].span.as_ref().unwrap();
    assert_eq!(Path::new(span.file()), library.as_path());
    assert_eq!(span.start().line, 1);
}

#[test]
fn test_lexer_end_of_input_and_pushback() {
    let mut lexer = Lexer::from_source("v 1", "t.obj", Dialect::Model);
    let keyword = lexer.next().unwrap();
    lexer.push_back(keyword.clone());
    assert_eq!(lexer.next().unwrap(), keyword);

    let _operand = lexer.next().unwrap();
    let eof = lexer.next().unwrap();
    assert_eq!(eof.kind, TokenKind::Eof);
    for _ in 0..3 {
        assert_eq!(lexer.next().unwrap(), eof);
    }
}

#[test]
fn test_span_merge_associativity() {
    let line: Arc<str> = Arc::from("f 1 2 3");
    let file: Arc<str> = Arc::from("t.obj");
    let a = SourceSpan::single_line(Arc::clone(&file), 1, 1, 1, Arc::clone(&line));
    let b = SourceSpan::single_line(Arc::clone(&file), 1, 3, 3, Arc::clone(&line));
    let c = SourceSpan::single_line(file, 1, 5, 7, line);

    let left = &(&a + &b) + &c;
    let right = &a + &(&b + &c);
    assert_eq!((left.start(), left.end()), (right.start(), right.end()));
}

/// Allocator that keeps buffers in host memory
#[derive(Default)]
struct HostAllocator {
    buffers: Vec<Vec<u8>>,
    budget: Option<usize>,
}

impl BufferAllocator for HostAllocator {
    type Handle = usize;

    fn allocate(&mut self, byte_size: usize, _usage: BufferUsage) -> Result<usize, AllocationError> {
        if self.budget.is_some_and(|budget| byte_size > budget) {
            return Err(AllocationError::OutOfMemory { size: byte_size });
        }
        self.buffers.push(Vec::with_capacity(byte_size));
        Ok(self.buffers.len() - 1)
    }

    fn upload(&mut self, handle: &usize, bytes: &[u8]) -> Result<(), AllocationError> {
        self.buffers[*handle].extend_from_slice(bytes);
        Ok(())
    }
}

#[test]
fn test_upload_through_allocator() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "model.obj", MINIMAL);

    let mut uploader = BufferUploader::new(HostAllocator::default());
    let mut sink = CollectingSink::new();
    ObjLoader::default()
        .load(&path, &mut MaterialRegistry::new(), &mut uploader, &mut sink)
        .unwrap();

    let (allocator, meshes) = uploader.into_parts();
    assert_eq!(meshes.len(), 1);
    assert_eq!(meshes[0].vertex_count, 3);
    let bytes = &allocator.buffers[meshes[0].vertex_buffer];
    assert_eq!(bytes.len(), 3 * std::mem::size_of::<Vertex>());
    let third: Vertex = bytemuck::pod_read_unaligned(&bytes[64..96]);
    assert_eq!(third.position, [0.0, 1.0, 0.0]);
}

#[test]
fn test_allocation_failure_aborts_with_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "model.obj", MINIMAL);

    let mut uploader = BufferUploader::new(HostAllocator { budget: Some(8), ..Default::default() });
    let mut sink = CollectingSink::new();
    let result = ObjLoader::default().load(&path, &mut MaterialRegistry::new(), &mut uploader, &mut sink);

    assert!(matches!(result, Err(ModelError::Allocation(_))));
    assert_eq!(sink.of_severity(Severity::Fatal).count(), 1);
}

#[test]
fn test_concurrent_loads_share_registry() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir, "a.mtl", "newmtl shared\nKd 0.1 0.2 0.3\nnewmtl only_a\n");
    write(&dir, "b.mtl", "newmtl shared\nKd 0.1 0.2 0.3\nnewmtl only_b\n");
    let paths = [
        write(&dir, "a.obj", &format!("mtllib a.mtl\nusemtl only_a\n{MINIMAL}")),
        write(&dir, "b.obj", &format!("mtllib b.mtl\nusemtl only_b\n{MINIMAL}")),
    ];

    let registry = SharedMaterialRegistry::new();
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let mut table = registry.clone();
            thread::spawn(move || {
                let mut groups: Vec<MeshGroup> = Vec::new();
                let report = ObjLoader::default()
                    .load(path, &mut table, &mut groups, &mut CollectingSink::new())
                    .unwrap();
                (report, groups)
            })
        })
        .collect();

    // `shared` comes from a different run each time, which is not a collision
    for handle in handles {
        let (report, groups) = handle.join().unwrap();
        assert!(report.is_clean());
        assert_ne!(groups[0].material_id, MaterialId::DEFAULT);
    }
    // default + shared + only_a + only_b
    assert_eq!(registry.with(MaterialRegistry::len), 4);
}
