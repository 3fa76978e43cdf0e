//! Model inspector
//!
//! Loads a model, prints its groups and materials and renders every diagnostic
//! to stderr.
//!
//! Usage: cargo run --bin model_inspect model.obj [loader.toml]

use std::env;
use std::process::ExitCode;

use model_loader::foundation::logging;
use model_loader::prelude::*;

fn main() -> ExitCode {
    logging::init_with_level(log::LevelFilter::Warn);

    let args: Vec<String> = env::args().collect();
    if !(2..=3).contains(&args.len()) {
        eprintln!("Usage: {} model.obj [loader.toml|loader.ron]", args[0]);
        eprintln!("Loads a model and reports its groups, materials and diagnostics");
        return ExitCode::FAILURE;
    }

    let loader = match args.get(2) {
        Some(config_path) => match ObjLoader::from_config_file(config_path) {
            Ok(loader) => loader,
            Err(e) => {
                eprintln!("Error reading {config_path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => ObjLoader::default(),
    };

    let mut materials = MaterialRegistry::new();
    let mut groups: Vec<MeshGroup> = Vec::new();
    let mut renderer = TextRenderer::stderr(loader.config().diagnostics.color);

    let report = match loader.load(&args[1], &mut materials, &mut groups, &mut renderer) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Loading {} failed: {}", args[1], e);
            return ExitCode::FAILURE;
        }
    };

    println!("{}", args[1]);
    for group in &groups {
        let material = materials.name(group.material_id).unwrap_or("?");
        println!(
            "  group {:<24} {:>8} vertices {:>8} triangles  material {}",
            group.name,
            group.vertices.len(),
            group.triangle_count(),
            material
        );
    }
    for (id, name, color) in materials.iter() {
        println!("  material {:<3} {:<24} Kd {:.3} {:.3} {:.3}", id.0, name, color.r, color.g, color.b);
    }
    println!(
        "  {} note(s), {} warning(s), {} error(s)",
        report.notes, report.warnings, report.errors
    );

    if report.errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
