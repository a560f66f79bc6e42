//! Entry point for the objmesh loader demo.
//! Loads an OBJ, builds the requested buffers and reports groups/materials.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use objmesh::{LoadOptions, WeldStrategy, mtl, obj};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Mode {
    Split,
    Indexed,
}

struct Args {
    obj: PathBuf,
    mode: Mode,
    options: LoadOptions,
    mtl: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    // Accept: <file.obj> --mode=split|indexed --weld=sorted|first-seen --mtl=<file>
    let mut obj = None;
    let mut mode = Mode::Indexed;
    let mut options = LoadOptions::default();
    let mut mtl = None;

    for arg in std::env::args().skip(1) {
        if let Some(val) = arg.strip_prefix("--mode=") {
            mode = match val.to_ascii_lowercase().as_str() {
                "split" | "arrays" => Mode::Split,
                "indexed" | "elements" => Mode::Indexed,
                other => bail!("Unknown mode '{}', expected split or indexed", other),
            };
        } else if let Some(val) = arg.strip_prefix("--weld=") {
            options.weld = val.parse::<WeldStrategy>().map_err(anyhow::Error::msg)?;
        } else if let Some(val) = arg.strip_prefix("--parallel-min-len=") {
            options.parallel_min_len = val
                .parse()
                .with_context(|| format!("Invalid --parallel-min-len '{}'", val))?;
        } else if let Some(val) = arg.strip_prefix("--mtl=") {
            mtl = Some(PathBuf::from(val));
        } else if arg.starts_with("--") {
            log::warn!("Ignoring unknown flag '{}'", arg);
        } else {
            obj = Some(PathBuf::from(arg));
        }
    }

    let obj = obj.context("usage: objmesh <file.obj> [--mode=split|indexed] [--weld=sorted|first-seen] [--mtl=<file.mtl>]")?;
    Ok(Args {
        obj,
        mode,
        options,
        mtl,
    })
}

/// Explicit `--mtl` wins; otherwise use `mtllib` entries next to the OBJ.
fn material_paths(args: &Args, libraries: &[String]) -> Vec<PathBuf> {
    if let Some(path) = &args.mtl {
        return vec![path.clone()];
    }
    let dir = args.obj.parent().unwrap_or_else(|| Path::new("."));
    libraries.iter().map(|name| dir.join(name)).collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    log::info!(
        "Loading {:?}: mode={:?}, weld={}, parallel_min_len={}",
        args.obj,
        args.mode,
        args.options.weld,
        args.options.parallel_min_len
    );

    let (groups, libraries) = match args.mode {
        Mode::Split => {
            let mesh = obj::load_split_from_path(&args.obj, &args.options)
                .with_context(|| format!("Failed to load {}", args.obj.display()))?;
            println!(
                "vertices: {} ({} bytes)",
                mesh.vertices.len(),
                mesh.vertex_bytes().len()
            );
            (mesh.groups, mesh.material_libraries)
        }
        Mode::Indexed => {
            let mesh = obj::load_indexed_from_path(&args.obj, &args.options)
                .with_context(|| format!("Failed to load {}", args.obj.display()))?;
            println!(
                "vertices: {} ({} bytes), indices: {} ({} bytes)",
                mesh.vertices.len(),
                mesh.vertex_bytes().len(),
                mesh.indices.len(),
                mesh.index_bytes().len()
            );
            (mesh.groups, mesh.material_libraries)
        }
    };

    for group in &groups {
        println!(
            "group name: {} material: {} startOffset: {} count: {}",
            group.name,
            group.material.as_deref().unwrap_or("-"),
            group.start_offset,
            group.count
        );
    }

    for path in material_paths(&args, &libraries) {
        match mtl::load_mtl_from_path(&path) {
            Ok(library) => {
                let mut names: Vec<_> = library.keys().collect();
                names.sort();
                for name in names {
                    let material = &library[name];
                    println!(
                        "material: {} diffuse: {:?} maps: {}",
                        name,
                        material.diffuse.to_array(),
                        material.texture_maps.len()
                    );
                }
            }
            Err(err) => log::warn!("Skipping material library: {}", err),
        }
    }

    Ok(())
}
