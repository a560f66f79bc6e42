//! OBJ loading entry points.
//!
//! Each output type can be loaded from a path, a [`BufRead`] or a string.
//! Parsing always completes before any output buffer is built.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    time::Instant,
};

use crate::{
    assemble::assemble_split,
    error::{ObjError, ObjResult},
    mesh::{IndexedMesh, RawMesh, SplitMesh},
    parse::parse_obj,
    weld::WeldStrategy,
};

/// Knobs for building output buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    pub weld: WeldStrategy,
    /// Minimum items per rayon job in the parallel loops.
    pub parallel_min_len: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            weld: WeldStrategy::Sorted,
            parallel_min_len: 4096,
        }
    }
}

fn open(path: &Path) -> ObjResult<BufReader<File>> {
    let file = File::open(path).map_err(|source| ObjError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Load the raw attribute arrays and corners from a file path.
pub fn load_raw_from_path(path: impl AsRef<Path>) -> ObjResult<RawMesh> {
    let path = path.as_ref();
    log::info!("Loading OBJ from {:?}", path);
    load_raw_from_reader(open(path)?)
}

/// Load the raw attribute arrays and corners from any buffered reader.
pub fn load_raw_from_reader<R: BufRead>(reader: R) -> ObjResult<RawMesh> {
    let start = Instant::now();
    let raw = parse_obj(reader)?;
    log::info!(
        "Parsed {} positions, {} normals, {} uvs, {} corners, {} groups in {:.3?}",
        raw.position_count(),
        raw.normal_count(),
        raw.tex_coord_count(),
        raw.corners().len(),
        raw.groups().len(),
        start.elapsed()
    );
    Ok(raw)
}

/// Convenience helper to parse an OBJ string literal into a [`RawMesh`].
pub fn load_raw_from_str(contents: &str) -> ObjResult<RawMesh> {
    load_raw_from_reader(io::Cursor::new(contents))
}

/// Build an unindexed mesh (one vertex per corner) from a file path.
pub fn load_split_from_path(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> ObjResult<SplitMesh> {
    Ok(build_split(load_raw_from_path(path)?, options))
}

/// Build an unindexed mesh from any buffered reader.
pub fn load_split_from_reader<R: BufRead>(reader: R, options: &LoadOptions) -> ObjResult<SplitMesh> {
    Ok(build_split(load_raw_from_reader(reader)?, options))
}

/// Build an unindexed mesh from an OBJ string literal.
pub fn load_split_from_str(contents: &str, options: &LoadOptions) -> ObjResult<SplitMesh> {
    Ok(build_split(load_raw_from_str(contents)?, options))
}

/// Build a welded, indexed mesh from a file path.
pub fn load_indexed_from_path(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> ObjResult<IndexedMesh> {
    Ok(build_indexed(load_raw_from_path(path)?, options))
}

/// Build a welded, indexed mesh from any buffered reader.
pub fn load_indexed_from_reader<R: BufRead>(
    reader: R,
    options: &LoadOptions,
) -> ObjResult<IndexedMesh> {
    Ok(build_indexed(load_raw_from_reader(reader)?, options))
}

/// Build a welded, indexed mesh from an OBJ string literal.
pub fn load_indexed_from_str(contents: &str, options: &LoadOptions) -> ObjResult<IndexedMesh> {
    Ok(build_indexed(load_raw_from_str(contents)?, options))
}

/// Expand every corner of `raw` into its own vertex.
pub fn build_split(raw: RawMesh, options: &LoadOptions) -> SplitMesh {
    let start = Instant::now();
    let mesh = assemble_split(raw, options.parallel_min_len);
    log::info!(
        "Assembled {} vertices in {:.3?}",
        mesh.vertices.len(),
        start.elapsed()
    );
    mesh
}

/// Weld the corners of `raw` with the configured strategy.
pub fn build_indexed(raw: RawMesh, options: &LoadOptions) -> IndexedMesh {
    let start = Instant::now();
    let corners = raw.corners().len();
    log::debug!("Welding {} corners ({} strategy)", corners, options.weld);
    let mesh = options.weld.weld(raw, options.parallel_min_len);
    log::info!(
        "Welded {} corners into {} unique vertices in {:.3?}",
        corners,
        mesh.vertices.len(),
        start.elapsed()
    );
    mesh
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::mesh::MeshVertex;

    const TRIANGLE: &str = r#"
        v 0.0 0.0 0.0
        v 1.0 0.0 0.0
        v 0.0 1.0 0.0
        f 1 2 3
    "#;

    const TOY: &str = r#"
        mtllib toy.mtl
        v 0 0 0
        v 1 0 0
        v 1 1 0
        v 0 1 0
        v 0 0 1
        vt 0 0
        vt 1 0
        vt 1 1
        vt 0 1
        vn 0 0 1
        vn 0 1 0
        g unused
        g body
        usemtl skin
        f 1/1/1 2/2/1 3/3/1 4/4/1
        f 1/1/2 2/2/2 5/3/2
        g
        usemtl cloth
        f 4/4/1 3/3/1 5/1/2
    "#;

    fn options() -> LoadOptions {
        LoadOptions {
            parallel_min_len: 1,
            ..LoadOptions::default()
        }
    }

    #[test]
    fn end_to_end_triangle() {
        let split = load_split_from_str(TRIANGLE, &options()).expect("split");
        assert_eq!(split.vertices.len(), 3);
        assert_ne!(split.vertices[0].position, split.vertices[1].position);
        assert_ne!(split.vertices[1].position, split.vertices[2].position);
        assert_ne!(split.vertices[0].position, split.vertices[2].position);

        let indexed = load_indexed_from_str(TRIANGLE, &options()).expect("indexed");
        assert_eq!(indexed.vertices.len(), 3);
        assert_eq!(indexed.indices, vec![0, 1, 2]);
        assert!(indexed.is_valid());
    }

    #[test]
    fn split_and_indexed_agree() {
        let split = load_split_from_str(TOY, &options()).unwrap();
        for weld in [WeldStrategy::Sorted, WeldStrategy::FirstSeen] {
            let opts = LoadOptions { weld, ..options() };
            let indexed = load_indexed_from_str(TOY, &opts).unwrap();
            assert_eq!(split.vertices.len(), 12);
            assert_eq!(indexed.indices.len(), split.vertices.len());
            let expanded: Vec<MeshVertex> = indexed
                .indices
                .iter()
                .map(|&i| indexed.vertices[i as usize])
                .collect();
            assert_eq!(expanded, split.vertices);
            assert_eq!(indexed.groups, split.groups);
            assert_eq!(indexed.material_libraries, vec!["toy.mtl".to_string()]);
        }
    }

    #[test]
    fn groups_carry_names_materials_and_ranges() {
        let mesh = load_indexed_from_str(TOY, &options()).unwrap();
        let summary: Vec<(&str, Option<&str>, u32, u32)> = mesh
            .groups
            .iter()
            .map(|g| (g.name.as_str(), g.material.as_deref(), g.start_offset, g.count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("body", Some("skin"), 0, 9),
                ("group1", Some("cloth"), 9, 3)
            ]
        );
    }

    #[test]
    fn loads_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TOY.as_bytes()).unwrap();

        let raw = load_raw_from_path(file.path()).unwrap();
        assert_eq!(raw.position_count(), 5);
        assert_eq!(raw.corners().len(), 12);

        let split = load_split_from_path(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(split.vertices.len(), 12);
        let indexed = load_indexed_from_path(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(indexed.indices.len(), 12);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.obj");
        let err = load_indexed_from_path(&path, &LoadOptions::default()).unwrap_err();
        match err {
            ObjError::Open { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_errors_abort_the_whole_read() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\nv 1 x 1\n";
        assert!(load_split_from_str(src, &options()).is_err());
        assert!(load_indexed_from_str(src, &options()).is_err());
    }

    #[test]
    fn reader_entry_points() {
        let split = load_split_from_reader(TRIANGLE.as_bytes(), &options()).unwrap();
        let indexed = load_indexed_from_reader(TRIANGLE.as_bytes(), &options()).unwrap();
        assert_eq!(split.vertices.len(), indexed.indices.len());
    }
}
