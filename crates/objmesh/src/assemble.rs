//! Unindexed vertex assembly: one resolved vertex per face corner.

use rayon::prelude::*;

use crate::mesh::{MeshVertex, RawMesh, SplitMesh};

/// Expand every corner into its own vertex, in corner order.
pub fn assemble_split(mut raw: RawMesh, parallel_min_len: usize) -> SplitMesh {
    let vertices = resolve_corners(&raw, parallel_min_len);
    let (groups, material_libraries) = raw.take_metadata();
    SplitMesh {
        vertices,
        groups,
        material_libraries,
    }
}

pub(crate) fn resolve_corners(raw: &RawMesh, parallel_min_len: usize) -> Vec<MeshVertex> {
    raw.corners()
        .par_iter()
        .with_min_len(parallel_min_len.max(1))
        .map(|&corner| raw.resolve(corner))
        .collect()
}
