//! Vertex welding: collapse repeated face corners into unique vertices plus
//! an index buffer that keeps the original corner order.
//!
//! Two strategies produce the same [`IndexedMesh`] contract but number the
//! unique vertices differently:
//!
//! * [`WeldStrategy::Sorted`] sorts corner references by
//!   `(position, tex_coord, normal)` and numbers runs of equal corners in that
//!   ascending key order. Vertex resolution runs in parallel.
//! * [`WeldStrategy::FirstSeen`] walks corners in order with a hash map keyed
//!   on the resolved vertex values and numbers vertices by first appearance.
//!   Corners that differ in indices but resolve to identical values share a
//!   vertex.

use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
};

use rayon::prelude::*;

use crate::mesh::{IndexedMesh, MeshVertex, RawMesh};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WeldStrategy {
    #[default]
    Sorted,
    FirstSeen,
}

impl WeldStrategy {
    pub fn weld(self, mut raw: RawMesh, parallel_min_len: usize) -> IndexedMesh {
        let (vertices, indices) = match self {
            WeldStrategy::Sorted => weld_sorted(&raw, parallel_min_len),
            WeldStrategy::FirstSeen => weld_first_seen(&raw),
        };
        let (groups, material_libraries) = raw.take_metadata();
        IndexedMesh {
            vertices,
            indices,
            groups,
            material_libraries,
        }
    }
}

impl fmt::Display for WeldStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeldStrategy::Sorted => "sorted",
            WeldStrategy::FirstSeen => "first-seen",
        })
    }
}

impl FromStr for WeldStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sorted" | "sort" => Ok(WeldStrategy::Sorted),
            "first-seen" | "firstseen" | "hash" | "map" => Ok(WeldStrategy::FirstSeen),
            other => Err(format!("unknown weld strategy '{other}'")),
        }
    }
}

/// Sort-based welding. Unique vertex ids follow ascending corner-key order.
pub fn weld_sorted(raw: &RawMesh, parallel_min_len: usize) -> (Vec<MeshVertex>, Vec<u32>) {
    let corners = raw.corners();
    let n = corners.len();
    if n == 0 {
        return (Vec::new(), Vec::new());
    }

    // Permutation of corner references; the corners themselves never move.
    let mut order: Vec<u32> = (0..n as u32).collect();
    order.par_sort_unstable_by(|&a, &b| corners[a as usize].cmp(&corners[b as usize]));

    // Start of every run of equal keys in the sorted view.
    let run_starts: Vec<usize> = (0..n)
        .filter(|&j| j == 0 || corners[order[j] as usize] != corners[order[j - 1] as usize])
        .collect();

    let vertices: Vec<MeshVertex> = run_starts
        .par_iter()
        .with_min_len(parallel_min_len.max(1))
        .map(|&start| raw.resolve(corners[order[start] as usize]))
        .collect();

    // Scatter run ids back to original corner positions. Every corner belongs
    // to exactly one run, so each slot is written once. The last run is
    // half-open and ends at n.
    let slots: Vec<AtomicU32> = (0..n).map(|_| AtomicU32::new(0)).collect();
    run_starts
        .par_iter()
        .enumerate()
        .with_min_len(parallel_min_len.max(1))
        .for_each(|(id, &start)| {
            let end = run_starts.get(id + 1).copied().unwrap_or(n);
            for &corner in &order[start..end] {
                slots[corner as usize].store(id as u32, Ordering::Relaxed);
            }
        });
    let indices = slots.into_iter().map(AtomicU32::into_inner).collect();

    (vertices, indices)
}

/// Hash-based welding. Unique vertex ids follow first appearance.
pub fn weld_first_seen(raw: &RawMesh) -> (Vec<MeshVertex>, Vec<u32>) {
    let corners = raw.corners();
    let mut unique: HashMap<[u32; 8], u32> = HashMap::with_capacity(corners.len() / 2);
    let mut vertices = Vec::new();
    let mut indices = Vec::with_capacity(corners.len());

    for &corner in corners {
        let vertex = raw.resolve(corner);
        // -0.0 and 0.0 compare equal, so they must share a key
        let key = bytemuck::cast::<_, [f32; 8]>(vertex).map(|x| (x + 0.0).to_bits());
        let id = *unique.entry(key).or_insert_with(|| {
            vertices.push(vertex);
            (vertices.len() - 1) as u32
        });
        indices.push(id);
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assemble::resolve_corners, parse::parse_obj};

    fn raw(src: &str) -> RawMesh {
        parse_obj(src.as_bytes()).expect("parse")
    }

    /// Two quads sharing an edge, with normals and uvs, listed so that first
    /// appearance and sorted-key order disagree.
    const SHARED_EDGE: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 2 0 0
v 2 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
g right
f 5/2/1 6/3/1 3/3/1 2/2/1
g left
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    fn assert_sound(raw: &RawMesh, mesh: &IndexedMesh) {
        let direct = resolve_corners(raw, 1);
        assert_eq!(mesh.indices.len(), raw.corners().len());
        assert!(mesh.vertices.len() <= raw.corners().len());
        for (i, &index) in mesh.indices.iter().enumerate() {
            assert_eq!(mesh.vertices[index as usize], direct[i], "corner {i}");
        }
    }

    fn assert_unique(mesh: &IndexedMesh) {
        for (i, a) in mesh.vertices.iter().enumerate() {
            for b in &mesh.vertices[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn single_triangle() {
        let raw = raw("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let mesh = WeldStrategy::Sorted.weld(raw, 1);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn sorted_ids_follow_key_order() {
        let raw = raw("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 3 1 2\nf 2 1 3\n");
        let mesh = WeldStrategy::Sorted.weld(raw, 1);
        assert_eq!(mesh.vertices.len(), 3);
        // vertex id == position index - 1 because keys sort by position first
        assert_eq!(mesh.indices, vec![2, 0, 1, 1, 0, 2]);
        assert_eq!(mesh.vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn first_seen_ids_follow_appearance() {
        let raw = raw("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 3 1 2\nf 2 1 3\n");
        let mesh = WeldStrategy::FirstSeen.weld(raw, 1);
        assert_eq!(mesh.indices, vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(mesh.vertices[0].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn shared_edge_is_welded_by_both_strategies() {
        for strategy in [WeldStrategy::Sorted, WeldStrategy::FirstSeen] {
            let raw = raw(SHARED_EDGE);
            let mesh = strategy.weld(raw.clone(), 1);
            assert_eq!(mesh.indices.len(), 12, "{strategy}");
            // 4 corners per quad, 2 of them shared
            assert_eq!(mesh.vertices.len(), 6, "{strategy}");
            assert_sound(&raw, &mesh);
            assert_unique(&mesh);
            assert_eq!(mesh.groups.len(), 2);
            assert_eq!(mesh.groups[1].name, "left");
            assert_eq!(mesh.groups[1].range(), 6..12);
        }
    }

    #[test]
    fn strategies_differ_only_in_numbering() {
        let raw = raw(SHARED_EDGE);
        let sorted = WeldStrategy::Sorted.weld(raw.clone(), 1);
        let seen = WeldStrategy::FirstSeen.weld(raw, 1);
        assert_ne!(sorted.indices, seen.indices);
        let expand = |m: &IndexedMesh| -> Vec<MeshVertex> {
            m.indices.iter().map(|&i| m.vertices[i as usize]).collect()
        };
        assert_eq!(expand(&sorted), expand(&seen));
        // sorted ids start with the smallest position index
        assert_eq!(sorted.vertices[0].position, [0.0, 0.0, 0.0]);
        // first-seen ids start with the first corner of the file
        assert_eq!(seen.vertices[0].position, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn sorted_keys_weld_indices_not_values() {
        // positions 1 and 2 hold the same coordinates
        let raw = raw("v 0 0 0\nv 0 0 0\nv 1 0 0\nf 1 3 2\n");
        let sorted = WeldStrategy::Sorted.weld(raw.clone(), 1);
        let seen = WeldStrategy::FirstSeen.weld(raw.clone(), 1);
        assert_eq!(sorted.vertices.len(), 3);
        assert_eq!(seen.vertices.len(), 2);
        assert_sound(&raw, &sorted);
        assert_sound(&raw, &seen);
    }

    #[test]
    fn first_seen_merges_signed_zeros() {
        let raw = raw("v 0 0 0\nv -0 0 0\nv 1 0 0\nf 1 2 3\nf 2 1 3\n");
        let mesh = WeldStrategy::FirstSeen.weld(raw.clone(), 1);
        assert_eq!(mesh.vertices.len(), 2);
        assert_eq!(mesh.indices, vec![0, 0, 1, 0, 0, 1]);
        assert_sound(&raw, &mesh);
        assert_unique(&mesh);
    }

    #[test]
    fn large_grid_welds_in_parallel() {
        // n x n quad grid: (n+1)^2 unique vertices
        let n = 60u32;
        let mut src = String::new();
        for y in 0..=n {
            for x in 0..=n {
                src.push_str(&format!("v {x} {y} 0\n"));
            }
        }
        let idx = |x: u32, y: u32| y * (n + 1) + x + 1;
        for y in 0..n {
            for x in 0..n {
                src.push_str(&format!(
                    "f {} {} {} {}\n",
                    idx(x, y),
                    idx(x + 1, y),
                    idx(x + 1, y + 1),
                    idx(x, y + 1)
                ));
            }
        }
        let raw = raw(&src);
        let mesh = WeldStrategy::Sorted.weld(raw.clone(), 64);
        assert_eq!(mesh.indices.len(), (n * n * 6) as usize);
        assert_eq!(mesh.vertices.len(), ((n + 1) * (n + 1)) as usize);
        assert_sound(&raw, &mesh);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn empty_input_gives_empty_buffers() {
        for strategy in [WeldStrategy::Sorted, WeldStrategy::FirstSeen] {
            let mesh = strategy.weld(RawMesh::new(), 1);
            assert!(mesh.vertices.is_empty());
            assert!(mesh.indices.is_empty());
            assert!(mesh.groups.is_empty());
            assert!(!mesh.is_valid());
        }
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!("sorted".parse::<WeldStrategy>(), Ok(WeldStrategy::Sorted));
        assert_eq!("First-Seen".parse::<WeldStrategy>(), Ok(WeldStrategy::FirstSeen));
        assert!("fastest".parse::<WeldStrategy>().is_err());
        assert_eq!(WeldStrategy::default(), WeldStrategy::Sorted);
    }
}
