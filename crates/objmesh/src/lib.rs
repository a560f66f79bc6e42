//! Wavefront OBJ mesh ingestion.
//!
//! Parses OBJ text into flat attribute arrays ([`RawMesh`]) and builds either
//! an unindexed [`SplitMesh`] or a welded [`IndexedMesh`] from it. Companion
//! `.mtl` files are read by [`mtl`].

pub mod assemble;
pub mod error;
pub mod mesh;
pub mod mtl;
pub mod obj;
pub mod parse;
pub mod reader;
pub mod weld;

pub use error::{ObjError, ObjResult};
pub use mesh::{FaceCorner, GroupInfo, IndexedMesh, MeshVertex, RawMesh, SplitMesh};
pub use mtl::{MapKind, MaterialInfo, MaterialLibrary};
pub use obj::LoadOptions;
pub use weld::WeldStrategy;
