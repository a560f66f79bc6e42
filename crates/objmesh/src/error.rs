//! Error taxonomy for OBJ and MTL loading.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: invalid {what} '{text}'")]
    InvalidNumber {
        line: usize,
        what: &'static str,
        text: String,
    },
    #[error("line {line}: missing {what}")]
    MissingField { line: usize, what: &'static str },
    #[error("line {line}: malformed face vertex '{text}'")]
    MalformedCorner { line: usize, text: String },
    #[error("line {line}: face has {count} vertices, only triangles and quads are supported")]
    UnsupportedFace { line: usize, count: usize },
    #[error("line {line}: OBJ indices are 1-based; found 0")]
    ZeroIndex { line: usize },
    #[error("line {line}: {attribute} index {index} out of range ({len} defined)")]
    IndexOutOfRange {
        line: usize,
        attribute: &'static str,
        index: i64,
        len: usize,
    },
    #[error("mesh has more than {} face corners", u32::MAX)]
    TooManyCorners,
    #[error("line {line}: newmtl issued without a material name")]
    MissingMaterialName { line: usize },
}

pub type ObjResult<T> = Result<T, ObjError>;
