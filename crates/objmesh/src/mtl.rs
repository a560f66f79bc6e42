//! Material library (`.mtl`) parser.
//!
//! Purely descriptive: records colors, exponents and texture map paths per
//! `newmtl` block. Nothing here feeds back into geometry.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use glam::Vec3;

use crate::{
    error::{ObjError, ObjResult},
    parse::{next_number, parse_number},
    reader::{Line, LineReader},
};

/// Texture map slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapKind {
    Ambient,
    Diffuse,
    Specular,
    Bump,
    Opacity,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialInfo {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub transmission: Vec3,
    pub opacity: f32,
    pub specular_focus: f32,
    pub index_of_refraction: f32,
    pub illum_model: i32,
    pub texture_maps: HashMap<MapKind, PathBuf>,
}

impl Default for MaterialInfo {
    fn default() -> Self {
        Self {
            ambient: Vec3::ZERO,
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
            transmission: Vec3::ZERO,
            opacity: 1.0,
            specular_focus: 0.0,
            index_of_refraction: 1.0,
            illum_model: 0,
            texture_maps: HashMap::new(),
        }
    }
}

pub type MaterialLibrary = HashMap<String, MaterialInfo>;

/// Load a material library from a file path.
pub fn load_mtl_from_path(path: impl AsRef<Path>) -> ObjResult<MaterialLibrary> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ObjError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let library = load_mtl_from_reader(BufReader::new(file))?;
    log::info!("Loaded {} materials from {:?}", library.len(), path);
    Ok(library)
}

/// Convenience helper to parse an MTL string literal.
pub fn load_mtl_from_str(contents: &str) -> ObjResult<MaterialLibrary> {
    load_mtl_from_reader(io::Cursor::new(contents))
}

pub fn load_mtl_from_reader<R: BufRead>(reader: R) -> ObjResult<MaterialLibrary> {
    let mut lines = LineReader::new(reader);
    let mut library = MaterialLibrary::new();
    let mut current: Option<(String, MaterialInfo)> = None;

    while let Some(line) = lines.next_line()? {
        let directive = line.directive();
        if directive == b"newmtl" {
            let name = line.rest();
            if name.is_empty() {
                return Err(ObjError::MissingMaterialName { line: line.number });
            }
            library.extend(current.take());
            current = Some((
                String::from_utf8_lossy(name).into_owned(),
                MaterialInfo::default(),
            ));
            continue;
        }
        if directive.starts_with(b"#") {
            continue;
        }

        let Some((_, material)) = current.as_mut() else {
            log::debug!(
                "Ignoring '{}' on line {} before the first newmtl",
                String::from_utf8_lossy(directive),
                line.number
            );
            continue;
        };

        let number = line.number;
        let mut fields = line.fields();
        match directive {
            b"Ka" => read_color(&line, "ambient color", &mut material.ambient)?,
            b"Kd" => read_color(&line, "diffuse color", &mut material.diffuse)?,
            b"Ks" => read_color(&line, "specular color", &mut material.specular)?,
            b"Tf" => read_color(&line, "transmission filter", &mut material.transmission)?,
            b"Ns" => material.specular_focus = next_number(&mut fields, number, "specular exponent")?,
            b"Ni" => {
                material.index_of_refraction =
                    next_number(&mut fields, number, "index of refraction")?
            }
            b"d" => {
                let mut fields = line.fields().skip_while(|f| *f == b"-halo");
                material.opacity = next_number(&mut fields, number, "dissolve")?
            }
            b"Tr" => {
                let transparency: f32 = next_number(&mut fields, number, "transparency")?;
                material.opacity = 1.0 - transparency;
            }
            b"illum" => material.illum_model = next_number(&mut fields, number, "illumination model")?,
            _ => {
                if let Some(kind) = map_kind(directive) {
                    // options such as `-bm 1` may precede the file name
                    let path = line
                        .fields()
                        .last()
                        .ok_or(ObjError::MissingField {
                            line: number,
                            what: "texture path",
                        })?;
                    material
                        .texture_maps
                        .insert(kind, PathBuf::from(String::from_utf8_lossy(path).into_owned()));
                }
            }
        }
    }

    // the last record has no following newmtl to commit it
    library.extend(current.take());
    Ok(library)
}

/// `K* r [g b]`, `K* xyz x [y z]` or `K* spectral file [factor]`. Missing
/// trailing components repeat the first. Spectral curves are not sampled, so
/// they leave `out` untouched.
fn read_color(line: &Line<'_>, what: &'static str, out: &mut Vec3) -> ObjResult<()> {
    let mut fields = line.fields().peekable();
    match fields.peek().copied() {
        Some(b"spectral") => {
            log::debug!("Ignoring spectral {} on line {}", what, line.number);
            return Ok(());
        }
        Some(b"xyz") => {
            fields.next();
        }
        _ => {}
    }
    let x: f32 = next_number(&mut fields, line.number, what)?;
    let y = match fields.next() {
        Some(field) => parse_number(field, line.number, what)?,
        None => x,
    };
    let z = match fields.next() {
        Some(field) => parse_number(field, line.number, what)?,
        None => y,
    };
    *out = Vec3::new(x, y, z);
    Ok(())
}

fn map_kind(directive: &[u8]) -> Option<MapKind> {
    match directive {
        b"map_Ka" => Some(MapKind::Ambient),
        b"map_Kd" => Some(MapKind::Diffuse),
        b"map_Ks" => Some(MapKind::Specular),
        b"map_Bump" | b"map_bump" | b"bump" => Some(MapKind::Bump),
        b"map_d" => Some(MapKind::Opacity),
        _ => None,
    }
}
