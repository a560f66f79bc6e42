//! OBJ directive dispatch: turns lines into a [`RawMesh`].
//!
//! Directives are keyed by the first two bytes of the line. Supported:
//! `v`, `vn`, `vt`, `f` (triangles and quads), `g`, `usemtl`, `mtllib`.
//! `vp`, comments and anything unrecognised are skipped.

use std::{io::BufRead, str::FromStr};

use glam::{Vec2, Vec3};

use crate::{
    error::{ObjError, ObjResult},
    mesh::{FaceCorner, GroupInfo, RawMesh},
    reader::{Line, LineReader},
};

/// Parse a whole OBJ stream. Any error aborts the read.
pub fn parse_obj<R: BufRead>(reader: R) -> ObjResult<RawMesh> {
    let mut lines = LineReader::new(reader);
    let mut mesh = RawMesh::new();
    let mut groups = GroupTracker::default();
    let mut face = [FaceCorner::default(); 4];

    while let Some(line) = lines.next_line()? {
        match &line.key() {
            b"v " => mesh.push_position(read_vec3(&line, "vertex position")?),
            b"vn" => mesh.push_normal(read_vec3(&line, "vertex normal")?),
            b"vt" => mesh.push_tex_coord(read_vec2(&line, "texture coordinate")?),
            b"vp" | b"# " => {}
            b"f " => {
                let count = read_face(&line, &mesh, &mut face)?;
                let offset = corner_count(&mesh)?;
                groups.handle(GroupEvent::Face, offset);

                mesh.push_corner(face[0]);
                mesh.push_corner(face[1]);
                mesh.push_corner(face[2]);
                if count == 4 {
                    // fan from the first vertex keeps the winding
                    mesh.push_corner(face[0]);
                    mesh.push_corner(face[2]);
                    mesh.push_corner(face[3]);
                }
            }
            b"g " => {
                let offset = corner_count(&mesh)?;
                groups.handle(GroupEvent::Group(line.rest()), offset);
            }
            _ => match line.directive() {
                b"usemtl" => groups.use_material(line.rest()),
                b"mtllib" => {
                    for name in line.fields() {
                        mesh.push_material_library(String::from_utf8_lossy(name).into_owned());
                    }
                }
                _ => {}
            },
        }
    }

    let total = corner_count(&mesh)?;
    mesh.set_groups(groups.finish(total));
    Ok(mesh)
}

fn corner_count(mesh: &RawMesh) -> ObjResult<u32> {
    u32::try_from(mesh.corners().len()).map_err(|_| ObjError::TooManyCorners)
}

/// Parse a number out of a field slice without allocating.
pub(crate) fn parse_number<T: FromStr>(
    field: &[u8],
    line: usize,
    what: &'static str,
) -> ObjResult<T> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ObjError::InvalidNumber {
            line,
            what,
            text: String::from_utf8_lossy(field).into_owned(),
        })
}

pub(crate) fn next_number<'a, T: FromStr>(
    fields: &mut impl Iterator<Item = &'a [u8]>,
    line: usize,
    what: &'static str,
) -> ObjResult<T> {
    let field = fields.next().ok_or(ObjError::MissingField { line, what })?;
    parse_number(field, line, what)
}

fn read_vec3(line: &Line<'_>, what: &'static str) -> ObjResult<Vec3> {
    let mut fields = line.fields();
    let x = next_number(&mut fields, line.number, what)?;
    let y = next_number(&mut fields, line.number, what)?;
    let z = next_number(&mut fields, line.number, what)?;
    Ok(Vec3::new(x, y, z))
}

fn read_vec2(line: &Line<'_>, what: &'static str) -> ObjResult<Vec2> {
    let mut fields = line.fields();
    let u = next_number(&mut fields, line.number, what)?;
    let v = next_number(&mut fields, line.number, what)?;
    Ok(Vec2::new(u, v))
}

/// Fill `out` with the face's corners and return how many there are (3 or 4).
fn read_face(line: &Line<'_>, mesh: &RawMesh, out: &mut [FaceCorner; 4]) -> ObjResult<usize> {
    let mut count = 0;
    for field in line.fields() {
        if count < out.len() {
            out[count] = read_corner(field, line.number, mesh)?;
        }
        count += 1;
    }
    if !(3..=4).contains(&count) {
        return Err(ObjError::UnsupportedFace {
            line: line.number,
            count,
        });
    }
    Ok(count)
}

/// Parse `p`, `p/t`, `p//n` or `p/t/n`. Omitted attributes map to the sentinel.
fn read_corner(field: &[u8], line: usize, mesh: &RawMesh) -> ObjResult<FaceCorner> {
    let mut parts = field.split(|&b| b == b'/');
    let position = parts.next().unwrap_or_default();
    let tex_coord = parts.next().unwrap_or_default();
    let normal = parts.next().unwrap_or_default();
    if position.is_empty() || parts.next().is_some() {
        return Err(ObjError::MalformedCorner {
            line,
            text: String::from_utf8_lossy(field).into_owned(),
        });
    }

    Ok(FaceCorner {
        position: resolve_index(position, mesh.position_count(), "position", line)?,
        tex_coord: optional_index(tex_coord, mesh.tex_coord_count(), "texture coordinate", line)?,
        normal: optional_index(normal, mesh.normal_count(), "normal", line)?,
    })
}

fn optional_index(text: &[u8], len: usize, attribute: &'static str, line: usize) -> ObjResult<u32> {
    if text.is_empty() {
        return Ok(0);
    }
    resolve_index(text, len, attribute, line)
}

/// Turn an OBJ index into an absolute 1-based one. Negative indices count back
/// from the last attribute of that kind defined so far.
fn resolve_index(text: &[u8], len: usize, attribute: &'static str, line: usize) -> ObjResult<u32> {
    let raw: i64 = parse_number(text, line, "face index")?;
    let index = match raw {
        0 => return Err(ObjError::ZeroIndex { line }),
        i if i > 0 => i,
        i => len as i64 + 1 + i,
    };
    let out_of_range = || ObjError::IndexOutOfRange {
        line,
        attribute,
        index: raw,
        len,
    };
    if index < 1 || index > len as i64 {
        return Err(out_of_range());
    }
    u32::try_from(index).map_err(|_| out_of_range())
}

/// Whether a `g` directive is still waiting for its first face.
#[derive(Debug, Default)]
enum GroupState {
    #[default]
    Idle,
    Pending(GroupInfo),
}

#[derive(Debug, Clone, Copy)]
enum GroupEvent<'a> {
    Group(&'a [u8]),
    Face,
    EndOfInput,
}

/// Group bookkeeping. A group is only kept once a face follows its `g`
/// directive; a pending group is dropped when another `g` or the end of
/// input arrives first.
#[derive(Debug, Default)]
struct GroupTracker {
    state: GroupState,
    groups: Vec<GroupInfo>,
    unnamed: u32,
    material: Option<String>,
}

impl GroupTracker {
    fn handle(&mut self, event: GroupEvent<'_>, offset: u32) {
        match (std::mem::take(&mut self.state), event) {
            // confirm
            (GroupState::Pending(mut group), GroupEvent::Face) => {
                group.material = self.material.clone();
                self.groups.push(group);
            }
            (GroupState::Idle, GroupEvent::Face | GroupEvent::EndOfInput) => {}
            // replace
            (previous, GroupEvent::Group(name)) => {
                if let GroupState::Pending(empty) = previous {
                    log::debug!("Dropping group '{}' with no faces", empty.name);
                }
                let group = self.open(name, offset);
                self.state = GroupState::Pending(group);
            }
            // retract
            (GroupState::Pending(empty), GroupEvent::EndOfInput) => {
                log::debug!("Dropping trailing group '{}' with no faces", empty.name);
            }
        }
    }

    fn open(&mut self, name: &[u8], offset: u32) -> GroupInfo {
        let name = if name.is_empty() {
            self.unnamed += 1;
            format!("group{}", self.unnamed)
        } else {
            String::from_utf8_lossy(name).into_owned()
        };
        GroupInfo {
            name,
            material: None,
            start_offset: offset,
            count: 0,
        }
    }

    fn use_material(&mut self, name: &[u8]) {
        self.material = (!name.is_empty()).then(|| String::from_utf8_lossy(name).into_owned());
    }

    /// Close the stream and fill in every group's count from its successor.
    fn finish(mut self, total: u32) -> Vec<GroupInfo> {
        self.handle(GroupEvent::EndOfInput, total);
        let mut end = total;
        for group in self.groups.iter_mut().rev() {
            group.count = end - group.start_offset;
            end = group.start_offset;
        }
        self.groups
    }
}
