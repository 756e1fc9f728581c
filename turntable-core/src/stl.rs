/// STL import (binary and ASCII) into flat-shaded `MeshData`
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::opt,
    multi::many0,
    number::complete::float,
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::error::{PipelineError, Result};
use crate::math::{Vec3, EPSILON};
use crate::mesh::MeshData;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// A facet as stored in the file: normal plus three corners
type Facet = (Vec3, [Vec3; 3]);

fn unavailable(msg: impl Into<String>) -> PipelineError {
    PipelineError::ResourceUnavailable(msg.into())
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<MeshData> {
    if data.len() < HEADER_LEN + 4 {
        return Err(unavailable("file too small to be a binary STL"));
    }

    let count_bytes: [u8; 4] = data[HEADER_LEN..HEADER_LEN + 4]
        .try_into()
        .map_err(|_| unavailable("truncated triangle count"))?;
    let facet_count = u32::from_le_bytes(count_bytes) as usize;

    let body = &data[HEADER_LEN + 4..];
    if body.len() < facet_count * FACET_LEN {
        return Err(unavailable(format!(
            "header promises {} facets but only {} bytes follow",
            facet_count,
            body.len()
        )));
    }

    let mut mesh = MeshData::with_capacity(facet_count * 3, facet_count * 3);
    for record in body.chunks_exact(FACET_LEN).take(facet_count) {
        // 12 little-endian floats, then a 2-byte attribute count
        let mut floats = record[..48]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]));
        let mut next = || {
            Vec3::new(
                floats.next().unwrap_or(0.0),
                floats.next().unwrap_or(0.0),
                floats.next().unwrap_or(0.0),
            )
        };
        let normal = next();
        let corners = [next(), next(), next()];
        push_facet(&mut mesh, (normal, corners));
    }

    Ok(mesh)
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<MeshData> {
    let (_, facets) =
        solid(input).map_err(|e| unavailable(format!("malformed ASCII STL: {:?}", e)))?;

    let mut mesh = MeshData::with_capacity(facets.len() * 3, facets.len() * 3);
    for facet in facets {
        push_facet(&mut mesh, facet);
    }
    Ok(mesh)
}

/// Detect the flavour and parse. Binary files may also start with "solid",
/// so a failed ASCII parse falls through to binary.
pub fn parse_stl(data: &[u8]) -> Result<MeshData> {
    if data.starts_with(b"solid") {
        if let Ok(mesh) = std::str::from_utf8(data)
            .map_err(|e| unavailable(e.to_string()))
            .and_then(parse_ascii_stl)
        {
            return Ok(mesh);
        }
    }
    parse_binary_stl(data)
}

/// Stored normals are often zero; fall back to the winding normal.
fn push_facet(mesh: &mut MeshData, (normal, corners): Facet) {
    let normal = normal.try_normalize(EPSILON).unwrap_or_else(|| {
        (corners[1] - corners[0])
            .cross(&(corners[2] - corners[0]))
            .try_normalize(EPSILON)
            .unwrap_or_else(Vec3::zeros)
    });
    mesh.push_flat_triangle(corners, normal);
}

fn solid(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = opt(not_line_ending)(input)?;
    let (input, facets) = many0(facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, facets))
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(multispace0, tag(word))
}

fn facet(input: &str) -> IResult<&str, Facet> {
    let (input, normal) = preceded(tuple((keyword("facet"), keyword("normal"))), vector)(input)?;
    let (input, _) = tuple((keyword("outer"), keyword("loop")))(input)?;
    let (input, (a, b, c)) = tuple((vertex, vertex, vertex))(input)?;
    let (input, _) = terminated(keyword("endloop"), keyword("endfacet"))(input)?;
    Ok((input, (normal, [a, b, c])))
}

fn vertex(input: &str) -> IResult<&str, Vec3> {
    preceded(keyword("vertex"), vector)(input)
}

fn vector(input: &str) -> IResult<&str, Vec3> {
    let (input, (x, y, z)) = tuple((
        preceded(multispace1, float),
        preceded(multispace1, float),
        preceded(multispace1, float),
    ))(input)?;
    Ok((input, Vec3::new(x, y, z)))
}
