//! CGNS: data model and IO for the subset of the CGNS SIDS hierarchy the
//! viewer consumes: `root -> bases -> zones -> gridCoordinates -> dataArrays`.
//!
//! Files are stored in a compact little-endian container of that hierarchy.
//! Full ADF/HDF5 parsing is out of scope; this crate is the in-workspace
//! parsing collaborator, the same way `hypc` serves the holographic viewer.
//!
//! File layout (little-endian; all names are 32-byte zero-padded UTF-8,
//! matching the SIDS 32-character name limit):
//!   00  : [u8;4]  magic = b"CGNS"
//!   04  : u32     version = 1
//!   08  : u32     base_count
//!   per base:
//!     [u8;32] name
//!     u32     cell_dimension
//!     u32     physical_dimension
//!     u32     zone_count
//!     per zone:
//!       u8      kind (1 = structured, 2 = unstructured)
//!       [u8;32] name
//!       structured:   u64[3] vertex_counts, u64[3] cell_counts
//!       unstructured: u64    vertex_count,  u64    cell_count
//!       u32     grid_coordinates_count
//!       per grid coordinates node:
//!         [u8;32] name
//!         u32     data_array_count
//!         per data array:
//!           [u8;2]  data type tag (b"R4" or b"R8")
//!           [u8;32] name
//!           u64     value_count
//!           value_count * 4 (R4) or * 8 (R8) bytes of payload
//!     u32     family_count
//!     per family: [u8;32] name

use std::fs::File;
use std::io::{self, ErrorKind, Write};
use std::path::Path;

pub const CGNS_MAGIC: [u8; 4] = *b"CGNS";
pub const CGNS_VERSION: u32 = 1;

/// Maximum node name length, per the SIDS naming conventions.
pub const NAME_LEN: usize = 32;

/// Top-level container of a CGNS file.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub bases: Vec<Base>,
}

/// A CGNS base: zones plus family metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Base {
    pub name: String,
    pub cell_dimension: u32,
    pub physical_dimension: u32,
    pub zones: Vec<Zone>,
    pub families: Vec<Family>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Family {
    pub name: String,
}

/// Closed sum over the zone kinds the SIDS defines. Consumers dispatch with
/// an exhaustive match; there is no catch-all kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Zone {
    Structured(StructuredZone),
    Unstructured(UnstructuredZone),
}

impl Zone {
    pub fn name(&self) -> &str {
        match self {
            Zone::Structured(z) => &z.name,
            Zone::Unstructured(z) => &z.name,
        }
    }

    pub fn grid_coordinates(&self) -> &[GridCoordinates] {
        match self {
            Zone::Structured(z) => &z.grid_coordinates,
            Zone::Unstructured(z) => &z.grid_coordinates,
        }
    }
}

/// A grid-indexed zone. `vertex_counts`/`cell_counts` hold the per-index
/// dimensions (i, j, k).
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredZone {
    pub name: String,
    pub vertex_counts: [u64; 3],
    pub cell_counts: [u64; 3],
    pub grid_coordinates: Vec<GridCoordinates>,
}

/// An element-connectivity-indexed zone. Connectivity itself is not stored;
/// the viewer only consumes grid coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct UnstructuredZone {
    pub name: String,
    pub vertex_count: u64,
    pub cell_count: u64,
    pub grid_coordinates: Vec<GridCoordinates>,
}

/// A `GridCoordinates_t` node: one data array per coordinate component.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCoordinates {
    pub name: String,
    pub data_arrays: Vec<DataArray>,
}

/// A coordinate data array in one of the two SIDS floating-point types.
#[derive(Debug, Clone, PartialEq)]
pub enum DataArray {
    Real32 { name: String, data: Vec<f32> },
    Real64 { name: String, data: Vec<f64> },
}

impl DataArray {
    pub fn name(&self) -> &str {
        match self {
            DataArray::Real32 { name, .. } => name,
            DataArray::Real64 { name, .. } => name,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DataArray::Real32 { data, .. } => data.len(),
            DataArray::Real64 { data, .. } => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index`, widened to f64. Panics if out of bounds, like
    /// slice indexing; callers are expected to have checked `len`.
    pub fn value(&self, index: usize) -> f64 {
        match self {
            DataArray::Real32 { data, .. } => data[index] as f64,
            DataArray::Real64 { data, .. } => data[index],
        }
    }
}

#[inline(always)]
fn need(buf: &[u8], want: usize) -> io::Result<()> {
    if buf.len() < want {
        Err(io::Error::new(ErrorKind::UnexpectedEof, "truncated CGNS container"))
    } else {
        Ok(())
    }
}

#[inline(always)]
fn take<'a>(buf: &mut &'a [u8], n: usize) -> io::Result<&'a [u8]> {
    need(buf, n)?;
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

#[inline(always)]
fn le_u8(buf: &mut &[u8]) -> io::Result<u8> {
    Ok(take(buf, 1)?[0])
}

#[inline(always)]
fn le_u32(buf: &mut &[u8]) -> io::Result<u32> {
    let b = take(buf, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

#[inline(always)]
fn le_u64(buf: &mut &[u8]) -> io::Result<u64> {
    let b = take(buf, 8)?;
    Ok(u64::from_le_bytes([
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
    ]))
}

#[cold]
fn bad(msg: &str) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, msg)
}

fn read_name(buf: &mut &[u8]) -> io::Result<String> {
    let raw = take(buf, NAME_LEN)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    std::str::from_utf8(&raw[..end])
        .map(str::to_owned)
        .map_err(|_| bad("node name is not valid UTF-8"))
}

fn read_data_array(buf: &mut &[u8]) -> io::Result<DataArray> {
    let tag = take(buf, 2)?;
    let name = read_name(buf)?;
    let count = le_u64(buf)? as usize;

    match tag {
        b"R4" => {
            let bytes = count
                .checked_mul(4)
                .ok_or_else(|| bad("data array size overflow"))?;
            let raw = take(buf, bytes)?;
            let mut data = Vec::<f32>::with_capacity(count);
            for chunk in raw.chunks_exact(4) {
                data.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
            }
            Ok(DataArray::Real32 { name, data })
        }
        b"R8" => {
            let bytes = count
                .checked_mul(8)
                .ok_or_else(|| bad("data array size overflow"))?;
            let raw = take(buf, bytes)?;
            let mut data = Vec::<f64>::with_capacity(count);
            for chunk in raw.chunks_exact(8) {
                data.push(f64::from_le_bytes([
                    chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
                ]));
            }
            Ok(DataArray::Real64 { name, data })
        }
        _ => Err(bad("unknown data array type tag")),
    }
}

fn read_grid_coordinates(buf: &mut &[u8]) -> io::Result<GridCoordinates> {
    let name = read_name(buf)?;
    let array_count = le_u32(buf)? as usize;

    let mut data_arrays = Vec::with_capacity(array_count.min(8));
    for _ in 0..array_count {
        data_arrays.push(read_data_array(buf)?);
    }

    Ok(GridCoordinates { name, data_arrays })
}

fn read_zone(buf: &mut &[u8]) -> io::Result<Zone> {
    let kind = le_u8(buf)?;
    let name = read_name(buf)?;

    match kind {
        1 => {
            let vertex_counts = [le_u64(buf)?, le_u64(buf)?, le_u64(buf)?];
            let cell_counts = [le_u64(buf)?, le_u64(buf)?, le_u64(buf)?];
            let gc_count = le_u32(buf)? as usize;

            let mut grid_coordinates = Vec::with_capacity(gc_count.min(8));
            for _ in 0..gc_count {
                grid_coordinates.push(read_grid_coordinates(buf)?);
            }

            Ok(Zone::Structured(StructuredZone {
                name,
                vertex_counts,
                cell_counts,
                grid_coordinates,
            }))
        }
        2 => {
            let vertex_count = le_u64(buf)?;
            let cell_count = le_u64(buf)?;
            let gc_count = le_u32(buf)? as usize;

            let mut grid_coordinates = Vec::with_capacity(gc_count.min(8));
            for _ in 0..gc_count {
                grid_coordinates.push(read_grid_coordinates(buf)?);
            }

            Ok(Zone::Unstructured(UnstructuredZone {
                name,
                vertex_count,
                cell_count,
                grid_coordinates,
            }))
        }
        _ => Err(bad("unknown zone kind")),
    }
}

/// Parse a CGNS container from a contiguous byte slice. This is the single
/// source of truth for parsing.
pub fn parse_bytes(mut p: &[u8]) -> io::Result<Root> {
    if take(&mut p, 4)? != CGNS_MAGIC {
        return Err(bad("bad CGNS magic"));
    }

    let version = le_u32(&mut p)?;
    if version != CGNS_VERSION {
        return Err(bad("unsupported CGNS container version"));
    }

    let base_count = le_u32(&mut p)? as usize;
    let mut bases = Vec::with_capacity(base_count.min(8));

    for _ in 0..base_count {
        let name = read_name(&mut p)?;
        let cell_dimension = le_u32(&mut p)?;
        let physical_dimension = le_u32(&mut p)?;

        let zone_count = le_u32(&mut p)? as usize;
        let mut zones = Vec::with_capacity(zone_count.min(8));
        for _ in 0..zone_count {
            zones.push(read_zone(&mut p)?);
        }

        let family_count = le_u32(&mut p)? as usize;
        let mut families = Vec::with_capacity(family_count.min(8));
        for _ in 0..family_count {
            families.push(Family {
                name: read_name(&mut p)?,
            });
        }

        bases.push(Base {
            name,
            cell_dimension,
            physical_dimension,
            zones,
            families,
        });
    }

    if !p.is_empty() {
        return Err(bad("trailing bytes after last base"));
    }

    Ok(Root { bases })
}

/// Fast path: prefer mmap; fall back to a single read.
#[cfg(feature = "mmap")]
pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<Root> {
    let file = File::open(path)?;
    let map = unsafe { memmap2::MmapOptions::new().map(&file)? };
    parse_bytes(&map)
}

#[cfg(not(feature = "mmap"))]
pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<Root> {
    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes)
}

fn write_name<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    let bytes = name.as_bytes();
    if bytes.len() > NAME_LEN {
        return Err(bad("node name exceeds 32 bytes"));
    }
    w.write_all(bytes)?;
    w.write_all(&[0u8; NAME_LEN][..NAME_LEN - bytes.len()])
}

fn write_data_array<W: Write>(w: &mut W, array: &DataArray) -> io::Result<()> {
    match array {
        DataArray::Real32 { name, data } => {
            w.write_all(b"R4")?;
            write_name(w, name)?;
            write_u64(w, data.len() as u64)?;
            for v in data {
                w.write_all(&v.to_le_bytes())?;
            }
        }
        DataArray::Real64 { name, data } => {
            w.write_all(b"R8")?;
            write_name(w, name)?;
            write_u64(w, data.len() as u64)?;
            for v in data {
                w.write_all(&v.to_le_bytes())?;
            }
        }
    }
    Ok(())
}

fn write_grid_coordinates<W: Write>(w: &mut W, gc: &GridCoordinates) -> io::Result<()> {
    write_name(w, &gc.name)?;
    write_u32(w, gc.data_arrays.len() as u32)?;
    for array in &gc.data_arrays {
        write_data_array(w, array)?;
    }
    Ok(())
}

fn write_zone<W: Write>(w: &mut W, zone: &Zone) -> io::Result<()> {
    match zone {
        Zone::Structured(z) => {
            w.write_all(&[1u8])?;
            write_name(w, &z.name)?;
            for v in z.vertex_counts.iter().chain(z.cell_counts.iter()) {
                write_u64(w, *v)?;
            }
            write_u32(w, z.grid_coordinates.len() as u32)?;
            for gc in &z.grid_coordinates {
                write_grid_coordinates(w, gc)?;
            }
        }
        Zone::Unstructured(z) => {
            w.write_all(&[2u8])?;
            write_name(w, &z.name)?;
            write_u64(w, z.vertex_count)?;
            write_u64(w, z.cell_count)?;
            write_u32(w, z.grid_coordinates.len() as u32)?;
            for gc in &z.grid_coordinates {
                write_grid_coordinates(w, gc)?;
            }
        }
    }
    Ok(())
}

/// Serialize a root into any writer.
pub fn write_to<W: Write>(w: &mut W, root: &Root) -> io::Result<()> {
    w.write_all(&CGNS_MAGIC)?;
    write_u32(w, CGNS_VERSION)?;
    write_u32(w, root.bases.len() as u32)?;

    for base in &root.bases {
        write_name(w, &base.name)?;
        write_u32(w, base.cell_dimension)?;
        write_u32(w, base.physical_dimension)?;

        write_u32(w, base.zones.len() as u32)?;
        for zone in &base.zones {
            write_zone(w, zone)?;
        }

        write_u32(w, base.families.len() as u32)?;
        for family in &base.families {
            write_name(w, &family.name)?;
        }
    }

    Ok(())
}

pub fn write_file<P: AsRef<Path>>(path: P, root: &Root) -> io::Result<()> {
    let mut file = File::create(path)?;
    write_to(&mut file, root)?;
    file.flush()
}

#[inline]
fn write_u32<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

#[inline]
fn write_u64<W: Write>(w: &mut W, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_root() -> Root {
        Root {
            bases: vec![Base {
                name: "Base".into(),
                cell_dimension: 3,
                physical_dimension: 3,
                zones: vec![
                    Zone::Structured(StructuredZone {
                        name: "blk-1".into(),
                        vertex_counts: [2, 2, 1],
                        cell_counts: [1, 1, 0],
                        grid_coordinates: vec![GridCoordinates {
                            name: "GridCoordinates".into(),
                            data_arrays: vec![
                                DataArray::Real64 {
                                    name: "CoordinateX".into(),
                                    data: vec![0.0, 1.0, 0.0, 1.0],
                                },
                                DataArray::Real64 {
                                    name: "CoordinateY".into(),
                                    data: vec![0.0, 0.0, 1.0, 1.0],
                                },
                                DataArray::Real32 {
                                    name: "CoordinateZ".into(),
                                    data: vec![0.5, 0.5, 0.5, 0.5],
                                },
                            ],
                        }],
                    }),
                    Zone::Unstructured(UnstructuredZone {
                        name: "tet-region".into(),
                        vertex_count: 4,
                        cell_count: 1,
                        grid_coordinates: vec![],
                    }),
                ],
                families: vec![Family {
                    name: "wall".into(),
                }],
            }],
        }
    }

    fn encode(root: &Root) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_to(&mut bytes, root).unwrap();
        bytes
    }

    #[test]
    fn test_write_parse_round_trip() {
        let root = sample_root();
        let parsed = parse_bytes(&encode(&root)).unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn test_zone_accessors_dispatch_per_kind() {
        let root = sample_root();
        let zones = &root.bases[0].zones;
        assert_eq!(zones[0].name(), "blk-1");
        assert_eq!(zones[0].grid_coordinates().len(), 1);
        assert_eq!(zones[1].name(), "tet-region");
        assert!(zones[1].grid_coordinates().is_empty());
    }

    #[test]
    fn test_data_array_value_widens_both_types() {
        let array = DataArray::Real32 {
            name: "CoordinateX".into(),
            data: vec![1.5, -2.0],
        };
        assert_eq!(array.len(), 2);
        assert_eq!(array.value(0), 1.5);
        assert_eq!(array.value(1), -2.0);

        let array = DataArray::Real64 {
            name: "CoordinateY".into(),
            data: vec![3.25],
        };
        assert_eq!(array.value(0), 3.25);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = encode(&sample_root());
        bytes[0] = b'X';
        let err = parse_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_rejects_unsupported_version() {
        let mut bytes = encode(&sample_root());
        bytes[4] = 0xFF;
        let err = parse_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_rejects_unknown_zone_kind() {
        let mut bytes = encode(&sample_root());
        // First zone kind byte sits right after the base header.
        let kind_offset = 4 + 4 + 4 + NAME_LEN + 4 + 4 + 4;
        assert_eq!(bytes[kind_offset], 1);
        bytes[kind_offset] = 7;
        let err = parse_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_rejects_truncated_input() {
        let bytes = encode(&sample_root());
        let err = parse_bytes(&bytes[..bytes.len() - 5]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = encode(&sample_root());
        bytes.push(0);
        let err = parse_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_rejects_overlong_name_on_write() {
        let root = Root {
            bases: vec![Base {
                name: "x".repeat(NAME_LEN + 1),
                cell_dimension: 3,
                physical_dimension: 3,
                zones: vec![],
                families: vec![],
            }],
        };
        let mut bytes = Vec::new();
        assert!(write_to(&mut bytes, &root).is_err());
    }
}
