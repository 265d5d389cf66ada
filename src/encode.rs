//! The two payload encoders behind one contract.
//!
//! An [`Encoder`] accepts vertex rows and face index triples and accumulates
//! them into two payload blocks, one for the vertex element and one for the
//! face element. The trait is implemented exactly twice: [`AsciiEncoder`]
//! and [`BinaryEncoder`]. The variant is chosen once per export and the
//! per-element loops are generic over it, so there is no per-vertex format
//! branching.

use std::ops;

use byteorder::{ByteOrder, LittleEndian};
use derive_more::{Add, AddAssign, From};

use crate::{
    error::Error,
    schema::{CompiledSchema, ScalarLen, ScalarType, FACE_SIZE},
};


/// The encoded vertex and face blocks of one export.
///
/// For the ASCII variant these hold newline-joined text; for the binary
/// variant they are the untouched pre-sized buffers (no copy, no trimming).
#[derive(Debug)]
pub struct Payloads {
    pub vertex: Vec<u8>,
    pub face: Vec<u8>,
}

/// A sink for encoded vertex rows and faces.
///
/// Row values arrive as `f64` and are narrowed to each property's scalar
/// type by the encoder (the ASCII variant just prints them). Faces are
/// always triangles; their indices must already be offset for multi-mesh
/// concatenation.
pub trait Encoder {
    fn append_vertex(&mut self, row: &[f64]) -> Result<(), Error>;

    fn append_face(&mut self, indices: [u32; 3]) -> Result<(), Error>;

    /// Consumes the encoder and hands out both payload blocks.
    fn into_payloads(self) -> Payloads;
}


// ===============================================================================================
// ===== ASCII encoding
// ===============================================================================================

/// Accumulates vertex and face lines as text.
///
/// Values are formatted with the `Display` impl of `f64`: whole numbers
/// print without a fractional part, everything else with the shortest
/// round-tripping representation. No further rounding or padding is applied.
#[derive(Debug, Default)]
pub struct AsciiEncoder {
    vertex_lines: Vec<String>,
    face_lines: Vec<String>,
}

impl AsciiEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder for AsciiEncoder {
    fn append_vertex(&mut self, row: &[f64]) -> Result<(), Error> {
        let line = row.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.vertex_lines.push(line);
        Ok(())
    }

    fn append_face(&mut self, [a, b, c]: [u32; 3]) -> Result<(), Error> {
        self.face_lines.push(format!("3 {} {} {}", a, b, c));
        Ok(())
    }

    fn into_payloads(self) -> Payloads {
        Payloads {
            vertex: join_lines(self.vertex_lines),
            face: join_lines(self.face_lines),
        }
    }
}

fn join_lines(lines: Vec<String>) -> Vec<u8> {
    (lines.join("\n") + "\n").into_bytes()
}


// ===============================================================================================
// ===== Binary little endian encoding
// ===============================================================================================

/// A byte offset into a pre-sized payload buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Add, AddAssign, From)]
struct ByteOffset(u32);

impl ByteOffset {
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl ops::Add<ScalarLen> for ByteOffset {
    type Output = ByteOffset;
    fn add(self, len: ScalarLen) -> Self::Output {
        ByteOffset(self.0 + len.as_u8() as u32)
    }
}

impl ops::AddAssign<ScalarLen> for ByteOffset {
    fn add_assign(&mut self, rhs: ScalarLen) {
        *self = *self + rhs;
    }
}

/// Writes vertices and faces into two fixed-size little endian buffers.
///
/// Both buffers are allocated up front from the compiled schema and the
/// element counts, so encoding never reallocates and the payload size is
/// known before the first element is written. Appending more elements than
/// the buffers were sized for is a caller contract violation and panics.
#[derive(Debug)]
pub struct BinaryEncoder {
    /// Resolved type of each vertex property, in byte order. Unresolved
    /// types occupy no bytes (see `append_vertex`).
    types: Vec<Option<ScalarType>>,
    vertex: Vec<u8>,
    voffset: ByteOffset,
    face: Vec<u8>,
    foffset: ByteOffset,
}

impl BinaryEncoder {
    pub fn new(schema: &CompiledSchema, nverts: u32, nfaces: u32) -> Self {
        Self {
            types: schema.vertex_properties.iter().map(|p| p.scalar).collect(),
            vertex: vec![0; nverts as usize * schema.vertex_size as usize],
            voffset: ByteOffset(0),
            face: vec![0; nfaces as usize * schema.face_size as usize],
            foffset: ByteOffset(0),
        }
    }
}

impl Encoder for BinaryEncoder {
    fn append_vertex(&mut self, row: &[f64]) -> Result<(), Error> {
        if row.len() != self.types.len() {
            return Err(Error::RowArityMismatch {
                expected: self.types.len(),
                got: row.len(),
            });
        }

        for (ty, &value) in self.types.iter().zip(row) {
            if let Some(ty) = *ty {
                write_scalar(&mut self.vertex, self.voffset, ty, value);
                self.voffset += ty.len();
            }
            // Unresolved types contribute no bytes; the cursor stays put.
        }

        Ok(())
    }

    fn append_face(&mut self, [a, b, c]: [u32; 3]) -> Result<(), Error> {
        let at = self.foffset.as_usize();
        self.face[at] = 3;
        LittleEndian::write_u32(&mut self.face[at + 1..at + 5], a);
        LittleEndian::write_u32(&mut self.face[at + 5..at + 9], b);
        LittleEndian::write_u32(&mut self.face[at + 9..at + 13], c);
        self.foffset += ByteOffset(FACE_SIZE);
        Ok(())
    }

    fn into_payloads(self) -> Payloads {
        Payloads {
            vertex: self.vertex,
            face: self.face,
        }
    }
}

/// Writes `value` at `at`, narrowed to `ty`.
///
/// The `as` casts saturate on overflow and truncate fractions, which is what
/// a `DataView`-style byte writer does as well.
fn write_scalar(buf: &mut [u8], at: ByteOffset, ty: ScalarType, value: f64) {
    let at = at.as_usize();
    match ty {
        ScalarType::Char => buf[at] = (value as i8) as u8,
        ScalarType::UChar => buf[at] = value as u8,
        ScalarType::Short => LittleEndian::write_i16(&mut buf[at..at + 2], value as i16),
        ScalarType::UShort => LittleEndian::write_u16(&mut buf[at..at + 2], value as u16),
        ScalarType::Int => LittleEndian::write_i32(&mut buf[at..at + 4], value as i32),
        ScalarType::UInt => LittleEndian::write_u32(&mut buf[at..at + 4], value as u32),
        ScalarType::Float => LittleEndian::write_f32(&mut buf[at..at + 4], value as f32),
        ScalarType::Double => LittleEndian::write_f64(&mut buf[at..at + 8], value),
    }
}


// ===============================================================================================
// ===== Tests
// ===============================================================================================
