//! Vertex attribute schemas and their compilation into a fixed property
//! layout.
//!
//! An export request carries a list of [`VertexAttribute`]s. Compiling that
//! list yields a [`CompiledSchema`]: the full ordered vertex property list
//! (always starting with the `x`/`y`/`z` position), the per-vertex byte size
//! and the fixed face descriptor. The compiled schema drives both the header
//! and the binary buffer layout, so its property order is significant and
//! never reordered.

use std::{fmt, str::FromStr};

use log::warn;


// ===============================================================================================
// ===== Scalar types and their byte widths
// ===============================================================================================

/// Length of a PLY scalar value in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarLen {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl ScalarLen {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn as_u32(&self) -> u32 {
        *self as u32
    }
}

/// A primitive PLY type. There are 8 in total: 2 floating point types, 3
/// signed and 3 unsigned integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Char,
    Short,
    Int,
    UChar,
    UShort,
    UInt,
    Float,
    Double,
}

impl ScalarType {
    /// Returns the number of bytes this type occupies.
    pub fn len(&self) -> ScalarLen {
        match self {
            ScalarType::Char => ScalarLen::One,
            ScalarType::Short => ScalarLen::Two,
            ScalarType::Int => ScalarLen::Four,
            ScalarType::UChar => ScalarLen::One,
            ScalarType::UShort => ScalarLen::Two,
            ScalarType::UInt => ScalarLen::Four,
            ScalarType::Float => ScalarLen::Four,
            ScalarType::Double => ScalarLen::Eight,
        }
    }

    /// Returns the canonical type name used in PLY headers (e.g. `short` for
    /// `i16`). This is simply the variant name in lowercase.
    pub fn ply_type_name(&self) -> &'static str {
        match self {
            ScalarType::Char => "char",
            ScalarType::Short => "short",
            ScalarType::Int => "int",
            ScalarType::UChar => "uchar",
            ScalarType::UShort => "ushort",
            ScalarType::UInt => "uint",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }
}

/// The error emitted when the `FromStr` implementation for `ScalarType`
/// cannot parse the given string.
pub struct ScalarTypeParseError(String);

impl fmt::Display for ScalarTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\" is not a valid PLY scalar type", self.0)
    }
}

impl fmt::Debug for ScalarTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for ScalarType {
    type Err = ScalarTypeParseError;

    /// Parses a scalar type token. Both the canonical PLY names (`uchar`,
    /// `float`, ...) and the sized aliases (`uint8`, `float32`, ...) are
    /// accepted, matching what common PLY tooling emits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "char" | "int8" => Ok(ScalarType::Char),
            "short" | "int16" => Ok(ScalarType::Short),
            "int" | "int32" => Ok(ScalarType::Int),
            "uchar" | "uint8" => Ok(ScalarType::UChar),
            "ushort" | "uint16" => Ok(ScalarType::UShort),
            "uint" | "uint32" => Ok(ScalarType::UInt),
            "float" | "float32" => Ok(ScalarType::Float),
            "double" | "float64" => Ok(ScalarType::Double),
            other => Err(ScalarTypeParseError(other.to_string())),
        }
    }
}


// ===============================================================================================
// ===== Vertex attributes
// ===============================================================================================

/// How a property derives its scalar from the per-vertex source value.
///
/// The source value of an attribute is a small slice of `f64` components
/// (`stride` many, see [`VertexAttribute`]). Each property picks or computes
/// one scalar from it.
#[derive(Debug, Clone, Copy)]
pub enum Convert {
    /// Forward component `i` of the source value unchanged.
    Identity(usize),

    /// Component `i` scaled from `[0.0, 1.0]` to `0..=255` and truncated.
    /// Used for color channels: `1.0` maps to `255`, `0.5` to `127`.
    UnitToByte(usize),

    /// An arbitrary mapping over the whole source value.
    Custom(fn(&[f64]) -> f64),
}

impl Convert {
    pub fn apply(&self, value: &[f64]) -> f64 {
        match *self {
            Convert::Identity(i) => value[i],
            Convert::UnitToByte(i) => (value[i] * 255.0).floor(),
            Convert::Custom(f) => f(value),
        }
    }
}

/// One scalar property contributed by a vertex attribute.
///
/// The type is kept as the raw token from the header vocabulary instead of a
/// [`ScalarType`] so that misconfigured attributes survive until schema
/// compilation, where they are reported and degraded instead of being
/// unrepresentable.
#[derive(Debug, Clone)]
pub struct AttributeProperty {
    pub name: String,
    pub ty: String,
    pub convert: Convert,
}

impl AttributeProperty {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, convert: Convert) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            convert,
        }
    }
}

/// One named vertex attribute: an ordered list of scalar properties fed from
/// a per-vertex source value.
///
/// `stride` is the number of `f64` components each per-vertex source value
/// holds. It usually, but not necessarily, equals the property count: the
/// predefined color attribute reads three source components into three
/// properties, while a custom attribute may compute several properties from
/// one component or vice versa.
#[derive(Debug, Clone)]
pub struct VertexAttribute {
    /// Name of the per-vertex source value this attribute reads, used by the
    /// [`MeshSource`][crate::scene::MeshSource] to look up its data.
    pub name: String,
    pub stride: usize,
    pub properties: Vec<AttributeProperty>,
}

impl VertexAttribute {
    /// Per-vertex RGB color: three `uchar` properties `red`/`green`/`blue`,
    /// fed from a `[0.0, 1.0]` float triple.
    pub fn rgb_color() -> Self {
        Self {
            name: "color".to_string(),
            stride: 3,
            properties: vec![
                AttributeProperty::new("red", "uchar", Convert::UnitToByte(0)),
                AttributeProperty::new("green", "uchar", Convert::UnitToByte(1)),
                AttributeProperty::new("blue", "uchar", Convert::UnitToByte(2)),
            ],
        }
    }

    /// Per-vertex object id: a single `uint16` property `objectId`.
    pub fn object_id() -> Self {
        Self::id_attribute("Object", "objectId")
    }

    /// Per-vertex segment id: a single `uint16` property `segmentId`.
    pub fn segment_id() -> Self {
        Self::id_attribute("Segment", "segmentId")
    }

    /// Per-vertex category id: a single `uint16` property `categoryId`.
    pub fn category_id() -> Self {
        Self::id_attribute("Category", "categoryId")
    }

    /// Per-vertex label id: a single `uint16` property `labelId`.
    pub fn label_id() -> Self {
        Self::id_attribute("Label", "labelId")
    }

    // The segmentation attributes all look the same: one id stored verbatim.
    // Source names are capitalized, property names are not.
    fn id_attribute(source: &str, property: &str) -> Self {
        Self {
            name: source.to_string(),
            stride: 1,
            properties: vec![
                AttributeProperty::new(property, "uint16", Convert::Identity(0)),
            ],
        }
    }
}


// ===============================================================================================
// ===== The compiled schema
// ===============================================================================================

/// Number of bytes of one encoded face: one `uchar` list length plus three
/// `int` indices. Faces are always triangles.
pub const FACE_SIZE: u32 = 1 + 3 * 4;

/// The header definition of one property, with its type resolved.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,

    /// The raw type token exactly as it appears in the header.
    pub ty: String,

    /// The resolved scalar type, or `None` if the token is not a known
    /// scalar type (which includes the face element's `list ...` token).
    pub scalar: Option<ScalarType>,
}

impl PropertyDef {
    /// The byte width of this property; 0 if the type is unresolved.
    pub fn size(&self) -> u32 {
        self.scalar.map(|ty| ty.len().as_u32()).unwrap_or(0)
    }
}

/// The full property layout of one export: derived once per export call from
/// the requested vertex attributes, immutable afterwards.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    /// All vertex properties in declaration and byte order: `x`, `y`, `z`,
    /// then each requested attribute's properties in request order.
    pub vertex_properties: Vec<PropertyDef>,

    /// Sum of the resolved vertex property sizes in bytes.
    pub vertex_size: u32,

    /// Always the single fixed `vertex_indices` list descriptor.
    pub face_properties: Vec<PropertyDef>,

    /// Always [`FACE_SIZE`]; only used for sizing binary buffers.
    pub face_size: u32,
}

/// Compiles the requested vertex attributes into the full property layout.
///
/// A property whose type token cannot be resolved is still declared (the
/// header will contain its raw token), but contributes 0 bytes to
/// `vertex_size` and a warning is logged. Such a schema produces binary files
/// whose header lies about the layout, so callers are expected to only pass
/// resolvable types; the degraded path exists to make the failure visible
/// instead of corrupting neighboring properties.
pub fn compile(attributes: &[VertexAttribute]) -> CompiledSchema {
    let mut vertex_properties = vec![
        resolved_def("x", "float"),
        resolved_def("y", "float"),
        resolved_def("z", "float"),
    ];

    for attribute in attributes {
        for property in &attribute.properties {
            vertex_properties.push(resolved_def(&property.name, &property.ty));
        }
    }

    let vertex_size = vertex_properties.iter().map(|p| p.size()).sum();

    let face_properties = vec![PropertyDef {
        name: "vertex_indices".to_string(),
        ty: "list uchar int".to_string(),
        scalar: None,
    }];

    CompiledSchema {
        vertex_properties,
        vertex_size,
        face_properties,
        face_size: FACE_SIZE,
    }
}

fn resolved_def(name: &str, ty: &str) -> PropertyDef {
    let scalar = ty.parse::<ScalarType>().ok();
    if scalar.is_none() {
        warn!("no size for property `{}` of type `{}`", name, ty);
    }

    PropertyDef {
        name: name.to_string(),
        ty: ty.to_string(),
        scalar,
    }
}


// ===============================================================================================
// ===== Tests
// ===============================================================================================
