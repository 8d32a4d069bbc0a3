//! KF format constants: primitive tags, chunk header layout and chunk IDs.

/// 64-bit signed integer, 8 bytes.
pub const TAG_I64: u8 = 0x00;
/// 64-bit unsigned integer, 8 bytes.
pub const TAG_U64: u8 = 0x01;
/// 32-bit signed integer, 4 bytes.
pub const TAG_I32: u8 = 0x02;
/// 32-bit unsigned integer, 4 bytes.
pub const TAG_U32: u8 = 0x03;
/// 16-bit signed integer, 2 bytes.
pub const TAG_I16: u8 = 0x04;
/// 16-bit unsigned integer, 2 bytes.
pub const TAG_U16: u8 = 0x05;
/// Plain char, 1 byte.
pub const TAG_CHAR: u8 = 0x06;
/// Signed char, 1 byte.
pub const TAG_I8: u8 = 0x07;
/// Unsigned char, 1 byte.
pub const TAG_U8: u8 = 0x08;
/// IEEE-754 single, 4 bytes.
pub const TAG_F32: u8 = 0x09;
/// IEEE-754 double, 8 bytes.
pub const TAG_F64: u8 = 0x0A;
/// Embedded chunk header (TagID used by every exporter chunk).
pub const TAG_CHUNK: u8 = 0x0C;
/// Length-prefixed ASCII string.
pub const TAG_STRING: u8 = 0x0D;
/// Boolean, 1 byte.
pub const TAG_BOOL: u8 = 0x0E;
/// Unsigned integer packed in 3 bytes.
pub const TAG_U24: u8 = 0x0F;
/// Unsigned integer packed in 2 bytes.
pub const TAG_U32_AS_U16: u8 = 0x10;
/// Unsigned integer packed in 1 byte.
pub const TAG_U32_AS_U8: u8 = 0x11;
/// Signed integer packed in 3 bytes.
pub const TAG_I24: u8 = 0x12;
/// Signed integer packed in 2 bytes.
pub const TAG_I32_AS_I16: u8 = 0x13;
/// Signed integer packed in 1 byte.
pub const TAG_I32_AS_I8: u8 = 0x14;
pub const TAG_VEC2: u8 = 0x15;
pub const TAG_VEC3: u8 = 0x16;
pub const TAG_VEC4: u8 = 0x17;
pub const TAG_MAT2: u8 = 0x18;
pub const TAG_MAT3: u8 = 0x19;
pub const TAG_MAT4X3: u8 = 0x1A;
pub const TAG_MAT4: u8 = 0x1B;
/// Untagged structural marker delimiting sub-arrays.
pub const TAG_MARKER: u8 = 0x1C;

/// Chunk header: TagID (1) + ID (4) + Version (4) + Size (4).
pub const CHUNK_HEADER_SIZE: usize = 13;

/// Version written into every exporter chunk.
pub const CHUNK_VERSION: u32 = 1;

/// Signed magnitudes above this need the full 4 bytes.
pub(crate) const I24_MAX_MAGNITUDE: u32 = 0x7F_FFFF;
pub(crate) const I16_MAX_MAGNITUDE: u32 = 0x7FFF;
pub(crate) const I8_MAX_MAGNITUDE: u32 = 0x7F;

pub(crate) const U24_MAX: u32 = 0xFF_FFFF;
pub(crate) const U16_MAX: u32 = 0xFFFF;
pub(crate) const U8_MAX: u32 = 0xFF;

/// Chunk IDs written by the exporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ChunkId {
    MaterialList = 0x0100,
    Material = 0x0101,
    Mesh = 0x0200,
    Node = 0x0201,
    Geometry = 0x0202,
    Polygons = 0x0203,
    PolygonMaterials = 0x0204,
    UvMapping = 0x0205,
    Skin = 0x0300,
    SkinBones = 0x0301,
    SkinWeights = 0x0302,
}

impl ChunkId {
    pub fn from_u32(id: u32) -> Option<Self> {
        Some(match id {
            0x0100 => Self::MaterialList,
            0x0101 => Self::Material,
            0x0200 => Self::Mesh,
            0x0201 => Self::Node,
            0x0202 => Self::Geometry,
            0x0203 => Self::Polygons,
            0x0204 => Self::PolygonMaterials,
            0x0205 => Self::UvMapping,
            0x0300 => Self::Skin,
            0x0301 => Self::SkinBones,
            0x0302 => Self::SkinWeights,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MaterialList => "MaterialList",
            Self::Material => "Material",
            Self::Mesh => "Mesh",
            Self::Node => "Node",
            Self::Geometry => "Geometry",
            Self::Polygons => "Polygons",
            Self::PolygonMaterials => "PolygonMaterials",
            Self::UvMapping => "UvMapping",
            Self::Skin => "Skin",
            Self::SkinBones => "SkinBones",
            Self::SkinWeights => "SkinWeights",
        }
    }

    /// True for chunks whose payload is made only of child chunks.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Mesh)
    }
}

/// Payload width of a fixed-size tag, in bytes.
///
/// Returns `None` for tags whose payload is variable (strings, chunks) and
/// for bytes that are not tags.
pub const fn payload_width(tag: u8) -> Option<usize> {
    match tag {
        TAG_I64 | TAG_U64 | TAG_F64 => Some(8),
        TAG_I32 | TAG_U32 | TAG_F32 => Some(4),
        TAG_I24 | TAG_U24 => Some(3),
        TAG_I16 | TAG_U16 | TAG_I32_AS_I16 | TAG_U32_AS_U16 => Some(2),
        TAG_CHAR | TAG_I8 | TAG_U8 | TAG_BOOL | TAG_I32_AS_I8 | TAG_U32_AS_U8 => Some(1),
        TAG_VEC2 => Some(8),
        TAG_VEC3 => Some(12),
        TAG_VEC4 | TAG_MAT2 => Some(16),
        TAG_MAT3 => Some(36),
        TAG_MAT4X3 => Some(48),
        TAG_MAT4 => Some(64),
        TAG_MARKER => Some(0),
        _ => None,
    }
}
