//! Error types for KF export.

use thiserror::Error;

/// Main error type for KF export operations.
///
/// Every variant is fatal for the export that raised it: the pipeline
/// short-circuits with `?` and no output file is written.
#[derive(Error, Debug)]
pub enum Error {
    /// Scene node of a kind the exporter cannot handle
    #[error("Unsupported object '{node}' of kind {kind}")]
    UnsupportedObject { node: String, kind: String },

    /// Face with no material assigned
    #[error("Mesh '{mesh}': face {face} has no material")]
    MissingMaterial { mesh: String, face: usize },

    /// Material handle the scene cannot resolve
    #[error("Unknown material handle {0}")]
    UnknownMaterial(usize),

    /// Required string contains non-ASCII bytes
    #[error("Non-ASCII string: {0:?}")]
    NonAscii(String),

    /// String longer than a signed 32-bit length prefix allows
    #[error("String of {0} bytes is too long to encode")]
    StringTooLong(usize),

    /// Element count or chunk size that does not fit in 32 bits
    #[error("Count {0} does not fit in 32 bits")]
    CountOverflow(usize),

    /// Material map that references no bitmap
    #[error("Material '{material}': texture '{texture}' has no bitmap")]
    TextureWithoutBitmap { material: String, texture: String },

    /// Face corner referencing data past the end of the mesh arrays
    #[error("Mesh '{mesh}': {what} index {index} out of range (count: {count})")]
    IndexOutOfRange { mesh: String, what: &'static str, index: u32, count: usize },

    /// Skin modifier with no bones
    #[error("Skin on '{0}' references no bones")]
    NoBones(String),

    /// Skinned vertex count does not match the source geometry
    #[error("Skin on '{mesh}' covers {skin} vertices but the mesh has {geometry}")]
    VertexCountMismatch { mesh: String, skin: usize, geometry: usize },

    /// Bones that do not share a single root
    #[error("Skin on '{mesh}' has more than one root bone ('{first}' and '{second}')")]
    MultipleRootBones { mesh: String, first: String, second: String },

    /// Bone with no ancestor in the exported bone list
    #[error("Skin on '{mesh}': bone '{bone}' does not resolve to an exported bone")]
    UnresolvedBone { mesh: String, bone: String },

    /// Vertex influence kind other than rigid or rigid-blended
    #[error("Skin on '{mesh}': unknown vertex type {kind} at vertex {vertex}")]
    UnknownVertexType { mesh: String, vertex: usize, kind: u32 },

    /// Vertex reporting zero influences for a rigid binding
    #[error("Skin on '{mesh}': rigid vertex {vertex} has no bone")]
    MissingInfluence { mesh: String, vertex: usize },

    /// Input ended in the middle of a value
    #[error("Unexpected end of data at offset {0}")]
    UnexpectedEof(usize),

    /// Byte that is not a known tag
    #[error("Invalid tag 0x{tag:02X} at offset {offset}")]
    InvalidTag { tag: u8, offset: usize },

    /// Tag differs from the one the caller asked for
    #[error("Type mismatch at offset {offset}: expected {expected}, got tag 0x{actual:02X}")]
    TypeMismatch { expected: &'static str, actual: u8, offset: usize },

    /// Malformed chunk header
    #[error("Invalid chunk at offset {offset}: {reason}")]
    InvalidChunk { offset: usize, reason: String },

    /// Scene description is inconsistent
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene description failed to parse
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid scene error.
    pub fn invalid_scene(msg: impl Into<String>) -> Self {
        Self::InvalidScene(msg.into())
    }

    /// Create an invalid chunk error.
    pub fn invalid_chunk(offset: usize, reason: impl Into<String>) -> Self {
        Self::InvalidChunk { offset, reason: reason.into() }
    }

    /// True for the skin topology family of errors.
    pub fn is_skin_error(&self) -> bool {
        matches!(
            self,
            Self::NoBones(_)
                | Self::VertexCountMismatch { .. }
                | Self::MultipleRootBones { .. }
                | Self::UnresolvedBone { .. }
                | Self::UnknownVertexType { .. }
                | Self::MissingInfluence { .. }
        )
    }
}

/// Result type alias for KF export operations.
pub type Result<T> = std::result::Result<T, Error>;
