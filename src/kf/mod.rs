//! Low-level KF binary format implementation.
//!
//! A KF file is a flat sequence of chunks. Chunk payloads are tagged
//! primitives and further chunks, nested to any depth.
//!
//! ## Chunk Layout
//!
//! ```text
//! +------------------+
//! | TagID            |  1 byte (0x0C)
//! +------------------+
//! | ID               |  4 bytes (u32 LE)
//! +------------------+
//! | Version          |  4 bytes (u32 LE)
//! +------------------+
//! | Size             |  4 bytes (u32 LE, payload + 13)
//! +------------------+
//! | ... Payload ...  |
//! +------------------+
//! ```
//!
//! ## Tagged Primitive
//!
//! ```text
//! +-----+----------------------+
//! | tag | payload (width(tag)) |
//! +-----+----------------------+
//! ```

pub mod format;
pub mod writer;
mod reader;

pub use format::ChunkId;
pub use reader::*;
pub use writer::*;
