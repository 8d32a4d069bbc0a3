//! KF writer implementation.
//!
//! Split into the byte store, the tagged primitive codec and the chunk
//! layer on top of it.

mod buffer;
mod chunk;
mod codec;

pub use buffer::ByteBuffer;
pub use chunk::{ChunkWriter, KfWriter};
pub use codec::{signed_width, unsigned_width, TaggedWrite};
