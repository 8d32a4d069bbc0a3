//! Chunk and root writers.

use crate::kf::format::{ChunkId, CHUNK_VERSION, TAG_CHUNK};

use super::buffer::ByteBuffer;
use super::codec::TaggedWrite;

/// Writer for one chunk payload.
///
/// The header is not part of the buffer; it is emitted when the chunk is
/// embedded into a parent with [`TaggedWrite::write_chunk`]. Embedding copies
/// the payload, so the child can be dropped right after.
#[derive(Clone, Debug)]
pub struct ChunkWriter {
    tag: u8,
    id: u32,
    version: u32,
    buffer: ByteBuffer,
}

impl ChunkWriter {
    /// Chunk with an explicit header triple.
    pub fn new(tag: u8, id: u32, version: u32) -> Self {
        Self { tag, id, version, buffer: ByteBuffer::new() }
    }

    /// Exporter chunk: standard tag and current version.
    pub fn for_id(id: ChunkId) -> Self {
        Self::new(TAG_CHUNK, id as u32, CHUNK_VERSION)
    }

    #[inline]
    pub fn tag(&self) -> u8 {
        self.tag
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Size field this chunk will carry once embedded.
    pub fn embedded_size(&self) -> usize {
        self.buffer.size() + crate::kf::format::CHUNK_HEADER_SIZE
    }
}

impl TaggedWrite for ChunkWriter {
    fn buffer(&self) -> &ByteBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut ByteBuffer {
        &mut self.buffer
    }
}

/// Top-level writer. Holds the file image; has no header of its own.
#[derive(Clone, Debug, Default)]
pub struct KfWriter {
    buffer: ByteBuffer,
}

impl KfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished file image.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_bytes()
    }
}

impl TaggedWrite for KfWriter {
    fn buffer(&self) -> &ByteBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut ByteBuffer {
        &mut self.buffer
    }
}
