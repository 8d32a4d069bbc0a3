//! Growable in-memory byte store backing every KF writer.

/// Capacity grows in whole steps of this many bytes.
pub(crate) const GROW_STEP: usize = 4096;

/// Owned byte buffer with an explicit write cursor.
///
/// Invariant: `position <= size <= capacity`. Growth preserves every byte
/// already written at its offset; the buffer never shrinks.
#[derive(Clone, Debug, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
    position: usize,
    capacity: usize,
}

impl ByteBuffer {
    /// Create an empty buffer. No memory is allocated until the first write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for at least `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buf = Self::new();
        if capacity > 0 {
            buf.grow(capacity);
        }
        buf
    }

    /// Next write offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// High-water mark of written bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The written prefix, `size()` bytes long.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Append bytes at the cursor and advance it.
    pub fn write(&mut self, bytes: &[u8]) {
        let end = self.position + bytes.len();
        if end > self.capacity {
            self.grow(end);
        }
        self.data.extend_from_slice(bytes);
        self.position = end;
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.write(&[value]);
    }

    /// Write a u32 value (little-endian).
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    fn grow(&mut self, required: usize) {
        let new_capacity = required.div_ceil(GROW_STEP) * GROW_STEP;
        self.data.reserve_exact(new_capacity - self.data.len());
        tracing::trace!(from = self.capacity, to = new_capacity, "grow byte buffer");
        self.capacity = new_capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_invariant(buf: &ByteBuffer) {
        assert!(buf.position() <= buf.size());
        assert!(buf.size() <= buf.capacity());
    }

    #[test]
    fn test_empty_buffer() {
        let buf = ByteBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 0);
        check_invariant(&buf);
    }

    #[test]
    fn test_growth_preserves_prefix() {
        let mut buf = ByteBuffer::new();
        let prefix: Vec<u8> = (0..100u8).collect();
        buf.write(&prefix);
        assert_eq!(buf.capacity(), GROW_STEP);

        let filler = vec![0xAB; GROW_STEP * 2 + 17];
        buf.write(&filler);
        check_invariant(&buf);

        assert_eq!(buf.capacity(), GROW_STEP * 3);
        assert_eq!(&buf.as_bytes()[..100], prefix.as_slice());
        assert_eq!(buf.size(), 100 + filler.len());
        assert_eq!(buf.position(), buf.size());
    }

    #[test]
    fn test_little_endian_u32() {
        let mut buf = ByteBuffer::with_capacity(10);
        assert_eq!(buf.capacity(), GROW_STEP);
        buf.write_u32(0x0403_0201);
        buf.write_u8(5);
        assert_eq!(buf.as_bytes(), &[1, 2, 3, 4, 5]);
    }
}
