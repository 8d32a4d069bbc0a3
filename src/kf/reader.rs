//! KF reader: decodes tagged primitives and walks chunk trees.
//!
//! The reader borrows its input and never copies payloads; chunk views and
//! strings point back into the original slice.

use byteorder::{ByteOrder, LittleEndian};

use super::format::*;
use crate::util::{Error, Mat2, Mat3, Mat4, Mat4x3, Result, Vec2, Vec3, Vec4};

/// One decoded tagged value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value<'a> {
    I64(i64),
    U64(u64),
    /// Any of the four signed 32-bit encodings.
    I32(i32),
    /// Any of the four unsigned 32-bit encodings.
    U32(u32),
    I16(i16),
    U16(u16),
    Char(u8),
    I8(i8),
    U8(u8),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(&'a str),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4x3(Mat4x3),
    Mat4(Mat4),
    Marker,
    Chunk(ChunkView<'a>),
}

/// A chunk header plus a borrowed payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkView<'a> {
    pub tag: u8,
    pub id: u32,
    pub version: u32,
    /// Offset of the header within the parent input.
    pub offset: usize,
    pub payload: &'a [u8],
}

impl<'a> ChunkView<'a> {
    /// Value of the on-disk size field.
    pub fn size(&self) -> usize {
        self.payload.len() + CHUNK_HEADER_SIZE
    }

    pub fn kind(&self) -> Option<ChunkId> {
        ChunkId::from_u32(self.id)
    }

    /// Reader over the payload.
    pub fn reader(&self) -> KfReader<'a> {
        KfReader::new(self.payload)
    }

    /// Decode the payload as a sequence of child chunks.
    pub fn children(&self) -> Result<Vec<ChunkView<'a>>> {
        self.reader().read_chunks()
    }

    /// First child chunk with the given ID.
    pub fn child(&self, id: ChunkId) -> Result<Option<ChunkView<'a>>> {
        Ok(self.children()?.into_iter().find(|c| c.id == id as u32))
    }
}

/// Cursor over KF bytes.
#[derive(Clone, Debug)]
pub struct KfReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> KfReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Next tag byte without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::UnexpectedEof(self.pos));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn expect_tag(&mut self, expected: u8, name: &'static str) -> Result<()> {
        let offset = self.pos;
        let tag = self.take_u8()?;
        if tag != expected {
            self.pos = offset;
            return Err(Error::TypeMismatch { expected: name, actual: tag, offset });
        }
        Ok(())
    }

    fn take_floats<const N: usize>(&mut self) -> Result<[f32; N]> {
        let bytes = self.take(N * 4)?;
        let mut out = [0.0f32; N];
        LittleEndian::read_f32_into(bytes, &mut out);
        Ok(out)
    }

    /// Signed payload of `width` bytes, sign-extended to 32 bits.
    fn take_signed(&mut self, width: usize) -> Result<i32> {
        let mut raw = [0u8; 4];
        raw[..width].copy_from_slice(self.take(width)?);
        let shift = 32 - 8 * width as u32;
        Ok(((LittleEndian::read_u32(&raw) << shift) as i32) >> shift)
    }

    fn take_unsigned(&mut self, width: usize) -> Result<u32> {
        let mut raw = [0u8; 4];
        raw[..width].copy_from_slice(self.take(width)?);
        Ok(LittleEndian::read_u32(&raw))
    }

    /// Signed 32-bit value in any of its four widths.
    pub fn read_i32(&mut self) -> Result<i32> {
        let offset = self.pos;
        let tag = self.take_u8()?;
        let width = match tag {
            TAG_I32 => 4,
            TAG_I24 => 3,
            TAG_I32_AS_I16 => 2,
            TAG_I32_AS_I8 => 1,
            _ => {
                self.pos = offset;
                return Err(Error::TypeMismatch { expected: "int32", actual: tag, offset });
            }
        };
        self.take_signed(width)
    }

    /// Unsigned 32-bit value in any of its four widths.
    pub fn read_u32(&mut self) -> Result<u32> {
        let offset = self.pos;
        let tag = self.take_u8()?;
        let width = match tag {
            TAG_U32 => 4,
            TAG_U24 => 3,
            TAG_U32_AS_U16 => 2,
            TAG_U32_AS_U8 => 1,
            _ => {
                self.pos = offset;
                return Err(Error::TypeMismatch { expected: "uint32", actual: tag, offset });
            }
        };
        self.take_unsigned(width)
    }

    /// Unsigned count as `usize`.
    pub fn read_count(&mut self) -> Result<usize> {
        Ok(self.read_u32()? as usize)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.expect_tag(TAG_I16, "int16")?;
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.expect_tag(TAG_U16, "uint16")?;
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.expect_tag(TAG_I64, "int64")?;
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.expect_tag(TAG_U64, "uint64")?;
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn read_char(&mut self) -> Result<u8> {
        self.expect_tag(TAG_CHAR, "char")?;
        self.take_u8()
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.expect_tag(TAG_I8, "signed char")?;
        Ok(self.take_u8()? as i8)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.expect_tag(TAG_U8, "unsigned char")?;
        self.take_u8()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.expect_tag(TAG_F32, "float")?;
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.expect_tag(TAG_F64, "double")?;
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.expect_tag(TAG_BOOL, "bool")?;
        Ok(self.take_u8()? != 0)
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        self.expect_tag(TAG_VEC2, "vec2")?;
        Ok(Vec2::from_array(self.take_floats::<2>()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        self.expect_tag(TAG_VEC3, "vec3")?;
        Ok(Vec3::from_array(self.take_floats::<3>()?))
    }

    pub fn read_vec4(&mut self) -> Result<Vec4> {
        self.expect_tag(TAG_VEC4, "vec4")?;
        Ok(Vec4::from_array(self.take_floats::<4>()?))
    }

    pub fn read_mat2(&mut self) -> Result<Mat2> {
        self.expect_tag(TAG_MAT2, "mat2x2")?;
        Ok(Mat2::from_cols_array(&self.take_floats::<4>()?).transpose())
    }

    pub fn read_mat3(&mut self) -> Result<Mat3> {
        self.expect_tag(TAG_MAT3, "mat3x3")?;
        Ok(Mat3::from_cols_array(&self.take_floats::<9>()?).transpose())
    }

    pub fn read_mat4x3(&mut self) -> Result<Mat4x3> {
        self.expect_tag(TAG_MAT4X3, "mat4x3")?;
        Ok(Mat4x3::from_floats(&self.take_floats::<12>()?))
    }

    pub fn read_mat4(&mut self) -> Result<Mat4> {
        self.expect_tag(TAG_MAT4, "mat4x4")?;
        Ok(Mat4::from_cols_array(&self.take_floats::<16>()?).transpose())
    }

    pub fn read_string(&mut self) -> Result<&'a str> {
        self.expect_tag(TAG_STRING, "string")?;
        self.take_string_body()
    }

    fn take_string_body(&mut self) -> Result<&'a str> {
        let offset = self.pos;
        let len = self.read_i32()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::invalid_chunk(offset, format!("negative string length {len}")))?;
        let bytes = self.take(len)?;
        if !bytes.is_ascii() {
            return Err(Error::NonAscii(String::from_utf8_lossy(bytes).into_owned()));
        }
        // ASCII is valid UTF-8.
        std::str::from_utf8(bytes).map_err(|e| Error::invalid_chunk(offset, e.to_string()))
    }

    /// Count followed by that many vec3 values.
    pub fn read_vec3_array(&mut self) -> Result<Vec<Vec3>> {
        let count = self.read_count()?;
        (0..count).map(|_| self.read_vec3()).collect()
    }

    /// Count followed by that many unsigned values.
    pub fn read_u32_array(&mut self) -> Result<Vec<u32>> {
        let count = self.read_count()?;
        (0..count).map(|_| self.read_u32()).collect()
    }

    pub fn read_marker(&mut self) -> Result<()> {
        self.expect_tag(TAG_MARKER, "marker")
    }

    /// Chunk header and payload. The TagID byte is not checked.
    pub fn read_chunk(&mut self) -> Result<ChunkView<'a>> {
        let offset = self.pos;
        let header = self.take(CHUNK_HEADER_SIZE)?;
        let tag = header[0];
        let id = LittleEndian::read_u32(&header[1..5]);
        let version = LittleEndian::read_u32(&header[5..9]);
        let size = LittleEndian::read_u32(&header[9..13]) as usize;

        if size < CHUNK_HEADER_SIZE {
            self.pos = offset;
            return Err(Error::invalid_chunk(offset, format!("size {size} smaller than header")));
        }
        let payload_len = size - CHUNK_HEADER_SIZE;
        if payload_len > self.remaining() {
            self.pos = offset;
            return Err(Error::invalid_chunk(
                offset,
                format!("payload of {payload_len} bytes exceeds remaining {}", self.remaining()),
            ));
        }
        let payload = self.take(payload_len)?;
        Ok(ChunkView { tag, id, version, offset, payload })
    }

    /// Every remaining byte as consecutive chunks.
    pub fn read_chunks(&mut self) -> Result<Vec<ChunkView<'a>>> {
        let mut chunks = Vec::new();
        while !self.is_at_end() {
            chunks.push(self.read_chunk()?);
        }
        Ok(chunks)
    }

    /// Next value of any type, dispatching on its tag.
    pub fn read_value(&mut self) -> Result<Value<'a>> {
        let offset = self.pos;
        let tag = self.peek_tag().ok_or(Error::UnexpectedEof(offset))?;
        let value = match tag {
            TAG_I32 | TAG_I24 | TAG_I32_AS_I16 | TAG_I32_AS_I8 => Value::I32(self.read_i32()?),
            TAG_U32 | TAG_U24 | TAG_U32_AS_U16 | TAG_U32_AS_U8 => Value::U32(self.read_u32()?),
            TAG_I64 => Value::I64(self.read_i64()?),
            TAG_U64 => Value::U64(self.read_u64()?),
            TAG_I16 => Value::I16(self.read_i16()?),
            TAG_U16 => Value::U16(self.read_u16()?),
            TAG_CHAR => Value::Char(self.read_char()?),
            TAG_I8 => Value::I8(self.read_i8()?),
            TAG_U8 => Value::U8(self.read_u8()?),
            TAG_F32 => Value::F32(self.read_f32()?),
            TAG_F64 => Value::F64(self.read_f64()?),
            TAG_BOOL => Value::Bool(self.read_bool()?),
            TAG_STRING => Value::String(self.read_string()?),
            TAG_VEC2 => Value::Vec2(self.read_vec2()?),
            TAG_VEC3 => Value::Vec3(self.read_vec3()?),
            TAG_VEC4 => Value::Vec4(self.read_vec4()?),
            TAG_MAT2 => Value::Mat2(self.read_mat2()?),
            TAG_MAT3 => Value::Mat3(self.read_mat3()?),
            TAG_MAT4X3 => Value::Mat4x3(self.read_mat4x3()?),
            TAG_MAT4 => Value::Mat4(self.read_mat4()?),
            TAG_MARKER => {
                self.read_marker()?;
                Value::Marker
            }
            TAG_CHUNK => Value::Chunk(self.read_chunk()?),
            _ => return Err(Error::InvalidTag { tag, offset }),
        };
        Ok(value)
    }
}
