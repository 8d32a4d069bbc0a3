//! Tagged primitive encoding.
//!
//! Every value is written as a tag byte followed by its payload. Signed and
//! unsigned 32-bit integers pick the narrowest of four widths; everything
//! else has one fixed tag. See [`crate::kf::format`] for the tag table.

use crate::kf::format::*;
use crate::util::{mat2_rows, mat3_rows, mat4_rows, Error, Mat2, Mat3, Mat4, Mat4x3, Result, Vec2, Vec3, Vec4};

use super::buffer::ByteBuffer;
use super::chunk::ChunkWriter;

/// Tag and payload width for a signed 32-bit value.
#[inline]
pub fn signed_width(value: i32) -> (u8, usize) {
    let magnitude = value.unsigned_abs();
    if magnitude > I24_MAX_MAGNITUDE {
        (TAG_I32, 4)
    } else if magnitude > I16_MAX_MAGNITUDE {
        (TAG_I24, 3)
    } else if magnitude > I8_MAX_MAGNITUDE {
        (TAG_I32_AS_I16, 2)
    } else {
        (TAG_I32_AS_I8, 1)
    }
}

/// Tag and payload width for an unsigned 32-bit value.
#[inline]
pub fn unsigned_width(value: u32) -> (u8, usize) {
    if value > U24_MAX {
        (TAG_U32, 4)
    } else if value > U16_MAX {
        (TAG_U24, 3)
    } else if value > U8_MAX {
        (TAG_U32_AS_U16, 2)
    } else {
        (TAG_U32_AS_U8, 1)
    }
}

/// Primitive writes shared by the root writer and chunk writers.
///
/// Implementors only expose their buffer; every encoding lives in the
/// provided methods so the two writers cannot drift apart.
pub trait TaggedWrite {
    fn buffer(&self) -> &ByteBuffer;
    fn buffer_mut(&mut self) -> &mut ByteBuffer;

    /// Bytes written so far.
    fn payload(&self) -> &[u8] {
        self.buffer().as_bytes()
    }

    /// Untagged bytes.
    fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer_mut().write(bytes);
    }

    fn write_i32(&mut self, value: i32) {
        let (tag, width) = signed_width(value);
        let buf = self.buffer_mut();
        buf.write_u8(tag);
        buf.write(&value.to_le_bytes()[..width]);
    }

    fn write_u32(&mut self, value: u32) {
        let (tag, width) = unsigned_width(value);
        let buf = self.buffer_mut();
        buf.write_u8(tag);
        buf.write(&value.to_le_bytes()[..width]);
    }

    /// Element count, written with the unsigned rule.
    fn write_count(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count).map_err(|_| Error::CountOverflow(count))?;
        self.write_u32(count);
        Ok(())
    }

    fn write_i16(&mut self, value: i16) {
        self.write_tagged(TAG_I16, &value.to_le_bytes());
    }

    fn write_u16(&mut self, value: u16) {
        self.write_tagged(TAG_U16, &value.to_le_bytes());
    }

    fn write_i64(&mut self, value: i64) {
        self.write_tagged(TAG_I64, &value.to_le_bytes());
    }

    fn write_u64(&mut self, value: u64) {
        self.write_tagged(TAG_U64, &value.to_le_bytes());
    }

    /// Plain `char` (one byte, signedness unspecified).
    fn write_char(&mut self, value: u8) {
        self.write_tagged(TAG_CHAR, &[value]);
    }

    fn write_i8(&mut self, value: i8) {
        self.write_tagged(TAG_I8, &value.to_le_bytes());
    }

    fn write_u8(&mut self, value: u8) {
        self.write_tagged(TAG_U8, &[value]);
    }

    fn write_f32(&mut self, value: f32) {
        self.write_tagged(TAG_F32, &value.to_le_bytes());
    }

    fn write_f64(&mut self, value: f64) {
        self.write_tagged(TAG_F64, &value.to_le_bytes());
    }

    fn write_bool(&mut self, value: bool) {
        self.write_tagged(TAG_BOOL, &[value as u8]);
    }

    fn write_vec2(&mut self, v: Vec2) {
        self.write_floats(TAG_VEC2, &v.to_array());
    }

    fn write_vec3(&mut self, v: Vec3) {
        self.write_floats(TAG_VEC3, &v.to_array());
    }

    fn write_vec4(&mut self, v: Vec4) {
        self.write_floats(TAG_VEC4, &v.to_array());
    }

    fn write_mat2(&mut self, m: &Mat2) {
        self.write_floats(TAG_MAT2, &mat2_rows(m));
    }

    fn write_mat3(&mut self, m: &Mat3) {
        self.write_floats(TAG_MAT3, &mat3_rows(m));
    }

    fn write_mat4x3(&mut self, m: &Mat4x3) {
        self.write_floats(TAG_MAT4X3, &m.to_floats());
    }

    fn write_mat4(&mut self, m: &Mat4) {
        self.write_floats(TAG_MAT4, &mat4_rows(m));
    }

    /// Count followed by one tagged vec3 per element.
    fn write_vec3_array(&mut self, values: &[Vec3]) -> Result<()> {
        self.write_count(values.len())?;
        for v in values {
            self.write_vec3(*v);
        }
        Ok(())
    }

    /// Count followed by one tagged unsigned value per element.
    fn write_u32_array(&mut self, values: &[u32]) -> Result<()> {
        self.write_count(values.len())?;
        for &v in values {
            self.write_u32(v);
        }
        Ok(())
    }

    /// ASCII string: tag, signed-32 length, raw bytes.
    fn write_string(&mut self, s: &str) -> Result<()> {
        if !s.is_ascii() {
            return Err(Error::NonAscii(s.to_string()));
        }
        let len = i32::try_from(s.len()).map_err(|_| Error::StringTooLong(s.len()))?;
        self.buffer_mut().write_u8(TAG_STRING);
        self.write_i32(len);
        self.write_raw(s.as_bytes());
        Ok(())
    }

    /// Untagged sub-array delimiter.
    fn write_marker(&mut self) {
        self.buffer_mut().write_u8(TAG_MARKER);
    }

    /// Embed a finished chunk: raw header, then its payload bytes.
    fn write_chunk(&mut self, child: &ChunkWriter) -> Result<()> {
        let payload = child.payload();
        let total = payload.len() + CHUNK_HEADER_SIZE;
        let size = u32::try_from(total).map_err(|_| Error::CountOverflow(total))?;

        let buf = self.buffer_mut();
        buf.write_u8(child.tag());
        buf.write_u32(child.id());
        buf.write_u32(child.version());
        buf.write_u32(size);
        buf.write(payload);
        Ok(())
    }

    #[doc(hidden)]
    fn write_tagged(&mut self, tag: u8, payload: &[u8]) {
        let buf = self.buffer_mut();
        buf.write_u8(tag);
        buf.write(payload);
    }

    #[doc(hidden)]
    fn write_floats(&mut self, tag: u8, values: &[f32]) {
        let buf = self.buffer_mut();
        buf.write_u8(tag);
        for v in values {
            buf.write(&v.to_le_bytes());
        }
    }
}
