//! TLS presentation-language codec.
//!
//! All wire-visible structures in this crate are encoded with the TLS
//! conventions: fixed-width big-endian integers, byte-length-prefixed
//! variable vectors with 1, 2 or 4 byte heads, a one-byte presence tag for
//! optional values and a one-byte discriminant for unions. Tree hashes are
//! computed over these encodings, so they must be deterministic and
//! bit-exact.

use thiserror::Error;

/// Codec error
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum CodecError {
    /// The value could not be encoded.
    #[error("The value could not be encoded.")]
    EncodingError,
    /// The byte stream does not decode to a valid value.
    #[error("The byte stream does not decode to a valid value.")]
    DecodingError,
    /// A vector is longer than its length prefix can express.
    #[error("A vector is longer than its length prefix can express.")]
    InvalidVectorLength,
    /// The byte stream ended in the middle of a value.
    #[error("The byte stream ended in the middle of a value.")]
    EndOfStream,
}

/// The width of the byte-length prefix in front of a variable-length
/// vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VecSize {
    VecU8,
    VecU16,
    VecU32,
}

impl VecSize {
    /// Number of bytes the length prefix occupies.
    pub(crate) fn len_len(&self) -> usize {
        match self {
            VecSize::VecU8 => 1,
            VecSize::VecU16 => 2,
            VecSize::VecU32 => 4,
        }
    }

    /// Write `length` as a big-endian prefix of this width.
    pub(crate) fn write_length(
        &self,
        buffer: &mut Vec<u8>,
        length: usize,
    ) -> Result<(), CodecError> {
        match self {
            VecSize::VecU8 => {
                let length = u8::try_from(length).map_err(|_| CodecError::InvalidVectorLength)?;
                buffer.push(length);
            }
            VecSize::VecU16 => {
                let length = u16::try_from(length).map_err(|_| CodecError::InvalidVectorLength)?;
                buffer.extend_from_slice(&length.to_be_bytes());
            }
            VecSize::VecU32 => {
                let length = u32::try_from(length).map_err(|_| CodecError::InvalidVectorLength)?;
                buffer.extend_from_slice(&length.to_be_bytes());
            }
        }
        Ok(())
    }

    /// Read a big-endian length prefix of this width.
    pub(crate) fn read_length(&self, cursor: &mut Cursor) -> Result<usize, CodecError> {
        Ok(match self {
            VecSize::VecU8 => u8::decode(cursor)? as usize,
            VecSize::VecU16 => u16::decode(cursor)? as usize,
            VecSize::VecU32 => u32::decode(cursor)? as usize,
        })
    }
}

/// A position in a borrowed byte stream.
#[derive(Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, position: 0 }
    }

    /// Consume `length` bytes. The returned slice borrows from the
    /// underlying stream, not from the cursor.
    pub(crate) fn read(&mut self, length: usize) -> Result<&'a [u8], CodecError> {
        let bytes: &'a [u8] = self.bytes;
        let slice = bytes
            .get(self.position..self.position + length)
            .ok_or(CodecError::EndOfStream)?;
        self.position += length;
        Ok(slice)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.position >= self.bytes.len()
    }

    pub(crate) fn has_more(&self) -> bool {
        !self.is_empty()
    }
}

/// Encoding half of the codec.
pub trait Encode {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError>;

    fn encode_detached(&self) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::new();
        self.encode(&mut buffer)?;
        Ok(buffer)
    }
}

/// Decoding half of the codec.
pub trait Decode: Sized {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError>;

    fn decode_detached(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut cursor = Cursor::new(bytes);
        let value = Self::decode(&mut cursor)?;
        // Trailing garbage means the input was not an encoding of this value.
        if cursor.has_more() {
            return Err(CodecError::DecodingError);
        }
        Ok(value)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        (*self).encode(buffer)
    }
}

impl Encode for u8 {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        buffer.push(*self);
        Ok(())
    }
}

impl Decode for u8 {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        cursor.read(1).map(|b| b[0])
    }
}

impl Encode for u16 {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        buffer.extend_from_slice(&self.to_be_bytes());
        Ok(())
    }
}

impl Decode for u16 {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        let bytes = cursor.read(2)?;
        Ok(u16::from_be_bytes(
            bytes.try_into().map_err(|_| CodecError::EndOfStream)?,
        ))
    }
}

impl Encode for u32 {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        buffer.extend_from_slice(&self.to_be_bytes());
        Ok(())
    }
}

impl Decode for u32 {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        let bytes = cursor.read(4)?;
        Ok(u32::from_be_bytes(
            bytes.try_into().map_err(|_| CodecError::EndOfStream)?,
        ))
    }
}

impl Encode for u64 {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        buffer.extend_from_slice(&self.to_be_bytes());
        Ok(())
    }
}

impl Decode for u64 {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        let bytes = cursor.read(8)?;
        Ok(u64::from_be_bytes(
            bytes.try_into().map_err(|_| CodecError::EndOfStream)?,
        ))
    }
}

// optional<T>: a one-byte presence tag, then the value if present.

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        match self {
            None => buffer.push(0x00),
            Some(value) => {
                buffer.push(0x01);
                value.encode(buffer)?;
            }
        }
        Ok(())
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        match u8::decode(cursor)? {
            0x00 => Ok(None),
            0x01 => Ok(Some(T::decode(cursor)?)),
            _ => Err(CodecError::DecodingError),
        }
    }
}

/// Encode `slice` as a variable-length vector with a byte-length prefix of
/// the given width.
pub fn encode_vec<T: Encode>(
    vec_size: VecSize,
    buffer: &mut Vec<u8>,
    slice: &[T],
) -> Result<(), CodecError> {
    let mut content = Vec::new();
    for element in slice {
        element.encode(&mut content)?;
    }
    vec_size.write_length(buffer, content.len())?;
    buffer.extend_from_slice(&content);
    Ok(())
}

/// Decode a variable-length vector. The declared byte length must be
/// consumed exactly.
pub fn decode_vec<T: Decode>(vec_size: VecSize, cursor: &mut Cursor) -> Result<Vec<T>, CodecError> {
    let length = vec_size.read_length(cursor)?;
    let mut sub = Cursor::new(cursor.read(length)?);
    let mut vec = Vec::new();
    while sub.has_more() {
        // Running out of bytes inside the declared region means the
        // length does not describe a whole number of elements. That is a
        // malformed vector, not a short stream.
        let element = T::decode(&mut sub).map_err(|e| match e {
            CodecError::EndOfStream => CodecError::DecodingError,
            other => other,
        })?;
        vec.push(element);
    }
    Ok(vec)
}
