//! Little-endian binary access shared by the schema codec.
//!
//! Reads are bounds-checked and never panic; writes append to a growable
//! buffer. Integer views go through `zerocopy` so no manual shifting is
//! needed.

use zerocopy::{FromBytes, IntoBytes, LE, U16, U32};

/// Binary access error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    InsufficientData { expected: usize, available: usize },
    /// Failed to parse the data
    ParseError(String),
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                expected,
                available,
            } => {
                write!(
                    f,
                    "Insufficient data: expected {}, got {}",
                    expected, available
                )
            },
            BinaryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Borrow `len` bytes starting at `offset`, checking for overflow and bounds.
///
/// # Examples
///
/// ```
/// use officekit::common::binary::read_slice;
/// let data = [1u8, 2, 3, 4];
/// assert_eq!(read_slice(&data, 1, 2).unwrap(), &[2, 3]);
/// assert!(read_slice(&data, 3, 2).is_err());
/// ```
#[inline]
pub fn read_slice(data: &[u8], offset: usize, len: usize) -> BinaryResult<&[u8]> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| BinaryError::ParseError("offset overflow".to_string()))?;
    if end > data.len() {
        return Err(BinaryError::InsufficientData {
            expected: end,
            available: data.len(),
        });
    }
    Ok(&data[offset..end])
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use officekit::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    let bytes = read_slice(data, offset, 2)?;
    U16::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u16".to_string()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use officekit::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    let bytes = read_slice(data, offset, 4)?;
    U32::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u32".to_string()))
}

/// Append a little-endian u16.
#[inline]
pub fn write_u16_le(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(U16::<LE>::new(value).as_bytes());
}

/// Append a little-endian u32.
#[inline]
pub fn write_u32_le(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(U32::<LE>::new(value).as_bytes());
}

/// Convert a length to the u32 used on the wire.
#[inline]
pub fn len_u32(len: usize) -> BinaryResult<u32> {
    u32::try_from(len).map_err(|_| BinaryError::ParseError(format!("length {} exceeds u32", len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_le() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert!(read_u16_le(&data, 0).is_ok_and(|v| v == 0x1234));
        assert!(read_u16_le(&data, 2).is_ok_and(|v| v == 0x5678));
        assert!(read_u16_le(&data, 3).is_err());
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x78, 0x56, 0x34, 0x12];
        assert!(read_u32_le(&data, 0).is_ok_and(|v| v == 0x12345678));
        assert!(read_u32_le(&data, 1).is_err());
    }

    #[test]
    fn test_read_slice_overflow() {
        let data = [0u8; 4];
        assert!(matches!(
            read_slice(&data, usize::MAX, 2),
            Err(BinaryError::ParseError(_))
        ));
        assert_eq!(
            read_slice(&data, 2, 4),
            Err(BinaryError::InsufficientData {
                expected: 6,
                available: 4
            })
        );
    }

    #[test]
    fn test_write_le() {
        let mut out = Vec::new();
        write_u16_le(&mut out, 0x1234);
        write_u32_le(&mut out, 0x12345678);
        assert_eq!(out, [0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);
    }
}
