//! Field kinds and the typed value conversions layered on top of them.

use bytes::Bytes;

use super::error::{Result, SchemaError};
use crate::common::binary::{len_u32, read_slice, read_u32_le, write_u32_le};

/// Kind tag stored next to every field in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldKind {
    /// One byte, 0 or 1
    Bool = 1,
    /// Four bytes, little-endian
    U32 = 2,
    /// UTF-8 text
    String = 3,
    /// u32 count followed by length-prefixed UTF-8 items
    StringList = 4,
    /// Uninterpreted bytes
    Bytes = 5,
}

impl FieldKind {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(FieldKind::Bool),
            2 => Some(FieldKind::U32),
            3 => Some(FieldKind::String),
            4 => Some(FieldKind::StringList),
            5 => Some(FieldKind::Bytes),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::U32 => "u32",
            FieldKind::String => "string",
            FieldKind::StringList => "string list",
            FieldKind::Bytes => "bytes",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An encoded field: its kind tag and payload, not yet interpreted.
///
/// The tag is kept as a raw byte so fields written by a newer schema version
/// (with kinds this build does not know) can be carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub kind: u8,
    pub payload: Bytes,
}

impl RawField {
    pub fn new(kind: FieldKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind: kind as u8,
            payload: payload.into(),
        }
    }

    /// The kind tag, if it is one this build understands.
    pub fn field_kind(&self) -> Option<FieldKind> {
        FieldKind::from_u8(self.kind)
    }

    /// Encode a typed value.
    pub fn encode<T: FieldType>(slot: u16, value: &T) -> Result<Self> {
        let mut payload = Vec::new();
        value.encode(slot, &mut payload)?;
        Ok(Self::new(T::KIND, payload))
    }

    /// Interpret the payload as `T`, checking the stored kind first.
    pub fn decode<T: FieldType>(&self, slot: u16) -> Result<T> {
        match self.field_kind() {
            Some(kind) if kind == T::KIND => T::decode(slot, &self.payload),
            Some(kind) => Err(SchemaError::mismatch(slot, T::KIND, kind.name())),
            None => Err(SchemaError::mismatch(
                slot,
                T::KIND,
                format!("unknown kind tag {}", self.kind),
            )),
        }
    }
}

/// A Rust type that can be stored in a table field.
pub trait FieldType: Sized {
    /// Kind tag written for this type.
    const KIND: FieldKind;

    /// Append the payload for `self`.
    fn encode(&self, slot: u16, out: &mut Vec<u8>) -> Result<()>;

    /// Decode a payload whose kind tag already matched.
    fn decode(slot: u16, payload: &Bytes) -> Result<Self>;
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn encode(&self, _slot: u16, out: &mut Vec<u8>) -> Result<()> {
        out.push(u8::from(*self));
        Ok(())
    }

    fn decode(slot: u16, payload: &Bytes) -> Result<Self> {
        match payload.as_ref() {
            [0] => Ok(false),
            [1] => Ok(true),
            [other] => Err(SchemaError::mismatch(
                slot,
                FieldKind::Bool,
                format!("byte value {}", other),
            )),
            _ => Err(SchemaError::mismatch(
                slot,
                FieldKind::Bool,
                format!("{}-byte value", payload.len()),
            )),
        }
    }
}

impl FieldType for u32 {
    const KIND: FieldKind = FieldKind::U32;

    fn encode(&self, _slot: u16, out: &mut Vec<u8>) -> Result<()> {
        write_u32_le(out, *self);
        Ok(())
    }

    fn decode(slot: u16, payload: &Bytes) -> Result<Self> {
        if payload.len() != 4 {
            return Err(SchemaError::mismatch(
                slot,
                FieldKind::U32,
                format!("{}-byte value", payload.len()),
            ));
        }
        read_u32_le(payload, 0).map_err(|e| SchemaError::out_of_range(slot, e.to_string()))
    }
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::String;

    fn encode(&self, _slot: u16, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(self.as_bytes());
        Ok(())
    }

    fn decode(slot: u16, payload: &Bytes) -> Result<Self> {
        utf8(slot, FieldKind::String, payload)
    }
}

impl FieldType for Vec<String> {
    const KIND: FieldKind = FieldKind::StringList;

    fn encode(&self, slot: u16, out: &mut Vec<u8>) -> Result<()> {
        let count = len_u32(self.len()).map_err(|e| SchemaError::out_of_range(slot, e.to_string()))?;
        write_u32_le(out, count);
        for item in self {
            let len =
                len_u32(item.len()).map_err(|e| SchemaError::out_of_range(slot, e.to_string()))?;
            write_u32_le(out, len);
            out.extend_from_slice(item.as_bytes());
        }
        Ok(())
    }

    fn decode(slot: u16, payload: &Bytes) -> Result<Self> {
        let range = |e: crate::common::binary::BinaryError| SchemaError::out_of_range(slot, e.to_string());

        let count = read_u32_le(payload, 0).map_err(range)? as usize;
        // Every item needs at least its 4-byte length prefix.
        if count > payload.len() / 4 {
            return Err(SchemaError::out_of_range(
                slot,
                format!("list claims {} items in {} bytes", count, payload.len()),
            ));
        }

        let mut items = Vec::with_capacity(count);
        let mut pos = 4;
        for _ in 0..count {
            let len = read_u32_le(payload, pos).map_err(range)? as usize;
            pos += 4;
            let bytes = read_slice(payload, pos, len).map_err(range)?;
            pos += len;
            items.push(utf8(slot, FieldKind::StringList, bytes)?);
        }
        Ok(items)
    }
}

impl FieldType for Bytes {
    const KIND: FieldKind = FieldKind::Bytes;

    fn encode(&self, _slot: u16, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(self);
        Ok(())
    }

    fn decode(_slot: u16, payload: &Bytes) -> Result<Self> {
        Ok(payload.clone())
    }
}

fn utf8(slot: u16, kind: FieldKind, bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| SchemaError::mismatch(slot, kind, format!("invalid UTF-8 ({})", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tag_checked_before_payload() {
        let raw = RawField::encode(4, &"text".to_string()).unwrap();
        assert_eq!(raw.decode::<String>(4).unwrap(), "text");
        assert!(matches!(
            raw.decode::<bool>(4),
            Err(SchemaError::TypeMismatch { slot: 4, expected: FieldKind::Bool, .. })
        ));
    }

    #[test]
    fn test_unknown_kind_tag() {
        let raw = RawField {
            kind: 42,
            payload: Bytes::from_static(b"x"),
        };
        assert_eq!(raw.field_kind(), None);
        let err = raw.decode::<String>(6).unwrap_err();
        assert!(err.to_string().contains("unknown kind tag 42"));
    }

    #[test]
    fn test_bool_width_is_strict() {
        let raw = RawField::new(FieldKind::Bool, vec![1u8, 0]);
        assert!(matches!(
            raw.decode::<bool>(4),
            Err(SchemaError::TypeMismatch { .. })
        ));
        let raw = RawField::new(FieldKind::Bool, vec![7u8]);
        assert!(raw.decode::<bool>(4).is_err());
    }

    #[test]
    fn test_string_list_preserves_order_and_empties() {
        let tags = vec!["b".to_string(), String::new(), "a".to_string()];
        let raw = RawField::encode(10, &tags).unwrap();
        assert_eq!(raw.decode::<Vec<String>>(10).unwrap(), tags);
    }

    #[test]
    fn test_string_list_truncated_item() {
        // count = 1, item length = 10, but only 2 bytes follow
        let payload = vec![1, 0, 0, 0, 10, 0, 0, 0, b'h', b'i'];
        let raw = RawField::new(FieldKind::StringList, payload);
        assert!(matches!(
            raw.decode::<Vec<String>>(10),
            Err(SchemaError::FieldOutOfRange { slot: 10, .. })
        ));
    }

    #[test]
    fn test_string_list_absurd_count() {
        let payload = vec![0xFF, 0xFF, 0xFF, 0xFF];
        let raw = RawField::new(FieldKind::StringList, payload);
        assert!(matches!(
            raw.decode::<Vec<String>>(10),
            Err(SchemaError::FieldOutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_type_mismatch() {
        let raw = RawField::new(FieldKind::String, vec![0xC3, 0x28]);
        assert!(matches!(
            raw.decode::<String>(4),
            Err(SchemaError::TypeMismatch { .. })
        ));
    }
}
