//! Lazily-validated view over an encoded table.

use bytes::Bytes;

use super::error::{Result, SchemaError};
use super::field::{FieldType, RawField};
use super::{DIRECTORY_HEADER_LEN, ENTRY_LEN, HEADER_LEN, MAGIC};
use crate::common::binary::{read_slice, read_u16_le, read_u32_le};

/// One directory entry, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    slot: u16,
    kind: u8,
    offset: u32,
    len: u32,
}

/// A decoded table.
///
/// Holds the original buffer; cloning is cheap. Only the header and the
/// directory bounds are checked by [`BinaryTable::decode`]; field payloads
/// are checked when read.
#[derive(Debug, Clone)]
pub struct BinaryTable {
    buf: Bytes,
    version: u16,
    directory: usize,
    count: usize,
}

impl BinaryTable {
    /// Decode a buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MalformedBuffer`] if the buffer is shorter than
    /// the header, carries the wrong magic or a zero version, or if the root
    /// offset or the directory it points at lies outside the buffer.
    pub fn decode(buf: impl Into<Bytes>) -> Result<Self> {
        let buf: Bytes = buf.into();
        let malformed = |msg: String| SchemaError::MalformedBuffer(msg);

        if buf.len() < HEADER_LEN {
            return Err(malformed(format!(
                "buffer is {} bytes, header needs {}",
                buf.len(),
                HEADER_LEN
            )));
        }
        if buf[0..4] != MAGIC {
            return Err(malformed("bad magic".to_string()));
        }

        let version = read_u16_le(&buf, 4).map_err(|e| malformed(e.to_string()))?;
        if version == 0 {
            return Err(malformed("version 0 is not a valid table version".to_string()));
        }

        let root = read_u32_le(&buf, 8).map_err(|e| malformed(e.to_string()))? as usize;
        if root < HEADER_LEN {
            return Err(malformed(format!("root offset {} overlaps the header", root)));
        }
        let count = read_u16_le(&buf, root)
            .map_err(|_| malformed(format!("root offset {} is out of range", root)))?
            as usize;

        let directory = root + DIRECTORY_HEADER_LEN;
        read_slice(&buf, directory, count * ENTRY_LEN).map_err(|_| {
            malformed(format!(
                "directory of {} entries at offset {} is truncated",
                count, root
            ))
        })?;

        Ok(Self {
            buf,
            version,
            directory,
            count,
        })
    }

    /// Schema version the buffer was written with.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The encoded bytes this table was decoded from.
    pub fn as_bytes(&self) -> &Bytes {
        &self.buf
    }

    /// Slots present in the table, in directory order.
    pub fn slots(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.count).filter_map(|i| self.entry(i).map(|e| e.slot))
    }

    /// Whether `slot` has a value.
    pub fn contains(&self, slot: u16) -> bool {
        self.find(slot).is_some()
    }

    /// The raw field at `slot`, bounds-checked.
    ///
    /// # Errors
    ///
    /// [`SchemaError::FieldOutOfRange`] if the entry points outside the buffer.
    pub fn raw(&self, slot: u16) -> Result<Option<RawField>> {
        let Some(entry) = self.find(slot) else {
            return Ok(None);
        };

        let start = entry.offset as usize;
        let end = start
            .checked_add(entry.len as usize)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                SchemaError::out_of_range(
                    slot,
                    format!(
                        "payload {}..+{} exceeds buffer of {} bytes",
                        entry.offset,
                        entry.len,
                        self.buf.len()
                    ),
                )
            })?;

        Ok(Some(RawField {
            kind: entry.kind,
            payload: self.buf.slice(start..end),
        }))
    }

    /// Typed read of `slot`. Absent fields yield `Ok(None)`.
    pub fn get<T: FieldType>(&self, slot: u16) -> Result<Option<T>> {
        match self.raw(slot)? {
            Some(raw) => raw.decode(slot).map(Some),
            None => Ok(None),
        }
    }

    fn find(&self, slot: u16) -> Option<Entry> {
        (0..self.count)
            .filter_map(|i| self.entry(i))
            .find(|e| e.slot == slot)
    }

    fn entry(&self, index: usize) -> Option<Entry> {
        let base = self.directory + index * ENTRY_LEN;
        let slot = read_u16_le(&self.buf, base).ok()?;
        let kind = *self.buf.get(base + 2)?;
        let offset = read_u32_le(&self.buf, base + 4).ok()?;
        let len = read_u32_le(&self.buf, base + 8).ok()?;
        Some(Entry {
            slot,
            kind,
            offset,
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::binary::{write_u16_le, write_u32_le};
    use crate::schema::{FieldKind, TableBuilder};

    fn sample() -> Bytes {
        let mut builder = TableBuilder::new();
        builder.set(4, &"Title".to_string()).unwrap();
        builder.set(6, &false).unwrap();
        builder.finish().unwrap()
    }

    /// Hand-build a table with arbitrary entries and payload bytes.
    fn handmade(version: u16, entries: &[(u16, u8, u32, u32)], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        write_u16_le(&mut out, version);
        write_u16_le(&mut out, 0);
        write_u32_le(&mut out, HEADER_LEN as u32);
        write_u16_le(&mut out, entries.len() as u16);
        write_u16_le(&mut out, 0);
        for &(slot, kind, offset, len) in entries {
            write_u16_le(&mut out, slot);
            out.push(kind);
            out.push(0);
            write_u32_le(&mut out, offset);
            write_u32_le(&mut out, len);
        }
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let err = BinaryTable::decode(vec![b'O', b'X']).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedBuffer(_)));
        assert!(BinaryTable::decode(Vec::new()).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut bytes = sample().to_vec();
        bytes[0] = b'Z';
        assert!(matches!(
            BinaryTable::decode(bytes),
            Err(SchemaError::MalformedBuffer(_))
        ));
    }

    #[test]
    fn test_decode_rejects_root_out_of_range() {
        let mut bytes = sample().to_vec();
        bytes[8..12].copy_from_slice(&10_000u32.to_le_bytes());
        let err = BinaryTable::decode(bytes).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_decode_rejects_truncated_directory() {
        let bytes = sample();
        // Cut inside the first directory entry.
        let truncated = bytes.slice(0..HEADER_LEN + DIRECTORY_HEADER_LEN + 3);
        assert!(matches!(
            BinaryTable::decode(truncated),
            Err(SchemaError::MalformedBuffer(_))
        ));
    }

    #[test]
    fn test_field_errors_are_lazy() {
        // Slot 4 points far past the end; slot 6 is fine.
        let dir_end = (HEADER_LEN + DIRECTORY_HEADER_LEN + 2 * ENTRY_LEN) as u32;
        let bytes = handmade(
            1,
            &[(4, FieldKind::String as u8, 9_999, 5), (6, FieldKind::Bool as u8, dir_end, 1)],
            &[1],
        );

        let table = BinaryTable::decode(bytes).expect("header is valid");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get::<bool>(6).unwrap(), Some(true));
        assert!(matches!(
            table.get::<String>(4),
            Err(SchemaError::FieldOutOfRange { slot: 4, .. })
        ));
    }

    #[test]
    fn test_absent_field_is_none() {
        let table = BinaryTable::decode(sample()).unwrap();
        assert_eq!(table.get::<String>(8).unwrap(), None);
        assert!(!table.contains(8));
        assert!(table.contains(4));
    }

    #[test]
    fn test_type_mismatch() {
        let table = BinaryTable::decode(sample()).unwrap();
        let err = table.get::<bool>(4).unwrap_err();
        assert_eq!(
            err,
            SchemaError::TypeMismatch {
                slot: 4,
                expected: FieldKind::Bool,
                found: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_newer_version_with_unknown_slot_is_readable() {
        let dir_end = (HEADER_LEN + DIRECTORY_HEADER_LEN + 2 * ENTRY_LEN) as u32;
        let bytes = handmade(
            7,
            &[(4, FieldKind::String as u8, dir_end, 2), (40, 99, dir_end + 2, 3)],
            b"hixyz",
        );

        let table = BinaryTable::decode(bytes).unwrap();
        assert_eq!(table.version(), 7);
        assert_eq!(table.get::<String>(4).unwrap().as_deref(), Some("hi"));
        let unknown = table.raw(40).unwrap().unwrap();
        assert_eq!(unknown.kind, 99);
        assert_eq!(unknown.payload.as_ref(), b"xyz");
        assert_eq!(table.slots().collect::<Vec<_>>(), vec![4, 40]);
    }
}
