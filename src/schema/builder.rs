//! Deterministic table encoder.

use std::collections::BTreeMap;

use bytes::Bytes;

use super::error::{Result, SchemaError};
use super::field::{FieldType, RawField};
use super::{DIRECTORY_HEADER_LEN, ENTRY_LEN, FORMAT_VERSION, HEADER_LEN, MAGIC};
use crate::common::binary::{len_u32, write_u16_le, write_u32_le};

/// Collects fields and encodes them into a table buffer.
///
/// Output depends only on the set of `(slot, field)` pairs: entries and
/// payloads are written in ascending slot order regardless of insertion
/// order, and unset fields are not written at all.
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    fields: BTreeMap<u16, RawField>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a typed field, replacing any previous value at `slot`.
    pub fn set<T: FieldType>(&mut self, slot: u16, value: &T) -> Result<&mut Self> {
        let raw = RawField::encode(slot, value)?;
        self.fields.insert(slot, raw);
        Ok(self)
    }

    /// Set an already-encoded field.
    pub fn set_raw(&mut self, slot: u16, raw: RawField) -> &mut Self {
        self.fields.insert(slot, raw);
        self
    }

    /// Remove a field so it is omitted from the output.
    pub fn remove(&mut self, slot: u16) -> Option<RawField> {
        self.fields.remove(&slot)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode the collected fields.
    pub fn finish(&self) -> Result<Bytes> {
        let too_large = |what: &str| SchemaError::MalformedBuffer(format!("{} exceeds u32 range", what));

        let count = u16::try_from(self.fields.len()).map_err(|_| too_large("field count"))?;
        let data_start = HEADER_LEN + DIRECTORY_HEADER_LEN + self.fields.len() * ENTRY_LEN;
        let data_len: usize = self.fields.values().map(|f| f.payload.len()).sum();

        let mut out = Vec::with_capacity(data_start + data_len);

        out.extend_from_slice(&MAGIC);
        write_u16_le(&mut out, FORMAT_VERSION);
        write_u16_le(&mut out, 0);
        write_u32_le(&mut out, HEADER_LEN as u32);

        write_u16_le(&mut out, count);
        write_u16_le(&mut out, 0);

        let mut offset = data_start;
        for (&slot, field) in &self.fields {
            let len = len_u32(field.payload.len()).map_err(|_| too_large("field payload"))?;
            let start = len_u32(offset).map_err(|_| too_large("table"))?;
            write_u16_le(&mut out, slot);
            out.push(field.kind);
            out.push(0);
            write_u32_le(&mut out, start);
            write_u32_le(&mut out, len);
            offset += field.payload.len();
        }

        for field in self.fields.values() {
            out.extend_from_slice(&field.payload);
        }

        Ok(Bytes::from(out))
    }
}
