//! Schema-checked, batched access to a [`BinaryTable`].

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::schema::{BinaryTable, FieldKind, FieldType, RawField, Result, SchemaError, TableBuilder};

/// One published field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub slot: u16,
    pub name: &'static str,
    pub kind: FieldKind,
}

/// The published layout of a record.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub fn field(&self, slot: u16) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.slot == slot)
    }
}

/// A decoded table plus the writes made since it was decoded.
///
/// Writes are kept as encoded fields and only merged into a new buffer by
/// [`PropertyTable::to_bytes`]. Slots the schema does not declare (written by
/// a newer version) are never modified and are carried through on re-encode.
#[derive(Debug, Clone)]
pub struct PropertyTable {
    schema: &'static Schema,
    source: Option<BinaryTable>,
    /// `None` marks a cleared field
    pending: BTreeMap<u16, Option<RawField>>,
}

impl PropertyTable {
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            source: None,
            pending: BTreeMap::new(),
        }
    }

    pub fn from_bytes(schema: &'static Schema, buf: impl Into<Bytes>) -> Result<Self> {
        Ok(Self {
            schema,
            source: Some(BinaryTable::decode(buf)?),
            pending: BTreeMap::new(),
        })
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Whether there are writes not yet materialized.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether `slot` was set or cleared since the table was decoded.
    pub fn is_pending(&self, slot: u16) -> bool {
        self.pending.contains_key(&slot)
    }

    /// Whether `slot` currently has a value.
    pub fn is_set(&self, slot: u16) -> bool {
        match self.pending.get(&slot) {
            Some(value) => value.is_some(),
            None => self.source.as_ref().is_some_and(|t| t.contains(slot)),
        }
    }

    /// Whether no slot, declared or not, has a value.
    pub fn is_empty(&self) -> bool {
        let source_set = self
            .source
            .as_ref()
            .is_some_and(|t| t.slots().any(|slot| self.is_set(slot)));
        !source_set && !self.pending.values().any(Option::is_some)
    }

    /// Typed read.
    ///
    /// Returns `Ok(None)` for an unset field. Fails with `TypeMismatch` when
    /// the schema declares `slot` with a kind other than `T`'s, or when the
    /// stored kind disagrees; fails with `FieldOutOfRange` when the stored
    /// payload lies outside the buffer.
    pub fn get<T: FieldType>(&self, slot: u16) -> Result<Option<T>> {
        if let Some(spec) = self.schema.field(slot)
            && spec.kind != T::KIND
        {
            return Err(SchemaError::mismatch(
                slot,
                T::KIND,
                format!("{} field `{}`", spec.kind, spec.name),
            ));
        }

        match self.pending.get(&slot) {
            Some(Some(raw)) => raw.decode(slot).map(Some),
            Some(None) => Ok(None),
            None => match &self.source {
                Some(table) => table.get(slot),
                None => Ok(None),
            },
        }
    }

    /// Typed write, batched until the next [`PropertyTable::to_bytes`].
    pub fn set<T: FieldType>(&mut self, slot: u16, value: &T) -> Result<()> {
        let spec = self.declared(slot)?;
        if spec.kind != T::KIND {
            return Err(SchemaError::mismatch(
                slot,
                spec.kind,
                format!("{} value", T::KIND),
            ));
        }
        let raw = RawField::encode(slot, value)?;
        self.pending.insert(slot, Some(raw));
        Ok(())
    }

    /// Unset a field so readers see its default again.
    pub fn clear(&mut self, slot: u16) -> Result<()> {
        self.declared(slot)?;
        self.pending.insert(slot, None);
        Ok(())
    }

    /// Merge the source table with pending writes and encode.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut builder = TableBuilder::new();
        if let Some(table) = &self.source {
            for slot in table.slots() {
                if let Some(raw) = table.raw(slot)? {
                    builder.set_raw(slot, raw);
                }
            }
        }
        for (&slot, value) in &self.pending {
            match value {
                Some(raw) => {
                    builder.set_raw(slot, raw.clone());
                },
                None => {
                    builder.remove(slot);
                },
            }
        }
        builder.finish()
    }

    fn declared(&self, slot: u16) -> Result<&'static FieldSpec> {
        self.schema.field(slot).ok_or_else(|| {
            SchemaError::out_of_range(
                slot,
                format!("slot is not declared by {}", self.schema.name),
            )
        })
    }
}

/// A typed view over one record layout.
pub trait PropertyModel: Sized {
    /// Published layout of the record.
    const SCHEMA: &'static Schema;

    fn from_table(table: PropertyTable) -> Self;

    fn table(&self) -> &PropertyTable;

    fn table_mut(&mut self) -> &mut PropertyTable;

    /// An empty record: every field reads as its default.
    fn empty() -> Self {
        Self::from_table(PropertyTable::new(Self::SCHEMA))
    }

    /// Decode a record written by any schema version.
    fn from_bytes(buf: impl Into<Bytes>) -> Result<Self> {
        PropertyTable::from_bytes(Self::SCHEMA, buf).map(Self::from_table)
    }

    /// Encode the record, including pending writes.
    fn to_bytes(&self) -> Result<Bytes> {
        self.table().to_bytes()
    }

    fn get_field<T: FieldType>(&self, slot: u16) -> Result<Option<T>> {
        self.table().get(slot)
    }

    fn set_field<T: FieldType>(&mut self, slot: u16, value: T) -> Result<()> {
        self.table_mut().set(slot, &value)
    }

    fn clear_field(&mut self, slot: u16) -> Result<()> {
        self.table_mut().clear(slot)
    }
}
