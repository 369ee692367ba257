use crate::access::schema::TupleDesc;
use crate::access::value::Value;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::PageId;

/// The on-disk location of a tuple: a page plus a slot index within it.
///
/// Assigned once at insert time and never reused for a different tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

/// A row: an ordered sequence of typed field values conforming to a schema.
///
/// `record_id` is `None` until the tuple has been placed on a page.
#[derive(Debug, Clone)]
pub struct Tuple {
    desc: TupleDesc,
    values: Vec<Value>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a tuple, checking that the values match the schema.
    pub fn new(desc: TupleDesc, values: Vec<Value>) -> StorageResult<Self> {
        if values.len() != desc.num_fields() {
            return Err(StorageError::SchemaMismatch(format!(
                "{} values for a {}-field schema",
                values.len(),
                desc.num_fields()
            )));
        }
        for (i, value) in values.iter().enumerate() {
            if value.data_type() != desc.field_type(i) {
                return Err(StorageError::SchemaMismatch(format!(
                    "field {} is {:?}, expected {:?}",
                    i,
                    value.data_type(),
                    desc.field_type(i)
                )));
            }
        }
        Ok(Self {
            desc,
            values,
            record_id: None,
        })
    }

    pub fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    pub fn value(&self, i: usize) -> &Value {
        &self.values[i]
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: RecordId) {
        self.record_id = Some(rid);
    }

    /// Fixed-width serialization of this tuple's fields, `tuple_size()`
    /// bytes long.
    pub fn serialize(&self) -> StorageResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.desc.tuple_size());
        for value in &self.values {
            value.serialize_into(&mut out)?;
        }
        Ok(out)
    }

    /// Decodes a tuple from the fixed-width slot bytes.
    pub fn deserialize(desc: &TupleDesc, bytes: &[u8]) -> StorageResult<Tuple> {
        let mut reader = bytes;
        let mut values = Vec::with_capacity(desc.num_fields());
        for i in 0..desc.num_fields() {
            values.push(Value::deserialize_from(desc.field_type(i), &mut reader)?);
        }
        Ok(Tuple {
            desc: desc.clone(),
            values,
            record_id: None,
        })
    }
}
