//! Record projection: a record is a list of `[fieldName, value]` pairs, sorted
//! by field name.

use super::{kind_of, mismatch, pair, unpair, Canonical, Value};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Assembles a record tree. Fields can be added in any order.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    fields: Vec<(&'static str, Value)>,
}

impl RecordBuilder {
    /// Start an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    pub fn field<T: Canonical>(mut self, name: &'static str, value: &T) -> Self {
        self.fields.push((name, value.to_struct()));
        self
    }

    /// Add a field that's already been projected.
    pub fn field_struct(mut self, name: &'static str, value: Value) -> Self {
        self.fields.push((name, value));
        self
    }

    /// Sort the fields by name and produce the tree.
    pub fn build(mut self) -> Value {
        self.fields.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        let pairs = self
            .fields
            .into_iter()
            .map(|(name, value)| pair(Value::from(name), value))
            .collect::<Vec<_>>();
        Value::Array(pairs)
    }
}

/// Pulls fields back out of a record tree by name.
///
/// Call [take][RecordReader::take] for every field the type declares, then
/// [finish][RecordReader::finish] to make sure nothing unexpected was left
/// behind.
#[derive(Debug)]
pub struct RecordReader {
    record: &'static str,
    fields: BTreeMap<String, Value>,
}

impl RecordReader {
    /// Index a record tree. Fails if the tree isn't a list of
    /// `[text, value]` pairs or if a field name repeats.
    pub fn new(record: &'static str, value: Value) -> Result<Self> {
        let items = match value {
            Value::Array(items) => items,
            other => Err(mismatch("record", &other))?,
        };
        let mut fields = BTreeMap::new();
        for item in items {
            let (name, value) = unpair(item)?;
            let name = match name {
                Value::String(s) => s.into_str().ok_or_else(|| Error::Deserialize(String::from("field name is not utf8")))?,
                other => Err(Error::EncodingTypeMismatch {
                    expected: "field name",
                    found: kind_of(&other),
                })?,
            };
            if fields.contains_key(&name) {
                Err(Error::EncodingDuplicate(format!("{}.{}", record, name)))?;
            }
            fields.insert(name, value);
        }
        Ok(Self { record, fields })
    }

    /// Remove and decode a field.
    pub fn take<T: Canonical>(&mut self, name: &'static str) -> Result<T> {
        let value = self.fields.remove(name).ok_or(Error::EncodingMissingField {
            record: self.record,
            field: name,
        })?;
        T::from_struct(value)
    }

    /// Remove a field without decoding it, for fields whose shape depends on
    /// another field.
    pub fn take_struct(&mut self, name: &'static str) -> Result<Value> {
        self.fields.remove(name).ok_or(Error::EncodingMissingField {
            record: self.record,
            field: name,
        })
    }

    /// Fail if any fields were never taken.
    pub fn finish(self) -> Result<()> {
        match self.fields.into_keys().next() {
            Some(field) => Err(Error::EncodingUnknownField {
                record: self.record,
                field,
            }),
            None => Ok(()),
        }
    }
}
