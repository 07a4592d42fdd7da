//! Primary-key descriptors and key values.
//!
//! A table's key is described once, as an ordered field list. The same
//! ordering drives local lookups and the remote conflict target, so the two
//! representations cannot drift apart.

use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Ordered primary-key field list for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    fields: &'static [&'static str],
}

impl KeySpec {
    pub const fn new(fields: &'static [&'static str]) -> Self {
        Self { fields }
    }

    /// Key fields in storage and conflict-resolution order.
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn is_composite(&self) -> bool {
        self.fields.len() > 1
    }

    /// Comma-joined field list used as the remote upsert conflict target.
    pub fn conflict_target(&self) -> String {
        self.fields.join(",")
    }

    /// Extract this key's values from a row, in field order.
    pub fn extract(&self, table: &'static str, row: &Value) -> StoreResult<Key> {
        let mut values = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            match row.get(*field) {
                Some(v) if !v.is_null() => values.push(v.clone()),
                _ => return Err(StoreError::MissingKeyField { table, field }),
            }
        }
        Ok(Key(values))
    }
}

/// Ordered key values matching a table's [`KeySpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct Key(Vec<Value>);

impl Key {
    /// Key for a single-field primary key.
    pub fn single(value: impl Into<Value>) -> Self {
        Self(vec![value.into()])
    }

    /// Key for a composite primary key; values must follow the spec's field
    /// order.
    pub fn composite<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
