use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of a record, assigned by the remote source.
pub type RecordId = i64;

/// Field names the table renders as columns.
pub const FIELD_ID: &str = "id";
pub const FIELD_NAME: &str = "name";
pub const FIELD_EMAIL: &str = "email";

/// One user entity fetched from the remote source.
///
/// `id`, `name` and `email` are the typed columns the table works with. Every
/// other field the source sends (address, phone, company, ...) lands in `extra`
/// untouched and in source order, so a record can be serialized back without
/// losing anything.
///
/// Records are treated as immutable values: saving an edit builds a new record
/// with [`Record::with_contact`] and swaps it in by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub email: String,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Runtime-typed view of a record field, used to pick sort semantics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    /// Any JSON integer. Wide enough for every `i64` and `u64` without rounding.
    Integer(i128),
    Float(f64),
    /// Missing, null, boolean, array or object.
    Other,
}

impl Record {
    pub fn new(id: RecordId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            extra: IndexMap::new(),
        }
    }

    /// Look up a field by its source name.
    pub fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            FIELD_ID => FieldValue::Integer(i128::from(self.id)),
            FIELD_NAME => FieldValue::Text(&self.name),
            FIELD_EMAIL => FieldValue::Text(&self.email),
            other => match self.extra.get(other) {
                Some(Value::String(s)) => FieldValue::Text(s),
                Some(Value::Number(n)) => number_value(n),
                _ => FieldValue::Other,
            },
        }
    }

    /// Copy of this record with `name` and `email` replaced. Passthrough fields are kept.
    pub fn with_contact(&self, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: self.id,
            name: name.into(),
            email: email.into(),
            extra: self.extra.clone(),
        }
    }

    /// Case-insensitive substring match on `name`. `needle` must already be lowercased.
    pub fn name_contains(&self, needle: &str) -> bool {
        needle.is_empty() || self.name.to_lowercase().contains(needle)
    }
}

fn number_value(n: &serde_json::Number) -> FieldValue<'_> {
    if let Some(i) = n.as_i64() {
        FieldValue::Integer(i128::from(i))
    } else if let Some(u) = n.as_u64() {
        FieldValue::Integer(i128::from(u))
    } else {
        n.as_f64().map_or(FieldValue::Other, FieldValue::Float)
    }
}
