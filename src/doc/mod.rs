//! Module `doc` implement the document and field model.
//!
//! A [Document] is an ordered list of [Field]s. The first field is always the
//! special `_id` field carrying the document's external identifier; updating
//! or deleting a document addresses it by that identifier, byte-exact.
//!
//! What happens to a field is controlled by its [options][FieldOptions]: a
//! field may be indexed, stored verbatim for retrieval, indexed with token
//! locations (required for phrase matching and highlighting downstream), and
//! recorded as a columnar doc-value (required for sorting and aggregations).

use chrono::{DateTime, Utc};

use std::ops;

pub mod geo;
pub mod numeric;

/// Name of the identifier field, always the first field of a document.
pub const ID_FIELD: &str = "_id";

/// Default name for the composite field spanning all indexed fields.
pub const ALL_FIELD: &str = "_all";

/// Field behavior flags. Combine with `|`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldOptions(u8);

/// Field shall be searchable.
pub const INDEX: FieldOptions = FieldOptions(1);
/// Field's raw value shall be retrievable from the index.
pub const STORE: FieldOptions = FieldOptions(1 << 1);
/// Index token locations (position, byte offsets) for this field.
pub const LOCATIONS: FieldOptions = FieldOptions(1 << 2);
/// Record the field's terms as columnar doc-values, for sorting/aggregation.
pub const DOC_VALUES: FieldOptions = FieldOptions(1 << 3);
/// Index the raw value as a single token, bypassing tokenization.
pub const KEYWORD: FieldOptions = FieldOptions(1 << 4);

impl ops::BitOr for FieldOptions {
    type Output = FieldOptions;

    fn bitor(self, rhs: FieldOptions) -> FieldOptions {
        FieldOptions(self.0 | rhs.0)
    }
}

impl FieldOptions {
    pub fn is_index(&self) -> bool {
        (self.0 & INDEX.0) != 0
    }

    pub fn is_store(&self) -> bool {
        (self.0 & STORE.0) != 0
    }

    pub fn is_locations(&self) -> bool {
        (self.0 & LOCATIONS.0) != 0
    }

    pub fn is_doc_values(&self) -> bool {
        (self.0 & DOC_VALUES.0) != 0
    }

    pub fn is_keyword(&self) -> bool {
        (self.0 & KEYWORD.0) != 0
    }
}

/// Typed field payload. The type decides how the field is analyzed into
/// terms and how its raw value is encoded for storage.
#[derive(Clone, Debug)]
pub enum FieldValue {
    Text(String),
    Numeric(f64),
    Date(DateTime<Utc>),
    GeoPoint { lng: f64, lat: f64 },
    /// Synthetic field whose term stream is the union of every other indexed
    /// field of the document, except the named exclusions.
    Composite { exclude: Vec<String> },
}

/// A single named field of a document.
#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub options: FieldOptions,
}

impl Field {
    /// Text field, tokenized by the analyzer; indexed by default.
    pub fn text(name: &str, value: &str) -> Field {
        Field {
            name: name.to_string(),
            value: FieldValue::Text(value.to_string()),
            options: INDEX,
        }
    }

    /// Text field indexed as one verbatim token; indexed by default.
    pub fn keyword(name: &str, value: &str) -> Field {
        Field {
            name: name.to_string(),
            value: FieldValue::Text(value.to_string()),
            options: INDEX | KEYWORD,
        }
    }

    /// Numeric field, indexed as prefix-coded trie terms with doc-values.
    pub fn numeric(name: &str, value: f64) -> Field {
        Field {
            name: name.to_string(),
            value: FieldValue::Numeric(value),
            options: INDEX | DOC_VALUES,
        }
    }

    /// Date-time field, indexed like a numeric field over UNIX nanoseconds.
    pub fn date(name: &str, value: DateTime<Utc>) -> Field {
        Field {
            name: name.to_string(),
            value: FieldValue::Date(value),
            options: INDEX | DOC_VALUES,
        }
    }

    /// Geo-point field, indexed as morton-coded trie terms with doc-values.
    pub fn geo_point(name: &str, lng: f64, lat: f64) -> Field {
        Field {
            name: name.to_string(),
            value: FieldValue::GeoPoint { lng, lat },
            options: INDEX | DOC_VALUES,
        }
    }

    /// Composite field assembled from the token streams of all other indexed
    /// fields, excluding `exclude` and the `_id` field.
    pub fn composite(name: &str, exclude: Vec<String>) -> Field {
        Field {
            name: name.to_string(),
            value: FieldValue::Composite { exclude },
            options: INDEX,
        }
    }

    /// Additionally store the raw value for retrieval.
    pub fn store_value(mut self) -> Field {
        self.options = self.options | STORE;
        self
    }

    /// Additionally index token locations.
    pub fn include_locations(mut self) -> Field {
        self.options = self.options | LOCATIONS;
        self
    }

    /// Additionally record terms as doc-values.
    pub fn doc_values(mut self) -> Field {
        self.options = self.options | DOC_VALUES;
        self
    }

    /// Alias for [Field::doc_values]; sorting reads doc-values.
    pub fn sortable(self) -> Field {
        self.doc_values()
    }

    /// Raw value bytes, as persisted for a stored field. Composite fields
    /// have no raw value.
    pub fn value_bytes(&self) -> Vec<u8> {
        match &self.value {
            FieldValue::Text(text) => text.as_bytes().to_vec(),
            FieldValue::Numeric(num) => num.to_bits().to_be_bytes().to_vec(),
            FieldValue::Date(dt) => {
                let nanos = dt.timestamp_nanos();
                nanos.to_be_bytes().to_vec()
            }
            FieldValue::GeoPoint { lng, lat } => {
                let mut buf = Vec::with_capacity(16);
                buf.extend_from_slice(&lng.to_bits().to_be_bytes());
                buf.extend_from_slice(&lat.to_bits().to_be_bytes());
                buf
            }
            FieldValue::Composite { .. } => vec![],
        }
    }
}

/// An ordered sequence of fields, addressed by its `_id`.
#[derive(Clone, Debug)]
pub struct Document {
    pub fields: Vec<Field>,
}

impl Document {
    /// Create a document with the given external identifier. The `_id` field
    /// is indexed verbatim and stored.
    pub fn new(id: &str) -> Document {
        let id_field = Field {
            name: ID_FIELD.to_string(),
            value: FieldValue::Text(id.to_string()),
            options: INDEX | STORE | KEYWORD | DOC_VALUES,
        };
        Document {
            fields: vec![id_field],
        }
    }

    pub fn add_field(mut self, field: Field) -> Document {
        self.fields.push(field);
        self
    }

    /// The identifier term bytes for this document.
    pub fn id(&self) -> Vec<u8> {
        match &self.fields[0].value {
            FieldValue::Text(text) => text.as_bytes().to_vec(),
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
