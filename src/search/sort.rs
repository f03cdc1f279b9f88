//! Sort order over matches: by score, by id, or by a field's doc-value,
//! each ascending or descending, with missing-value placement.

use std::cmp::Ordering;

use crate::{doc::ID_FIELD, search::DocumentMatch};

#[derive(Clone, Debug)]
pub enum SortSource {
    Score,
    Id,
    Field(String),
}

#[derive(Clone, Debug)]
pub struct SortBy {
    pub source: SortSource,
    pub desc: bool,
    pub missing_first: bool,
}

impl SortBy {
    pub fn field(name: &str) -> SortBy {
        SortBy {
            source: SortSource::Field(name.to_string()),
            desc: false,
            missing_first: false,
        }
    }

    pub fn score() -> SortBy {
        SortBy {
            source: SortSource::Score,
            desc: false,
            missing_first: false,
        }
    }

    pub fn id() -> SortBy {
        SortBy {
            source: SortSource::Id,
            desc: false,
            missing_first: false,
        }
    }

    pub fn desc(mut self) -> SortBy {
        self.desc = true;
        self
    }

    pub fn missing_first(mut self) -> SortBy {
        self.missing_first = true;
        self
    }

    fn key(&self, dm: &DocumentMatch) -> Vec<u8> {
        match &self.source {
            SortSource::Score => encode_f64_ordered(dm.score),
            SortSource::Id => dm.doc_value(ID_FIELD).map(|v| v.to_vec()).unwrap_or_default(),
            SortSource::Field(field) => {
                dm.doc_value(field).map(|v| v.to_vec()).unwrap_or_default()
            }
        }
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        // empty keys stand for a missing value
        let ord = match (a.is_empty(), b.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) if self.missing_first => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, true) if self.missing_first => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.cmp(b),
        };
        match self.desc {
            true => ord.reverse(),
            false => ord,
        }
    }
}

/// Ordered list of sort criteria, most significant first.
#[derive(Clone, Debug, Default)]
pub struct SortOrder {
    pub orders: Vec<SortBy>,
}

impl SortOrder {
    pub fn new(orders: Vec<SortBy>) -> SortOrder {
        SortOrder { orders }
    }

    /// Default relevance order: score descending.
    pub fn by_score() -> SortOrder {
        SortOrder::new(vec![SortBy::score().desc()])
    }

    /// Parse sort strings: a leading `-` sorts descending, `_score` and
    /// `_id` name the computed sources, anything else a field.
    pub fn parse(orders: &[&str]) -> SortOrder {
        let orders = orders
            .iter()
            .map(|s| {
                let (desc, name) = match s.strip_prefix('-') {
                    Some(name) => (true, name),
                    None => (false, *s),
                };
                let by = match name {
                    "_score" => SortBy::score(),
                    "_id" => SortBy::id(),
                    name => SortBy::field(name),
                };
                match desc {
                    true => by.desc(),
                    false => by,
                }
            })
            .collect();
        SortOrder::new(orders)
    }

    /// Fields whose doc-values the keys need.
    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![];
        for by in self.orders.iter() {
            let name = match &by.source {
                SortSource::Field(field) => field.clone(),
                SortSource::Id => ID_FIELD.to_string(),
                SortSource::Score => continue,
            };
            if !fields.contains(&name) {
                fields.push(name);
            }
        }
        fields
    }

    pub fn key(&self, dm: &DocumentMatch) -> Vec<Vec<u8>> {
        self.orders.iter().map(|by| by.key(dm)).collect()
    }

    pub fn compare(&self, a: &[Vec<u8>], b: &[Vec<u8>]) -> Ordering {
        for (i, by) in self.orders.iter().enumerate() {
            let (ka, kb) = (
                a.get(i).map(|k| k.as_slice()).unwrap_or(&[]),
                b.get(i).map(|k| k.as_slice()).unwrap_or(&[]),
            );
            match by.compare(ka, kb) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// Flip every direction; used by cursor-before pagination.
    pub fn reverse(&mut self) {
        for by in self.orders.iter_mut() {
            by.desc = !by.desc;
        }
    }

    pub fn reversed(&self) -> SortOrder {
        let mut copy = self.clone();
        copy.reverse();
        copy
    }
}

// total-order byte encoding of a float: flip the sign bit for positives,
// all bits for negatives.
fn encode_f64_ordered(value: f64) -> Vec<u8> {
    let bits = value.to_bits();
    let ordered = if bits & 0x8000_0000_0000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000_0000_0000
    };
    ordered.to_be_bytes().to_vec()
}

#[cfg(test)]
#[path = "sort_test.rs"]
mod sort_test;
