//! Query result rows
//!
//! A [`Row`] maps column names to [`ResultValue`]s. Rows carry no ordering of
//! their own: every encoder emits values in the declared column order.

mod value;

pub use value::{ResultValue, TIMESTAMP_TEXT_FORMAT};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One result row keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, ResultValue>);

/// All rows of one completed query
pub type ResultSet = Vec<Row>;

impl Row {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<ResultValue>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<ResultValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&ResultValue> {
        self.0.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<ResultValue> {
        self.0.remove(column)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<ResultValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
