//! Request body builders
//!
//! Every builder is a value: setters take `self` and hand back the modified
//! copy, and [`Source::source`] renders the accumulated options as
//! `{"<name>": {option: value, ...}}`.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod aggregations;
pub mod filters;
pub mod queries;
pub mod search;

pub use aggregations::*;
pub use filters::*;
pub use queries::*;
pub use search::SearchSource;

/// Anything that renders to a request body fragment
pub trait Source {
    fn source(&self) -> Value;
}

/// Aggregation builder, usable as a sub-aggregation of another
pub trait Aggregation: Source + Send + Sync {}

/// Filter builder
pub trait Filter: Source + Send + Sync {}

/// Query builder
pub trait Query: Source + Send + Sync {}

/// Options shared by aggregations that read values from a field or a script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValuesSource {
    pub field: Option<String>,
    pub script: Option<String>,
    pub script_file: Option<String>,
    pub lang: Option<String>,
    pub format: Option<String>,
    pub params: Map<String, Value>,
}

impl ValuesSource {
    /// Write the set options into `opts`
    pub fn write_to(&self, opts: &mut Map<String, Value>) {
        let strings = [
            ("field", &self.field),
            ("script", &self.script),
            ("script_file", &self.script_file),
            ("lang", &self.lang),
            ("format", &self.format),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                opts.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        if !self.params.is_empty() {
            opts.insert("params".to_string(), Value::Object(self.params.clone()));
        }
    }
}

/// Named child aggregations
#[derive(Clone, Default)]
pub struct SubAggregations {
    aggs: BTreeMap<String, Arc<dyn Aggregation>>,
}

impl SubAggregations {
    pub fn insert(&mut self, name: impl Into<String>, agg: impl Aggregation + 'static) {
        self.aggs.insert(name.into(), Arc::new(agg));
    }

    pub fn is_empty(&self) -> bool {
        self.aggs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.aggs.len()
    }

    /// `{"<name>": <agg source>, ...}`
    pub fn source(&self) -> Value {
        Value::Object(
            self.aggs
                .iter()
                .map(|(name, agg)| (name.clone(), agg.source()))
                .collect(),
        )
    }

    /// Add an `"aggregations"` key to `source` when there are children
    pub fn write_to(&self, source: &mut Map<String, Value>) {
        if !self.is_empty() {
            source.insert("aggregations".to_string(), self.source());
        }
    }
}

impl std::fmt::Debug for SubAggregations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.aggs.keys()).finish()
    }
}

/// `{"<kind>": opts}` plus the sub-aggregations block
pub(crate) fn wrap(kind: &str, opts: Map<String, Value>, subs: &SubAggregations) -> Value {
    let mut source = Map::new();
    source.insert(kind.to_string(), Value::Object(opts));
    subs.write_to(&mut source);
    Value::Object(source)
}
