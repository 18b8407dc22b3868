use serde_json::{Map, Value};
use std::sync::Arc;

use super::{Aggregation, Filter, Query, Source, SubAggregations};

/// Body of a `_search` request
#[derive(Clone, Default)]
pub struct SearchSource {
    query: Option<Arc<dyn Query>>,
    post_filter: Option<Arc<dyn Filter>>,
    from: Option<usize>,
    size: Option<usize>,
    aggregations: SubAggregations,
}

impl SearchSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Query + 'static) -> Self {
        self.query = Some(Arc::new(query));
        self
    }

    pub fn post_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.post_filter = Some(Arc::new(filter));
        self
    }

    pub fn from(mut self, from: usize) -> Self {
        self.from = Some(from);
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn aggregation(mut self, name: impl Into<String>, agg: impl Aggregation + 'static) -> Self {
        self.aggregations.insert(name, agg);
        self
    }
}

impl Source for SearchSource {
    fn source(&self) -> Value {
        let mut source = Map::new();
        if let Some(query) = &self.query {
            source.insert("query".to_string(), query.source());
        }
        if let Some(filter) = &self.post_filter {
            source.insert("post_filter".to_string(), filter.source());
        }
        if let Some(from) = self.from {
            source.insert("from".to_string(), from.into());
        }
        if let Some(size) = self.size {
            source.insert("size".to_string(), size.into());
        }
        self.aggregations.write_to(&mut source);
        Value::Object(source)
    }
}

impl std::fmt::Debug for SearchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchSource({})", self.source())
    }
}
