use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{Filter, Query, Source};

/// Matches every document
#[derive(Debug, Clone, Default)]
pub struct MatchAllQuery {
    boost: Option<f64>,
}

impl MatchAllQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }
}

impl Source for MatchAllQuery {
    fn source(&self) -> Value {
        let mut params = Map::new();
        if let Some(boost) = self.boost {
            params.insert("boost".to_string(), json!(boost));
        }
        json!({ "match_all": params })
    }
}

impl Query for MatchAllQuery {}

/// Exact term match on a single field.
///
/// Renders the short form `{"term":{"field":value}}` unless a boost or a
/// query name is set.
#[derive(Debug, Clone)]
pub struct TermQuery {
    field: String,
    value: Value,
    boost: Option<f64>,
    query_name: Option<String>,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            boost: None,
            query_name: None,
        }
    }

    pub fn boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }

    pub fn query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = Some(query_name.into());
        self
    }
}

impl Source for TermQuery {
    fn source(&self) -> Value {
        let mut params = Map::new();
        if self.boost.is_none() && self.query_name.is_none() {
            params.insert(self.field.clone(), self.value.clone());
        } else {
            let mut opts = Map::new();
            opts.insert("value".to_string(), self.value.clone());
            if let Some(boost) = self.boost {
                opts.insert("boost".to_string(), json!(boost));
            }
            if let Some(name) = &self.query_name {
                opts.insert("_name".to_string(), name.clone().into());
            }
            params.insert(self.field.clone(), Value::Object(opts));
        }
        json!({ "term": params })
    }
}

impl Query for TermQuery {}

/// Runs `query` over the documents accepted by `filter`
#[derive(Clone)]
pub struct FilteredQuery {
    query: Arc<dyn Query>,
    filter: Option<Arc<dyn Filter>>,
}

impl FilteredQuery {
    pub fn new(query: impl Query + 'static) -> Self {
        Self {
            query: Arc::new(query),
            filter: None,
        }
    }

    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }
}

impl Source for FilteredQuery {
    fn source(&self) -> Value {
        let mut params = Map::new();
        params.insert("query".to_string(), self.query.source());
        if let Some(filter) = &self.filter {
            params.insert("filter".to_string(), filter.source());
        }
        json!({ "filtered": params })
    }
}

impl Query for FilteredQuery {}

impl std::fmt::Debug for FilteredQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredQuery")
            .field("query", &self.query.source())
            .field("filter", &self.filter.as_ref().map(|filter| filter.source()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::TermFilter;

    #[test]
    fn test_match_all() {
        assert_eq!(MatchAllQuery::new().source().to_string(), r#"{"match_all":{}}"#);
        assert_eq!(
            MatchAllQuery::new().boost(1.5).source().to_string(),
            r#"{"match_all":{"boost":1.5}}"#
        );
        assert_eq!(
            MatchAllQuery::new().boost(1.1).source().to_string(),
            r#"{"match_all":{"boost":1.1}}"#
        );
    }

    #[test]
    fn test_term_query_short_form() {
        let q = TermQuery::new("user", "kimchy");
        assert_eq!(q.source().to_string(), r#"{"term":{"user":"kimchy"}}"#);
    }

    #[test]
    fn test_term_query_long_form() {
        let q = TermQuery::new("user", "kimchy").boost(2.0).query_name("by_user");
        assert_eq!(
            q.source(),
            json!({"term": {"user": {"value": "kimchy", "boost": 2.0, "_name": "by_user"}}})
        );
    }

    #[test]
    fn test_term_query_boost_is_written_as_given() {
        let q = TermQuery::new("user", "kimchy").boost(1.1);
        assert_eq!(
            q.source().to_string(),
            r#"{"term":{"user":{"boost":1.1,"value":"kimchy"}}}"#
        );
    }

    #[test]
    fn test_filtered_query() {
        let q = FilteredQuery::new(MatchAllQuery::new()).filter(TermFilter::new("tag", "rust"));
        assert_eq!(
            q.source(),
            json!({
                "filtered": {
                    "query": {"match_all": {}},
                    "filter": {"term": {"tag": "rust"}}
                }
            })
        );
    }
}
