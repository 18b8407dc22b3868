use serde_json::{Map, Value};

use super::{Filter, Source};

/// Matches documents whose `name` field contains exactly `value`
#[derive(Debug, Clone)]
pub struct TermFilter {
    name: String,
    value: Value,
    cache: Option<bool>,
    cache_key: Option<String>,
    filter_name: Option<String>,
}

impl TermFilter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            cache: None,
            cache_key: None,
            filter_name: None,
        }
    }

    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache_key(mut self, cache_key: impl Into<String>) -> Self {
        self.cache_key = Some(cache_key.into());
        self
    }

    pub fn filter_name(mut self, filter_name: impl Into<String>) -> Self {
        self.filter_name = Some(filter_name.into());
        self
    }
}

impl Source for TermFilter {
    fn source(&self) -> Value {
        let mut params = Map::new();
        params.insert(self.name.clone(), self.value.clone());
        if let Some(cache) = self.cache {
            params.insert("_cache".to_string(), cache.into());
        }
        if let Some(cache_key) = &self.cache_key {
            params.insert("_cache_key".to_string(), cache_key.clone().into());
        }
        if let Some(filter_name) = &self.filter_name {
            params.insert("_name".to_string(), filter_name.clone().into());
        }

        let mut source = Map::new();
        source.insert("term".to_string(), Value::Object(params));
        Value::Object(source)
    }
}

impl Filter for TermFilter {}

/// Matches documents with a non-null value in `field`
#[derive(Debug, Clone)]
pub struct ExistsFilter {
    field: String,
    filter_name: Option<String>,
}

impl ExistsFilter {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            filter_name: None,
        }
    }

    pub fn filter_name(mut self, filter_name: impl Into<String>) -> Self {
        self.filter_name = Some(filter_name.into());
        self
    }
}

impl Source for ExistsFilter {
    fn source(&self) -> Value {
        let mut params = Map::new();
        params.insert("field".to_string(), self.field.clone().into());
        if let Some(filter_name) = &self.filter_name {
            params.insert("_name".to_string(), filter_name.clone().into());
        }

        let mut source = Map::new();
        source.insert("exists".to_string(), Value::Object(params));
        Value::Object(source)
    }
}

impl Filter for ExistsFilter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_filter() {
        let f = TermFilter::new("user", "ki")
            .cache(true)
            .cache_key("MyTermFilter")
            .filter_name("MyFilterName");
        assert_eq!(
            serde_json::to_string(&f.source()).unwrap(),
            r#"{"term":{"_cache":true,"_cache_key":"MyTermFilter","_name":"MyFilterName","user":"ki"}}"#
        );
    }

    #[test]
    fn test_term_filter_non_string_value() {
        let f = TermFilter::new("age", 42);
        assert_eq!(f.source().to_string(), r#"{"term":{"age":42}}"#);
    }

    #[test]
    fn test_exists_filter() {
        let f = ExistsFilter::new("email").filter_name("has_email");
        assert_eq!(
            f.source().to_string(),
            r#"{"exists":{"_name":"has_email","field":"email"}}"#
        );
    }
}
