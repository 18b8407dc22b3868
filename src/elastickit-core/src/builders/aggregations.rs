//! Aggregation builders
//!
//! Metric aggregations (`min`, `max`, `sum`, `avg`, `stats`,
//! `extended_stats`, `value_count`) only differ by name, so they are
//! generated by `metrics_aggregation!`. `cardinality` adds its own options
//! and `global` has none at all.

use serde_json::{Map, Value};

use super::{wrap, Aggregation, Source, SubAggregations, ValuesSource};

/// Setters for the values-source options, shared by every builder that has a
/// `values: ValuesSource` field
macro_rules! values_source_setters {
    () => {
        pub fn field(mut self, field: impl Into<String>) -> Self {
            self.values.field = Some(field.into());
            self
        }

        pub fn script(mut self, script: impl Into<String>) -> Self {
            self.values.script = Some(script.into());
            self
        }

        pub fn script_file(mut self, script_file: impl Into<String>) -> Self {
            self.values.script_file = Some(script_file.into());
            self
        }

        pub fn lang(mut self, lang: impl Into<String>) -> Self {
            self.values.lang = Some(lang.into());
            self
        }

        pub fn format(mut self, format: impl Into<String>) -> Self {
            self.values.format = Some(format.into());
            self
        }

        pub fn param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
            self.values.params.insert(name.into(), value.into());
            self
        }

        pub fn sub_aggregation(
            mut self,
            name: impl Into<String>,
            agg: impl Aggregation + 'static,
        ) -> Self {
            self.subs.insert(name, agg);
            self
        }
    };
}

macro_rules! metrics_aggregation {
    ($(#[$doc:meta])* $name:ident, $kind:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            values: ValuesSource,
            subs: SubAggregations,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            values_source_setters!();
        }

        impl Source for $name {
            fn source(&self) -> Value {
                let mut opts = Map::new();
                self.values.write_to(&mut opts);
                wrap($kind, opts, &self.subs)
            }
        }

        impl Aggregation for $name {}
    };
}

metrics_aggregation!(
    /// Smallest value of a numeric field
    MinAggregation,
    "min"
);
metrics_aggregation!(
    /// Largest value of a numeric field
    MaxAggregation,
    "max"
);
metrics_aggregation!(SumAggregation, "sum");
metrics_aggregation!(AvgAggregation, "avg");
metrics_aggregation!(
    /// min, max, sum, count and avg in one pass
    StatsAggregation,
    "stats"
);
metrics_aggregation!(
    /// `stats` plus sum of squares, variance and standard deviation
    ExtendedStatsAggregation,
    "extended_stats"
);
metrics_aggregation!(ValueCountAggregation, "value_count");

/// Approximate count of distinct values.
///
/// ```
/// use elastickit_core::builders::{CardinalityAggregation, Source};
///
/// let agg = CardinalityAggregation::new().field("author");
/// assert_eq!(agg.source().to_string(), r#"{"cardinality":{"field":"author"}}"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CardinalityAggregation {
    values: ValuesSource,
    subs: SubAggregations,
    precision_threshold: Option<i64>,
    rehash: Option<bool>,
}

impl CardinalityAggregation {
    pub fn new() -> Self {
        Self::default()
    }

    values_source_setters!();

    pub fn precision_threshold(mut self, threshold: i64) -> Self {
        self.precision_threshold = Some(threshold);
        self
    }

    pub fn rehash(mut self, rehash: bool) -> Self {
        self.rehash = Some(rehash);
        self
    }
}

impl Source for CardinalityAggregation {
    fn source(&self) -> Value {
        let mut opts = Map::new();
        self.values.write_to(&mut opts);
        if let Some(threshold) = self.precision_threshold {
            opts.insert("precision_threshold".to_string(), threshold.into());
        }
        if let Some(rehash) = self.rehash {
            opts.insert("rehash".to_string(), rehash.into());
        }
        wrap("cardinality", opts, &self.subs)
    }
}

impl Aggregation for CardinalityAggregation {}

/// Bucket holding every document of the search context, regardless of query
#[derive(Debug, Clone, Default)]
pub struct GlobalAggregation {
    subs: SubAggregations,
}

impl GlobalAggregation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sub_aggregation(mut self, name: impl Into<String>, agg: impl Aggregation + 'static) -> Self {
        self.subs.insert(name, agg);
        self
    }
}

impl Source for GlobalAggregation {
    fn source(&self) -> Value {
        wrap("global", Map::new(), &self.subs)
    }
}

impl Aggregation for GlobalAggregation {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_json(agg: &impl Source) -> String {
        serde_json::to_string(&agg.source()).unwrap()
    }

    #[test]
    fn test_min_aggregation() {
        let agg = MinAggregation::new().field("price");
        assert_eq!(to_json(&agg), r#"{"min":{"field":"price"}}"#);
    }

    #[test]
    fn test_min_aggregation_with_format() {
        let agg = MinAggregation::new().field("price").format("00000.00");
        assert_eq!(to_json(&agg), r#"{"min":{"field":"price","format":"00000.00"}}"#);
    }

    #[test]
    fn test_extended_stats_aggregation() {
        let agg = ExtendedStatsAggregation::new().field("grade");
        assert_eq!(to_json(&agg), r#"{"extended_stats":{"field":"grade"}}"#);

        let agg = agg.format("000.0");
        assert_eq!(
            to_json(&agg),
            r#"{"extended_stats":{"field":"grade","format":"000.0"}}"#
        );
    }

    #[test]
    fn test_global_aggregation() {
        assert_eq!(to_json(&GlobalAggregation::new()), r#"{"global":{}}"#);
    }

    #[test]
    fn test_global_with_sub_aggregation() {
        let agg = GlobalAggregation::new().sub_aggregation("avg_price", AvgAggregation::new().field("price"));
        assert_eq!(
            agg.source(),
            json!({
                "global": {},
                "aggregations": {
                    "avg_price": {"avg": {"field": "price"}}
                }
            })
        );
    }

    #[test]
    fn test_cardinality_options() {
        let agg = CardinalityAggregation::new()
            .field("author_hash")
            .precision_threshold(100)
            .rehash(false);
        assert_eq!(
            to_json(&agg),
            r#"{"cardinality":{"field":"author_hash","precision_threshold":100,"rehash":false}}"#
        );
    }

    #[test]
    fn test_script_with_params() {
        let agg = SumAggregation::new()
            .script("doc['price'].value * factor")
            .lang("painless")
            .param("factor", 1.2);
        assert_eq!(
            agg.source(),
            json!({
                "sum": {
                    "script": "doc['price'].value * factor",
                    "lang": "painless",
                    "params": {"factor": 1.2}
                }
            })
        );
    }

    #[test]
    fn test_builders_are_values() {
        let base = StatsAggregation::new().field("grade");
        let formatted = base.clone().format("0.0");

        assert_eq!(to_json(&base), r#"{"stats":{"field":"grade"}}"#);
        assert_eq!(to_json(&formatted), r#"{"stats":{"field":"grade","format":"0.0"}}"#);
    }

    #[test]
    fn test_nested_sub_aggregations() {
        let agg = MaxAggregation::new().field("price").sub_aggregation(
            "count",
            ValueCountAggregation::new()
                .field("sku")
                .sub_aggregation("distinct", CardinalityAggregation::new().field("sku")),
        );
        assert_eq!(
            agg.source(),
            json!({
                "max": {"field": "price"},
                "aggregations": {
                    "count": {
                        "value_count": {"field": "sku"},
                        "aggregations": {
                            "distinct": {"cardinality": {"field": "sku"}}
                        }
                    }
                }
            })
        );
    }
}
