//! Search Body Example
//!
//! Builds a filtered search with nested aggregations and prints the JSON.
//!
//! Run with: cargo run --example build_search

use elastickit_core::builders::*;

fn main() -> anyhow::Result<()> {
    let query = FilteredQuery::new(MatchAllQuery::new())
        .filter(TermFilter::new("status", "published").cache(true));

    let search = SearchSource::new()
        .query(query)
        .size(0)
        .aggregation(
            "all_products",
            GlobalAggregation::new()
                .sub_aggregation("avg_price", AvgAggregation::new().field("price")),
        )
        .aggregation(
            "authors",
            CardinalityAggregation::new()
                .field("author")
                .precision_threshold(1000),
        )
        .aggregation(
            "grades",
            ExtendedStatsAggregation::new().field("grade").format("000.0"),
        );

    println!("{}", serde_json::to_string_pretty(&search.source())?);

    Ok(())
}
