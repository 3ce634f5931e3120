//! Metric aggregations

use crate::query::Script;
use crate::search::{IntoSortOptions, SortOptions, SourceConfig};
use crate::util::{non_blank, to_json_data_or_none};
use serde::Serialize;
use serde_json::Value;

/// Body shared by `avg`, `sum`, `min`, `max`, `value_count` and `stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricAggregation {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,
}

impl MetricAggregation {
    pub fn new(field: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            missing: None,
            script: None,
        })
    }

    /// Value used for documents without the field.
    pub fn with_missing(mut self, value: impl Serialize) -> Self {
        self.missing = to_json_data_or_none(Some(value));
        self
    }
}

with_setters!(MetricAggregation {
    with_script => script: Script,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedStatsAggregation {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
}

impl ExtendedStatsAggregation {
    pub fn new(field: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            sigma: None,
            missing: None,
        })
    }
}

with_setters!(ExtendedStatsAggregation {
    with_sigma => sigma: f64,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardinalityAggregation {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
}

impl CardinalityAggregation {
    pub fn new(field: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            precision_threshold: None,
            missing: None,
        })
    }
}

with_setters!(CardinalityAggregation {
    with_precision_threshold => precision_threshold: u32,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentilesAggregation {
    pub field: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub percents: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
}

impl PercentilesAggregation {
    pub fn new(field: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            percents: Vec::new(),
            keyed: None,
            missing: None,
        })
    }

    /// Percentiles outside `[0, 100]` are dropped; none means the
    /// Elasticsearch default set.
    pub fn with_percents(mut self, percents: &[f64]) -> Self {
        self.percents = percents
            .iter()
            .copied()
            .filter(|p| (0.0..=100.0).contains(p))
            .collect();
        self
    }
}

with_setters!(PercentilesAggregation {
    with_keyed => keyed: bool,
});

/// Top matching documents per bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopHitsAggregation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortOptions>,
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceConfig>,
}

impl TopHitsAggregation {
    pub fn sort(&mut self, sort: impl IntoSortOptions) -> &mut Self {
        if let Some(sort) = sort.into_sort() {
            self.sort.push(sort);
        }
        self
    }
}

mut_setters!(TopHitsAggregation {
    from => from: u32,
    size => size: u32,
    source => source: SourceConfig,
});

#[cfg(test)]
mod tests {
    use crate::aggregation::Aggregations;
    use crate::search::{FieldSort, SortOrder, SourceConfig};
    use serde_json::json;

    #[test]
    fn test_simple_metrics() {
        let aggs = Aggregations::build(|a| {
            a.avg("avg_price", "price")
                .sum("total", "price")
                .value_count("n", "_id")
                .stats("price_stats", "price")
                .extended_stats("ext", "price")
                .cardinality("uniq", "user");
        });
        assert_eq!(
            serde_json::to_value(aggs).unwrap(),
            json!({
                "avg_price": {"avg": {"field": "price"}},
                "total": {"sum": {"field": "price"}},
                "n": {"value_count": {"field": "_id"}},
                "price_stats": {"stats": {"field": "price"}},
                "ext": {"extended_stats": {"field": "price"}},
                "uniq": {"cardinality": {"field": "user"}}
            })
        );
    }

    #[test]
    fn test_percentiles_filters_out_of_range() {
        let aggs = Aggregations::build(|a| {
            a.percentiles("latency", "took_ms", &[50.0, 99.0, 150.0, -1.0]);
        });
        assert_eq!(
            serde_json::to_value(aggs).unwrap(),
            json!({"latency": {"percentiles": {"field": "took_ms", "percents": [50.0, 99.0]}}})
        );
    }

    #[test]
    fn test_top_hits() {
        let aggs = Aggregations::build(|a| {
            a.top_hits("latest", |t| {
                t.size(1)
                    .sort(FieldSort::new("date").map(|s| s.with_order(SortOrder::Desc)))
                    .source(SourceConfig::includes(["title", "date"]));
            });
        });
        assert_eq!(
            serde_json::to_value(aggs).unwrap(),
            json!({"latest": {"top_hits": {
                "size": 1,
                "sort": [{"date": {"order": "desc"}}],
                "_source": {"includes": ["title", "date"]}
            }}})
        );
    }
}
