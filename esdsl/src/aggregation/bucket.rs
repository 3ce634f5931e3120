//! Bucket aggregations

use super::Aggregations;
use crate::one_field_map::OneFieldMap;
use crate::query::{query, Clause, Query, QueryClauses};
use crate::search::SortOrder;
use crate::util::{non_blank, to_json_data_or_none};
use serde::ser::SerializeMap;
use serde::Serialize;
use serde_json::Value;

/// Adds `aggs` (in place) and `with_aggs` (by value) for the
/// sub-aggregations of a bucket aggregation.
macro_rules! sub_aggregations {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $ty {
                pub fn aggs(&mut self, configure: impl FnOnce(&mut Aggregations)) -> &mut Self {
                    configure(&mut self.aggregations);
                    self
                }

                pub fn with_aggs(mut self, configure: impl FnOnce(&mut Aggregations)) -> Self {
                    configure(&mut self.aggregations);
                    self
                }
            }
        )*
    };
}

sub_aggregations!(
    TermsAggregation,
    HistogramAggregation,
    DateHistogramAggregation,
    RangeAggregation,
    DateRangeAggregation,
    FilterAggregation,
    FiltersAggregation,
    NestedAggregation,
    ReverseNestedAggregation,
    GlobalAggregation,
    MissingAggregation,
);

// ============================================================================
// terms
// ============================================================================

/// `{"<key>": "asc"|"desc"}` entry of a terms `order`
#[derive(Debug, Clone, PartialEq)]
pub struct BucketOrder {
    pub key: String,
    pub order: SortOrder,
}

impl Serialize for BucketOrder {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OneFieldMap::new(&self.key, &self.order).serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermsAggregation {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_doc_count: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<BucketOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    #[serde(skip)]
    pub aggregations: Aggregations,
}

impl TermsAggregation {
    pub fn build(field: &str, configure: impl FnOnce(&mut TermsAggregation)) -> Option<Self> {
        let mut terms = TermsAggregation {
            field: non_blank(field)?,
            size: None,
            shard_size: None,
            min_doc_count: None,
            order: Vec::new(),
            missing: None,
            include: None,
            exclude: None,
            aggregations: Aggregations::default(),
        };
        configure(&mut terms);
        Some(terms)
    }

    /// Appends an ordering criterion such as `_count` or `_key`.
    pub fn order(&mut self, key: &str, order: SortOrder) -> &mut Self {
        if let Some(key) = non_blank(key) {
            self.order.push(BucketOrder { key, order });
        }
        self
    }

    pub fn missing(&mut self, value: impl Serialize) -> &mut Self {
        self.missing = to_json_data_or_none(Some(value));
        self
    }
}

mut_setters!(TermsAggregation {
    size => size: u32,
    shard_size => shard_size: u32,
    min_doc_count => min_doc_count: u64,
    include => include: impl Into<String>,
    exclude => exclude: impl Into<String>,
});

// ============================================================================
// histogram / date_histogram
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtendedBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramAggregation {
    pub field: String,
    pub interval: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_doc_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_bounds: Option<ExtendedBounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyed: Option<bool>,
    #[serde(skip)]
    pub aggregations: Aggregations,
}

impl HistogramAggregation {
    /// `None` for a blank field or a non-positive interval.
    pub fn build(
        field: &str,
        interval: f64,
        configure: impl FnOnce(&mut HistogramAggregation),
    ) -> Option<Self> {
        if !(interval.is_finite() && interval > 0.0) {
            tracing::debug!(interval, "histogram with invalid interval dropped");
            return None;
        }
        let mut histogram = HistogramAggregation {
            field: non_blank(field)?,
            interval,
            min_doc_count: None,
            offset: None,
            extended_bounds: None,
            keyed: None,
            aggregations: Aggregations::default(),
        };
        configure(&mut histogram);
        Some(histogram)
    }

    pub fn extended_bounds(&mut self, min: f64, max: f64) -> &mut Self {
        self.extended_bounds = Some(ExtendedBounds { min, max });
        self
    }
}

mut_setters!(HistogramAggregation {
    min_doc_count => min_doc_count: u64,
    offset => offset: f64,
    keyed => keyed: bool,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateHistogramAggregation {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_doc_count: Option<u64>,
    #[serde(skip)]
    pub aggregations: Aggregations,
}

impl DateHistogramAggregation {
    /// `None` for a blank field or when neither interval was set.
    pub fn build(
        field: &str,
        configure: impl FnOnce(&mut DateHistogramAggregation),
    ) -> Option<Self> {
        let mut histogram = DateHistogramAggregation {
            field: non_blank(field)?,
            calendar_interval: None,
            fixed_interval: None,
            format: None,
            time_zone: None,
            offset: None,
            min_doc_count: None,
            aggregations: Aggregations::default(),
        };
        configure(&mut histogram);
        if histogram.calendar_interval.is_none() && histogram.fixed_interval.is_none() {
            tracing::debug!(field = %histogram.field, "date_histogram without interval dropped");
            return None;
        }
        Some(histogram)
    }

    /// Calendar-aware interval such as `1M` or `week`.
    pub fn calendar_interval(&mut self, interval: &str) -> &mut Self {
        self.calendar_interval = non_blank(interval);
        self
    }

    /// Fixed interval in SI units such as `30m` or `12h`.
    pub fn fixed_interval(&mut self, interval: &str) -> &mut Self {
        self.fixed_interval = non_blank(interval);
        self
    }
}

mut_setters!(DateHistogramAggregation {
    format => format: impl Into<String>,
    time_zone => time_zone: impl Into<String>,
    offset => offset: impl Into<String>,
    min_doc_count => min_doc_count: u64,
});

// ============================================================================
// range / date_range
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeAggregation {
    pub field: String,
    pub ranges: Vec<AggregationRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyed: Option<bool>,
    #[serde(skip)]
    pub aggregations: Aggregations,
}

impl RangeAggregation {
    /// `None` for a blank field or when no range was added.
    pub fn build(field: &str, configure: impl FnOnce(&mut RangeAggregation)) -> Option<Self> {
        let mut range = RangeAggregation {
            field: non_blank(field)?,
            ranges: Vec::new(),
            keyed: None,
            aggregations: Aggregations::default(),
        };
        configure(&mut range);
        (!range.ranges.is_empty()).then_some(range)
    }

    /// Adds `[from, to)`; a range without either bound is ignored.
    pub fn range(&mut self, from: Option<f64>, to: Option<f64>) -> &mut Self {
        self.push(None, from, to)
    }

    pub fn keyed_range(&mut self, key: &str, from: Option<f64>, to: Option<f64>) -> &mut Self {
        self.push(non_blank(key), from, to)
    }

    fn push(&mut self, key: Option<String>, from: Option<f64>, to: Option<f64>) -> &mut Self {
        if from.is_some() || to.is_some() {
            self.ranges.push(AggregationRange { key, from, to });
        }
        self
    }
}

mut_setters!(RangeAggregation {
    keyed => keyed: bool,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeAggregation {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    pub ranges: Vec<DateRangeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyed: Option<bool>,
    #[serde(skip)]
    pub aggregations: Aggregations,
}

impl DateRangeAggregation {
    pub fn build(field: &str, configure: impl FnOnce(&mut DateRangeAggregation)) -> Option<Self> {
        let mut range = DateRangeAggregation {
            field: non_blank(field)?,
            format: None,
            time_zone: None,
            ranges: Vec::new(),
            keyed: None,
            aggregations: Aggregations::default(),
        };
        configure(&mut range);
        (!range.ranges.is_empty()).then_some(range)
    }

    /// Adds a range of dates or date math; blank bounds count as open.
    pub fn range(&mut self, from: impl Serialize, to: impl Serialize) -> &mut Self {
        self.push(None, from, to)
    }

    pub fn keyed_range(&mut self, key: &str, from: impl Serialize, to: impl Serialize) -> &mut Self {
        self.push(non_blank(key), from, to)
    }

    fn push(&mut self, key: Option<String>, from: impl Serialize, to: impl Serialize) -> &mut Self {
        let from = to_json_data_or_none(Some(from));
        let to = to_json_data_or_none(Some(to));
        if from.is_some() || to.is_some() {
            self.ranges.push(DateRangeEntry { key, from, to });
        }
        self
    }
}

mut_setters!(DateRangeAggregation {
    format => format: impl Into<String>,
    time_zone => time_zone: impl Into<String>,
    keyed => keyed: bool,
});

// ============================================================================
// filter / filters
// ============================================================================

/// Single bucket of the documents matching `filter`; serializes as the query.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterAggregation {
    pub filter: Query,
    pub aggregations: Aggregations,
}

impl FilterAggregation {
    pub fn new(filter: impl Clause) -> Option<Self> {
        Some(Self {
            filter: filter.into_clause()?,
            aggregations: Aggregations::default(),
        })
    }
}

impl Serialize for FilterAggregation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.filter.serialize(serializer)
    }
}

/// One named bucket per filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiltersAggregation {
    pub filters: Vec<(String, Query)>,
    pub other_bucket_key: Option<String>,
    pub aggregations: Aggregations,
}

impl FiltersAggregation {
    /// `None` when no named filter survived.
    pub fn build(configure: impl FnOnce(&mut FiltersAggregation)) -> Option<Self> {
        let mut filters = FiltersAggregation::default();
        configure(&mut filters);
        (!filters.filters.is_empty()).then_some(filters)
    }

    /// Adds or replaces the bucket `name`.
    pub fn filter(&mut self, name: &str, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        if let (Some(name), Some(filter)) = (non_blank(name), query(configure)) {
            match self.filters.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = filter,
                None => self.filters.push((name, filter)),
            }
        }
        self
    }

    pub fn other_bucket_key(&mut self, key: &str) -> &mut Self {
        self.other_bucket_key = non_blank(key);
        self
    }
}

struct NamedFilters<'a>(&'a [(String, Query)]);

impl Serialize for NamedFilters<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, filter) in self.0 {
            map.serialize_entry(name, filter)?;
        }
        map.end()
    }
}

impl Serialize for FiltersAggregation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("filters", &NamedFilters(&self.filters))?;
        if let Some(key) = &self.other_bucket_key {
            map.serialize_entry("other_bucket_key", key)?;
        }
        map.end()
    }
}

// ============================================================================
// nested / reverse_nested / global / missing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedAggregation {
    pub path: String,
    #[serde(skip)]
    pub aggregations: Aggregations,
}

impl NestedAggregation {
    pub fn new(path: &str) -> Option<Self> {
        Some(Self {
            path: non_blank(path)?,
            aggregations: Aggregations::default(),
        })
    }
}

/// Joins back from nested documents to their parent (or to `path`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReverseNestedAggregation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip)]
    pub aggregations: Aggregations,
}

impl ReverseNestedAggregation {
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = non_blank(path);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalAggregation {
    #[serde(skip)]
    pub aggregations: Aggregations,
}

/// Bucket of documents without a value in `field`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingAggregation {
    pub field: String,
    #[serde(skip)]
    pub aggregations: Aggregations,
}

impl MissingAggregation {
    pub fn new(field: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            aggregations: Aggregations::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::Aggregations;
    use serde_json::json;

    fn to_json(aggs: Aggregations) -> Value {
        serde_json::to_value(aggs).unwrap()
    }

    #[test]
    fn test_terms_with_order_and_missing() {
        let aggs = Aggregations::build(|a| {
            a.terms("tags", "tags.keyword", |t| {
                t.size(20)
                    .min_doc_count(2)
                    .order("_count", SortOrder::Desc)
                    .order("", SortOrder::Asc)
                    .missing("N/A");
            });
        });
        assert_eq!(
            to_json(aggs),
            json!({"tags": {"terms": {
                "field": "tags.keyword",
                "size": 20,
                "min_doc_count": 2,
                "order": [{"_count": "desc"}],
                "missing": "N/A"
            }}})
        );
    }

    #[test]
    fn test_terms_blank_patterns_are_omitted() {
        let aggs = Aggregations::build(|a| {
            a.terms("tags", "tag", |t| {
                t.include("").exclude("  ");
            });
        });
        assert_eq!(to_json(aggs), json!({"tags": {"terms": {"field": "tag"}}}));
    }

    #[test]
    fn test_histogram() {
        let aggs = Aggregations::build(|a| {
            a.histogram("prices", "price", 50.0, |h| {
                h.min_doc_count(1).extended_bounds(0.0, 500.0);
            });
            a.histogram("bad", "price", 0.0, |_| {});
        });
        assert_eq!(
            to_json(aggs),
            json!({"prices": {"histogram": {
                "field": "price",
                "interval": 50.0,
                "min_doc_count": 1,
                "extended_bounds": {"min": 0.0, "max": 500.0}
            }}})
        );
    }

    #[test]
    fn test_date_histogram_needs_interval() {
        let aggs = Aggregations::build(|a| {
            a.date_histogram("per_month", "date", |h| {
                h.calendar_interval("month").format("yyyy-MM").time_zone("Europe/Oslo");
            });
            a.date_histogram("blank", "date", |h| {
                h.fixed_interval(" ");
            });
        });
        assert_eq!(
            to_json(aggs),
            json!({"per_month": {"date_histogram": {
                "field": "date",
                "calendar_interval": "month",
                "format": "yyyy-MM",
                "time_zone": "Europe/Oslo"
            }}})
        );
    }

    #[test]
    fn test_range_aggregation() {
        let aggs = Aggregations::build(|a| {
            a.range("price_ranges", "price", |r| {
                r.range(None, Some(100.0))
                    .keyed_range("mid", Some(100.0), Some(200.0))
                    .range(None, None);
            });
        });
        assert_eq!(
            to_json(aggs),
            json!({"price_ranges": {"range": {
                "field": "price",
                "ranges": [
                    {"to": 100.0},
                    {"key": "mid", "from": 100.0, "to": 200.0}
                ]
            }}})
        );
    }

    #[test]
    fn test_date_range_aggregation() {
        let aggs = Aggregations::build(|a| {
            a.date_range("recent", "date", |r| {
                r.format("MM-yyyy").range("now-10M/M", "").range("", None::<&str>);
            });
        });
        assert_eq!(
            to_json(aggs),
            json!({"recent": {"date_range": {
                "field": "date",
                "format": "MM-yyyy",
                "ranges": [{"from": "now-10M/M"}]
            }}})
        );
    }

    #[test]
    fn test_filter_and_filters() {
        let aggs = Aggregations::build(|a| {
            a.filter(
                "t_shirts",
                |f| {
                    f.term("type", "t-shirt");
                },
                |sub| {
                    sub.avg("avg_price", "price");
                },
            );
            a.filter("empty", |_| {}, |_| {});
            a.filters("messages", |f| {
                f.filter("errors", |c| {
                    c.match_query("body", "error");
                });
                f.filter("", |c| {
                    c.match_all();
                });
                f.other_bucket_key("other");
            });
        });
        assert_eq!(
            to_json(aggs),
            json!({
                "t_shirts": {
                    "filter": {"term": {"type": {"value": "t-shirt"}}},
                    "aggs": {"avg_price": {"avg": {"field": "price"}}}
                },
                "messages": {"filters": {
                    "filters": {"errors": {"match": {"body": {"query": "error"}}}},
                    "other_bucket_key": "other"
                }}
            })
        );
    }

    #[test]
    fn test_global_and_missing() {
        let aggs = Aggregations::build(|a| {
            a.global("all", |g| {
                g.max("max_price", "price");
            });
            a.missing("no_price", "price", |_| {});
            a.missing("blank", "", |_| {});
        });
        assert_eq!(
            to_json(aggs),
            json!({
                "all": {"global": {}, "aggs": {"max_price": {"max": {"field": "price"}}}},
                "no_price": {"missing": {"field": "price"}}
            })
        );
    }
}
