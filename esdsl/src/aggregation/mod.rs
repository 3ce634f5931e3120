//! Aggregations
//!
//! [`Aggregations`] is an insertion-ordered, name-keyed container. Bucket
//! aggregations own a nested container for their sub-aggregations, filled
//! through their `aggs` method.
//!
//! ```
//! use esdsl::aggregation::Aggregations;
//!
//! let aggs = Aggregations::build(|a| {
//!     a.terms("by_status", "status", |t| {
//!         t.size(10);
//!         t.aggs(|sub| {
//!             sub.avg("avg_price", "price");
//!         });
//!     });
//!     a.max("", "price"); // blank name, ignored
//! });
//! assert_eq!(aggs.len(), 1);
//! ```

pub mod bucket;
pub mod metric;

pub use bucket::{
    AggregationRange, BucketOrder, DateHistogramAggregation, DateRangeAggregation,
    DateRangeEntry, ExtendedBounds, FilterAggregation, FiltersAggregation, GlobalAggregation,
    HistogramAggregation, MissingAggregation, NestedAggregation, RangeAggregation,
    ReverseNestedAggregation, TermsAggregation,
};
pub use metric::{
    CardinalityAggregation, ExtendedStatsAggregation, MetricAggregation, PercentilesAggregation,
    TopHitsAggregation,
};

use crate::query::{query, QueryClauses};
use crate::util::non_blank;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Named aggregations, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregations {
    entries: Vec<(String, Aggregation)>,
}

impl Aggregations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(configure: impl FnOnce(&mut Aggregations)) -> Self {
        let mut aggs = Aggregations::new();
        configure(&mut aggs);
        aggs
    }

    /// Stores `aggregation` under `name`, replacing any previous entry.
    /// Blank names and rejected aggregations are ignored.
    pub fn add(&mut self, name: &str, aggregation: impl IntoAggregation) -> &mut Self {
        let Some(name) = non_blank(name) else {
            tracing::debug!("aggregation with blank name ignored");
            return self;
        };
        let Some(aggregation) = aggregation.into_aggregation() else {
            tracing::debug!(name = %name, "incomplete aggregation dropped");
            return self;
        };
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = aggregation,
            None => self.entries.push((name, aggregation)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Aggregation> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, aggregation)| aggregation)
    }

    pub fn remove(&mut self, name: &str) -> Option<Aggregation> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Aggregation)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), a))
    }

    // Buckets

    pub fn terms(
        &mut self,
        name: &str,
        field: &str,
        configure: impl FnOnce(&mut TermsAggregation),
    ) -> &mut Self {
        self.add(name, TermsAggregation::build(field, configure))
    }

    pub fn histogram(
        &mut self,
        name: &str,
        field: &str,
        interval: f64,
        configure: impl FnOnce(&mut HistogramAggregation),
    ) -> &mut Self {
        self.add(name, HistogramAggregation::build(field, interval, configure))
    }

    pub fn date_histogram(
        &mut self,
        name: &str,
        field: &str,
        configure: impl FnOnce(&mut DateHistogramAggregation),
    ) -> &mut Self {
        self.add(name, DateHistogramAggregation::build(field, configure))
    }

    pub fn range(
        &mut self,
        name: &str,
        field: &str,
        configure: impl FnOnce(&mut RangeAggregation),
    ) -> &mut Self {
        self.add(name, RangeAggregation::build(field, configure))
    }

    pub fn date_range(
        &mut self,
        name: &str,
        field: &str,
        configure: impl FnOnce(&mut DateRangeAggregation),
    ) -> &mut Self {
        self.add(name, DateRangeAggregation::build(field, configure))
    }

    /// Single-bucket `filter` over the clauses of `filter`, collapsed like a
    /// root query.
    pub fn filter(
        &mut self,
        name: &str,
        filter: impl FnOnce(&mut QueryClauses),
        configure: impl FnOnce(&mut Aggregations),
    ) -> &mut Self {
        self.add(
            name,
            FilterAggregation::new(query(filter)).map(|f| f.with_aggs(configure)),
        )
    }

    pub fn filters(
        &mut self,
        name: &str,
        configure: impl FnOnce(&mut FiltersAggregation),
    ) -> &mut Self {
        self.add(name, FiltersAggregation::build(configure))
    }

    pub fn nested(
        &mut self,
        name: &str,
        path: &str,
        configure: impl FnOnce(&mut Aggregations),
    ) -> &mut Self {
        self.add(
            name,
            NestedAggregation::new(path).map(|n| n.with_aggs(configure)),
        )
    }

    pub fn reverse_nested(
        &mut self,
        name: &str,
        configure: impl FnOnce(&mut Aggregations),
    ) -> &mut Self {
        self.add(name, ReverseNestedAggregation::default().with_aggs(configure))
    }

    pub fn global(&mut self, name: &str, configure: impl FnOnce(&mut Aggregations)) -> &mut Self {
        self.add(name, GlobalAggregation::default().with_aggs(configure))
    }

    pub fn missing(
        &mut self,
        name: &str,
        field: &str,
        configure: impl FnOnce(&mut Aggregations),
    ) -> &mut Self {
        self.add(
            name,
            MissingAggregation::new(field).map(|m| m.with_aggs(configure)),
        )
    }

    // Metrics

    pub fn avg(&mut self, name: &str, field: &str) -> &mut Self {
        self.add(name, MetricAggregation::new(field).map(AggregationKind::Avg))
    }

    pub fn sum(&mut self, name: &str, field: &str) -> &mut Self {
        self.add(name, MetricAggregation::new(field).map(AggregationKind::Sum))
    }

    pub fn min(&mut self, name: &str, field: &str) -> &mut Self {
        self.add(name, MetricAggregation::new(field).map(AggregationKind::Min))
    }

    pub fn max(&mut self, name: &str, field: &str) -> &mut Self {
        self.add(name, MetricAggregation::new(field).map(AggregationKind::Max))
    }

    pub fn value_count(&mut self, name: &str, field: &str) -> &mut Self {
        self.add(
            name,
            MetricAggregation::new(field).map(AggregationKind::ValueCount),
        )
    }

    pub fn stats(&mut self, name: &str, field: &str) -> &mut Self {
        self.add(name, MetricAggregation::new(field).map(AggregationKind::Stats))
    }

    pub fn extended_stats(&mut self, name: &str, field: &str) -> &mut Self {
        self.add(name, ExtendedStatsAggregation::new(field))
    }

    pub fn cardinality(&mut self, name: &str, field: &str) -> &mut Self {
        self.add(name, CardinalityAggregation::new(field))
    }

    pub fn percentiles(&mut self, name: &str, field: &str, percents: &[f64]) -> &mut Self {
        self.add(
            name,
            PercentilesAggregation::new(field).map(|p| p.with_percents(percents)),
        )
    }

    pub fn top_hits(&mut self, name: &str, configure: impl FnOnce(&mut TopHitsAggregation)) -> &mut Self {
        let mut top_hits = TopHitsAggregation::default();
        configure(&mut top_hits);
        self.add(name, top_hits)
    }
}

impl Serialize for Aggregations {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, aggregation) in &self.entries {
            map.serialize_entry(name, aggregation)?;
        }
        map.end()
    }
}

/// One aggregation with its sub-aggregations and metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    #[serde(flatten)]
    pub kind: AggregationKind,
    #[serde(skip_serializing_if = "Aggregations::is_empty")]
    pub aggs: Aggregations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl Aggregation {
    /// Wraps `kind`, lifting the sub-aggregations a bucket kind collected.
    pub fn new(mut kind: AggregationKind) -> Self {
        let aggs = kind.take_sub_aggregations();
        Self {
            kind,
            aggs,
            meta: None,
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Serialize) -> Self {
        if let (Some(key), Some(value)) = (
            non_blank(key),
            crate::util::to_json_data_or_none(Some(value)),
        ) {
            self.meta.get_or_insert_with(Map::new).insert(key, value);
        }
        self
    }
}

/// Anything that may become an [`Aggregation`]
pub trait IntoAggregation {
    fn into_aggregation(self) -> Option<Aggregation>;
}

impl IntoAggregation for Aggregation {
    fn into_aggregation(self) -> Option<Aggregation> {
        Some(self)
    }
}

impl IntoAggregation for Option<Aggregation> {
    fn into_aggregation(self) -> Option<Aggregation> {
        self
    }
}

impl IntoAggregation for AggregationKind {
    fn into_aggregation(self) -> Option<Aggregation> {
        Some(Aggregation::new(self))
    }
}

impl IntoAggregation for Option<AggregationKind> {
    fn into_aggregation(self) -> Option<Aggregation> {
        self.map(Aggregation::new)
    }
}

macro_rules! aggregation_kinds {
    (
        buckets { $($bvariant:ident($bty:ty) => $bname:literal),* $(,)? }
        metrics { $($mvariant:ident($mty:ty) => $mname:literal),* $(,)? }
        distinct { $($dvariant:ident($dty:ty)),* $(,)? }
    ) => {
        /// The body of an aggregation, tagged with its Elasticsearch name
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub enum AggregationKind {
            $(#[serde(rename = $bname)] $bvariant($bty),)*
            $(#[serde(rename = $mname)] $mvariant($mty),)*
        }

        impl AggregationKind {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(AggregationKind::$bvariant(_) => $bname,)*
                    $(AggregationKind::$mvariant(_) => $mname,)*
                }
            }

            pub fn is_bucket(&self) -> bool {
                match self {
                    $(AggregationKind::$bvariant(_) => true,)*
                    $(AggregationKind::$mvariant(_) => false,)*
                }
            }

            fn take_sub_aggregations(&mut self) -> Aggregations {
                match self {
                    $(AggregationKind::$bvariant(a) => std::mem::take(&mut a.aggregations),)*
                    $(AggregationKind::$mvariant(_) => Aggregations::default(),)*
                }
            }
        }

        $(
            impl From<$dty> for AggregationKind {
                fn from(aggregation: $dty) -> Self {
                    AggregationKind::$dvariant(aggregation)
                }
            }

            impl IntoAggregation for $dty {
                fn into_aggregation(self) -> Option<Aggregation> {
                    Some(Aggregation::new(AggregationKind::$dvariant(self)))
                }
            }

            impl IntoAggregation for Option<$dty> {
                fn into_aggregation(self) -> Option<Aggregation> {
                    self.and_then(IntoAggregation::into_aggregation)
                }
            }
        )*
    };
}

aggregation_kinds! {
    buckets {
        Terms(TermsAggregation) => "terms",
        Histogram(HistogramAggregation) => "histogram",
        DateHistogram(DateHistogramAggregation) => "date_histogram",
        Range(RangeAggregation) => "range",
        DateRange(DateRangeAggregation) => "date_range",
        Filter(FilterAggregation) => "filter",
        Filters(FiltersAggregation) => "filters",
        Nested(NestedAggregation) => "nested",
        ReverseNested(ReverseNestedAggregation) => "reverse_nested",
        Global(GlobalAggregation) => "global",
        Missing(MissingAggregation) => "missing",
    }
    metrics {
        Avg(MetricAggregation) => "avg",
        Sum(MetricAggregation) => "sum",
        Min(MetricAggregation) => "min",
        Max(MetricAggregation) => "max",
        ValueCount(MetricAggregation) => "value_count",
        Stats(MetricAggregation) => "stats",
        ExtendedStats(ExtendedStatsAggregation) => "extended_stats",
        Cardinality(CardinalityAggregation) => "cardinality",
        Percentiles(PercentilesAggregation) => "percentiles",
        TopHits(TopHitsAggregation) => "top_hits",
    }
    distinct {
        Terms(TermsAggregation),
        Histogram(HistogramAggregation),
        DateHistogram(DateHistogramAggregation),
        Range(RangeAggregation),
        DateRange(DateRangeAggregation),
        Filter(FilterAggregation),
        Filters(FiltersAggregation),
        Nested(NestedAggregation),
        ReverseNested(ReverseNestedAggregation),
        Global(GlobalAggregation),
        Missing(MissingAggregation),
        ExtendedStats(ExtendedStatsAggregation),
        Cardinality(CardinalityAggregation),
        Percentiles(PercentilesAggregation),
        TopHits(TopHitsAggregation),
    }
}
