//! Term-level queries: exact values, ranges, patterns and ids

use crate::field_value::{FieldValue, IntoFieldValue};
use crate::one_field_map::field_keyed_serialize;
use crate::util::{non_blank, non_blank_strings, to_json_data_or_none};
use serde::ser::SerializeMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchAllQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    #[serde(rename = "_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

with_setters!(MatchAllQuery {
    with_boost => boost: f64,
    with_name => name: impl Into<String>,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchNoneQuery {
    #[serde(rename = "_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ============================================================================
// term
// ============================================================================

/// `{"term": {"<field>": {"value": ...}}}`
#[derive(Debug, Clone, PartialEq)]
pub struct TermQuery {
    pub field: String,
    pub params: TermParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermParams {
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_insensitive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    #[serde(rename = "_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TermQuery {
    /// `None` when the field is blank or the value is missing or blank.
    pub fn new(field: &str, value: impl IntoFieldValue) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: TermParams {
                value: value.into_field_value()?,
                case_insensitive: None,
                boost: None,
                name: None,
            },
        })
    }
}

with_setters!(TermQuery {
    with_case_insensitive => params.case_insensitive: bool,
    with_boost => params.boost: f64,
    with_name => params.name: impl Into<String>,
});

// ============================================================================
// terms
// ============================================================================

/// `{"terms": {"<field>": [...], "boost": ...}}`
#[derive(Debug, Clone, PartialEq)]
pub struct TermsQuery {
    pub field: String,
    pub values: Vec<FieldValue>,
    pub boost: Option<f64>,
    pub name: Option<String>,
}

impl TermsQuery {
    /// Null and blank values are dropped; `None` if nothing remains.
    pub fn new<I>(field: &str, values: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: IntoFieldValue,
    {
        let field = non_blank(field)?;
        let values: Vec<FieldValue> = values
            .into_iter()
            .filter_map(IntoFieldValue::into_field_value)
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(Self {
            field,
            values,
            boost: None,
            name: None,
        })
    }
}

with_setters!(TermsQuery {
    with_boost => boost: f64,
    with_name => name: impl Into<String>,
});

impl Serialize for TermsQuery {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(&self.field, &self.values)?;
        if let Some(boost) = self.boost {
            map.serialize_entry("boost", &boost)?;
        }
        if let Some(name) = &self.name {
            map.serialize_entry("_name", name)?;
        }
        map.end()
    }
}

// ============================================================================
// range
// ============================================================================

/// How a range query matches range fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RangeRelation {
    Intersects,
    Contains,
    Within,
}

/// `{"range": {"<field>": {"gte": ..., "lt": ...}}}`
///
/// Bounds accept any serializable value (numbers, dates, date math strings).
/// Blank or null bounds are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub field: String,
    pub params: RangeParams,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<RangeRelation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    #[serde(rename = "_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RangeQuery {
    /// Builds a range query, `None` for a blank field or when no bound is set.
    pub fn build(field: &str, configure: impl FnOnce(&mut RangeQuery)) -> Option<Self> {
        let mut range = RangeQuery {
            field: non_blank(field)?,
            params: RangeParams::default(),
        };
        configure(&mut range);
        if range.has_bounds() {
            Some(range)
        } else {
            tracing::debug!(field = %range.field, "range query without bounds dropped");
            None
        }
    }

    pub fn has_bounds(&self) -> bool {
        let p = &self.params;
        p.gt.is_some() || p.gte.is_some() || p.lt.is_some() || p.lte.is_some()
    }

    pub fn gt<T: Serialize>(&mut self, value: T) -> &mut Self {
        self.params.gt = to_json_data_or_none(Some(value));
        self
    }

    pub fn gte<T: Serialize>(&mut self, value: T) -> &mut Self {
        self.params.gte = to_json_data_or_none(Some(value));
        self
    }

    pub fn lt<T: Serialize>(&mut self, value: T) -> &mut Self {
        self.params.lt = to_json_data_or_none(Some(value));
        self
    }

    pub fn lte<T: Serialize>(&mut self, value: T) -> &mut Self {
        self.params.lte = to_json_data_or_none(Some(value));
        self
    }
}

mut_setters!(RangeQuery {
    format => params.format: impl Into<String>,
    time_zone => params.time_zone: impl Into<String>,
    relation => params.relation: RangeRelation,
    boost => params.boost: f64,
    name => params.name: impl Into<String>,
});

// ============================================================================
// exists / ids
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExistsQuery {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl ExistsQuery {
    pub fn new(field: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            boost: None,
        })
    }
}

with_setters!(ExistsQuery {
    with_boost => boost: f64,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdsQuery {
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl IdsQuery {
    /// Blank ids are dropped; `None` if nothing remains.
    pub fn new<I, S>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values = non_blank_strings(values);
        (!values.is_empty()).then_some(Self {
            values,
            boost: None,
        })
    }
}

with_setters!(IdsQuery {
    with_boost => boost: f64,
});

// ============================================================================
// prefix / wildcard / regexp / fuzzy
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixQuery {
    pub field: String,
    pub params: PatternParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WildcardQuery {
    pub field: String,
    pub params: PatternParams,
}

/// Shared body of `prefix` and `wildcard`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternParams {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_insensitive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl PatternParams {
    fn new(value: &str) -> Option<Self> {
        Some(Self {
            value: non_blank(value)?,
            case_insensitive: None,
            rewrite: None,
            boost: None,
        })
    }
}

impl PrefixQuery {
    pub fn new(field: &str, value: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: PatternParams::new(value)?,
        })
    }
}

impl WildcardQuery {
    pub fn new(field: &str, value: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: PatternParams::new(value)?,
        })
    }
}

with_setters!(PrefixQuery {
    with_case_insensitive => params.case_insensitive: bool,
    with_rewrite => params.rewrite: impl Into<String>,
    with_boost => params.boost: f64,
});

with_setters!(WildcardQuery {
    with_case_insensitive => params.case_insensitive: bool,
    with_rewrite => params.rewrite: impl Into<String>,
    with_boost => params.boost: f64,
});

#[derive(Debug, Clone, PartialEq)]
pub struct RegexpQuery {
    pub field: String,
    pub params: RegexpParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegexpParams {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_insensitive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_determinized_states: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl RegexpQuery {
    pub fn new(field: &str, value: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: RegexpParams {
                value: non_blank(value)?,
                flags: None,
                case_insensitive: None,
                max_determinized_states: None,
                rewrite: None,
                boost: None,
            },
        })
    }
}

with_setters!(RegexpQuery {
    with_flags => params.flags: impl Into<String>,
    with_case_insensitive => params.case_insensitive: bool,
    with_max_determinized_states => params.max_determinized_states: u32,
    with_rewrite => params.rewrite: impl Into<String>,
    with_boost => params.boost: f64,
});

#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyQuery {
    pub field: String,
    pub params: FuzzyParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyParams {
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzziness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_expansions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transpositions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl FuzzyQuery {
    pub fn new(field: &str, value: impl IntoFieldValue) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: FuzzyParams {
                value: value.into_field_value()?,
                fuzziness: None,
                max_expansions: None,
                prefix_length: None,
                transpositions: None,
                rewrite: None,
                boost: None,
            },
        })
    }
}

with_setters!(FuzzyQuery {
    with_fuzziness => params.fuzziness: impl Into<String>,
    with_max_expansions => params.max_expansions: u32,
    with_prefix_length => params.prefix_length: u32,
    with_transpositions => params.transpositions: bool,
    with_rewrite => params.rewrite: impl Into<String>,
    with_boost => params.boost: f64,
});

field_keyed_serialize!(
    TermQuery,
    RangeQuery,
    PrefixQuery,
    WildcardQuery,
    RegexpQuery,
    FuzzyQuery,
);
