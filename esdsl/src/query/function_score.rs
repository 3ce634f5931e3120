//! `function_score` query and its scoring functions
//!
//! Decay functions share one body shape and differ only by their JSON key,
//! so a single [`DecayFunction`] carries a [`DecayKind`] that picks the key
//! at serialization time.

use super::{Query, QueryClauses, Script};
use crate::util::{non_blank, to_json_data_or_none};
use serde::ser::SerializeMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionScoreMode {
    Multiply,
    Sum,
    Avg,
    First,
    Max,
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionBoostMode {
    Multiply,
    Replace,
    Sum,
    Avg,
    Max,
    Min,
}

/// How a decay function reduces a multi-valued field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiValueMode {
    Min,
    Max,
    Avg,
    Sum,
}

// ============================================================================
// function_score
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionScoreQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Box<Query>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_mode: Option<FunctionScoreMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost_mode: Option<FunctionBoostMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl FunctionScoreQuery {
    /// `None` when it ends up with neither an inner query nor a function.
    pub fn build(configure: impl FnOnce(&mut FunctionScoreQuery)) -> Option<Self> {
        let mut query = FunctionScoreQuery::default();
        configure(&mut query);
        if query.query.is_none() && query.functions.is_empty() {
            tracing::debug!("function_score without query and functions dropped");
            return None;
        }
        Some(query)
    }

    /// Inner query, collapsed from the clauses like a root query.
    pub fn query(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.query = super::query(configure).map(Box::new);
        self
    }

    /// Appends a function entry if it has a weight or a scoring function.
    pub fn function(&mut self, configure: impl FnOnce(&mut FunctionScore)) -> &mut Self {
        if let Some(function) = FunctionScore::build(configure) {
            self.functions.push(function);
        }
        self
    }
}

mut_setters!(FunctionScoreQuery {
    score_mode => score_mode: FunctionScoreMode,
    boost_mode => boost_mode: FunctionBoostMode,
    max_boost => max_boost: f64,
    min_score => min_score: f64,
    boost => boost: f64,
});

/// One entry of `functions`: optional filter, optional weight and at most
/// one scoring function. Setting a second scoring function replaces the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionScore {
    pub filter: Option<Query>,
    pub weight: Option<f64>,
    pub function: Option<ScoreFunction>,
}

impl FunctionScore {
    pub fn build(configure: impl FnOnce(&mut FunctionScore)) -> Option<Self> {
        let mut entry = FunctionScore::default();
        configure(&mut entry);
        if entry.weight.is_none() && entry.function.is_none() {
            tracing::debug!("function entry without weight or scoring function dropped");
            return None;
        }
        Some(entry)
    }

    pub fn filter(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.filter = super::query(configure);
        self
    }

    pub fn field_value_factor(
        &mut self,
        field: &str,
        configure: impl FnOnce(&mut FieldValueFactorFunction),
    ) -> &mut Self {
        if let Some(function) = FieldValueFactorFunction::build(field, configure) {
            self.function = Some(ScoreFunction::FieldValueFactor(function));
        }
        self
    }

    pub fn random_score(&mut self, configure: impl FnOnce(&mut RandomScoreFunction)) -> &mut Self {
        let mut function = RandomScoreFunction::default();
        configure(&mut function);
        self.function = Some(ScoreFunction::RandomScore(function));
        self
    }

    pub fn script_score(&mut self, script: Option<Script>) -> &mut Self {
        if let Some(script) = script {
            self.function = Some(ScoreFunction::ScriptScore(ScriptScoreFunction { script }));
        }
        self
    }

    pub fn decay(
        &mut self,
        kind: DecayKind,
        field: &str,
        configure: impl FnOnce(&mut DecayFunction),
    ) -> &mut Self {
        if let Some(function) = DecayFunction::build(kind, field, configure) {
            self.function = Some(ScoreFunction::Decay(function));
        }
        self
    }

    pub fn gauss(&mut self, field: &str, configure: impl FnOnce(&mut DecayFunction)) -> &mut Self {
        self.decay(DecayKind::Gauss, field, configure)
    }

    pub fn exp(&mut self, field: &str, configure: impl FnOnce(&mut DecayFunction)) -> &mut Self {
        self.decay(DecayKind::Exp, field, configure)
    }

    pub fn linear(&mut self, field: &str, configure: impl FnOnce(&mut DecayFunction)) -> &mut Self {
        self.decay(DecayKind::Linear, field, configure)
    }
}

mut_setters!(FunctionScore {
    weight => weight: f64,
});

impl Serialize for FunctionScore {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(filter) = &self.filter {
            map.serialize_entry("filter", filter)?;
        }
        if let Some(weight) = self.weight {
            map.serialize_entry("weight", &weight)?;
        }
        match &self.function {
            Some(ScoreFunction::FieldValueFactor(f)) => {
                map.serialize_entry("field_value_factor", f)?
            }
            Some(ScoreFunction::RandomScore(f)) => map.serialize_entry("random_score", f)?,
            Some(ScoreFunction::ScriptScore(f)) => map.serialize_entry("script_score", f)?,
            Some(ScoreFunction::Decay(f)) => map.serialize_entry(f.kind.as_str(), f)?,
            None => {}
        }
        map.end()
    }
}

/// The scoring function of a [`FunctionScore`] entry
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreFunction {
    FieldValueFactor(FieldValueFactorFunction),
    RandomScore(RandomScoreFunction),
    ScriptScore(ScriptScoreFunction),
    Decay(DecayFunction),
}

// ============================================================================
// field_value_factor / random_score / script_score
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValueFactorModifier {
    None,
    Log,
    Log1p,
    Log2p,
    Ln,
    Ln1p,
    Ln2p,
    Square,
    Sqrt,
    Reciprocal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValueFactorFunction {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<FieldValueFactorModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<f64>,
}

impl FieldValueFactorFunction {
    pub fn build(field: &str, configure: impl FnOnce(&mut FieldValueFactorFunction)) -> Option<Self> {
        let mut function = FieldValueFactorFunction {
            field: non_blank(field)?,
            factor: None,
            modifier: None,
            missing: None,
        };
        configure(&mut function);
        Some(function)
    }
}

mut_setters!(FieldValueFactorFunction {
    factor => factor: f64,
    modifier => modifier: FieldValueFactorModifier,
    missing => missing: f64,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RandomScoreFunction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl RandomScoreFunction {
    pub fn seed(&mut self, seed: impl Serialize) -> &mut Self {
        self.seed = to_json_data_or_none(Some(seed));
        self
    }

    pub fn field(&mut self, field: &str) -> &mut Self {
        self.field = non_blank(field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptScoreFunction {
    pub script: Script,
}

// ============================================================================
// decay functions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecayKind {
    Gauss,
    Exp,
    Linear,
}

impl DecayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecayKind::Gauss => "gauss",
            DecayKind::Exp => "exp",
            DecayKind::Linear => "linear",
        }
    }
}

/// `gauss`, `exp` or `linear` decay around `origin`.
///
/// Origin, scale and offset are free-form: numbers, dates (`"2d"`) or geo
/// points (`{"lat": .., "lon": ..}`).
#[derive(Debug, Clone, PartialEq)]
pub struct DecayFunction {
    pub kind: DecayKind,
    pub field: String,
    pub params: DecayParams,
    pub multi_value_mode: Option<MultiValueMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecayParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay: Option<f64>,
}

impl DecayFunction {
    /// `None` for a blank field or when no scale was set.
    pub fn build(
        kind: DecayKind,
        field: &str,
        configure: impl FnOnce(&mut DecayFunction),
    ) -> Option<Self> {
        let mut function = DecayFunction {
            kind,
            field: non_blank(field)?,
            params: DecayParams::default(),
            multi_value_mode: None,
        };
        configure(&mut function);
        if function.params.scale.is_none() {
            tracing::debug!(field = %function.field, kind = kind.as_str(), "decay function without scale dropped");
            return None;
        }
        Some(function)
    }

    pub fn origin(&mut self, origin: impl Serialize) -> &mut Self {
        self.params.origin = to_json_data_or_none(Some(origin));
        self
    }

    pub fn scale(&mut self, scale: impl Serialize) -> &mut Self {
        self.params.scale = to_json_data_or_none(Some(scale));
        self
    }

    pub fn offset(&mut self, offset: impl Serialize) -> &mut Self {
        self.params.offset = to_json_data_or_none(Some(offset));
        self
    }
}

mut_setters!(DecayFunction {
    decay => params.decay: f64,
    multi_value_mode => multi_value_mode: MultiValueMode,
});

impl Serialize for DecayFunction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(&self.field, &self.params)?;
        if let Some(mode) = &self.multi_value_mode {
            map.serialize_entry("multi_value_mode", mode)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::function_score as function_score_query;
    use serde_json::json;

    #[test]
    fn test_decay_dispatch() {
        for (kind, key) in [
            (DecayKind::Gauss, "gauss"),
            (DecayKind::Exp, "exp"),
            (DecayKind::Linear, "linear"),
        ] {
            let entry = FunctionScore::build(|f| {
                f.decay(kind, "date", |d| {
                    d.origin("2013-09-17").scale("10d").offset("5d").decay(0.5);
                });
            })
            .unwrap();
            assert_eq!(
                serde_json::to_value(entry).unwrap(),
                json!({key: {"date": {
                    "origin": "2013-09-17",
                    "scale": "10d",
                    "offset": "5d",
                    "decay": 0.5
                }}})
            );
        }
    }

    #[test]
    fn test_decay_multi_value_mode() {
        let decay = DecayFunction::build(DecayKind::Gauss, "location", |d| {
            d.origin(json!({"lat": 52.0, "lon": 4.5}))
                .scale("2km")
                .multi_value_mode(MultiValueMode::Avg);
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(decay).unwrap(),
            json!({
                "location": {"origin": {"lat": 52.0, "lon": 4.5}, "scale": "2km"},
                "multi_value_mode": "avg"
            })
        );
    }

    #[test]
    fn test_decay_requires_field_and_scale() {
        assert!(DecayFunction::build(DecayKind::Exp, "price", |d| {
            d.origin(10);
        })
        .is_none());
        assert!(DecayFunction::build(DecayKind::Exp, "", |d| {
            d.scale(10);
        })
        .is_none());
        assert!(DecayFunction::build(DecayKind::Exp, "price", |d| {
            d.scale("");
        })
        .is_none());
    }

    #[test]
    fn test_function_entry_needs_weight_or_function() {
        assert!(FunctionScore::build(|f| {
            f.filter(|c| {
                c.term("a", 1);
            });
        })
        .is_none());
        assert!(FunctionScore::build(|f| {
            f.gauss("date", |_| {});
        })
        .is_none());

        let weighted = FunctionScore::build(|f| {
            f.filter(|c| {
                c.term("type", "premium");
            });
            f.weight(3.0);
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(weighted).unwrap(),
            json!({"filter": {"term": {"type": {"value": "premium"}}}, "weight": 3.0})
        );
    }

    #[test]
    fn test_function_score_query() {
        let q = function_score_query(|fs| {
            fs.query(|c| {
                c.match_query("title", "phone");
            });
            fs.function(|f| {
                f.field_value_factor("likes", |v| {
                    v.factor(1.5).modifier(FieldValueFactorModifier::Log1p).missing(1.0);
                });
            });
            fs.function(|f| {
                f.random_score(|r| {
                    r.seed(10).field("_seq_no");
                });
            });
            fs.function(|f| {
                f.script_score(Script::new("Math.log(2 + doc['likes'].value)"));
            });
            fs.function(|_| {});
            fs.score_mode(FunctionScoreMode::Sum)
                .boost_mode(FunctionBoostMode::Multiply)
                .max_boost(42.0);
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(q).unwrap(),
            json!({"function_score": {
                "query": {"match": {"title": {"query": "phone"}}},
                "functions": [
                    {"field_value_factor": {"field": "likes", "factor": 1.5, "modifier": "log1p", "missing": 1.0}},
                    {"random_score": {"seed": 10, "field": "_seq_no"}},
                    {"script_score": {"script": {"source": "Math.log(2 + doc['likes'].value)"}}}
                ],
                "score_mode": "sum",
                "boost_mode": "multiply",
                "max_boost": 42.0
            }})
        );
    }

    #[test]
    fn test_function_score_omitted_when_empty() {
        assert!(function_score_query(|fs| {
            fs.boost(2.0);
            fs.function(|_| {});
            fs.query(|_| {});
        })
        .is_none());

        let only_functions = function_score_query(|fs| {
            fs.function(|f| {
                f.weight(2.0);
            });
        });
        assert!(only_functions.is_some());
    }
}
