//! Attribute-key autocomplete types
//!
//! Request/response shapes for the query service's
//! `GET /api/v3/autocomplete/attribute_keys` endpoint, used by the query
//! builder to suggest attribute keys while a filter is being typed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Path of the autocomplete endpoint relative to the query service root
pub const ATTRIBUTE_KEYS_PATH: &str = "/api/v3/autocomplete/attribute_keys";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Traces,
    Logs,
    Metrics,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Traces => "traces",
            Self::Logs => "logs",
            Self::Metrics => "metrics",
        }
    }
}

impl FromStr for DataSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "traces" => Ok(Self::Traces),
            "logs" => Ok(Self::Logs),
            "metrics" => Ok(Self::Metrics),
            _ => Err(ValidationError::InvalidVariant {
                field: "dataSource",
                value: s.to_owned(),
            }),
        }
    }
}

/// Aggregation applied in the query the keys are suggested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOperator {
    #[default]
    Noop,
    Count,
    CountDistinct,
    Sum,
    Avg,
    Max,
    Min,
    P50,
    P90,
    P95,
    P99,
    Rate,
    SumRate,
    AvgRate,
}

impl AggregateOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Count => "count",
            Self::CountDistinct => "count_distinct",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Min => "min",
            Self::P50 => "p50",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
            Self::Rate => "rate",
            Self::SumRate => "sum_rate",
            Self::AvgRate => "avg_rate",
        }
    }

    const ALL: [Self; 14] = [
        Self::Noop,
        Self::Count,
        Self::CountDistinct,
        Self::Sum,
        Self::Avg,
        Self::Max,
        Self::Min,
        Self::P50,
        Self::P90,
        Self::P95,
        Self::P99,
        Self::Rate,
        Self::SumRate,
        Self::AvgRate,
    ];
}

impl fmt::Display for AggregateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateOperator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "aggregateOperator",
                value: s.to_owned(),
            })
    }
}

/// Query parameters for an attribute-key lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeKeysQuery {
    pub search_text: String,
    pub aggregate_operator: AggregateOperator,
    pub data_source: DataSource,
    pub aggregate_attribute: String,
}

impl AttributeKeysQuery {
    /// Query string pairs in the order the query service documents them.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("aggregateOperator", self.aggregate_operator.as_str().to_owned()),
            ("dataSource", self.data_source.as_str().to_owned()),
            ("aggregateAttribute", self.aggregate_attribute.clone()),
            ("searchText", self.search_text.clone()),
        ]
    }
}

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeDataType {
    String,
    Int64,
    Float64,
    Bool,
    #[serde(other)]
    Unknown,
}

/// Where the attribute lives on a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Tag,
    Resource,
    #[serde(other)]
    Unspecified,
}

/// One suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeKey {
    pub key: String,
    pub data_type: AttributeDataType,
    #[serde(rename = "type")]
    pub kind: AttributeKind,
    #[serde(default)]
    pub is_column: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttributeKeysResponse {
    #[serde(default)]
    pub attribute_keys: Vec<AttributeKey>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_pairs_carry_all_params() {
        let query = AttributeKeysQuery {
            search_text: "http.".into(),
            aggregate_operator: AggregateOperator::CountDistinct,
            data_source: DataSource::Traces,
            aggregate_attribute: "durationNano".into(),
        };
        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("aggregateOperator", "count_distinct".into())));
        assert!(pairs.contains(&("dataSource", "traces".into())));
        assert!(pairs.contains(&("aggregateAttribute", "durationNano".into())));
        assert!(pairs.contains(&("searchText", "http.".into())));
    }

    #[test]
    fn operator_parse_matches_as_str() {
        assert_eq!("p95".parse::<AggregateOperator>().unwrap(), AggregateOperator::P95);
        assert_eq!(
            "sum_rate".parse::<AggregateOperator>().unwrap(),
            AggregateOperator::SumRate
        );
        assert!("median".parse::<AggregateOperator>().is_err());
    }

    #[test]
    fn response_tolerates_empty_type() {
        let resp: AttributeKeysResponse = serde_json::from_value(json!({
            "attributeKeys": [
                { "key": "service.name", "dataType": "string", "type": "resource", "isColumn": true },
                { "key": "body", "dataType": "string", "type": "" }
            ]
        }))
        .unwrap();
        assert_eq!(resp.attribute_keys.len(), 2);
        assert_eq!(resp.attribute_keys[0].kind, AttributeKind::Resource);
        assert_eq!(resp.attribute_keys[1].kind, AttributeKind::Unspecified);
        assert!(!resp.attribute_keys[1].is_column);
    }

    #[test]
    fn null_key_list_is_empty() {
        let resp: AttributeKeysResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.attribute_keys.is_empty());
    }
}
