//! Ingestion rules (drop and sampling)
//!
//! Rules decide which telemetry is discarded or sampled at ingestion time.
//! Like pipelines, the rule body lives in a JSON column next to the typed
//! columns used for filtering.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deploy::{DeployStatus, SEQ_NEVER_DEPLOYED};
use crate::error::{CoreError, Result};
use crate::validation::require_text;
use crate::ValidationError;

/// Priority given to rules submitted without one. All rules start equal;
/// a higher number runs first.
pub const DEFAULT_PRIORITY: i32 = 1;

const MAX_NAME_LEN: usize = 128;
const MAX_SUBTYPE_LEN: usize = 64;
const MAX_CONDITION_LEN: usize = 4096;

/// Signal a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionSource {
    Traces,
    Metrics,
    Logs,
}

impl IngestionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Traces => "traces",
            Self::Metrics => "metrics",
            Self::Logs => "logs",
        }
    }
}

impl FromStr for IngestionSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "traces" => Ok(Self::Traces),
            "metrics" => Ok(Self::Metrics),
            "logs" => Ok(Self::Logs),
            _ => Err(ValidationError::InvalidVariant {
                field: "source",
                value: s.to_owned(),
            }),
        }
    }
}

/// What a rule does to matching data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionRuleType {
    Drop,
    Sampling,
}

impl IngestionRuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Sampling => "sampling",
        }
    }
}

impl fmt::Display for IngestionRuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestionRuleType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "drop" => Ok(Self::Drop),
            "sampling" => Ok(Self::Sampling),
            _ => Err(ValidationError::InvalidVariant {
                field: "rule type",
                value: s.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropConfig {
    /// Filter expression; matching records are dropped
    pub conditions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingConfig {
    /// Records the percentage applies to; all records when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub sampling_percent: f64,
}

/// Body of the `config_json` column
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_config: Option<DropConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_config: Option<SamplingConfig>,
}

impl RuleConfig {
    /// Check the config carries the section its rule type needs.
    pub fn validate_for(&self, rule_type: IngestionRuleType) -> std::result::Result<(), ValidationError> {
        match rule_type {
            IngestionRuleType::Drop => {
                let drop = self
                    .drop_config
                    .as_ref()
                    .ok_or(ValidationError::Missing { field: "dropConfig" })?;
                require_text("dropConfig.conditions", &drop.conditions, MAX_CONDITION_LEN)
            }
            IngestionRuleType::Sampling => {
                let sampling = self
                    .sampling_config
                    .as_ref()
                    .ok_or(ValidationError::Missing { field: "samplingConfig" })?;
                if !(0.0..=100.0).contains(&sampling.sampling_percent) {
                    return Err(ValidationError::OutOfRange {
                        field: "samplingConfig.samplingPercent",
                        min: 0,
                        max: 100,
                    });
                }
                if let Some(condition) = &sampling.condition {
                    require_text("samplingConfig.condition", condition, MAX_CONDITION_LEN)?;
                }
                Ok(())
            }
        }
    }

    fn to_raw(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CoreError::json("ingestion rule config", e))
    }
}

/// Replace an unset (zero or absent) priority with [`DEFAULT_PRIORITY`].
pub fn normalize_priority(priority: Option<i32>) -> i32 {
    match priority {
        None | Some(0) => DEFAULT_PRIORITY,
        Some(p) => p,
    }
}

fn validate_priority(priority: Option<i32>) -> std::result::Result<(), ValidationError> {
    match priority {
        Some(p) if p < 0 => Err(ValidationError::OutOfRange {
            field: "priority",
            min: 0,
            max: i32::MAX as i64,
        }),
        _ => Ok(()),
    }
}

/// Rule as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostableIngestionRule {
    pub name: String,
    pub source: IngestionSource,
    pub rule_type: IngestionRuleType,
    #[serde(default)]
    pub rule_subtype: String,
    #[serde(default)]
    pub priority: Option<i32>,
    pub config: RuleConfig,
}

impl PostableIngestionRule {
    /// Check the rule before anything is written.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        if self.rule_subtype.chars().count() > MAX_SUBTYPE_LEN {
            return Err(ValidationError::TooLong {
                field: "ruleSubtype",
                max: MAX_SUBTYPE_LEN,
            });
        }
        validate_priority(self.priority)?;
        self.config.validate_for(self.rule_type)
    }

    /// Validate, default the priority, assign an id and serialize the config.
    pub fn into_rule(self) -> Result<IngestionRule> {
        self.validate()?;
        let raw_config = self.config.to_raw()?;
        let now = Utc::now();

        Ok(IngestionRule {
            id: crate::new_id(),
            name: self.name,
            source: self.source,
            rule_type: self.rule_type,
            rule_subtype: self.rule_subtype,
            priority: normalize_priority(self.priority),
            config: self.config,
            raw_config,
            deploy_status: DeployStatus::Pending,
            deploy_sequence: SEQ_NEVER_DEPLOYED,
            error_message: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// User edit of an existing rule.
///
/// Source and rule type are fixed at creation; `rule_type` states which type
/// the client believes the rule has and must match the stored one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEdit {
    pub rule_type: IngestionRuleType,
    pub name: String,
    #[serde(default)]
    pub rule_subtype: String,
    #[serde(default)]
    pub priority: Option<i32>,
    pub config: RuleConfig,
}

/// Edit after validation and defaulting, ready for the UPDATE.
#[derive(Debug, Clone)]
pub struct PreparedEdit {
    pub rule_type: IngestionRuleType,
    pub name: String,
    pub rule_subtype: String,
    pub priority: i32,
    pub raw_config: String,
}

impl RuleEdit {
    /// Validate against the stated rule type, default the priority and
    /// serialize the config.
    pub fn prepare(self) -> Result<PreparedEdit> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        if self.rule_subtype.chars().count() > MAX_SUBTYPE_LEN {
            return Err(ValidationError::TooLong {
                field: "ruleSubtype",
                max: MAX_SUBTYPE_LEN,
            }
            .into());
        }
        validate_priority(self.priority)?;
        self.config.validate_for(self.rule_type)?;

        Ok(PreparedEdit {
            raw_config: self.config.to_raw()?,
            rule_type: self.rule_type,
            name: self.name,
            rule_subtype: self.rule_subtype,
            priority: normalize_priority(self.priority),
        })
    }
}

/// Stored ingestion rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRule {
    pub id: String,
    pub name: String,
    pub source: IngestionSource,
    pub rule_type: IngestionRuleType,
    pub rule_subtype: String,
    pub priority: i32,
    pub config: RuleConfig,
    #[serde(skip)]
    pub raw_config: String,
    pub deploy_status: DeployStatus,
    pub deploy_sequence: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parse a stored `config_json` column.
pub fn parse_rule_config(raw: &str) -> std::result::Result<RuleConfig, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn drop_rule() -> PostableIngestionRule {
        serde_json::from_value(json!({
            "name": "drop health checks",
            "source": "traces",
            "ruleType": "drop",
            "config": { "dropConfig": { "conditions": "http.route = '/healthz'" } }
        }))
        .unwrap()
    }

    fn sampling_rule(percent: f64) -> PostableIngestionRule {
        serde_json::from_value(json!({
            "name": "sample checkout",
            "source": "traces",
            "ruleType": "sampling",
            "priority": 5,
            "config": {
                "samplingConfig": { "condition": "service.name = 'checkout'", "samplingPercent": percent }
            }
        }))
        .unwrap()
    }

    #[test]
    fn omitted_priority_defaults_to_one() {
        let rule = drop_rule().into_rule().unwrap();
        assert_eq!(rule.priority, DEFAULT_PRIORITY);
    }

    #[test]
    fn zero_priority_defaults_to_one() {
        let mut postable = drop_rule();
        postable.priority = Some(0);
        assert_eq!(postable.into_rule().unwrap().priority, 1);
    }

    #[test]
    fn explicit_priority_kept() {
        let rule = sampling_rule(20.0).into_rule().unwrap();
        assert_eq!(rule.priority, 5);
    }

    #[test]
    fn negative_priority_rejected() {
        let mut postable = drop_rule();
        postable.priority = Some(-3);
        assert!(matches!(
            postable.validate(),
            Err(ValidationError::OutOfRange { field: "priority", .. })
        ));
    }

    #[test]
    fn drop_rule_requires_drop_config() {
        let mut postable = drop_rule();
        postable.config = RuleConfig::default();
        assert_eq!(
            postable.validate(),
            Err(ValidationError::Missing { field: "dropConfig" })
        );
    }

    #[test]
    fn sampling_percent_bounds() {
        assert!(sampling_rule(0.0).validate().is_ok());
        assert!(sampling_rule(100.0).validate().is_ok());
        assert!(matches!(
            sampling_rule(100.5).validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn new_rule_is_pending_and_never_deployed() {
        let rule = drop_rule().into_rule().unwrap();
        assert_eq!(rule.deploy_status, DeployStatus::Pending);
        assert_eq!(rule.deploy_sequence, SEQ_NEVER_DEPLOYED);
        assert_eq!(parse_rule_config(&rule.raw_config).unwrap(), rule.config);
    }

    #[test]
    fn unknown_source_is_rejected_at_parse() {
        let parsed: std::result::Result<PostableIngestionRule, _> =
            serde_json::from_value(json!({
                "name": "x",
                "source": "profiles",
                "ruleType": "drop",
                "config": {}
            }));
        assert!(parsed.is_err());
    }

    #[test]
    fn edit_is_checked_against_existing_type() {
        let mut edit = RuleEdit {
            rule_type: IngestionRuleType::Sampling,
            name: "renamed".into(),
            rule_subtype: String::new(),
            priority: None,
            config: RuleConfig {
                drop_config: Some(DropConfig {
                    conditions: "k8s.namespace = 'dev'".into(),
                }),
                sampling_config: None,
            },
        };
        assert!(matches!(
            edit.clone().prepare(),
            Err(CoreError::Validation(ValidationError::Missing { .. }))
        ));

        edit.rule_type = IngestionRuleType::Drop;
        let prepared = edit.prepare().unwrap();
        assert_eq!(prepared.priority, DEFAULT_PRIORITY);
        assert!(prepared.raw_config.contains("dropConfig"));
    }
}
