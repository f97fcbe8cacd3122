//! Agent config element types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ingestion_rule::IngestionRuleType;
use crate::ValidationError;

/// Kind of record an agent config version is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    LogPipelines,
    DropRules,
    SamplingRules,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogPipelines => "log_pipelines",
            Self::DropRules => "drop_rules",
            Self::SamplingRules => "sampling_rules",
        }
    }

    /// Ingestion rule type stored for this element type, if it is a rule.
    pub fn rule_type(&self) -> Option<IngestionRuleType> {
        match self {
            Self::LogPipelines => None,
            Self::DropRules => Some(IngestionRuleType::Drop),
            Self::SamplingRules => Some(IngestionRuleType::Sampling),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log_pipelines" => Ok(Self::LogPipelines),
            "drop_rules" => Ok(Self::DropRules),
            "sampling_rules" => Ok(Self::SamplingRules),
            _ => Err(ValidationError::InvalidVariant {
                field: "element type",
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_element_types_map_to_rule_types() {
        assert_eq!(ElementType::DropRules.rule_type(), Some(IngestionRuleType::Drop));
        assert_eq!(
            ElementType::SamplingRules.rule_type(),
            Some(IngestionRuleType::Sampling)
        );
        assert_eq!(ElementType::LogPipelines.rule_type(), None);
    }

    #[test]
    fn parse_round_trips_as_str() {
        for t in [
            ElementType::LogPipelines,
            ElementType::DropRules,
            ElementType::SamplingRules,
        ] {
            assert_eq!(t.as_str().parse::<ElementType>().unwrap(), t);
        }
        assert!("pipelines".parse::<ElementType>().is_err());
    }
}
