//! Deployment bookkeeping shared by pipelines and ingestion rules
//!
//! The orchestrator that actually ships configuration to agents lives outside
//! this workspace. Records only carry the status and sequence columns it reads
//! and writes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Sequence stored on records that have never been part of a deployment.
pub const SEQ_NEVER_DEPLOYED: i32 = -1;

/// Sequence stored on records edited after deployment; picked up by the next
/// deploy cycle.
pub const SEQ_REDEPLOY_QUEUED: i32 = -2;

/// Deployment status column
///
/// Serialized as the column value; parsed case-insensitively everywhere
/// (query strings, JSON bodies, stored rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum DeployStatus {
    /// Created or edited, not yet shipped
    #[default]
    Pending,
    /// Part of an in-flight deployment
    Deploying,
    Deployed,
    Failed,
}

impl DeployStatus {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Deploying => "DEPLOYING",
            Self::Deployed => "DEPLOYED",
            Self::Failed => "FAILED",
        }
    }

    /// Whether a deployment attempt has finished with this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deployed | Self::Failed)
    }
}

impl fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "DEPLOYING" => Ok(Self::Deploying),
            "DEPLOYED" => Ok(Self::Deployed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(ValidationError::InvalidVariant {
                field: "deployment status",
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for DeployStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("deploying".parse::<DeployStatus>().unwrap(), DeployStatus::Deploying);
        assert_eq!("FAILED".parse::<DeployStatus>().unwrap(), DeployStatus::Failed);
    }

    #[test]
    fn rejects_unknown_status() {
        let err = "DIRTY".parse::<DeployStatus>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVariant { .. }));
    }

    #[test]
    fn serde_matches_column_values() {
        let json = serde_json::to_string(&DeployStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
        for status in [
            DeployStatus::Pending,
            DeployStatus::Deploying,
            DeployStatus::Deployed,
            DeployStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<DeployStatus>().unwrap(), status);
        }
    }

    #[test]
    fn json_parses_like_from_str() {
        let status: DeployStatus = serde_json::from_str("\"deployed\"").unwrap();
        assert_eq!(status, DeployStatus::Deployed);
        let err = serde_json::from_str::<DeployStatus>("\"shipped\"").unwrap_err();
        assert!(err.to_string().contains("shipped"));
    }

    #[test]
    fn terminal_statuses() {
        assert!(DeployStatus::Deployed.is_terminal());
        assert!(DeployStatus::Failed.is_terminal());
        assert!(!DeployStatus::Deploying.is_terminal());
    }
}
