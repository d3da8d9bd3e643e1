//! Transaction results: committed steps, outcomes and rollback reports

use crate::error::ProviderError;
use crate::types::{Handle, ResourceKind, ResourceRef};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A step whose resource the provider confirmed as created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedStep {
    pub kind: ResourceKind,
    pub name: String,
    /// What to delete when compensating
    pub target: ResourceRef,
    /// What the provider returned
    pub handle: Handle,
}

/// Where the transaction stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// Kind of the resource being created
    pub kind: ResourceKind,
    pub name: String,
    /// The primary error, always the one surfaced to the caller
    pub error: ProviderError,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "creating {} '{}' failed: {}",
            self.kind.display_name().to_lowercase(),
            self.name,
            self.error
        )
    }
}

/// How a single rollback/teardown entry ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RollbackStatus {
    /// Delete call completed
    Deleted,
    /// Provider said the resource no longer exists
    AlreadyAbsent,
    /// No delete call was issued
    Skipped { reason: String },
    /// Delete call failed; the resource may be left behind
    Failed { error: ProviderError },
}

impl RollbackStatus {
    /// Whether the resource is known to be gone (or needs no action)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackEntry {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(flatten)]
    pub status: RollbackStatus,
}

/// Every entry the compensator attempted, in the order it attempted them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    pub entries: Vec<RollbackEntry>,
}

impl RollbackReport {
    pub fn push(&mut self, entry: RollbackEntry) {
        self.entries.push(entry);
    }

    /// Entries whose delete call completed
    pub fn deleted(&self) -> impl Iterator<Item = &RollbackEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == RollbackStatus::Deleted)
    }

    /// Entries whose delete call failed
    pub fn failed(&self) -> impl Iterator<Item = &RollbackEntry> {
        self.entries.iter().filter(|e| !e.status.is_success())
    }

    /// True if nothing was left behind
    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.status.is_success())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Turn leftovers into an error listing them
    pub fn check(&self) -> Result<(), PartialRollbackError> {
        let leftovers: Vec<RollbackEntry> = self.failed().cloned().collect();
        if leftovers.is_empty() {
            Ok(())
        } else {
            Err(PartialRollbackError { leftovers })
        }
    }
}

/// One or more cleanup deletions failed; informational, never the primary error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct PartialRollbackError {
    pub leftovers: Vec<RollbackEntry>,
}

impl fmt::Display for PartialRollbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} resource(s) could not be deleted:", self.leftovers.len())?;
        for entry in &self.leftovers {
            write!(f, " {} '{}'", entry.kind, entry.name)?;
            if let RollbackStatus::Failed { error } = &entry.status {
                write!(f, " ({error})")?;
            }
            write!(f, ";")?;
        }
        Ok(())
    }
}

/// Result of a provisioning transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// Every step committed
    Success {
        vm: Handle,
        committed: Vec<CommittedStep>,
    },
    /// A step failed and the committed prefix was unwound
    Failure {
        failure: StepFailure,
        rollback: RollbackReport,
    },
}

impl ProvisionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The primary error, if the transaction failed
    pub fn error(&self) -> Option<&ProviderError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { failure, .. } => Some(&failure.error),
        }
    }

    pub fn rollback(&self) -> Option<&RollbackReport> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { rollback, .. } => Some(rollback),
        }
    }

    pub fn into_result(self) -> Result<Handle, ProvisionFailure> {
        match self {
            Self::Success { vm, .. } => Ok(vm),
            Self::Failure { failure, rollback } => Err(ProvisionFailure { failure, rollback }),
        }
    }
}

/// Error form of [`ProvisionOutcome::Failure`]
///
/// Displays the primary cause; the rollback report rides along as
/// diagnostics and is exposed through [`ProvisionFailure::rollback`].
#[derive(Debug, Clone, Error)]
#[error("{failure}")]
pub struct ProvisionFailure {
    pub failure: StepFailure,
    pub rollback: RollbackReport,
}

impl ProvisionFailure {
    pub fn primary(&self) -> &ProviderError {
        &self.failure.error
    }

    pub fn rollback(&self) -> &RollbackReport {
        &self.rollback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: ResourceKind, name: &str, status: RollbackStatus) -> RollbackEntry {
        RollbackEntry {
            kind,
            name: name.into(),
            status,
        }
    }

    #[test]
    fn test_report_counts() {
        let mut report = RollbackReport::default();
        report.push(entry(ResourceKind::SecurityGroup, "nsg", RollbackStatus::Deleted));
        report.push(entry(
            ResourceKind::Subnet,
            "snet",
            RollbackStatus::Skipped {
                reason: "deleted with parent".into(),
            },
        ));
        report.push(entry(ResourceKind::VirtualNetwork, "vnet", RollbackStatus::AlreadyAbsent));

        assert_eq!(report.deleted().count(), 1);
        assert_eq!(report.failed().count(), 0);
        assert!(report.is_clean());
        assert!(report.check().is_ok());
    }

    #[test]
    fn test_partial_rollback_error_lists_leftovers() {
        let mut report = RollbackReport::default();
        report.push(entry(
            ResourceKind::NetworkInterface,
            "nic-1",
            RollbackStatus::Failed {
                error: ProviderError::new("ResourceBusy", "still attached"),
            },
        ));
        report.push(entry(ResourceKind::PublicIp, "pip-1", RollbackStatus::Deleted));

        let err = report.check().unwrap_err();
        assert_eq!(err.leftovers.len(), 1);
        let msg = err.to_string();
        assert!(msg.contains("nic 'nic-1'"));
        assert!(msg.contains("ResourceBusy"));
    }

    #[test]
    fn test_failure_displays_primary_error() {
        let outcome = ProvisionOutcome::Failure {
            failure: StepFailure {
                kind: ResourceKind::PublicIp,
                name: "pip-1".into(),
                error: ProviderError::new("QuotaExceeded", "limit reached"),
            },
            rollback: RollbackReport::default(),
        };
        assert_eq!(outcome.error().map(|e| e.code.as_str()), Some("QuotaExceeded"));

        let err = outcome.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "creating public ip 'pip-1' failed: QuotaExceeded: limit reached"
        );
    }

    #[test]
    fn test_report_serializes_status_inline() {
        let mut report = RollbackReport::default();
        report.push(entry(ResourceKind::VirtualNetwork, "vnet", RollbackStatus::Deleted));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["kind"], "virtual_network");
        assert_eq!(json["entries"][0]["status"], "deleted");
    }
}
