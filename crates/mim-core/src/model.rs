//! Verdict shapes shared by every verifier

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Three-way compliance outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Error,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::NonCompliant => "non-compliant",
            ComplianceStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for a probed service URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub target: String,
    pub status: ComplianceStatus,
    pub details: String,
}

impl ComplianceResult {
    pub fn compliant(target: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            status: ComplianceStatus::Compliant,
            details: details.into(),
        }
    }

    pub fn non_compliant(target: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            status: ComplianceStatus::NonCompliant,
            details: details.into(),
        }
    }

    pub fn unreachable(target: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            status: ComplianceStatus::Error,
            details: details.into(),
        }
    }
}

/// Raised when a reachable target fails every compliance check.
///
/// Never produced for transport failures; those are `ComplianceStatus::Error`
/// results.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{target} is {status}: {details}")]
pub struct ComplianceException {
    pub target: String,
    pub status: ComplianceStatus,
    pub details: String,
}

impl ComplianceException {
    pub fn new(target: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            status: ComplianceStatus::NonCompliant,
            details: details.into(),
        }
    }
}

impl From<ComplianceException> for ComplianceResult {
    fn from(e: ComplianceException) -> Self {
        Self {
            target: e.target,
            status: e.status,
            details: e.details,
        }
    }
}

/// Outcome of probing a service URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Compliant(ComplianceResult),
    NonCompliant(ComplianceException),
    Unreachable(ComplianceResult),
}

impl ProbeOutcome {
    pub fn status(&self) -> ComplianceStatus {
        match self {
            ProbeOutcome::Compliant(_) => ComplianceStatus::Compliant,
            ProbeOutcome::NonCompliant(_) => ComplianceStatus::NonCompliant,
            ProbeOutcome::Unreachable(_) => ComplianceStatus::Error,
        }
    }

    /// Split into the result/exception contract: only non-compliance is an `Err`
    pub fn into_result(self) -> Result<ComplianceResult, ComplianceException> {
        match self {
            ProbeOutcome::Compliant(r) | ProbeOutcome::Unreachable(r) => Ok(r),
            ProbeOutcome::NonCompliant(e) => Err(e),
        }
    }

    /// Collapse every variant into the uniform result shape
    pub fn into_compliance_result(self) -> ComplianceResult {
        match self.into_result() {
            Ok(r) => r,
            Err(e) => e.into(),
        }
    }
}

/// Verdict for an uploaded GeoPackage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeospatialCheckResult {
    /// Empty when no layer qualified
    pub layer_name: String,
    pub contains_geospatial_data: bool,
    pub identifiers_unique: bool,
    /// Identifiers are monotonically non-decreasing in encounter order
    pub identifiers_persistent: bool,
    pub message: Option<String>,
}

impl GeospatialCheckResult {
    pub const NO_GEOSPATIAL_DATA: &'static str = "No geospatial data found in any layer";

    pub fn found(layer_name: impl Into<String>, unique: bool, persistent: bool) -> Self {
        Self {
            layer_name: layer_name.into(),
            contains_geospatial_data: true,
            identifiers_unique: unique,
            identifiers_persistent: persistent,
            message: None,
        }
    }

    pub fn not_found() -> Self {
        Self::failed(Self::NO_GEOSPATIAL_DATA)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            layer_name: String::new(),
            contains_geospatial_data: false,
            identifiers_unique: false,
            identifiers_persistent: false,
            message: Some(message.into()),
        }
    }
}
