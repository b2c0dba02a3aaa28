//! Dependency health reporting.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Health of a single dependency or of the whole service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    /// The dependency answered as expected.
    Ok,
    /// The dependency failed or is unreachable.
    Error,
}

/// Kind of dependency being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// The local database.
    Database,
    /// A service reached over HTTP.
    Http,
}

/// Result of checking one dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyHealth {
    /// Human-readable dependency name.
    pub name: String,
    /// Outcome of the check.
    pub status: HealthStatus,
    /// Kind of dependency.
    #[serde(rename = "type")]
    pub kind: DependencyType,
    /// Diagnostic details, usually `{"error": "..."}` on failure.
    pub details: Option<Value>,
}

impl DependencyHealth {
    /// A passing check.
    #[must_use]
    pub fn ok(name: impl Into<String>, kind: DependencyType) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Ok,
            kind,
            details: None,
        }
    }

    /// A failing check carrying the error text.
    #[must_use]
    pub fn failed(name: impl Into<String>, kind: DependencyType, error: impl ToString) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Error,
            kind,
            details: Some(serde_json::json!({ "error": error.to_string() })),
        }
    }
}

/// Aggregated health of the service and all of its dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// `OK` only if every dependency is `OK`.
    pub status: HealthStatus,
    /// Individual dependency results, in check order.
    pub deps: Vec<DependencyHealth>,
}

impl HealthReport {
    /// Build a report, deriving the overall status from the dependencies.
    #[must_use]
    pub fn from_deps(deps: Vec<DependencyHealth>) -> Self {
        let status = if deps.iter().all(|d| d.status == HealthStatus::Ok) {
            HealthStatus::Ok
        } else {
            HealthStatus::Error
        };
        Self { status, deps }
    }
}
