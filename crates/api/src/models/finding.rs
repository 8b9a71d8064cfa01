//! Typed view of the scanner's JSON report.
//!
//! Only the fields the host needs to list findings are modeled. Anything
//! else in the payload is ignored; a payload missing the required fields fails
//! deserialization and is reported as malformed output by the caller.

use serde::{Deserialize, Serialize};

/// Result of one directory scan: the ordered list of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub matches: Vec<Finding>,
}

impl ScanReport {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.matches.iter()
    }

    /// One-line human summary, e.g. "2 vulnerable packages".
    pub fn summary(&self) -> String {
        let noun = if self.len() == 1 { "package" } else { "packages" };
        format!("{} vulnerable {}", self.len(), noun)
    }
}

impl IntoIterator for ScanReport {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

/// A single vulnerability-to-package match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub vulnerability: Vulnerability,
    #[serde(default)]
    pub related_vulnerabilities: Vec<serde_json::Value>,
    #[serde(default)]
    pub match_details: Vec<serde_json::Value>,
    pub artifact: Artifact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Remediation hint attached to a vulnerability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub version: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
}

impl Finding {
    /// Versions that fix this finding, joined for display. Empty when unknown.
    pub fn fixed_in(&self) -> String {
        self.vulnerability
            .fix
            .as_ref()
            .map(|fix| fix.versions.join(", "))
            .unwrap_or_default()
    }

    pub fn first_location(&self) -> Option<&str> {
        self.artifact.locations.first().map(|l| l.path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
        "matches": [
            {
                "vulnerability": {
                    "id": "GHSA-35jh-r3h4-6jhm",
                    "dataSource": "https://github.com/advisories/GHSA-35jh-r3h4-6jhm",
                    "severity": "High",
                    "urls": ["https://github.com/advisories/GHSA-35jh-r3h4-6jhm"],
                    "description": "Command Injection in lodash",
                    "fix": { "versions": ["4.17.21"], "state": "fixed" }
                },
                "relatedVulnerabilities": [],
                "matchDetails": [{ "type": "exact-direct-match" }],
                "artifact": {
                    "name": "lodash",
                    "version": "4.17.20",
                    "type": "npm",
                    "locations": [{ "path": "/package-lock.json" }],
                    "purl": "pkg:npm/lodash@4.17.20"
                }
            }
        ],
        "source": { "type": "directory", "target": "/repo" },
        "descriptor": { "name": "grype", "version": "0.42.0" }
    }"#;

    #[test]
    fn test_parse_report_ignores_unknown_fields() {
        let report: ScanReport = serde_json::from_str(REPORT).unwrap();
        assert_eq!(report.len(), 1);
        let finding = &report.matches[0];
        assert_eq!(finding.vulnerability.id, "GHSA-35jh-r3h4-6jhm");
        assert_eq!(finding.artifact.kind, "npm");
        assert_eq!(finding.fixed_in(), "4.17.21");
        assert_eq!(finding.first_location(), Some("/package-lock.json"));
    }

    #[test]
    fn test_missing_matches_is_rejected() {
        let err = serde_json::from_str::<ScanReport>(r#"{"source": {}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_finding_without_artifact_is_rejected() {
        let raw = r#"{"matches": [{"vulnerability": {"id": "CVE-1", "severity": "Low"}}]}"#;
        assert!(serde_json::from_str::<ScanReport>(raw).is_err());
    }

    #[test]
    fn test_summary_pluralizes() {
        let mut report: ScanReport = serde_json::from_str(REPORT).unwrap();
        assert_eq!(report.summary(), "1 vulnerable package");
        report.matches.clear();
        assert_eq!(report.summary(), "0 vulnerable packages");
    }
}
