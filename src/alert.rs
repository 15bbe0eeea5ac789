//! Alert records emitted by detectors.

use serde::{Deserialize, Serialize};

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Info,
    Low,
    Medium,
    High,
}

impl Risk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Risk::Info => "info",
            Risk::Low => "low",
            Risk::Medium => "medium",
            Risk::High => "high",
        }
    }
}

impl std::fmt::Display for Risk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// How certain a detector is that a finding is real.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single finding. Immutable once emitted; the sink owns it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub rule_id: u32,
    pub name: String,
    pub risk: Risk,
    pub confidence: Confidence,
    pub evidence: String,
    pub other_info: String,
    pub uri: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub param: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub solution: String,
    #[serde(default)]
    pub cwe_id: u32,
    #[serde(default)]
    pub wasc_id: u32,
}

impl Alert {
    /// Start building an alert for the given rule.
    pub fn builder(rule_id: u32, name: impl Into<String>) -> AlertBuilder {
        AlertBuilder {
            alert: Alert {
                rule_id,
                name: name.into(),
                risk: Risk::Info,
                confidence: Confidence::Medium,
                evidence: String::new(),
                other_info: String::new(),
                uri: String::new(),
                description: String::new(),
                param: String::new(),
                solution: String::new(),
                cwe_id: 0,
                wasc_id: 0,
            },
        }
    }
}

/// Builder for [`Alert`]. Unset text fields stay empty.
#[derive(Debug, Clone)]
pub struct AlertBuilder {
    alert: Alert,
}

impl AlertBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.alert.name = name.into();
        self
    }

    pub fn risk(mut self, risk: Risk) -> Self {
        self.alert.risk = risk;
        self
    }

    pub fn confidence(mut self, confidence: Confidence) -> Self {
        self.alert.confidence = confidence;
        self
    }

    pub fn evidence(mut self, evidence: impl Into<String>) -> Self {
        self.alert.evidence = evidence.into();
        self
    }

    pub fn other_info(mut self, other_info: impl Into<String>) -> Self {
        self.alert.other_info = other_info.into();
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.alert.uri = uri.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.alert.description = description.into();
        self
    }

    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.alert.param = param.into();
        self
    }

    pub fn solution(mut self, solution: impl Into<String>) -> Self {
        self.alert.solution = solution.into();
        self
    }

    pub fn cwe(mut self, cwe_id: u32) -> Self {
        self.alert.cwe_id = cwe_id;
        self
    }

    pub fn wasc(mut self, wasc_id: u32) -> Self {
        self.alert.wasc_id = wasc_id;
        self
    }

    pub fn build(self) -> Alert {
        self.alert
    }
}
