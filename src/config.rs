//! TOML configuration.
//!
//! Every section is optional; an empty file yields the built-in behaviour.
//!
//! # Example `headerguard.toml`
//!
//! ```toml
//! [scan]
//! threshold = "low"
//! disabled = ["server-version"]
//!
//! [[matchers.application_errors]]
//! id = "internal-trace"
//! kind = "regex"
//! pattern = "ACME-ERR-[0-9]{4}"
//!
//! [versions]
//! apache = "2.4.62"
//! nginx = "1.27.0"
//!
//! [messages]
//! "cors.name" = "Overly permissive CORS policy"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::detector::{AlertThreshold, ScanContext};
use crate::error::{Error, Result};
use crate::matcher::MatchRule;
use crate::messages::Messages;

/// `[scan]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub threshold: AlertThreshold,
    /// Detector keys to skip (see `headerguard rules`).
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// `[matchers]` section. A present list replaces the built-in one entirely.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MatchersConfig {
    #[serde(default)]
    pub application_errors: Option<Vec<MatchRule>>,
    #[serde(default)]
    pub directory_listings: Option<Vec<MatchRule>>,
}

/// Top-level configuration deserialized from `headerguard.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub matchers: MatchersConfig,
    /// Latest known release per product name (matched case-insensitively).
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
    /// Message overrides keyed like the built-in table.
    #[serde(default)]
    pub messages: HashMap<String, String>,
}

impl AppConfig {
    /// Load and parse the configuration from a TOML file at the given path.
    ///
    /// `${VAR}` placeholders are replaced with environment variable values
    /// before parsing; an unset variable is an error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Scan context for this configuration. Fails when a configured pattern
    /// does not compile.
    pub fn build_context(&self) -> Result<ScanContext> {
        let mut ctx = ScanContext::new()?
            .with_threshold(self.scan.threshold)
            .with_messages(Messages::with_overrides(&self.messages));
        if let Some(rules) = &self.matchers.application_errors {
            ctx = ctx.with_application_errors(rules)?;
        }
        if let Some(rules) = &self.matchers.directory_listings {
            ctx = ctx.with_directory_listings(rules)?;
        }
        for (product, version) in &self.versions {
            ctx = ctx.with_latest_version(product, version);
        }
        Ok(ctx)
    }
}

/// Replace `${VAR_NAME}` placeholders with environment variable values.
///
/// Bare `$NAME` is left alone: regex patterns in matcher rules use `$`.
/// Full-line `#` comments are copied through untouched.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|source| {
        Error::InvalidPattern {
            rule_id: "env-var".to_string(),
            source,
        }
    })?;

    let mut result = String::with_capacity(input.len());
    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            continue;
        }
        let mut last = 0;
        for cap in re.captures_iter(line) {
            let (Some(whole), Some(var)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let value = std::env::var(var.as_str())
                .map_err(|_| Error::ConfigEnvVar(var.as_str().to_string()))?;
            result.push_str(&line[last..whole.start()]);
            result.push_str(&value);
            last = whole.end();
        }
        result.push_str(&line[last..]);
    }
    Ok(result)
}
