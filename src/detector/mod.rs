//! Detector contract and registry.
//!
//! A detector is a plain function from a captured [`Exchange`] (plus the
//! shared, read-only [`ScanContext`]) to zero or more [`Alert`]s. Detectors
//! keep no state between calls, so one instance can be invoked for many
//! exchanges concurrently.
//!
//! The [`Registry`] is the lookup collection the engine dispatches over.

pub mod body_patterns;
pub mod content_type;
pub mod cookie_scope;
pub mod cors;
pub mod csp;
pub mod header_leak;
pub mod version;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alert::{Alert, AlertBuilder};
use crate::error::Result;
use crate::exchange::Exchange;
use crate::matcher::{builtin, ContentMatcher, MatchRule};
use crate::messages::Messages;

/// Failure of a single detector on a single exchange.
///
/// "No finding" is never an error; this is reserved for exchanges a detector
/// cannot make sense of.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectorError {
    #[error("inconsistent exchange: {0}")]
    InconsistentExchange(String),

    #[error("detector panicked: {0}")]
    Panicked(String),
}

pub type DetectorResult = std::result::Result<Vec<Alert>, DetectorError>;

/// Signature every detector implements.
pub type DetectorFn = fn(&Exchange, &ScanContext) -> DetectorResult;

/// A registered detector.
#[derive(Clone, Copy)]
pub struct Detector {
    /// Numeric rule identifier carried on every alert this detector emits.
    pub id: u32,
    /// Stable short key used in configuration (e.g. `"cors-wildcard"`).
    pub key: &'static str,
    pub name: &'static str,
    pub run: DetectorFn,
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish()
    }
}

/// Ordered collection of detectors.
#[derive(Debug, Clone)]
pub struct Registry {
    detectors: Vec<Detector>,
}

impl Registry {
    /// All built-in detectors.
    pub fn builtin() -> Self {
        let detectors = vec![
            Detector {
                id: content_type::RULE_ID,
                key: "content-type-missing",
                name: "Content-Type Header Missing",
                run: content_type::detect,
            },
            Detector {
                id: cors::RULE_ID,
                key: "cors-wildcard",
                name: "Cross-Domain Misconfiguration",
                run: cors::detect,
            },
            Detector {
                id: header_leak::X_POWERED_BY.rule_id,
                key: "x-powered-by",
                name: "X-Powered-By Information Leak",
                run: header_leak::detect_x_powered_by,
            },
            Detector {
                id: header_leak::X_ASPNET_VERSION.rule_id,
                key: "x-aspnet-version",
                name: "X-AspNet-Version Information Leak",
                run: header_leak::detect_x_aspnet_version,
            },
            Detector {
                id: header_leak::X_DEBUG_TOKEN.rule_id,
                key: "x-debug-token",
                name: "X-Debug-Token Information Leak",
                run: header_leak::detect_x_debug_token,
            },
            Detector {
                id: header_leak::SERVER_VERSION.rule_id,
                key: "server-version",
                name: "Server Version Information Leak",
                run: header_leak::detect_server_version,
            },
            Detector {
                id: body_patterns::APPLICATION_ERROR_ID,
                key: "application-error",
                name: "Application Error Disclosure",
                run: body_patterns::detect_application_error,
            },
            Detector {
                id: body_patterns::DIRECTORY_LISTING_ID,
                key: "directory-listing",
                name: "Directory Browsing",
                run: body_patterns::detect_directory_listing,
            },
            Detector {
                id: cookie_scope::RULE_ID,
                key: "cookie-scope",
                name: "Loosely Scoped Cookie",
                run: cookie_scope::detect,
            },
            Detector {
                id: csp::RULE_ID,
                key: "csp",
                name: "Content Security Policy",
                run: csp::detect,
            },
            Detector {
                id: version::RULE_ID,
                key: "outdated-software",
                name: "Outdated Software Version",
                run: version::detect,
            },
        ];
        Self { detectors }
    }

    /// A registry holding exactly `detectors`, in order.
    pub fn from_detectors(detectors: Vec<Detector>) -> Self {
        Self { detectors }
    }

    /// Drop detectors whose key is listed in `keys`.
    pub fn without(mut self, keys: &[String]) -> Self {
        self.detectors.retain(|d| !keys.iter().any(|k| k == d.key));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Detector> {
        self.detectors.iter().find(|d| d.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.iter()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// How eagerly detectors report borderline findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertThreshold {
    /// Report as much as possible, including non-HTML responses.
    Low,
    #[default]
    Medium,
    /// Report only clear-cut findings.
    High,
}

/// Read-only state shared by every detector invocation.
#[derive(Debug)]
pub struct ScanContext {
    /// Reference date for recency scoring.
    pub today: NaiveDate,
    pub threshold: AlertThreshold,
    pub messages: Messages,
    pub application_errors: ContentMatcher,
    pub directory_listings: ContentMatcher,
    /// Latest known release per product, keyed by lower-case product name.
    pub latest_versions: BTreeMap<String, String>,
}

impl ScanContext {
    /// Context with built-in rule sets, English messages and today's date.
    pub fn new() -> Result<Self> {
        Ok(Self {
            today: chrono::Local::now().date_naive(),
            threshold: AlertThreshold::default(),
            messages: Messages::new(),
            application_errors: ContentMatcher::load(&builtin::application_errors())?,
            directory_listings: ContentMatcher::load(&builtin::directory_listings())?,
            latest_versions: BTreeMap::new(),
        })
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_threshold(mut self, threshold: AlertThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_application_errors(mut self, rules: &[MatchRule]) -> Result<Self> {
        self.application_errors = ContentMatcher::load(rules)?;
        Ok(self)
    }

    pub fn with_directory_listings(mut self, rules: &[MatchRule]) -> Result<Self> {
        self.directory_listings = ContentMatcher::load(rules)?;
        Ok(self)
    }

    pub fn with_latest_version(mut self, product: &str, version: &str) -> Self {
        self.latest_versions
            .insert(product.to_ascii_lowercase(), version.to_string());
        self
    }

    /// Alert pre-filled with the `{prefix}.name/.desc/.soln` messages and
    /// the request URI.
    pub fn alert(&self, rule_id: u32, prefix: &str, exchange: &Exchange) -> AlertBuilder {
        Alert::builder(rule_id, self.messages.get(&format!("{prefix}.name")))
            .description(self.messages.get(&format!("{prefix}.desc")))
            .solution(self.messages.get(&format!("{prefix}.soln")))
            .uri(exchange.request.uri.clone())
    }
}
