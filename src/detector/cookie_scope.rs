//! Loosely scoped cookies.
//!
//! A cookie whose `Domain` attribute names a parent of the request host is
//! sent to every sibling subdomain as well. Labels are compared right to left
//! (top-level domain first); the cookie is loose when its domain has strictly
//! fewer labels than the host and all of them line up with the host's
//! right-most labels.

use crate::alert::{Confidence, Risk};
use crate::exchange::Exchange;

use super::{DetectorResult, ScanContext};

pub const RULE_ID: u32 = 90033;

/// Attributes of one `Set-Cookie` value relevant to scoping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub name: String,
    /// `Domain` attribute value; `None` when absent or empty.
    pub domain: Option<String>,
}

impl CookieAttributes {
    /// Parse a `Set-Cookie` header value. The last `Domain` attribute wins.
    pub fn parse(set_cookie: &str) -> Self {
        let mut parts = set_cookie.split(';');
        let name = parts
            .next()
            .and_then(|pair| pair.split_once('=').map(|(n, _)| n))
            .unwrap_or("")
            .trim()
            .to_string();

        let mut domain = None;
        for attr in parts {
            let (key, value) = attr.split_once('=').unwrap_or((attr, ""));
            if key.trim().eq_ignore_ascii_case("domain") {
                let value = value.trim();
                domain = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
        }
        Self { name, domain }
    }
}

/// Whether `cookie_domain` is scoped more broadly than `host`.
///
/// Comparison is case-insensitive and ignores one leading `.` on either
/// side. Bare top-level domains and dotless hosts are compared with whatever
/// labels they have.
pub fn is_loosely_scoped(host: &str, cookie_domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = cookie_domain.to_ascii_lowercase();
    let host = host.strip_prefix('.').unwrap_or(&host);
    let domain = domain.strip_prefix('.').unwrap_or(&domain);

    if domain.is_empty() || host == domain {
        return false;
    }

    let host_labels: Vec<&str> = host.split('.').collect();
    let cookie_labels: Vec<&str> = domain.split('.').collect();
    if cookie_labels.len() >= host_labels.len() {
        return false;
    }

    cookie_labels
        .iter()
        .rev()
        .zip(host_labels.iter().rev())
        .all(|(c, h)| c == h)
}

/// One alert listing every loosely scoped cookie in the response.
pub fn detect(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    let Some(host) = exchange.host() else {
        return Ok(Vec::new());
    };

    let loose: Vec<&str> = exchange
        .response_headers()
        .get_all("Set-Cookie")
        .map(|h| h.value.as_str())
        .filter(|value| {
            CookieAttributes::parse(value)
                .domain
                .is_some_and(|domain| is_loosely_scoped(&host, &domain))
        })
        .collect();

    let Some(first) = loose.first() else {
        return Ok(Vec::new());
    };

    let other_info = ctx
        .messages
        .format("cookie_scope.otherinfo", &[&host, &loose.join("\n")]);
    Ok(vec![ctx
        .alert(RULE_ID, "cookie_scope", exchange)
        .risk(Risk::Info)
        .confidence(Confidence::Low)
        .evidence(*first)
        .other_info(other_info)
        .param("Set-Cookie")
        .cwe(565)
        .wasc(15)
        .build()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::testutil::context;

    #[test]
    fn parses_name_and_domain() {
        let attrs = CookieAttributes::parse("sid=abc; Path=/; DOMAIN=.Example.com; HttpOnly");
        assert_eq!(attrs.name, "sid");
        assert_eq!(attrs.domain.as_deref(), Some(".Example.com"));
    }

    #[test]
    fn empty_domain_attribute_is_absent() {
        assert_eq!(CookieAttributes::parse("sid=abc; domain=").domain, None);
        assert_eq!(CookieAttributes::parse("sid=abc; Secure").domain, None);
    }

    #[test]
    fn parent_domain_is_loose() {
        assert!(is_loosely_scoped("test.example.com", "example.com"));
        assert!(is_loosely_scoped("test.example.com", ".example.com"));
    }

    #[test]
    fn exact_host_is_not_loose() {
        assert!(!is_loosely_scoped("test.example.com", "test.example.com"));
        assert!(!is_loosely_scoped("TesT.org", "tEst.org"));
        assert!(!is_loosely_scoped(".example.com", "example.com"));
    }

    #[test]
    fn narrower_cookie_is_not_loose() {
        assert!(!is_loosely_scoped("example.com", "stage.example.com"));
    }

    #[test]
    fn unrelated_domain_is_not_loose() {
        assert!(!is_loosely_scoped("test.example.com", "example.org"));
        assert!(!is_loosely_scoped("a.b.example.com", "c.example.com"));
    }

    #[test]
    fn bare_labels_do_not_panic() {
        // Single-label cookie domain against a two-label host.
        let _ = is_loosely_scoped("example.com", "com");
        assert!(!is_loosely_scoped("intranet", "intranet"));
        assert!(!is_loosely_scoped("intranet", "corp.intranet"));
        assert!(!is_loosely_scoped("intranet", "com"));
        assert!(!is_loosely_scoped("", "."));
    }

    #[test]
    fn detect_alerts_on_parent_domain_cookie() {
        let ex = Exchange::new("GET", "https://test.example.com/login")
            .with_response_header("Set-Cookie", "sid=1; domain=example.com; Path=/")
            .with_response_header("Set-Cookie", "pref=2; domain=test.example.com")
            .with_response_header("Set-Cookie", "track=3; domain=.example.com");
        let alerts = detect(&ex, &context()).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].evidence, "sid=1; domain=example.com; Path=/");
        assert!(alerts[0].other_info.contains("test.example.com"));
        assert!(alerts[0].other_info.contains("track=3; domain=.example.com"));
        assert!(!alerts[0].other_info.contains("pref=2"));
        assert_eq!(alerts[0].risk, Risk::Info);
    }

    #[test]
    fn detect_ignores_host_only_cookies() {
        let ex = Exchange::new("GET", "https://test.example.com/")
            .with_response_header("Set-Cookie", "sid=1; Path=/; Secure");
        assert!(detect(&ex, &context()).unwrap().is_empty());
    }

    #[test]
    fn detect_without_host_is_no_finding() {
        let ex = Exchange::new("GET", "/relative")
            .with_response_header("Set-Cookie", "sid=1; domain=example.com");
        assert!(detect(&ex, &context()).unwrap().is_empty());
    }

    #[test]
    fn detect_bare_tld_cookie_does_not_panic() {
        let ex = Exchange::new("GET", "https://example.com/")
            .with_response_header("Set-Cookie", "sid=1; domain=com");
        assert!(detect(&ex, &context()).is_ok());
    }
}
