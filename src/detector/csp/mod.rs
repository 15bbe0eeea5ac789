//! Content Security Policy analysis.
//!
//! Each `Content-Security-Policy` value is parsed and analysed on its own.
//! One value yields alerts for parse notices, permissive or missing
//! directives, and `'unsafe-inline'` or `'unsafe-hashes'` for scripts and
//! styles. A value holding non-ASCII characters is rejected by browsers, so
//! it gets a single malformed-policy alert and nothing else. Deprecated
//! `X-Content-Security-Policy` and `X-WebKit-CSP` headers get an alert of
//! their own.

pub mod parser;

use tracing::debug;

use crate::alert::{Alert, AlertBuilder, Confidence, Risk};
use crate::exchange::{Exchange, Header};

use self::parser::{Notice, Policy, Severity};
use super::{AlertThreshold, DetectorResult, ScanContext};

pub const RULE_ID: u32 = 10055;

const CSP_HEADER: &str = "Content-Security-Policy";
const LEGACY_HEADERS: &[(&str, &str)] = &[
    ("X-Content-Security-Policy", "csp.xcsp"),
    ("X-WebKit-CSP", "csp.xwkcsp"),
];

/// Directives checked for permissiveness, in report order.
pub const CHECKED_DIRECTIVES: &[&str] = &[
    "script-src",
    "style-src",
    "img-src",
    "connect-src",
    "frame-src",
    "frame-ancestors",
    "font-src",
    "media-src",
    "object-src",
    "manifest-src",
    "worker-src",
    "prefetch-src",
    "form-action",
];

/// Directives that never fall back to `default-src`.
pub const DIRECTIVES_WITHOUT_FALLBACK: &[&str] = &["frame-ancestors", "form-action"];

const PERMISSIVE_SOURCES: &[&str] = &["*", "http:", "https:", "http://*", "https://*"];

pub fn detect(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    if !exchange.is_html() && ctx.threshold != AlertThreshold::Low {
        return Ok(Vec::new());
    }

    let headers = exchange.response_headers();
    let policies: Vec<&Header> = headers.get_all(CSP_HEADER).collect();
    let mut alerts = Vec::new();

    for (name, prefix) in LEGACY_HEADERS {
        if let Some(legacy) = headers.get_all(name).next() {
            let risk = if policies.is_empty() { Risk::Low } else { Risk::Info };
            alerts.push(
                csp_alert(ctx, exchange, legacy, prefix)
                    .description(ctx.messages.get(&format!("{prefix}.desc")))
                    .risk(risk)
                    .build(),
            );
        }
    }

    for header in policies {
        alerts.extend(analyze(ctx, exchange, header));
    }
    Ok(alerts)
}

/// Alerts for one `Content-Security-Policy` header.
fn analyze(ctx: &ScanContext, exchange: &Exchange, header: &Header) -> Vec<Alert> {
    let invalid = non_ascii_chars(&header.value);
    if !invalid.is_empty() {
        debug!(characters = %invalid, "content security policy is not ASCII");
        return vec![csp_alert(ctx, exchange, header, "csp.malformed")
            .risk(Risk::Medium)
            .other_info(ctx.messages.format("csp.malformed.otherinfo", &[&invalid]))
            .build()];
    }

    let (policy, notices) = parser::parse(header.value.trim());
    debug!(
        directives = policy.directives().len(),
        notices = notices.len(),
        "parsed content security policy"
    );
    let mut alerts = Vec::new();

    if !notices.is_empty() {
        let risk = if notices.iter().any(|n| n.severity != Severity::Info) {
            Risk::Low
        } else {
            Risk::Info
        };
        alerts.push(
            csp_alert(ctx, exchange, header, "csp.notices")
                .risk(risk)
                .other_info(notices_text(ctx, &notices))
                .build(),
        );
    }

    let permissive = permissive_directives(&policy);
    if !permissive.is_empty() {
        let mut text = ctx
            .messages
            .format("csp.wildcard.desc", &[&permissive.join(", ")]);
        let without_fallback: Vec<&str> = permissive
            .iter()
            .copied()
            .filter(|d| DIRECTIVES_WITHOUT_FALLBACK.contains(d))
            .collect();
        if !without_fallback.is_empty() {
            text.push_str(
                &ctx.messages
                    .format("csp.wildcard.extended", &[&without_fallback.join(", ")]),
            );
        }
        alerts.push(
            csp_alert(ctx, exchange, header, "csp.wildcard")
                .risk(Risk::Medium)
                .other_info(text)
                .build(),
        );
    }

    if allows_unsafe_inline(&policy, "script-src") {
        alerts.push(
            csp_alert(ctx, exchange, header, "csp.scriptsrc.unsafe")
                .description(ctx.messages.get("csp.scriptsrc.unsafe.desc"))
                .risk(Risk::Medium)
                .build(),
        );
    }
    if allows_unsafe_inline(&policy, "style-src") {
        alerts.push(
            csp_alert(ctx, exchange, header, "csp.stylesrc.unsafe")
                .description(ctx.messages.get("csp.stylesrc.unsafe.desc"))
                .risk(Risk::Medium)
                .build(),
        );
    }

    for (directive, prefix) in [
        ("script-src", "csp.scriptsrc.hashes"),
        ("style-src", "csp.stylesrc.hashes"),
    ] {
        if allows_unsafe_hashes(&policy, directive) {
            alerts.push(
                csp_alert(ctx, exchange, header, prefix)
                    .description(ctx.messages.get(&format!("{prefix}.desc")))
                    .risk(Risk::Medium)
                    .build(),
            );
        }
    }
    alerts
}

/// Distinct non-ASCII characters of `value`, in order of appearance.
fn non_ascii_chars(value: &str) -> String {
    let mut found = String::new();
    for c in value.chars().filter(|c| !c.is_ascii()) {
        if !found.contains(c) {
            found.push(c);
        }
    }
    found
}

/// Checked directives that are missing or allow any origin once fallbacks
/// are applied.
pub fn permissive_directives(policy: &Policy) -> Vec<&'static str> {
    CHECKED_DIRECTIVES
        .iter()
        .copied()
        .filter(|name| match policy.resolve(name) {
            None => true,
            Some(d) => PERMISSIVE_SOURCES.iter().any(|s| d.has(s)),
        })
        .collect()
}

/// Whether inline code of the given kind is allowed. A nonce, hash or
/// `'strict-dynamic'` disables `'unsafe-inline'` in browsers.
pub fn allows_unsafe_inline(policy: &Policy, directive: &str) -> bool {
    let Some(resolved) = policy.resolve(directive) else {
        return true;
    };
    resolved.has("'unsafe-inline'")
        && !resolved.values.iter().any(|v| {
            let v = v.to_ascii_lowercase();
            v == "'strict-dynamic'"
                || ["'nonce-", "'sha256-", "'sha384-", "'sha512-"]
                    .iter()
                    .any(|p| v.starts_with(p))
        })
}

/// Whether the resolved directive enables `'unsafe-hashes'`.
pub fn allows_unsafe_hashes(policy: &Policy, directive: &str) -> bool {
    policy
        .resolve(directive)
        .is_some_and(|d| d.has("'unsafe-hashes'"))
}

fn notices_text(ctx: &ScanContext, notices: &[Notice]) -> String {
    let mut text = String::new();
    for (severity, key) in [
        (Severity::Error, "csp.notices.errors"),
        (Severity::Warning, "csp.notices.warnings"),
        (Severity::Info, "csp.notices.infoitems"),
    ] {
        let mut section = notices.iter().filter(|n| n.severity == severity).peekable();
        if section.peek().is_none() {
            continue;
        }
        text.push_str(ctx.messages.get(key));
        text.push('\n');
        for notice in section {
            text.push_str(&notice.to_string());
            text.push('\n');
        }
    }
    text
}

/// `CSP: <sub-name>` alert carrying the header value as evidence.
fn csp_alert(
    ctx: &ScanContext,
    exchange: &Exchange,
    header: &Header,
    prefix: &str,
) -> AlertBuilder {
    let name = format!(
        "{}: {}",
        ctx.messages.get("csp.name"),
        ctx.messages.get(&format!("{prefix}.name"))
    );
    Alert::builder(RULE_ID, name)
        .confidence(Confidence::Medium)
        .description(ctx.messages.get("csp.desc"))
        .solution(ctx.messages.get("csp.soln"))
        .uri(exchange.request.uri.clone())
        .evidence(header.value.trim())
        .param(header.name.clone())
        .cwe(693)
        .wasc(15)
}
