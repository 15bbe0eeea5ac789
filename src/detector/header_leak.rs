//! Information-leaking response headers.
//!
//! Each check covers a family of header names. All response headers are
//! scanned in wire order; the first occurrence of any family member becomes
//! the evidence (rendered `Name: value` with its original case) and every
//! later occurrence is listed, one per line, in `other_info`. A check emits
//! at most one alert per exchange.

use crate::alert::{Confidence, Risk};
use crate::exchange::{Exchange, Header};

use super::{DetectorResult, ScanContext};

/// Static description of one header-leak check.
#[derive(Debug, Clone, Copy)]
pub struct LeakCheck {
    pub rule_id: u32,
    /// Message key prefix.
    pub prefix: &'static str,
    pub headers: &'static [&'static str],
    pub risk: Risk,
    pub confidence: Confidence,
    pub cwe_id: u32,
    pub wasc_id: u32,
    /// Extra condition on the header value; `None` accepts every value.
    pub value_filter: Option<fn(&str) -> bool>,
}

pub const X_POWERED_BY: LeakCheck = LeakCheck {
    rule_id: 10037,
    prefix: "x_powered_by",
    headers: &["X-Powered-By"],
    risk: Risk::Low,
    confidence: Confidence::Medium,
    cwe_id: 200,
    wasc_id: 13,
    value_filter: None,
};

pub const X_ASPNET_VERSION: LeakCheck = LeakCheck {
    rule_id: 10061,
    prefix: "x_aspnet_version",
    headers: &["X-AspNet-Version", "X-AspNetMvc-Version"],
    risk: Risk::Low,
    confidence: Confidence::High,
    cwe_id: 933,
    wasc_id: 14,
    value_filter: None,
};

pub const X_DEBUG_TOKEN: LeakCheck = LeakCheck {
    rule_id: 10056,
    prefix: "x_debug_token",
    headers: &["X-Debug-Token", "X-Debug-Token-Link"],
    risk: Risk::Low,
    confidence: Confidence::Medium,
    cwe_id: 200,
    wasc_id: 13,
    value_filter: None,
};

pub const SERVER_VERSION: LeakCheck = LeakCheck {
    rule_id: 10036,
    prefix: "server_version",
    headers: &["Server"],
    risk: Risk::Low,
    confidence: Confidence::High,
    cwe_id: 200,
    wasc_id: 13,
    value_filter: Some(has_version_digit),
};

fn has_version_digit(value: &str) -> bool {
    value.bytes().any(|b| b.is_ascii_digit())
}

pub fn detect_x_powered_by(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    run(&X_POWERED_BY, exchange, ctx)
}

pub fn detect_x_aspnet_version(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    run(&X_ASPNET_VERSION, exchange, ctx)
}

pub fn detect_x_debug_token(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    run(&X_DEBUG_TOKEN, exchange, ctx)
}

pub fn detect_server_version(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    run(&SERVER_VERSION, exchange, ctx)
}

/// Every matching occurrence in wire order.
pub fn occurrences<'a>(exchange: &'a Exchange, check: &LeakCheck) -> Vec<&'a Header> {
    exchange
        .response_headers()
        .iter()
        .filter(|h| check.headers.iter().any(|n| h.name.eq_ignore_ascii_case(n)))
        .filter(|h| check.value_filter.map_or(true, |accept| accept(&h.value)))
        .collect()
}

/// Run `check` against `exchange`.
pub fn run(check: &LeakCheck, exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    let found = occurrences(exchange, check);
    let Some((first, rest)) = found.split_first() else {
        return Ok(Vec::new());
    };

    let other_info = rest
        .iter()
        .map(|h| h.render())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(vec![ctx
        .alert(check.rule_id, check.prefix, exchange)
        .risk(check.risk)
        .confidence(check.confidence)
        .evidence(first.render())
        .other_info(other_info)
        .param(first.name.clone())
        .cwe(check.cwe_id)
        .wasc(check.wasc_id)
        .build()])
}
