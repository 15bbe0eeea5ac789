//! Body signature detectors backed by a [`ContentMatcher`].
//!
//! [`ContentMatcher`]: crate::matcher::ContentMatcher

use crate::alert::{Confidence, Risk};
use crate::exchange::Exchange;

use super::{AlertThreshold, DetectorResult, ScanContext};

pub const APPLICATION_ERROR_ID: u32 = 90022;
pub const DIRECTORY_LISTING_ID: u32 = 10033;

/// Application error signatures in the body, or a bare `500` status.
///
/// `404` responses are skipped: error pages for missing resources are
/// expected to mention errors.
pub fn detect_application_error(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    if exchange.status == 404 {
        return Ok(Vec::new());
    }

    if exchange.status == 500 && ctx.threshold != AlertThreshold::High {
        return Ok(vec![ctx
            .alert(APPLICATION_ERROR_ID, "application_error", exchange)
            .risk(Risk::Low)
            .confidence(Confidence::Medium)
            .evidence(format!("{} {}", exchange.request.protocol, exchange.status))
            .cwe(200)
            .wasc(13)
            .build()]);
    }

    let Some(found) = ctx.application_errors.find(&exchange.body) else {
        return Ok(Vec::new());
    };
    Ok(vec![ctx
        .alert(APPLICATION_ERROR_ID, "application_error", exchange)
        .risk(Risk::Medium)
        .confidence(Confidence::Medium)
        .evidence(found.matched_text)
        .other_info(
            ctx.messages
                .format("application_error.otherinfo", &[&found.rule_id]),
        )
        .cwe(200)
        .wasc(13)
        .build()])
}

/// Directory listing signatures in the body.
pub fn detect_directory_listing(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    let Some(found) = ctx.directory_listings.find(&exchange.body) else {
        return Ok(Vec::new());
    };
    Ok(vec![ctx
        .alert(DIRECTORY_LISTING_ID, "directory_listing", exchange)
        .risk(Risk::Medium)
        .confidence(Confidence::Medium)
        .evidence(found.matched_text)
        .other_info(
            ctx.messages
                .format("directory_listing.otherinfo", &[&found.rule_id]),
        )
        .cwe(548)
        .wasc(48)
        .build()])
}
