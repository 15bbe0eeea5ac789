//! Missing or empty `Content-Type` on responses with a body.

use crate::alert::{Confidence, Risk};
use crate::exchange::Exchange;

use super::{DetectorResult, ScanContext};

pub const RULE_ID: u32 = 10019;

pub fn detect(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    if exchange.body.is_empty() {
        return Ok(Vec::new());
    }
    let Some(headers) = exchange.response_headers.as_ref() else {
        return Ok(Vec::new());
    };

    let mut found = false;
    let mut alerts = Vec::new();
    for header in headers.get_all("Content-Type") {
        found = true;
        if header.value.trim().is_empty() {
            alerts.push(
                ctx.alert(RULE_ID, "content_type", exchange)
                    .name(ctx.messages.get("content_type.name.empty"))
                    .risk(Risk::Info)
                    .confidence(Confidence::Medium)
                    .param(header.name.clone())
                    .cwe(345)
                    .wasc(12)
                    .build(),
            );
        }
    }

    if !found {
        alerts.push(
            ctx.alert(RULE_ID, "content_type", exchange)
                .risk(Risk::Info)
                .confidence(Confidence::Medium)
                .param("Content-Type")
                .cwe(345)
                .wasc(12)
                .build(),
        );
    }
    Ok(alerts)
}
