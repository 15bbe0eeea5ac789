//! Wildcard `Access-Control-Allow-Origin`.

use crate::alert::{Confidence, Risk};
use crate::exchange::Exchange;

use super::{DetectorResult, ScanContext};

pub const RULE_ID: u32 = 10098;

const ACAO: &str = "Access-Control-Allow-Origin";

/// One alert per wildcard `Access-Control-Allow-Origin` occurrence.
pub fn detect(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    let alerts = exchange
        .response_headers()
        .get_all(ACAO)
        .filter(|h| h.value.trim() == "*")
        .map(|h| {
            ctx.alert(RULE_ID, "cors", exchange)
                .risk(Risk::Medium)
                .confidence(Confidence::Medium)
                .evidence(h.render())
                .other_info(ctx.messages.get("cors.otherinfo"))
                .param(h.name.clone())
                .cwe(264)
                .wasc(14)
                .build()
        })
        .collect();
    Ok(alerts)
}
