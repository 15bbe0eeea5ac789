//! Detector dispatch.
//!
//! The [`Engine`] owns a [`Registry`] and the shared [`ScanContext`] and runs
//! every registered detector over each exchange. A detector that fails or
//! panics is recorded in the [`ScanReport`] and the remaining detectors
//! still run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::alert::Alert;
use crate::config::AppConfig;
use crate::detector::{Detector, DetectorError, Registry, ScanContext};
use crate::error::Result;
use crate::exchange::Exchange;
use crate::sink::AlertSink;

/// A detector that could not finish on one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorFailure {
    pub key: &'static str,
    pub rule_id: u32,
    pub error: DetectorError,
}

/// Outcome of scanning one exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Alerts in registry order, then in the order each detector emitted them.
    pub alerts: Vec<Alert>,
    pub failures: Vec<DetectorFailure>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.alerts.is_empty() && self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct Engine {
    registry: Registry,
    ctx: ScanContext,
}

impl Engine {
    /// Engine with every built-in detector and the default context.
    pub fn new() -> Result<Self> {
        Ok(Self::with_parts(Registry::builtin(), ScanContext::new()?))
    }

    pub fn with_parts(registry: Registry, ctx: ScanContext) -> Self {
        info!(
            detectors = registry.len(),
            threshold = ?ctx.threshold,
            "detection engine ready"
        );
        Self { registry, ctx }
    }

    /// Engine built from configuration: disabled detectors are dropped and
    /// configured rule sets, versions and messages replace the defaults.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = Registry::builtin().without(&config.scan.disabled);
        let ctx = config.build_context()?;
        Ok(Self::with_parts(registry, ctx))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn context(&self) -> &ScanContext {
        &self.ctx
    }

    /// Run every detector over `exchange`.
    pub fn scan(&self, exchange: &Exchange) -> ScanReport {
        let mut report = ScanReport::default();
        for detector in self.registry.iter() {
            let start = Instant::now();
            match self.run_one(detector, exchange) {
                Ok(alerts) => {
                    debug!(
                        detector = detector.key,
                        alerts = alerts.len(),
                        elapsed_us = start.elapsed().as_micros() as u64,
                        "detector finished"
                    );
                    report.alerts.extend(alerts);
                }
                Err(error) => {
                    warn!(
                        detector = detector.key,
                        uri = %exchange.request.uri,
                        %error,
                        "detector failed"
                    );
                    report.failures.push(DetectorFailure {
                        key: detector.key,
                        rule_id: detector.id,
                        error,
                    });
                }
            }
        }
        report
    }

    /// Scan independent exchanges in parallel. Reports come back in input
    /// order.
    pub fn scan_batch(&self, exchanges: &[Exchange]) -> Vec<ScanReport> {
        exchanges.par_iter().map(|ex| self.scan(ex)).collect()
    }

    /// Scan `exchange` and push every alert to `sink`.
    ///
    /// Stops at the first sink error; detector failures are returned in the
    /// report as usual.
    pub fn scan_into(&self, exchange: &Exchange, sink: &dyn AlertSink) -> Result<ScanReport> {
        let report = self.scan(exchange);
        for alert in &report.alerts {
            sink.push(alert)?;
        }
        Ok(report)
    }

    fn run_one(
        &self,
        detector: &Detector,
        exchange: &Exchange,
    ) -> std::result::Result<Vec<Alert>, DetectorError> {
        match catch_unwind(AssertUnwindSafe(|| (detector.run)(exchange, &self.ctx))) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(DetectorError::Panicked(message))
            }
        }
    }
}
