//! Alert sinks.
//!
//! The engine hands every emitted [`Alert`] to an [`AlertSink`]; what happens
//! next (storage, display, forwarding) is up to the sink.

use std::io::Write;
use std::sync::Mutex;

use crate::alert::Alert;
use crate::error::{Error, Result};

/// Receiver for emitted alerts. Must tolerate concurrent `push` calls.
pub trait AlertSink: Send + Sync {
    fn push(&self, alert: &Alert) -> Result<()>;
}

/// Collects alerts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    alerts: Mutex<Vec<Alert>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything pushed so far, in push order.
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .map(|alerts| alerts.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().map(|alerts| alerts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlertSink for MemorySink {
    fn push(&self, alert: &Alert) -> Result<()> {
        self.alerts
            .lock()
            .map_err(|e| Error::Sink(e.to_string()))?
            .push(alert.clone());
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Sink(e.to_string()))
    }
}

impl<W: Write + Send> AlertSink for JsonLinesSink<W> {
    fn push(&self, alert: &Alert) -> Result<()> {
        let line = serde_json::to_string(alert)?;
        let mut writer = self.writer.lock().map_err(|e| Error::Sink(e.to_string()))?;
        writeln!(writer, "{line}")?;
        Ok(())
    }
}
