//! JSON output adapter.

use anyhow::Result;
use selfie_gate_core::{PhotoReport, ReportOutput};
use std::io::{self, Write};
use std::sync::Mutex;

/// JSON output adapter.
///
/// Writes one report per line by default. In array mode reports are
/// collected and written as a single JSON array on flush.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    pending: Option<Mutex<Vec<PhotoReport>>>,
    pretty: bool,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            pending: None,
            pretty: false,
        }
    }

    /// Switches to array mode; each flush writes the reports collected since
    /// the previous one.
    #[must_use]
    pub fn into_array(mut self, pretty: bool) -> Self {
        self.pending = Some(Mutex::new(Vec::new()));
        self.pretty = pretty;
        self
    }

    #[allow(clippy::significant_drop_tightening)]
    fn write_line(&self, json: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

impl ReportOutput for JsonOutput {
    fn write(&self, report: &PhotoReport) -> Result<()> {
        if let Some(pending) = &self.pending {
            pending
                .lock()
                .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?
                .push(report.clone());
            return Ok(());
        }
        self.write_line(&serde_json::to_string(report)?)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        if let Some(pending) = &self.pending {
            let reports = std::mem::take(
                &mut *pending
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?,
            );
            let json = if self.pretty {
                serde_json::to_string_pretty(&reports)?
            } else {
                serde_json::to_string(&reports)?
            };
            self.write_line(&json)?;
        }

        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}
