use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::client::CallOutcome;

/// Append-only record of every call made during a run, one block per call.
pub struct ResponseLog {
    file: File,
}

impl ResponseLog {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create response log at {}", path.display()))?;
        Ok(Self { file })
    }

    /// Writes one block for the call and echoes a progress line to stdout.
    pub fn record(&mut self, method: &str, endpoint: &str, outcome: &CallOutcome) -> Result<()> {
        let pretty = serde_json::to_string_pretty(&outcome.body)
            .context("Failed to format response body")?;

        writeln!(self.file, "Endpoint: {} {}", method, endpoint)?;
        writeln!(self.file, "Status: {}", outcome.status)?;
        writeln!(self.file, "Response: {}", pretty)?;
        writeln!(self.file, "{}", "-".repeat(50))?;

        println!("Tested {} {}: {}", method, endpoint, outcome.status);
        Ok(())
    }
}
