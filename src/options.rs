//! Pipeline configuration.

use std::fmt;
use std::sync::Arc;

use crate::observability::{PipelineObserver, PipelineSeverity};

/// Dialect shared by the source reader and the output writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    /// Field delimiter (default `,`).
    pub delimiter: u8,
    /// Quote character (default `"`).
    pub quote: u8,
    /// Trim surrounding whitespace from every field read.
    pub trim: bool,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            trim: false,
        }
    }
}

/// Options controlling how a [`crate::RowPipeline`] reads its input and reports events.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Rows to discard before the header row.
    pub skip_rows: usize,
    /// CSV dialect for reading and writing.
    pub format: CsvFormat,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: PipelineSeverity,
}

impl PipelineOptions {
    /// Default options that skip `skip_rows` leading rows.
    pub fn skipping(skip_rows: usize) -> Self {
        Self {
            skip_rows,
            ..Default::default()
        }
    }
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("skip_rows", &self.skip_rows)
            .field("format", &self.format)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            skip_rows: 0,
            format: CsvFormat::default(),
            observer: None,
            alert_at_or_above: PipelineSeverity::Critical,
        }
    }
}
