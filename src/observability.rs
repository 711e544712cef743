//! Observer hooks for pipeline runs.
//!
//! Attach an observer via [`crate::PipelineOptions::observer`] to record metrics, log rows or
//! raise alerts. Failures are classified by [`PipelineSeverity`]; observers get `on_alert` when the
//! severity meets [`crate::PipelineOptions::alert_at_or_above`].

use std::fmt;
use std::sync::Arc;

use crate::error::PipelineError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (a row or registration failed).
    Error,
    /// Critical error (I/O or malformed CSV).
    Critical,
}

impl PipelineSeverity {
    /// Classify an error.
    pub fn of(error: &PipelineError) -> Self {
        match error {
            PipelineError::Io(_) | PipelineError::Csv(_) => PipelineSeverity::Critical,
            _ => PipelineSeverity::Error,
        }
    }
}

/// Describes the pipeline an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineContext {
    /// Input path, or `<reader>` for in-memory sources.
    pub source: String,
}

/// Counters reported when the input is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    /// Input line of the last consumed record (skipped lines, header and blank lines included).
    pub rows_read: usize,
    /// Rows successfully returned by pulls.
    pub rows_emitted: usize,
}

/// Observer interface for pipeline runs.
pub trait PipelineObserver: Send + Sync {
    /// Called after a row passed all stages.
    fn on_row_emitted(&self, _ctx: &PipelineContext, _row_number: usize) {}

    /// Called when a pull or write fails.
    fn on_failure(&self, _ctx: &PipelineContext, _severity: PipelineSeverity, _error: &PipelineError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called once when the source is exhausted.
    fn on_finished(&self, _ctx: &PipelineContext, _stats: PipelineStats) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_row_emitted(&self, ctx: &PipelineContext, row_number: usize) {
        for o in &self.observers {
            o.on_row_emitted(ctx, row_number);
        }
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_finished(&self, ctx: &PipelineContext, stats: PipelineStats) {
        for o in &self.observers {
            o.on_finished(ctx, stats);
        }
    }
}

/// Logs failures and completion to stderr. Rows are not logged.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl PipelineObserver for StdErrObserver {
    fn on_failure(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        eprintln!("[pipeline][{severity:?}] source={} err={error}", ctx.source);
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        eprintln!("[ALERT][pipeline][{severity:?}] source={} err={error}", ctx.source);
    }

    fn on_finished(&self, ctx: &PipelineContext, stats: PipelineStats) {
        eprintln!(
            "[pipeline][ok] source={} rows_read={} rows_emitted={}",
            ctx.source, stats.rows_read, stats.rows_emitted
        );
    }
}

/// Forwards events to `tracing`.
///
/// Rows are logged at `trace`, failures at `error` (alerts at `warn` with `alert = true`, since
/// `on_failure` is also called), and completion at `info`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_row_emitted(&self, ctx: &PipelineContext, row_number: usize) {
        tracing::trace!(source = %ctx.source, row = row_number, "row emitted");
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        tracing::error!(
            source = %ctx.source,
            severity = ?severity,
            row = ?error.row(),
            error = %error,
            "pipeline failure"
        );
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        tracing::warn!(
            source = %ctx.source,
            severity = ?severity,
            alert = true,
            error = %error,
            "pipeline alert"
        );
    }

    fn on_finished(&self, ctx: &PipelineContext, stats: PipelineStats) {
        tracing::info!(
            source = %ctx.source,
            rows_read = stats.rows_read,
            rows_emitted = stats.rows_emitted,
            "pipeline finished"
        );
    }
}
