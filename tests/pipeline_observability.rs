use std::sync::{Arc, Mutex};

use csv_transform::{
    CompositeObserver, PipelineContext, PipelineError, PipelineObserver, PipelineOptions, PipelineSeverity,
    PipelineStats, Predicate, RowPipeline, TracingObserver,
};

#[derive(Default)]
struct RecordingObserver {
    rows: Mutex<Vec<usize>>,
    failures: Mutex<Vec<PipelineSeverity>>,
    alerts: Mutex<Vec<PipelineSeverity>>,
    finished: Mutex<Option<PipelineStats>>,
}

impl PipelineObserver for RecordingObserver {
    fn on_row_emitted(&self, _ctx: &PipelineContext, row_number: usize) {
        self.rows.lock().unwrap().push(row_number);
    }

    fn on_failure(&self, _ctx: &PipelineContext, severity: PipelineSeverity, _error: &PipelineError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &PipelineContext, severity: PipelineSeverity, _error: &PipelineError) {
        self.alerts.lock().unwrap().push(severity);
    }

    fn on_finished(&self, _ctx: &PipelineContext, stats: PipelineStats) {
        *self.finished.lock().unwrap() = Some(stats);
    }
}

fn options_with(obs: Arc<RecordingObserver>, skip_rows: usize) -> PipelineOptions {
    PipelineOptions {
        skip_rows,
        observer: Some(obs),
        alert_at_or_above: PipelineSeverity::Critical,
        ..Default::default()
    }
}

#[test]
fn observer_sees_rows_and_completion() {
    let obs = Arc::new(RecordingObserver::default());
    let mut p = RowPipeline::open_with_options("tests/fixtures/people.csv", &options_with(obs.clone(), 0)).unwrap();
    while p.next_row().unwrap().is_some() {}
    // Pulling again after the end does not report completion twice.
    assert!(p.next_row().unwrap().is_none());

    assert_eq!(*obs.rows.lock().unwrap(), vec![2, 3]);
    assert_eq!(
        *obs.finished.lock().unwrap(),
        Some(PipelineStats {
            rows_read: 3,
            rows_emitted: 2
        })
    );
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let _ = RowPipeline::open_with_options("tests/fixtures/does_not_exist.csv", &options_with(obs.clone(), 0))
        .unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![PipelineSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![PipelineSeverity::Critical]);
}

#[test]
fn constraint_failure_is_error_severity_without_alert() {
    let obs = Arc::new(RecordingObserver::default());
    let mut p = RowPipeline::open_with_options(
        "tests/fixtures/report_with_preamble.csv",
        &options_with(obs.clone(), 2),
    )
    .unwrap();
    p.constraint(Predicate::named("not_empty", |v| v.is_truthy()), "name")
        .unwrap();
    let _ = p.collect::<Result<Vec<_>, _>>().unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![PipelineSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
    assert_eq!(*obs.rows.lock().unwrap(), vec![4]);
}

#[test]
fn composite_observer_fans_out() {
    let a = Arc::new(RecordingObserver::default());
    let b = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn PipelineObserver>> = vec![
        a.clone() as Arc<dyn PipelineObserver>,
        b.clone() as Arc<dyn PipelineObserver>,
        Arc::new(TracingObserver) as Arc<dyn PipelineObserver>,
    ];
    let composite = CompositeObserver::new(observers);
    let opts = PipelineOptions {
        observer: Some(Arc::new(composite)),
        ..Default::default()
    };
    let p = RowPipeline::open_with_options("tests/fixtures/people.csv", &opts).unwrap();
    assert_eq!(p.count(), 2);

    assert_eq!(a.rows.lock().unwrap().len(), 2);
    assert_eq!(b.rows.lock().unwrap().len(), 2);
}

#[derive(Debug)]
struct BrokenPipe;

impl std::io::Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    }
}

#[test]
fn sink_write_failure_is_reported_as_critical() {
    let obs = Arc::new(RecordingObserver::default());
    let mut p = RowPipeline::open_with_options("tests/fixtures/people.csv", &options_with(obs.clone(), 0)).unwrap();
    let err = p.write_to_writer(BrokenPipe).unwrap_err();

    assert!(matches!(err, PipelineError::Io(_)));
    assert_eq!(*obs.failures.lock().unwrap(), vec![PipelineSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![PipelineSeverity::Critical]);
}
