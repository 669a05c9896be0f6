use std::sync::{Arc, Mutex};

use scave_results::config::SessionConfig;
use scave_results::query::{
    EMPTY_RESULT_HINT, ExtractionTool, MetadataInclusion, QueryContext, QueryObserver, QueryOptions, QuerySeverity,
    QueryStats, ResultSession, ToolOutput,
};
use scave_results::{ResultsError, ResultsResult};

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(&'static str, QueryStats)>>,
    failures: Mutex<Vec<QuerySeverity>>,
    alerts: Mutex<Vec<QuerySeverity>>,
    empty: Mutex<Vec<(String, String)>>,
}

impl QueryObserver for RecordingObserver {
    fn on_success(&self, ctx: &QueryContext, stats: QueryStats) {
        self.successes.lock().unwrap().push((ctx.query, stats));
    }

    fn on_failure(&self, _ctx: &QueryContext, severity: QuerySeverity, _error: &ResultsError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &QueryContext, severity: QuerySeverity, _error: &ResultsError) {
        self.alerts.lock().unwrap().push(severity);
    }

    fn on_empty_result(&self, ctx: &QueryContext, hint: &str) {
        self.empty
            .lock()
            .unwrap()
            .push((ctx.query.to_string(), hint.to_string()));
    }
}

/// Returns the same canned output for every invocation.
struct CannedTool(ToolOutput);

impl ExtractionTool for CannedTool {
    fn run(&self, _args: &[String]) -> ResultsResult<ToolOutput> {
        Ok(self.0.clone())
    }
}

fn session_with(output: ToolOutput, obs: Arc<RecordingObserver>) -> ResultSession<CannedTool> {
    ResultSession::with_tool(SessionConfig::default(), CannedTool(output)).with_observer(obs)
}

#[test]
fn observer_receives_failure_and_alert_on_tool_failure() {
    let obs = Arc::new(RecordingObserver::default());
    let failed = ToolOutput {
        exit_code: Some(1),
        stdout: Vec::new(),
        stderr: b"no such file".to_vec(),
    };
    let s = session_with(failed, obs.clone());

    let _ = s.get_scalars(None, &QueryOptions::default()).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![QuerySeverity::Critical]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![QuerySeverity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_parse_error() {
    let obs = Arc::new(RecordingObserver::default());
    let bad = ToolOutput::success("run,type,module,name,count\nRun-0,statistic,Net.a,s,many\n");
    let s = session_with(bad, obs.clone());

    let err = s.get_statistics(None, &QueryOptions::default()).unwrap_err();
    assert!(matches!(err, ResultsError::ParseError { row: 2, .. }));

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![QuerySeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn lowered_threshold_alerts_on_invalid_arguments() {
    let obs = Arc::new(RecordingObserver::default());
    let s = session_with(ToolOutput::success(""), obs.clone()).with_alert_threshold(QuerySeverity::Warning);

    let _ = s.get_vectors(Some(""), &QueryOptions::default()).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![QuerySeverity::Warning]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![QuerySeverity::Warning]);
}

#[test]
fn empty_metadata_reports_hint_but_succeeds() {
    let obs = Arc::new(RecordingObserver::default());
    let s = session_with(ToolOutput::success("\n  \n"), obs.clone());

    let t = s.get_itervars("*", &MetadataInclusion::none()).unwrap();
    assert_eq!(t.row_count(), 0);
    assert_eq!(t.schema.field_names().collect::<Vec<_>>(), vec!["runID", "name", "value"]);

    let empty = obs.empty.lock().unwrap().clone();
    assert_eq!(empty, vec![("itervars".to_string(), EMPTY_RESULT_HINT.to_string())]);
    assert!(obs.failures.lock().unwrap().is_empty());

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(successes, vec![("itervars", QueryStats { rows: 0, columns: 3 })]);
}
