//! Launch lifecycle scenarios
//!
//! Drives the full submit → resolve → poll flow against the scripted
//! backend, a recording sink and virtual time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use dataflow_launcher::mock::{BackendCall, MockBackend};
use dataflow_launcher::{
    Disposition, EffectiveConfig, EnvSnapshot, FakeClock, JobRequest, JobState, LaunchConfig,
    LaunchError, LaunchStatus, Launcher, MemorySink, Phase, StatePolicy,
};

fn env_pairs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("PROJECT_ID", "acme-data"),
        ("REGION", "europe-west1"),
        ("ENVIRONMENT", "dev"),
        ("JOB_NAME", "etl"),
        ("STAGING_LOCATION", "gs://acme/staging"),
        ("TEMP_LOCATION", "gs://acme/tmp"),
        ("ARTIFACT_SOURCE", "gs://acme/artifacts/pipeline.jar"),
    ]
}

fn config_from(pairs: Vec<(&'static str, &'static str)>) -> Result<LaunchConfig, LaunchError> {
    let env = EnvSnapshot::from_pairs(pairs);
    let effective = EffectiveConfig::build(None, &env, None)?;
    Ok(LaunchConfig::from_effective(&effective)?)
}

fn test_config() -> LaunchConfig {
    config_from(env_pairs()).unwrap()
}

fn request(config: &LaunchConfig) -> JobRequest {
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    JobRequest::from_config(config, at)
}

const JOB_NAME: &str = "dev-etl-20240102-030405";

struct Harness {
    backend: Arc<MockBackend>,
    sink: Arc<MemorySink>,
    clock: Arc<FakeClock>,
    launcher: Launcher,
}

fn harness(config: &LaunchConfig, backend: MockBackend, sink: MemorySink) -> Harness {
    let backend = Arc::new(backend);
    let sink = Arc::new(sink);
    let clock = Arc::new(FakeClock::new());
    let launcher = Launcher::new(config, backend.clone(), sink.clone(), clock.clone());
    Harness {
        backend,
        sink,
        clock,
        launcher,
    }
}

fn phases_and_states(sink: &MemorySink) -> Vec<(Phase, JobState)> {
    sink.events()
        .into_iter()
        .map(|e| (e.phase, e.state))
        .collect()
}

// =============================================================================
// Successful runs
// =============================================================================

#[test]
fn test_job_runs_to_done() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_listed_ids(["2024-01-02_03_04_05-111"])
        .with_states(
            "2024-01-02_03_04_05-111",
            &["JOB_STATE_PENDING", "JOB_STATE_RUNNING", "JOB_STATE_RUNNING", "JOB_STATE_DONE"],
        );
    let h = harness(&config, backend, MemorySink::new());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.exit_code, 0);
    assert_eq!(report.status, LaunchStatus::Success);
    assert_eq!(report.job_name, JOB_NAME);
    assert_eq!(report.job_id.as_deref(), Some("2024-01-02_03_04_05-111"));
    assert_eq!(report.final_state, Some(JobState::Done));
    assert_eq!(report.polls, 4);
    assert!(!report.timed_out);

    assert_eq!(
        phases_and_states(&h.sink),
        vec![
            (Phase::Submitted, JobState::Unknown),
            (Phase::Poll, JobState::Pending),
            (Phase::Poll, JobState::Running),
            (Phase::Poll, JobState::Running),
            (Phase::Poll, JobState::Done),
            (Phase::Finished, JobState::Done),
        ]
    );
    assert_eq!(report.events_published, 6);
    assert_eq!(report.events_failed, 0);

    // Sleeps only between non-terminal samples
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(30); 3]);
}

#[test]
fn test_submit_uses_derived_name_and_standard_parameters() {
    let config = config_from(
        env_pairs()
            .into_iter()
            .chain([("PIPELINE_ARGS", "--workers=4  --mode=batch")])
            .collect(),
    )
    .unwrap();
    let backend = MockBackend::new()
        .with_listed_ids(["id-1"])
        .with_states("id-1", &["Done"]);
    let h = harness(&config, backend, MemorySink::new());

    h.launcher.run(&request(&config));

    let submitted = h.backend.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(
        submitted[0].pipeline_args(),
        vec![
            "--project=acme-data",
            "--region=europe-west1",
            "--stagingLocation=gs://acme/staging",
            "--tempLocation=gs://acme/tmp",
            "--jobName=dev-etl-20240102-030405",
            "--workers=4",
            "--mode=batch",
        ]
    );
}

#[test]
fn test_events_carry_routing_attributes() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_listed_ids(["id-1"])
        .with_states("id-1", &["Running", "Done"]);
    let h = harness(&config, backend, MemorySink::new());

    h.launcher.run(&request(&config));

    for event in h.sink.events() {
        assert_eq!(event.environment, "dev");
        assert_eq!(event.job_name, JOB_NAME);
        assert_eq!(event.job_id, "id-1");
        let attrs = event.attributes();
        assert_eq!(attrs[0], ("environment", "dev"));
        assert_eq!(attrs[1].0, "state");
        assert_eq!(attrs[2], ("jobName", JOB_NAME));
    }
}

#[test]
fn test_exactly_one_submitted_and_one_finished_event() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_listed_ids(["id-1"])
        .with_states("id-1", &["Queued", "Running", "Cancelling", "Cancelled"]);
    let h = harness(&config, backend, MemorySink::new());

    let report = h.launcher.run(&request(&config));
    let events = h.sink.events();

    let submitted = events.iter().filter(|e| e.phase == Phase::Submitted).count();
    let finished = events.iter().filter(|e| e.phase == Phase::Finished).count();
    assert_eq!(submitted, 1);
    assert_eq!(finished, 1);
    assert_eq!(events.first().map(|e| e.phase), Some(Phase::Submitted));
    assert_eq!(events.last().map(|e| e.phase), Some(Phase::Finished));

    assert_eq!(report.exit_code, 1);
    assert_eq!(report.final_state, Some(JobState::Cancelled));
}

// =============================================================================
// Submit failures
// =============================================================================

#[test]
fn test_failed_submit_still_resolves_and_polls() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_submit_exit_code(1)
        .with_listed_ids(["id-late"])
        .with_states("id-late", &["Failed"]);
    let h = harness(&config, backend, MemorySink::new());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.exit_code, 1);
    assert_eq!(report.submit_exit_code, 1);
    assert_eq!(report.status, LaunchStatus::Failed);
    assert_eq!(
        phases_and_states(&h.sink),
        vec![
            (Phase::Submitted, JobState::Unknown),
            (Phase::Poll, JobState::Failed),
            (Phase::Finished, JobState::Failed),
        ]
    );
}

#[test]
fn test_failed_submit_but_job_succeeds() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_submit_exit_code(1)
        .with_listed_ids(["id-1"])
        .with_states("id-1", &["Running", "Done"]);
    let h = harness(&config, backend, MemorySink::new());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.exit_code, 0);
    assert_eq!(report.submit_exit_code, 1);
}

#[test]
fn test_submit_spawn_error_is_not_fatal() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_submit_error("java: not found")
        .with_listed_ids(["id-1"])
        .with_states("id-1", &["Done"]);
    let h = harness(&config, backend, MemorySink::new());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.submit_exit_code, 127);
    assert_eq!(report.exit_code, 0);
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_no_match_propagates_submit_exit_code() {
    let config = test_config();
    let backend = MockBackend::new().with_submit_exit_code(3);
    let h = harness(&config, backend, MemorySink::new());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.exit_code, 3);
    assert_eq!(report.status, LaunchStatus::NotFound);
    assert!(report.job_id.is_none());
    assert_eq!(report.polls, 0);
    assert!(h.sink.events().is_empty());
    assert_eq!(h.sink.attempts(), 0);
    assert_eq!(h.backend.describe_count(), 0);
}

#[test]
fn test_no_match_after_clean_submit_exits_one() {
    let config = test_config();
    let h = harness(&config, MockBackend::new(), MemorySink::new());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.exit_code, 1);
    assert_eq!(report.status, LaunchStatus::NotFound);
}

#[test]
fn test_list_error_counts_as_not_found() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_submit_exit_code(2)
        .with_list_error("permission denied");
    let h = harness(&config, backend, MemorySink::new());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.exit_code, 2);
    assert_eq!(report.status, LaunchStatus::NotFound);
    assert!(h.sink.events().is_empty());
}

#[test]
fn test_resolve_runs_once_with_name_and_known_states() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_listed_ids(["first", "second"])
        .with_states("first", &["Done"]);
    let h = harness(&config, backend, MemorySink::new());

    let report = h.launcher.run(&request(&config));

    let lists: Vec<_> = h
        .backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BackendCall::List { job_name, states } => Some((job_name, states)),
            _ => None,
        })
        .collect();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].0, JOB_NAME);
    assert_eq!(lists[0].1.len(), 10);
    assert!(lists[0].1.contains(&JobState::Done));
    assert!(lists[0].1.contains(&JobState::Failed));

    assert_eq!(report.job_id.as_deref(), Some("first"));
}

#[test]
fn test_call_order_is_submit_list_then_describe() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_listed_ids(["id-1"])
        .with_states("id-1", &["Running", "Done"]);
    let h = harness(&config, backend, MemorySink::new());

    h.launcher.run(&request(&config));

    let calls = h.backend.calls();
    assert!(matches!(calls[0], BackendCall::Submit(_)));
    assert!(matches!(calls[1], BackendCall::List { .. }));
    assert_eq!(calls[2], BackendCall::Describe("id-1".to_string()));
    assert_eq!(calls.len(), 4);
}

// =============================================================================
// Event sink outages
// =============================================================================

#[test]
fn test_publish_failure_does_not_change_outcome() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_listed_ids(["id-1"])
        .with_states("id-1", &["Running", "Done"]);
    let h = harness(&config, backend, MemorySink::failing());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.exit_code, 0);
    assert_eq!(report.polls, 2);
    assert_eq!(report.events_published, 0);
    assert_eq!(report.events_failed, 4);
    assert_eq!(h.sink.attempts(), 4);
}

#[test]
fn test_publish_failure_on_failed_job_still_exits_one() {
    let config = test_config();
    let backend = MockBackend::new()
        .with_listed_ids(["id-1"])
        .with_states("id-1", &["Failed"]);
    let h = harness(&config, backend, MemorySink::failing());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.exit_code, 1);
}

// =============================================================================
// Policy and limits
// =============================================================================

#[test]
fn test_policy_override_makes_drained_terminal() {
    let mut config = test_config();
    config.policy = StatePolicy::new().with_override(&JobState::parse("Drained"), Disposition::Success);
    let backend = MockBackend::new()
        .with_listed_ids(["id-1"])
        .with_states("id-1", &["Running", "JOB_STATE_DRAINED"]);
    let h = harness(&config, backend, MemorySink::new());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.exit_code, 0);
    assert_eq!(report.polls, 2);
}

#[test]
fn test_max_duration_stops_polling() {
    let mut config = test_config();
    config.poll.max_duration = Some(Duration::from_secs(60));
    let backend = MockBackend::new()
        .with_listed_ids(["id-1"])
        .with_states("id-1", &["Running"]);
    let h = harness(&config, backend, MemorySink::new());

    let report = h.launcher.run(&request(&config));

    assert_eq!(report.exit_code, 1);
    assert!(report.timed_out);
    assert_eq!(report.final_state, Some(JobState::Running));
    assert_eq!(report.polls, 3);

    let events = h.sink.events();
    let finished = events.last().unwrap();
    assert_eq!(finished.phase, Phase::Finished);
    assert_eq!(finished.state, JobState::Running);
    assert_eq!(
        finished.message.as_ref().unwrap()["reason"],
        "max_duration_exceeded"
    );
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_missing_configuration_exits_two() {
    let err = config_from(vec![("PROJECT_ID", "acme-data"), ("REGION", "")]).unwrap_err();

    assert_eq!(err.exit_code(), 2);
    let message = err.to_string();
    assert!(message.contains("REGION"));
    assert!(message.contains("ARTIFACT_SOURCE"));
    assert!(!message.contains("PROJECT_ID"));
}
