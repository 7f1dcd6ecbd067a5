//! SubprocessEngine driven by a POSIX shell

#![cfg(unix)]

mod common;

use anfkit::{
    Analysis, Chart, ChartRunner, ChartType, EngineConfig, IdAllocator, Item, Properties,
    RunError, ScriptError, SubprocessEngine,
};
use common::{read, serial, workspace_with, RecordingBackend};
use std::process::{Command, Stdio};

fn shell() -> SubprocessEngine {
    SubprocessEngine::new(EngineConfig {
        program: "sh".into(),
        args: Vec::new(),
        ..Default::default()
    })
}

fn chart(script: &str) -> (Analysis, Chart) {
    let ids = IdAllocator::new();
    let chart = Chart::new(ids.next_id(), ChartType::Matplotlib, "Delay histogram")
        .with_script(script)
        .with_property("bins", 20);
    let analysis = Analysis::with_items(&ids, ["/ProjectA/results/*.vec"], vec![Item::from(chart.clone())]);
    (analysis, chart)
}

#[test]
fn script_sees_context_through_environment() {
    let _serial = serial();
    let (ws_dir, workspace) = workspace_with(&["ProjectA"]);
    let work = tempfile::tempdir().unwrap();
    let mut runner = ChartRunner::new(shell());
    let (analysis, chart) = chart(concat!(
        "printf '%s' \"$ANF_CHART_NAME\" > name.txt\n",
        "printf '%s' \"$ANF_CHART_TYPE\" > type.txt\n",
        "printf '%s' \"$ANF_INPUTS\" > inputs.json\n",
        "printf '%s' \"$ANF_PROPERTIES\" > props.json\n",
        "printf '%s' \"$PYTHONPATH\" > search.txt\n",
    ));

    runner
        .run(&analysis, &chart, work.path(), &workspace, &Properties::new(), false)
        .unwrap();

    assert_eq!(read(work.path().join("name.txt")), "Delay histogram");
    assert_eq!(read(work.path().join("type.txt")), "MATPLOTLIB");

    let inputs: Vec<String> = serde_json::from_str(&read(work.path().join("inputs.json"))).unwrap();
    let expected = ws_dir.path().join("ProjectA/results/*.vec");
    assert_eq!(inputs, vec![expected.to_string_lossy().into_owned()]);

    let props: Properties = serde_json::from_str(&read(work.path().join("props.json"))).unwrap();
    assert_eq!(props.get("bins").map(String::as_str), Some("20"));

    let search = read(work.path().join("search.txt"));
    assert!(search.starts_with(&*work.path().to_string_lossy()));
}

#[test]
fn recorded_exit_status_becomes_script_failure() {
    let _serial = serial();
    let (_ws_dir, workspace) = workspace_with(&["ProjectA"]);
    let work = tempfile::tempdir().unwrap();
    let mut runner = ChartRunner::new(shell());
    let (analysis, chart) = chart("printf 3 > \"$ANF_EXIT_STATUS\"\nexit 3\n");

    let err = runner
        .run(&analysis, &chart, work.path(), &workspace, &Properties::new(), true)
        .unwrap_err();
    assert!(matches!(err, RunError::ScriptFailure { code: 3, .. }));
}

#[test]
fn unhandled_failure_is_an_execution_error_with_stderr() {
    let _serial = serial();
    let (_ws_dir, workspace) = workspace_with(&["ProjectA"]);
    let work = tempfile::tempdir().unwrap();
    let mut runner = ChartRunner::new(shell());
    let (analysis, chart) = chart("echo 'cannot read results' >&2\nexit 3\n");

    let err = runner
        .run(&analysis, &chart, work.path(), &workspace, &Properties::new(), false)
        .unwrap_err();
    match err {
        RunError::ScriptExecution(ScriptError::Raised(message)) => {
            assert_eq!(message, "cannot read results");
        }
        other => panic!("expected ScriptExecution, got {other:?}"),
    }
}

#[test]
fn unknown_command_is_an_execution_error() {
    let _serial = serial();
    let (_ws_dir, workspace) = workspace_with(&["ProjectA"]);
    let work = tempfile::tempdir().unwrap();
    let mut runner = ChartRunner::new(shell());
    let (analysis, chart) = chart("anf_no_such_command_here\n");

    let err = runner
        .run(&analysis, &chart, work.path(), &workspace, &Properties::new(), false)
        .unwrap_err();
    assert!(matches!(err, RunError::ScriptExecution(ScriptError::Raised(ref m)) if m.contains("anf_no_such_command_here")));
}

#[test]
fn recorded_zero_status_is_success() {
    let _serial = serial();
    let (_ws_dir, workspace) = workspace_with(&["ProjectA"]);
    let work = tempfile::tempdir().unwrap();
    let mut runner = ChartRunner::new(shell());
    let (analysis, chart) = chart("printf 0 > \"$ANF_EXIT_STATUS\"\nexit 0\n");

    runner
        .run(&analysis, &chart, work.path(), &workspace, &Properties::new(), false)
        .unwrap();
}

#[test]
fn display_request_is_passed_to_the_script() {
    let _serial = serial();
    let (_ws_dir, workspace) = workspace_with(&["ProjectA"]);
    let work = tempfile::tempdir().unwrap();
    let backend = RecordingBackend::default();
    let mut runner = ChartRunner::new(shell()).with_backend(backend.clone());
    let (analysis, chart) = chart(concat!(
        "printf '%s' \"$ANF_WANT_SHOW\" >> want.txt\n",
        "if [ \"$ANF_WANT_SHOW\" = 1 ]; then touch \"$ANF_SHOW_REQUEST\"; fi\n",
    ));

    runner
        .run(&analysis, &chart, work.path(), &workspace, &Properties::new(), true)
        .unwrap();
    runner
        .run(&analysis, &chart, work.path(), &workspace, &Properties::new(), false)
        .unwrap();

    assert_eq!(read(work.path().join("want.txt")), "10");
    // shown by the script itself, never again by the runner
    assert_eq!(backend.shows(), 1);
}

#[test]
fn show_request_is_honored_once() {
    let _serial = serial();
    let (_ws_dir, workspace) = workspace_with(&["ProjectA"]);
    let work = tempfile::tempdir().unwrap();
    let backend = RecordingBackend::default();
    let mut runner = ChartRunner::new(shell()).with_backend(backend.clone());

    let (analysis, showing) = chart("touch \"$ANF_SHOW_REQUEST\"\n");
    runner
        .run(&analysis, &showing, work.path(), &workspace, &Properties::new(), true)
        .unwrap();
    assert_eq!(backend.shows(), 1);

    let (analysis, silent) = chart("true\n");
    runner
        .run(&analysis, &silent, work.path(), &workspace, &Properties::new(), true)
        .unwrap();
    assert_eq!(backend.shows(), 2);
}

#[test]
fn missing_interpreter_is_a_spawn_error() {
    let _serial = serial();
    let (_ws_dir, workspace) = workspace_with(&["ProjectA"]);
    let work = tempfile::tempdir().unwrap();
    let mut runner = ChartRunner::new(SubprocessEngine::new(EngineConfig {
        program: "anf-no-such-interpreter".into(),
        ..Default::default()
    }));
    let (analysis, chart) = chart("exit 0\n");

    let err = runner
        .run(&analysis, &chart, work.path(), &workspace, &Properties::new(), false)
        .unwrap_err();
    assert!(matches!(err, RunError::ScriptExecution(ScriptError::Spawn { .. })));
}

fn python_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[test]
fn python_driver_separates_exit_from_exceptions() {
    if !python_available() {
        eprintln!("python3 not found; skipping");
        return;
    }
    let _serial = serial();
    let (_ws_dir, workspace) = workspace_with(&["ProjectA"]);
    let work = tempfile::tempdir().unwrap();
    let mut runner = ChartRunner::new(SubprocessEngine::default());

    let (analysis, exiting) = chart("exit(3)\n");
    let err = runner
        .run(&analysis, &exiting, work.path(), &workspace, &Properties::new(), false)
        .unwrap_err();
    assert!(matches!(err, RunError::ScriptFailure { code: 3, .. }));

    let (analysis, raising) = chart("raise ValueError('no data')\n");
    let err = runner
        .run(&analysis, &raising, work.path(), &workspace, &Properties::new(), false)
        .unwrap_err();
    assert!(matches!(err, RunError::ScriptExecution(ScriptError::Raised(ref m)) if m.contains("ValueError: no data")));

    let (analysis, plain) = chart("import os\nopen('name.txt', 'w').write(os.environ['ANF_CHART_NAME'])\n");
    runner
        .run(&analysis, &plain, work.path(), &workspace, &Properties::new(), false)
        .unwrap();
    assert_eq!(read(work.path().join("name.txt")), "Delay histogram");
}
