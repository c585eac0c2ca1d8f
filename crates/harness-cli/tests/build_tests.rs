//! Build loop behaviour against a scripted toolchain.

use harness_cli::toolchain::BuildRequest;
use harness_cli::{
    BuildConfig, BuildError, BuildEvent, BuildObserver, Builder, ToolOutput, Toolchain,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONTROLLER: &str = r#"package controllers

import "github.com/robfig/revel"

type App struct {
	*revel.Controller
}

func (c App) Index() revel.Result {
	return c.Render()
}
"#;

const MISSING_P: &str = "app/controllers/app.go:4:2: import \"github.com/x/p\": cannot find package \"github.com/x/p\" in any of:\n\t/usr/local/go/src/github.com/x/p (from $GOROOT)\n";
const MISSING_Q: &str = "app/controllers/app.go:5:2: import \"github.com/x/q\": cannot find package \"github.com/x/q\" in any of:\n";

#[derive(Debug, Clone, PartialEq, Eq)]
struct RecordedBuild {
    tags: String,
    output: PathBuf,
    package: String,
    work_dir: PathBuf,
}

#[derive(Default)]
struct ScriptedToolchain {
    builds: VecDeque<io::Result<ToolOutput>>,
    fetches: VecDeque<ToolOutput>,
    build_calls: Vec<RecordedBuild>,
    fetch_calls: Vec<String>,
}

impl ScriptedToolchain {
    fn new(builds: Vec<ToolOutput>, fetches: Vec<ToolOutput>) -> Self {
        Self {
            builds: builds.into_iter().map(Ok).collect(),
            fetches: fetches.into(),
            ..Self::default()
        }
    }
}

impl Toolchain for ScriptedToolchain {
    fn build(&mut self, request: &BuildRequest<'_>) -> io::Result<ToolOutput> {
        self.build_calls.push(RecordedBuild {
            tags: request.tags.to_string(),
            output: request.output.to_path_buf(),
            package: request.package.to_string(),
            work_dir: request.work_dir.to_path_buf(),
        });
        self.builds.pop_front().expect("unexpected build invocation")
    }

    fn fetch(&mut self, package: &str, _work_dir: &Path) -> io::Result<ToolOutput> {
        self.fetch_calls.push(package.to_string());
        Ok(self.fetches.pop_front().expect("unexpected fetch invocation"))
    }
}

#[derive(Default)]
struct RecordingObserver {
    events: RefCell<Vec<String>>,
}

impl BuildObserver for RecordingObserver {
    fn on_event(&self, event: &BuildEvent<'_>) {
        let name = match event {
            BuildEvent::Analyzed { .. } => "analyzed",
            BuildEvent::Generated { .. } => "generated",
            BuildEvent::Invoking { .. } => "invoking",
            BuildEvent::Fetching { .. } => "fetching",
            BuildEvent::FetchFailed { .. } => "fetch-failed",
            BuildEvent::AlreadyFetched { .. } => "already-fetched",
            BuildEvent::UnparsedOutput { .. } => "unparsed-output",
            BuildEvent::Built { .. } => "built",
            BuildEvent::Failed { .. } => "failed",
        };
        self.events.borrow_mut().push(name.to_string());
    }
}

struct Fixture {
    _dir: TempDir,
    config: BuildConfig,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("myapp");
    let controllers = source.join("app").join("controllers");
    fs::create_dir_all(&controllers).unwrap();
    fs::write(controllers.join("app.go"), CONTROLLER).unwrap();

    let mut config = BuildConfig::new(&source, "example.com/myapp");
    config.bin_dir = dir.path().join("bin");
    config.tags = "dev integration".to_string();
    Fixture { _dir: dir, config }
}

fn builder(
    fixture: &Fixture,
    toolchain: ScriptedToolchain,
) -> Builder<ScriptedToolchain, RecordingObserver> {
    Builder::with_observer(fixture.config.clone(), toolchain, RecordingObserver::default())
}

#[test]
fn clean_build_invokes_toolchain_once() {
    let fixture = fixture();
    let mut builder = builder(
        &fixture,
        ScriptedToolchain::new(vec![ToolOutput::success("")], vec![]),
    );

    let app = builder.build().unwrap();

    let expected_binary = fixture.config.bin_dir.join(if cfg!(windows) { "myapp.exe" } else { "myapp" });
    assert_eq!(app.bin_path, expected_binary);
    assert_eq!(
        builder.toolchain().build_calls,
        vec![RecordedBuild {
            tags: "dev integration".to_string(),
            output: expected_binary,
            package: "example.com/myapp/app/tmp".to_string(),
            work_dir: fixture.config.source_path.clone(),
        }]
    );
    assert!(builder.toolchain().fetch_calls.is_empty());

    let program = fs::read_to_string(fixture.config.scratch_path().join("main.go")).unwrap();
    assert!(program.contains("revel.RegisterController((*controllers.App)(nil),"));
    assert_eq!(
        *builder.observer().events.borrow(),
        vec!["analyzed", "generated", "invoking", "built"]
    );
}

#[test]
fn missing_package_is_fetched_then_build_succeeds() {
    let fixture = fixture();
    let mut builder = builder(
        &fixture,
        ScriptedToolchain::new(
            vec![ToolOutput::failure(MISSING_P), ToolOutput::success("")],
            vec![ToolOutput::success("")],
        ),
    );

    builder.build().unwrap();

    assert_eq!(builder.toolchain().build_calls.len(), 2);
    assert_eq!(builder.toolchain().fetch_calls, vec!["github.com/x/p"]);
}

#[test]
fn each_distinct_missing_package_is_fetched_once() {
    let fixture = fixture();
    let mut builder = builder(
        &fixture,
        ScriptedToolchain::new(
            vec![
                ToolOutput::failure(MISSING_P),
                ToolOutput::failure(MISSING_Q),
                ToolOutput::success(""),
            ],
            vec![ToolOutput::success(""), ToolOutput::success("")],
        ),
    );

    builder.build().unwrap();

    assert_eq!(builder.toolchain().build_calls.len(), 3);
    assert_eq!(
        builder.toolchain().fetch_calls,
        vec!["github.com/x/p", "github.com/x/q"]
    );
}

#[test]
fn package_still_missing_after_fetch_fails_on_second_invocation() {
    let fixture = fixture();
    let mut builder = builder(
        &fixture,
        ScriptedToolchain::new(
            vec![ToolOutput::failure(MISSING_P), ToolOutput::failure(MISSING_P)],
            vec![ToolOutput::success("")],
        ),
    );

    let error = builder.build().unwrap_err();

    assert_eq!(builder.toolchain().build_calls.len(), 2);
    assert_eq!(builder.toolchain().fetch_calls.len(), 1);
    let compile_error = match error {
        BuildError::Compile(compile_error) => compile_error,
        other => panic!("expected a compile error, got {other:?}"),
    };
    assert_eq!(compile_error.path, "app/controllers/app.go");
    assert_eq!(compile_error.line, 4);
    assert!(compile_error.description.contains("cannot find package"));
    assert_eq!(compile_error.source_lines.len(), CONTROLLER.lines().count());
    assert!(builder
        .observer()
        .events
        .borrow()
        .contains(&"already-fetched".to_string()));
}

#[test]
fn failed_fetch_reports_the_build_output() {
    let fixture = fixture();
    let mut builder = builder(
        &fixture,
        ScriptedToolchain::new(
            vec![ToolOutput::failure(MISSING_P)],
            vec![ToolOutput::failure("go: github.com/x/p: unrecognized import path")],
        ),
    );

    let error = builder.build().unwrap_err().into_compile_error();

    assert_eq!(builder.toolchain().build_calls.len(), 1);
    assert_eq!(error.path, "app/controllers/app.go");
    assert!(error.description.starts_with("import \"github.com/x/p\""));
    assert!(builder
        .observer()
        .events
        .borrow()
        .contains(&"fetch-failed".to_string()));
}

#[test]
fn unparsable_output_gives_generic_compile_error() {
    let fixture = fixture();
    let mut builder = builder(
        &fixture,
        ScriptedToolchain::new(vec![ToolOutput::failure("link: running gcc failed\n")], vec![]),
    );

    let error = builder.build().unwrap_err().into_compile_error();

    assert_eq!(error.title, "Go Compilation Error");
    assert_eq!(error.path, "");
    assert_eq!(error.description, "See console output for the build error.");
    assert_eq!(
        *builder.observer().events.borrow(),
        vec![
            "analyzed",
            "generated",
            "invoking",
            "unparsed-output",
            "failed"
        ]
    );
}

#[test]
fn scratch_directory_is_recreated() {
    let fixture = fixture();
    let scratch = fixture.config.scratch_path();
    fs::create_dir_all(&scratch).unwrap();
    fs::write(scratch.join("stale.go"), "package main\n").unwrap();

    let mut builder = builder(
        &fixture,
        ScriptedToolchain::new(vec![ToolOutput::success("")], vec![]),
    );
    builder.build().unwrap();

    assert!(!scratch.join("stale.go").exists());
    assert!(scratch.join("main.go").exists());
}

#[test]
fn scratch_directory_that_cannot_be_cleared_is_fatal() {
    let fixture = fixture();
    let scratch = fixture.config.scratch_path();
    fs::write(&scratch, "not a directory").unwrap();

    let mut builder = builder(&fixture, ScriptedToolchain::default());
    let error = builder.build().unwrap_err();

    match &error {
        BuildError::Preparation { path, .. } => assert_eq!(path, &scratch),
        other => panic!("expected a preparation error, got {other:?}"),
    }
    assert!(builder.toolchain().build_calls.is_empty());
    assert_eq!(*builder.observer().events.borrow(), vec!["analyzed"]);
    assert_eq!(fs::read_to_string(&scratch).unwrap(), "not a directory");
}

#[test]
fn scratch_directory_is_not_analysed() {
    let fixture = fixture();
    let scratch = fixture.config.scratch_path();
    fs::create_dir_all(&scratch).unwrap();
    fs::write(scratch.join("main.go"), "this does not parse").unwrap();

    let builder = builder(&fixture, ScriptedToolchain::default());
    let info = builder.analyze().unwrap();

    assert_eq!(info.controller_specs.len(), 1);
}

#[test]
fn test_suites_under_source_tests_are_discovered() {
    let fixture = fixture();
    let tests_dir = fixture.config.source_path.join("tests");
    fs::create_dir_all(&tests_dir).unwrap();
    fs::write(
        tests_dir.join("apptest.go"),
        "package tests\n\nimport \"github.com/robfig/revel\"\n\ntype AppTest struct {\n\trevel.TestSuite\n}\n",
    )
    .unwrap();
    let config = BuildConfig::new(&fixture.config.source_path, "example.com/myapp");

    let builder = Builder::with_observer(
        config,
        ScriptedToolchain::default(),
        RecordingObserver::default(),
    );
    let info = builder.analyze().unwrap();

    assert_eq!(info.test_suites.len(), 1);
    assert_eq!(info.test_suites[0].import_path, "example.com/myapp/tests");
    assert!(builder
        .generate(&info)
        .unwrap()
        .contains("(*tests.AppTest)(nil),"));
}

#[test]
fn missing_tests_directory_is_not_a_root() {
    let fixture = fixture();
    assert_eq!(fixture.config.code_roots.len(), 1);
}

#[test]
fn db_import_is_added_to_generated_program() {
    let mut fixture = fixture();
    fixture.config.db_import = Some("github.com/lib/pq".to_string());
    let builder = builder(&fixture, ScriptedToolchain::default());

    let info = builder.analyze().unwrap();
    let program = builder.generate(&info).unwrap();

    assert!(info.init_import_paths.contains("github.com/lib/pq"));
    assert!(program.contains("_ \"github.com/lib/pq\""));
}

#[test]
fn analysis_failure_stops_before_toolchain() {
    let fixture = fixture();
    fs::write(
        fixture.config.source_path.join("app/controllers/broken.go"),
        "package controllers\n\nfunc (c App) Broken( {\n",
    )
    .unwrap();
    let mut builder = builder(&fixture, ScriptedToolchain::default());

    let error = builder.build().unwrap_err();

    assert!(matches!(error, BuildError::Analysis(_)), "{error:?}");
    assert!(builder.toolchain().build_calls.is_empty());
    let compile_error = error.into_compile_error();
    assert!(compile_error.path.ends_with("broken.go"));
    assert!(compile_error.line > 0);
}

#[test]
fn toolchain_spawn_failure_is_reported() {
    let fixture = fixture();
    let mut toolchain = ScriptedToolchain::default();
    toolchain
        .builds
        .push_back(Err(io::Error::new(io::ErrorKind::NotFound, "go: not found")));
    let mut builder = builder(&fixture, toolchain);

    let error = builder.build().unwrap_err();

    assert!(matches!(error, BuildError::Toolchain(_)), "{error:?}");
}
