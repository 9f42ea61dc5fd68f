// tests/cli_flows.rs
//
// The foreground poll loop and the subcommand flows behind `main`.

mod common;
use crate::common::*;

use std::error::Error;
use std::path::Path;
use std::sync::atomic::Ordering;

use clap::Parser;
use tokio::runtime::Handle;

use minibuild::cli::CliArgs;
use minibuild::config;
use minibuild::engine::coordinator::SUCCESS_MARKER;
use minibuild::engine::{BuildCoordinator, BuildOutcome};
use minibuild::{POLL_INTERVAL, follow_build, run};

type TestResult = Result<(), Box<dyn Error>>;

fn args(settings: &Path, rest: &[&str]) -> Result<CliArgs, clap::Error> {
    let mut argv = vec![
        "minibuild".to_string(),
        "--settings".to_string(),
        settings.display().to_string(),
    ];
    argv.extend(rest.iter().map(|s| s.to_string()));
    CliArgs::try_parse_from(argv)
}

#[tokio::test]
async fn follow_build_returns_result_once_idle() -> TestResult {
    init_tracing();

    let (backend, gate) = FakeBackend::new(0).with_lines(&["compiling"]).gated();
    let starts = backend.starts();
    let coordinator = BuildCoordinator::new(backend, lenient_options(), Handle::current());
    coordinator.submit_build(dummy_request());

    let release = async {
        wait_until(|| starts.load(Ordering::SeqCst) == 1).await;
        tokio::time::sleep(POLL_INTERVAL * 2).await;
        gate.notify_one();
    };
    let (result, ()) = with_timeout(async { tokio::join!(follow_build(&coordinator), release) }).await;

    let result = result.ok_or("no result")?;
    assert_eq!(result.outcome, BuildOutcome::Success);
    assert!(!coordinator.is_busy());
    Ok(())
}

#[tokio::test]
async fn follow_build_survives_clear_log_mid_build() -> TestResult {
    init_tracing();

    let (backend, gate) = FakeBackend::new(0).with_lines(&["before clear"]).gated();
    let starts = backend.starts();
    let coordinator = BuildCoordinator::new(backend, lenient_options(), Handle::current());
    coordinator.submit_build(dummy_request());

    let clear_then_release = async {
        wait_until(|| starts.load(Ordering::SeqCst) == 1).await;
        tokio::time::sleep(POLL_INTERVAL * 2).await;
        coordinator.clear_log();
        gate.notify_one();
    };
    let (result, ()) =
        with_timeout(async { tokio::join!(follow_build(&coordinator), clear_then_release) }).await;

    let result = result.ok_or("no result")?;
    assert!(result.succeeded());
    assert_eq!(
        result.combined_log,
        vec!["before clear".to_string(), SUCCESS_MARKER.to_string()]
    );
    assert_eq!(coordinator.current_log(), format!("{SUCCESS_MARKER}\n"));
    Ok(())
}

#[tokio::test]
async fn follow_build_without_a_build_returns_nothing() {
    init_tracing();

    let coordinator =
        BuildCoordinator::new(FakeBackend::new(0), lenient_options(), Handle::current());
    assert!(with_timeout(follow_build(&coordinator)).await.is_none());
}

#[tokio::test]
async fn settings_command_saves_and_reloads() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("conf").join("minibuild.json");
    let gpp = dir.path().join("bin").join("g++");

    let ok = run(args(
        &path,
        &["settings", "--toolchain", &gpp.display().to_string(), "--std", "c++20"],
    )?)
    .await?;
    assert!(ok);

    let settings = config::load_or_default(&path)?;
    assert_eq!(settings.toolchain_path(), gpp.as_path());
    assert_eq!(settings.std(), "c++20");
    assert_eq!(
        settings.extra_flags().to_vec(),
        vec!["-static-libgcc".to_string(), "-static-libstdc++".to_string()]
    );

    // Only the given field changes on a later update.
    assert!(run(args(&path, &["settings", "--std", "c++17"])?).await?);
    let settings = config::load_or_default(&path)?;
    assert_eq!(settings.toolchain_path(), gpp.as_path());
    assert_eq!(settings.std(), "c++17");
    Ok(())
}

#[tokio::test]
async fn invalid_settings_update_leaves_file_untouched() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("minibuild.json");
    assert!(run(args(&path, &["settings", "--std", "c++20"])?).await?);
    let before = std::fs::read_to_string(&path)?;

    let err = run(args(&path, &["settings", "--std", "c++ 20"])?).await;
    assert!(err.is_err());
    assert_eq!(std::fs::read_to_string(&path)?, before);
    Ok(())
}

#[tokio::test]
async fn run_command_on_missing_program_is_unsuccessful() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let settings = dir.path().join("minibuild.json");
    let missing = dir.path().join("nope").display().to_string();
    assert!(!run(args(&settings, &["run", &missing, "--silent"])?).await?);
    Ok(())
}

#[cfg(unix)]
mod with_fake_toolchain {
    use super::*;

    use minibuild::project::{Project, STARTER_SOURCE};

    async fn settings_for(dir: &Path) -> Result<std::path::PathBuf, Box<dyn Error>> {
        let gpp = fake_toolchain(dir);
        let path = dir.join("minibuild.json");
        let set = args(&path, &["settings", "--toolchain", &gpp.display().to_string()])?;
        assert!(run(set).await?);
        Ok(path)
    }

    #[tokio::test]
    async fn project_command_writes_starter_and_builds_it() -> TestResult {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let settings = settings_for(dir.path()).await?;
        let root = dir.path().display().to_string();

        let ok = run(args(&settings, &["project", "demo", "--root", &root, "--silent"])?).await?;
        assert!(ok);

        let project = Project::new(dir.path(), "demo")?;
        assert_eq!(std::fs::read_to_string(project.source_path())?, STARTER_SOURCE);
        assert!(project.exe_path().is_file());
        Ok(())
    }

    #[tokio::test]
    async fn project_command_keeps_saved_source() -> TestResult {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let settings = settings_for(dir.path()).await?;
        let project = Project::new(dir.path(), "mine")?;
        project.save_source(BROKEN_SOURCE)?;
        let root = dir.path().display().to_string();

        let ok = run(args(&settings, &["project", "mine", "--root", &root])?).await?;
        assert!(!ok, "a failed build maps to an unsuccessful exit");
        assert_eq!(std::fs::read_to_string(project.source_path())?, BROKEN_SOURCE);
        assert!(!project.exe_path().exists());
        Ok(())
    }

    #[tokio::test]
    async fn build_command_with_run_launches_result() -> TestResult {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let settings = settings_for(dir.path()).await?;
        let src = write_source(dir.path(), "hello.cpp", HELLO_SOURCE);
        let out = dir.path().join("out").join("hello");

        let ok = run(args(
            &settings,
            &[
                "build",
                &src.display().to_string(),
                "-o",
                &out.display().to_string(),
                "--flag",
                "-O2",
                "--run",
                "--silent",
            ],
        )?)
        .await?;
        assert!(ok);
        assert!(out.is_file());
        Ok(())
    }
}
