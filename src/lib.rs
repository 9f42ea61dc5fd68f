// src/lib.rs

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod project;
pub mod runner;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command, LaunchArgs};
use crate::config::Settings;
use crate::engine::{BuildCoordinator, BuildResult, SubmitOutcome};
use crate::exec::BuildRequest;
use crate::project::Project;
use crate::runner::{LaunchPolicy, ProgramRunner};

/// How often the foreground loop looks at the build state.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading
/// - the build coordinator and its process backend
/// - a foreground poll loop that echoes the build log
/// - Ctrl-C handling
///
/// Returns `Ok(false)` when a build ran but did not succeed, or a program
/// could not be launched.
pub async fn run(args: CliArgs) -> Result<bool> {
    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(config::default_settings_path);

    match args.command {
        Command::Settings { toolchain, std: standard } => {
            update_settings(&settings_path, toolchain, standard)?;
            Ok(true)
        }
        Command::Run { exe, launch } => {
            let runner = ProgramRunner::new(policy_for(launch));
            Ok(runner.run(&exe))
        }
        Command::Build(build) => {
            let settings = load_settings(&settings_path)?;
            let output = build
                .output
                .clone()
                .unwrap_or_else(|| default_output_for(&build.source));
            let request = settings.request(&build.source, output, &build.flags);
            build_and_maybe_run(&settings, request, build.launch).await
        }
        Command::Project(project_args) => {
            let settings = load_settings(&settings_path)?;
            let project = Project::new(&project_args.root, &project_args.name)?;
            if !project.source_path().is_file() {
                let starter = project.load_source()?;
                project.save_source(&starter)?;
                info!(project = %project.name(), "wrote starter source");
            }
            let request = project.build_request(&settings, &project_args.flags);
            build_and_maybe_run(&settings, request, project_args.launch).await
        }
    }
}

fn load_settings(path: &Path) -> Result<Settings> {
    config::load_or_default(path)
        .with_context(|| format!("loading settings from {}", path.display()))
}

fn update_settings(
    path: &Path,
    toolchain: Option<PathBuf>,
    standard: Option<String>,
) -> Result<()> {
    let settings = load_settings(path)?;

    if toolchain.is_none() && standard.is_none() {
        println!("{}", serde_json::to_string_pretty(settings.raw())?);
        return Ok(());
    }

    let mut raw = settings.into_raw();
    if let Some(toolchain) = toolchain {
        raw.mingw_path = toolchain;
    }
    if let Some(standard) = standard {
        raw.std = standard;
    }
    let settings = Settings::try_from(raw)?;
    config::save(path, &settings)
        .with_context(|| format!("saving settings to {}", path.display()))?;
    println!("{}", serde_json::to_string_pretty(settings.raw())?);
    Ok(())
}

async fn build_and_maybe_run(
    settings: &Settings,
    request: BuildRequest,
    launch: LaunchArgs,
) -> Result<bool> {
    let exe = request.output_path.clone();
    let coordinator = BuildCoordinator::new(
        settings.backend(),
        settings.coordinator_options(policy_for(launch)),
        Handle::current(),
    );

    if coordinator.submit_build(request) == SubmitOutcome::Rejected {
        print!("{}", coordinator.current_log());
        return Ok(false);
    }

    let Some(result) = follow_build(&coordinator).await else {
        return Ok(false);
    };

    if !result.succeeded() {
        return Ok(false);
    }

    if launch.run {
        return Ok(coordinator.run_program(&exe));
    }
    Ok(true)
}

/// Foreground poll loop: echo new log text until the build is idle.
///
/// Never blocks on the build itself; it only samples the shared state every
/// [`POLL_INTERVAL`]. Ctrl-C stops following but does not cancel the build.
pub async fn follow_build(coordinator: &BuildCoordinator) -> Option<BuildResult> {
    let mut printed = 0usize;
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                } else {
                    warn!("interrupted; the compiler keeps running until it exits");
                }
                return None;
            }
        }

        // Sample busy before the log: once idle is seen, every line of the
        // build is already in the log.
        let busy = coordinator.is_busy();
        let log = coordinator.current_log();
        if log.len() < printed {
            // Cleared from elsewhere; start over.
            printed = 0;
        }
        if let Some(fresh) = log.get(printed..) {
            if !fresh.is_empty() {
                print!("{fresh}");
                printed = log.len();
            }
        }

        if !busy {
            break;
        }
    }

    coordinator.wait_idle().await;
    coordinator.last_result()
}

fn policy_for(launch: LaunchArgs) -> LaunchPolicy {
    if launch.silent {
        LaunchPolicy::Silent
    } else {
        LaunchPolicy::Detached
    }
}

/// `dir/main.cpp` -> `dir/main` (plus the platform executable suffix).
fn default_output_for(source: &Path) -> PathBuf {
    let mut out = source.with_extension("");
    if !std::env::consts::EXE_SUFFIX.is_empty() {
        out.set_extension(std::env::consts::EXE_EXTENSION);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_strips_extension() {
        let out = default_output_for(Path::new("src/main.cpp"));
        assert_eq!(out.file_stem().unwrap(), "main");
        assert_eq!(out.parent().unwrap(), Path::new("src"));
        assert_ne!(out, PathBuf::from("src/main.cpp"));
    }
}
