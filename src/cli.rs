// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `minibuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "minibuild",
    version,
    about = "Compile and run single-file C++ programs with an external g++.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the settings file (JSON).
    ///
    /// Default: `MINIBUILD_SETTINGS`, or `minibuild.json` in the current
    /// working directory. A missing file means default settings.
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MINIBUILD_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Compile a source file and stream the compiler log.
    Build(BuildArgs),

    /// Compile the saved source of a named project.
    Project(ProjectArgs),

    /// Launch an already built program.
    Run {
        /// Program to start.
        exe: PathBuf,

        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Show the settings, or update and save them.
    Settings {
        /// New compiler path to store as `mingw_path`.
        #[arg(long, value_name = "PATH")]
        toolchain: Option<PathBuf>,

        /// New language standard, e.g. `c++20`.
        #[arg(long, value_name = "STD")]
        std: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Source file to compile.
    pub source: PathBuf,

    /// Output binary. Defaults to the source path without its extension.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Extra compiler flag, appended after the configured ones. Repeatable.
    #[arg(long = "flag", value_name = "FLAG", allow_hyphen_values = true)]
    pub flags: Vec<String>,

    #[command(flatten)]
    pub launch: LaunchArgs,
}

#[derive(Debug, Clone, Args)]
pub struct ProjectArgs {
    /// Project name (a directory under `<root>/projects`).
    pub name: String,

    /// Directory that holds `projects/`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Extra compiler flag, appended after the configured ones. Repeatable.
    #[arg(long = "flag", value_name = "FLAG", allow_hyphen_values = true)]
    pub flags: Vec<String>,

    #[command(flatten)]
    pub launch: LaunchArgs,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct LaunchArgs {
    /// Run the program after a successful build (build commands only).
    #[arg(long)]
    pub run: bool,

    /// Launch without a console and discard the program's output.
    #[arg(long)]
    pub silent: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_accepts_hyphenated_flags() {
        let args = CliArgs::try_parse_from([
            "minibuild", "build", "main.cpp", "-o", "out/main", "--flag", "-Wall", "--flag", "-O2",
            "--run",
        ])
        .unwrap();

        match args.command {
            Command::Build(b) => {
                assert_eq!(b.source, PathBuf::from("main.cpp"));
                assert_eq!(b.output, Some(PathBuf::from("out/main")));
                assert_eq!(b.flags, vec!["-Wall", "-O2"]);
                assert!(b.launch.run);
                assert!(!b.launch.silent);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_options_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "minibuild", "run", "prog", "--silent", "--log-level", "debug", "--settings", "s.json",
        ])
        .unwrap();
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert_eq!(args.settings, Some(PathBuf::from("s.json")));
        assert!(matches!(args.command, Command::Run { launch, .. } if launch.silent));
    }
}
