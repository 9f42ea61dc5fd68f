// src/diagnostics.rs

//! Recognise GCC-style diagnostics in a build log.
//!
//! Only lines shaped like `file:line[:col]: severity: message` are picked
//! up. Linker output and context lines (`In function ...`, caret lines) are
//! left alone.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

const DIAGNOSTIC_PATTERN: &str = r"^(?P<file>.+?):(?P<line>\d+):(?:(?P<col>\d+):)?\s*(?P<severity>fatal error|error|warning|note):\s*(?P<message>.*)$";

static DIAGNOSTIC_RE: LazyLock<Option<Regex>> = LazyLock::new(|| match Regex::new(DIAGNOSTIC_PATTERN) {
    Ok(r) => Some(r),
    Err(e) => {
        warn!(error = %e, "diagnostic pattern failed to compile; summaries disabled");
        None
    }
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    fn from_label(label: &str) -> Self {
        match label {
            "warning" => Severity::Warning,
            "note" => Severity::Note,
            _ => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub column: Option<u32>,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        match self.column {
            Some(col) => write!(f, "{}:{}:{}: {label}: {}", self.file, self.line, col, self.message),
            None => write!(f, "{}:{}: {label}: {}", self.file, self.line, self.message),
        }
    }
}

/// Parse one log line, if it is a diagnostic.
pub fn parse_line(line: &str) -> Option<Diagnostic> {
    let caps = DIAGNOSTIC_RE.as_ref()?.captures(line.trim_end())?;
    Some(Diagnostic {
        file: caps["file"].to_string(),
        line: caps["line"].parse().ok()?,
        column: caps.name("col").and_then(|m| m.as_str().parse().ok()),
        severity: Severity::from_label(&caps["severity"]),
        message: caps["message"].to_string(),
    })
}

pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<Diagnostic> {
    lines.iter().filter_map(|l| parse_line(l.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_compiles() {
        assert!(DIAGNOSTIC_RE.is_some());
    }

    #[test]
    fn parses_error_with_column() {
        let d = parse_line("main.cpp:3:14: error: expected ';' before '}' token").unwrap();
        assert_eq!(d.file, "main.cpp");
        assert_eq!(d.line, 3);
        assert_eq!(d.column, Some(14));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "expected ';' before '}' token");
    }

    #[test]
    fn windows_drive_letter_stays_in_file() {
        let d = parse_line(r"C:\proj\source.cpp:10:2: warning: unused variable 'x'").unwrap();
        assert_eq!(d.file, r"C:\proj\source.cpp");
        assert_eq!(d.line, 10);
        assert_eq!(d.severity, Severity::Warning);
    }

    #[test]
    fn fatal_error_counts_as_error_and_column_is_optional() {
        let d = parse_line("a.cpp:1: fatal error: nothing.h: No such file or directory").unwrap();
        assert_eq!(d.column, None);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "nothing.h: No such file or directory");
    }

    #[test]
    fn non_diagnostic_lines_are_skipped() {
        let lines = [
            "[Compiler] Running g++...",
            "main.cpp: In function 'int main()':",
            "    3 |   return 0",
            "main.cpp:3:11: error: expected ';' before '}' token",
            "collect2: error: ld returned 1 exit status",
        ];
        let diags = parse_lines(&lines);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, 3);
    }

    #[test]
    fn display_round_trips_gcc_shape() {
        let line = "x.cpp:7:1: note: declared here";
        assert_eq!(parse_line(line).unwrap().to_string(), line);
    }
}
