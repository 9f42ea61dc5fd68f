//! A shell script standing in for `g++` (Unix only).
//!
//! The script is invoked exactly like the real compiler:
//! `<script> <source> -o <output> -std=... [flags...]`.
//!
//! - prints its argv on stdout
//! - if the source contains `BROKEN`, prints a GCC-style error on stderr and
//!   exits 1
//! - if the source contains `NO_OUTPUT`, exits 0 without writing the output
//! - if the source contains `SLOW`, sleeps a little first
//! - otherwise writes an executable shell script to `<output>` and exits 0

use std::fs;
use std::path::{Path, PathBuf};

pub const SCRIPT: &str = r#"#!/bin/sh
src="$1"
out="$3"
echo "fake-g++ $*"
if grep -q SLOW "$src"; then
  sleep 1
fi
if grep -q BROKEN "$src"; then
  echo "$src:1:30: error: expected ';' before '}' token" 1>&2
  exit 1
fi
if grep -q NO_OUTPUT "$src"; then
  exit 0
fi
printf '#!/bin/sh\necho hello\n' > "$out"
chmod +x "$out"
exit 0
"#;

pub const HELLO_SOURCE: &str =
    "#include <iostream>\nint main() { std::cout << \"hello\\n\"; return 0; }\n";

pub const BROKEN_SOURCE: &str =
    "#include <iostream>\nint main() { return 0 } // BROKEN\n";

/// Write the fake compiler into `dir` and make it executable.
#[cfg(unix)]
pub fn fake_toolchain(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin = dir.join("bin");
    fs::create_dir_all(&bin).expect("create bin dir");
    let path = bin.join("g++");
    fs::write(&path, SCRIPT).expect("write fake g++");
    let mut perms = fs::metadata(&path).expect("stat fake g++").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod fake g++");
    path
}

/// Write `text` to `dir/<name>` and return the path.
pub fn write_source(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create source dir");
    }
    fs::write(&path, text).expect("write source");
    path
}
