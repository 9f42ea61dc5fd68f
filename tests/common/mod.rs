#![allow(dead_code)]

pub use minibuild_test_utils::fake_backend::FakeBackend;
pub use minibuild_test_utils::fake_toolchain::{BROKEN_SOURCE, HELLO_SOURCE, write_source};
#[cfg(unix)]
pub use minibuild_test_utils::fake_toolchain::fake_toolchain;
pub use minibuild_test_utils::{init_tracing, wait_until, with_timeout};

use minibuild::engine::CoordinatorOptions;
use minibuild::exec::BuildRequest;
use minibuild::runner::LaunchPolicy;

/// Options that do not require the output binary to exist.
pub fn lenient_options() -> CoordinatorOptions {
    CoordinatorOptions {
        verify_output: false,
        log_file: None,
        launch_policy: LaunchPolicy::Silent,
    }
}

/// A request whose paths are never touched by a fake backend.
pub fn dummy_request() -> BuildRequest {
    BuildRequest::new("main.cpp", "build/main", "g++")
}
