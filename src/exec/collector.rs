// src/exec/collector.rs

//! Output draining for a launched child.
//!
//! Both pipes are read concurrently in bounded chunks while the child is
//! still running, so a compiler producing a lot of diagnostics can never
//! block on a full pipe. Bytes are assembled into lines per stream and
//! handed to a callback as soon as each line is complete.

use std::sync::{Mutex, PoisonError};

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::errors::Result;
use crate::exec::launcher::ChildProcessHandle;

/// Size of a single read from a child pipe.
pub const CHUNK_SIZE: usize = 4096;

/// Drain stdout and stderr of `handle` until both reach end-of-stream.
///
/// `on_line` is called once per complete line (without the trailing newline),
/// in order within each stream. The interleaving of the two streams follows
/// whichever line completes first. Returns every line read, each terminated
/// by `\n`.
///
/// Calling this again on the same handle returns an empty string: the pipes
/// are consumed by the first call.
pub async fn drain<F>(handle: &mut ChildProcessHandle, on_line: &F) -> Result<String>
where
    F: Fn(&str) + Sync,
{
    let stdout = handle.take_stdout();
    let stderr = handle.take_stderr();

    let collected = Mutex::new(String::new());
    let emit = |line: &str| {
        on_line(line);
        let mut all = collected.lock().unwrap_or_else(PoisonError::into_inner);
        all.push_str(line);
        all.push('\n');
    };

    let (out_res, err_res) = tokio::join!(
        read_stream("stdout", stdout, &emit),
        read_stream("stderr", stderr, &emit),
    );
    let out_bytes = out_res?;
    let err_bytes = err_res?;

    debug!(stdout_bytes = out_bytes, stderr_bytes = err_bytes, "child output drained");
    Ok(collected.into_inner().unwrap_or_else(PoisonError::into_inner))
}

/// Read one stream to completion. Returns the number of bytes read.
async fn read_stream<R, F>(name: &'static str, stream: Option<R>, emit: &F) -> Result<usize>
where
    R: AsyncRead + Unpin,
    F: Fn(&str),
{
    let Some(mut stream) = stream else {
        return Ok(0);
    };

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut lines = LineAssembler::default();
    let mut total = 0usize;

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n;
        trace!(stream = name, bytes = n, "read chunk");
        lines.push(&buf[..n], emit);
    }

    lines.finish(emit);
    Ok(total)
}

/// Turns arbitrary byte chunks into complete UTF-8 lines.
///
/// A multi-byte character split across two reads is held back until the rest
/// arrives. Invalid sequences become U+FFFD. `\r\n` endings lose the `\r`.
#[derive(Debug, Default)]
pub(crate) struct LineAssembler {
    pending: Vec<u8>,
    partial: String,
}

impl LineAssembler {
    pub(crate) fn push<F: Fn(&str)>(&mut self, chunk: &[u8], emit: &F) {
        self.pending.extend_from_slice(chunk);
        self.decode_pending();

        while let Some(idx) = self.partial.find('\n') {
            let mut line: String = self.partial.drain(..=idx).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            emit(&line);
        }
    }

    pub(crate) fn finish<F: Fn(&str)>(mut self, emit: &F) {
        if !self.pending.is_empty() {
            self.partial.push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
        if self.partial.ends_with('\r') {
            self.partial.pop();
        }
        if !self.partial.is_empty() {
            emit(&self.partial);
        }
    }

    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    self.partial.push_str(s);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.partial
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Truncated sequence at the end: wait for more bytes.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(bad) => {
                            self.partial.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                    }
                }
            }
        }
    }
}


#[cfg(all(test, unix))]
mod process_tests {
    use std::sync::Mutex;

    use super::*;
    use crate::exec::command::CommandLine;
    use crate::exec::launcher::launch;

    #[tokio::test]
    async fn drains_both_streams_and_preserves_per_stream_order() {
        let script = "for i in 1 2 3; do echo out$i; echo err$i 1>&2; done";
        let cmd = CommandLine::new("/bin/sh").arg("-c").arg(script);
        let mut handle = launch(&cmd).unwrap();

        let seen = Mutex::new(Vec::new());
        let text = drain(&mut handle, &|l: &str| seen.lock().unwrap().push(l.to_string()))
            .await
            .unwrap();
        assert_eq!(handle.wait().await.unwrap(), 0);

        let seen = seen.into_inner().unwrap();
        let outs: Vec<_> = seen.iter().filter(|l| l.starts_with("out")).collect();
        let errs: Vec<_> = seen.iter().filter(|l| l.starts_with("err")).collect();
        assert_eq!(outs, vec!["out1", "out2", "out3"]);
        assert_eq!(errs, vec!["err1", "err2", "err3"]);
        assert_eq!(text.lines().count(), 6);
    }

    #[tokio::test]
    async fn large_output_does_not_deadlock() {
        // Well past any pipe buffer; the child would block if we only read
        // after it exited.
        let script = "i=0; while [ $i -lt 20000 ]; do echo line-$i-xxxxxxxxxxxxxxxxxxxx 1>&2; i=$((i+1)); done";
        let cmd = CommandLine::new("/bin/sh").arg("-c").arg(script);
        let mut handle = launch(&cmd).unwrap();

        let text = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            drain(&mut handle, &|_: &str| {}),
        )
        .await
        .expect("drain timed out")
        .unwrap();

        assert_eq!(handle.wait().await.unwrap(), 0);
        assert_eq!(text.lines().count(), 20000);
    }

    #[tokio::test]
    async fn second_drain_is_empty() {
        let cmd = CommandLine::new("/bin/sh").arg("-c").arg("echo once");
        let mut handle = launch(&cmd).unwrap();

        let first = drain(&mut handle, &|_: &str| {}).await.unwrap();
        handle.wait().await.unwrap();
        let second = drain(&mut handle, &|_: &str| {}).await.unwrap();

        assert_eq!(first, "once\n");
        assert!(second.is_empty());
    }
}
