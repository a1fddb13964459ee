//! External process byte streams
//!
//! Runs a program with stdout piped and exposes stdout as a `MediaStream`.
//! The stream owns the child: dropping it (for example when an HTTP client
//! disconnects) kills the process. An optional input stream is copied into
//! the child's stdin by a feeder task, one awaited write at a time, so the
//! input is only pulled as fast as the child consumes it.

use std::process::Stdio;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;

use crate::error::MediaError;
use crate::fetch::MediaStream;

/// Bytes of stderr kept for error classification
const STDERR_TAIL_BYTES: usize = 8 * 1024;

/// Maps a failed process's stderr to an error kind
pub type Classifier = fn(&str) -> MediaError;

/// How to run one external program
pub struct ProcessOptions {
    /// Short program name used in logs and errors
    pub label: &'static str,
    /// Read size for stdout
    pub chunk_size: usize,
    /// Turns stderr of a failed run into an error
    pub classify: Classifier,
    /// Bytes written to the child's stdin
    pub input: Option<MediaStream>,
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct Running {
    label: &'static str,
    child: Child,
    stdout: ReaderStream<ChildStdout>,
    stderr: JoinHandle<String>,
    feeder: Option<AbortOnDrop<Result<(), MediaError>>>,
    classify: Classifier,
    finished: bool,
}

/// Spawn `command` and stream its stdout.
///
/// The stream ends cleanly when the process exits successfully. Otherwise
/// its last item is an error: the input stream's error if the feeder hit
/// one, or the classified stderr of the failed process.
pub fn spawn_stream(mut command: Command, options: ProcessOptions) -> Result<MediaStream, MediaError> {
    let ProcessOptions {
        label,
        chunk_size,
        classify,
        input,
    } = options;

    command
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| {
        tracing::warn!("Failed to spawn {}: {}", label, e);
        MediaError::Spawn(format!("{}: {}", label, e))
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| MediaError::Spawn(format!("{}: stdout not captured", label)))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| MediaError::Spawn(format!("{}: stderr not captured", label)))?;

    let feeder = match input {
        Some(input) => {
            let stdin = child
                .stdin
                .take()
                .ok_or_else(|| MediaError::Spawn(format!("{}: stdin not captured", label)))?;
            Some(AbortOnDrop(tokio::spawn(feed_stdin(label, input, stdin))))
        }
        None => None,
    };

    tracing::debug!(pid = child.id(), "{} started", label);

    let running = Running {
        label,
        child,
        stdout: ReaderStream::with_capacity(stdout, chunk_size.max(1)),
        stderr: tokio::spawn(collect_stderr(label, stderr)),
        feeder,
        classify,
        finished: false,
    };

    Ok(stream::unfold(running, next_chunk).boxed())
}

async fn next_chunk(mut running: Running) -> Option<(Result<Bytes, MediaError>, Running)> {
    if running.finished {
        return None;
    }

    match running.stdout.next().await {
        Some(Ok(chunk)) => Some((Ok(chunk), running)),
        Some(Err(e)) => {
            running.finished = true;
            Some((Err(MediaError::Io(e)), running))
        }
        None => {
            running.finished = true;
            finish(&mut running).await.map(|err| (Err(err), running))
        }
    }
}

/// Reap the child after stdout closed; `Some` when the run failed.
async fn finish(running: &mut Running) -> Option<MediaError> {
    // An input failure explains whatever the child did afterwards.
    if let Some(feeder) = running.feeder.as_mut() {
        match (&mut feeder.0).await {
            Ok(Err(err)) => {
                let _ = running.child.kill().await;
                return Some(err);
            }
            Ok(Ok(())) => {}
            Err(e) => tracing::warn!("{} input task failed: {}", running.label, e),
        }
    }

    let status = match running.child.wait().await {
        Ok(status) => status,
        Err(e) => return Some(MediaError::Io(e)),
    };
    if status.success() {
        tracing::debug!("{} exited cleanly", running.label);
        return None;
    }

    let stderr = (&mut running.stderr).await.unwrap_or_default();
    tracing::warn!(
        code = status.code(),
        "{} failed: {}",
        running.label,
        stderr.trim()
    );
    let message = if stderr.trim().is_empty() {
        format!("{} exited with {}", running.label, status)
    } else {
        stderr
    };
    Some((running.classify)(&message))
}

/// Copy `input` into the child's stdin until either side ends.
async fn feed_stdin(
    label: &'static str,
    mut input: MediaStream,
    mut stdin: ChildStdin,
) -> Result<(), MediaError> {
    while let Some(chunk) = input.next().await {
        let chunk = chunk?;
        if let Err(e) = stdin.write_all(&chunk).await {
            // The child stopped reading; its exit status reports why.
            tracing::debug!("{} closed stdin early: {}", label, e);
            return Ok(());
        }
    }
    if let Err(e) = stdin.shutdown().await {
        tracing::debug!("{} stdin shutdown: {}", label, e);
    }
    Ok(())
}

/// Log stderr lines and keep the tail for error reporting.
///
/// Lines are decoded lossily and the pipe is drained to EOF, so odd bytes in
/// a title never close stderr under a still-running child.
async fn collect_stderr(label: &'static str, stderr: ChildStderr) -> String {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut tail = String::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                tracing::debug!("{}: {}", label, line);
                tail.push_str(line);
                tail.push('\n');
                if tail.len() > STDERR_TAIL_BYTES {
                    let mut cut = tail.len() - STDERR_TAIL_BYTES;
                    while !tail.is_char_boundary(cut) {
                        cut += 1;
                    }
                    tail.drain(..cut);
                }
            }
            Err(e) => {
                tracing::debug!("{} stderr read error: {}", label, e);
                break;
            }
        }
    }
    tail
}

#[cfg(all(test, unix))]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Write an executable shell script into `dir`.
    pub(crate) fn script(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "#!/bin/sh").unwrap();
            file.write_all(body.as_bytes()).unwrap();
            file.sync_all().unwrap();
        }
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn upstream(message: &str) -> MediaError {
        MediaError::Upstream(message.to_string())
    }

    fn options(input: Option<MediaStream>) -> ProcessOptions {
        ProcessOptions {
            label: "test",
            chunk_size: 4,
            classify: upstream,
            input,
        }
    }

    async fn collect(stream: MediaStream) -> (Vec<u8>, Option<MediaError>) {
        let mut stream = stream;
        let mut out = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => out.extend_from_slice(&chunk),
                Err(e) => return (out, Some(e)),
            }
        }
        (out, None)
    }

    #[tokio::test]
    async fn test_stdout_is_streamed() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, "hello", "printf 'hello world'\n");

        let stream = spawn_stream(Command::new(program), options(None)).unwrap();
        let (out, err) = collect(stream).await;
        assert_eq!(out, b"hello world");
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_failure_is_classified_from_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, "fail", "echo 'ERROR: boom' >&2\nexit 3\n");

        let stream = spawn_stream(Command::new(program), options(None)).unwrap();
        let (out, err) = collect(stream).await;
        assert!(out.is_empty());
        match err {
            Some(MediaError::Upstream(message)) => assert!(message.contains("boom")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stdin_is_fed_from_input() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, "cat", "exec cat\n");
        let input: MediaStream = stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Ok(Bytes::from_static(b"def")),
        ])
        .boxed();

        let stream = spawn_stream(Command::new(program), options(Some(input))).unwrap();
        let (out, err) = collect(stream).await;
        assert_eq!(out, b"abcdef");
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_input_error_wins_over_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, "cat", "exec cat\n");
        let input: MediaStream = stream::iter(vec![Err(MediaError::NotFound(
            "Video unavailable".to_string(),
        ))])
        .boxed();

        let stream = spawn_stream(Command::new(program), options(Some(input))).unwrap();
        let (out, err) = collect(stream).await;
        assert!(out.is_empty());
        assert!(matches!(err, Some(MediaError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_utf8_stderr_is_still_classified() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(
            &dir,
            "garbled",
            "printf 'WARNING: title \\377\\376\\n' >&2\n\
             echo 'ERROR: [youtube] x: Video unavailable' >&2\n\
             exit 1\n",
        );
        let classify: Classifier = |stderr| {
            if stderr.contains("Video unavailable") {
                MediaError::NotFound(stderr.to_string())
            } else {
                MediaError::Upstream(stderr.to_string())
            }
        };

        let stream = spawn_stream(
            Command::new(program),
            ProcessOptions {
                classify,
                ..options(None)
            },
        )
        .unwrap();
        let (out, err) = collect(stream).await;
        assert!(out.is_empty());
        match err {
            Some(MediaError::NotFound(message)) => {
                assert!(message.contains("WARNING: title"));
                assert!(message.contains('\u{FFFD}'));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropping_stream_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let program = script(
            &dir,
            "slow",
            &format!("printf 'data'\nsleep 1\ntouch '{}'\n", marker.display()),
        );

        let mut stream = spawn_stream(Command::new(program), options(None)).unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from_static(b"data"));
        drop(stream);

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let result = spawn_stream(
            Command::new("/nonexistent/definitely-not-here"),
            options(None),
        );
        assert!(matches!(result, Err(MediaError::Spawn(_))));
    }
}
