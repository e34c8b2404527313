//! Process supervision shared by every executor.
//!
//! [`run_command`] spawns the child as the leader of a fresh process group,
//! feeds stdin from a separate task, drains stdout/stderr in spawned tasks
//! and races the whole run against the deadline. Whether the script exits,
//! times out or its caller goes away, the entire group is killed so no
//! descendant outlives the invocation.

use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use super::executor::{ScriptError, ScriptInput, ScriptOutput};

/// Spawn `cmd`, supervise it under `input.timeout`, and collect its output.
///
/// The caller sets program, arguments and working directory; stdio,
/// environment overrides and process-group placement are applied here.
/// Output is returned in full; callers decide whether to cap it.
pub async fn run_command(
    mut cmd: std::process::Command,
    input: ScriptInput,
) -> Result<ScriptOutput, ScriptError> {
    let stdin_mode = if input.stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    };
    cmd.stdin(stdin_mode)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    for (key, value) in &input.env_vars {
        cmd.env(key, value);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut cmd = tokio::process::Command::from(cmd);
    cmd.kill_on_drop(true);

    let start = Instant::now();
    let deadline = tokio::time::Instant::now() + input.timeout;

    let mut child = cmd.spawn().map_err(ScriptError::Spawn)?;
    // Declared after `child` so it drops first: if this future is cancelled
    // the group is killed while the unreaped leader still pins its pgid.
    let pid = child.id();
    let mut group = GroupGuard::new(pid);

    // Best-effort write; a script that never reads stdin closes the pipe early.
    if let (Some(mut pipe), Some(bytes)) = (child.stdin.take(), input.stdin) {
        tokio::spawn(async move {
            let _ = pipe.write_all(&bytes).await;
            let _ = pipe.shutdown().await;
        });
    }

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let run = async {
        let status = child.wait().await.map_err(ScriptError::Io)?;
        // Reap stragglers so they cannot keep the pipes open. The leader is
        // already reaped here, so if every member has also exited the pgid
        // could in principle be recycled before this signal lands. Linux
        // keeps a pid allocated while it names a live group, so the window
        // needs an empty group plus a full pid wrap-around in between.
        group.kill();
        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        Ok::<_, ScriptError>((status, stdout, stderr))
    };

    let outcome = tokio::time::timeout_at(deadline, run).await;
    match outcome {
        Ok(Ok((status, stdout, stderr))) => Ok(ScriptOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
            duration_ms: start.elapsed().as_millis() as u64,
        }),
        Ok(Err(e)) => {
            group.kill();
            Err(e)
        }
        Err(_elapsed) => {
            group.kill();
            let _ = child.kill().await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            tracing::warn!(pid = ?pid, elapsed_ms, "Script exceeded its budget, process group killed");
            Err(ScriptError::Timeout { elapsed_ms })
        }
    }
}

/// Kills the child's process group exactly once: explicitly via
/// [`GroupGuard::kill`], or on drop when the supervising future is cancelled.
struct GroupGuard {
    pgid: Option<u32>,
}

impl GroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid {
            tracing::debug!(pgid, "Supervision cancelled, killing process group");
        }
        self.kill();
    }
}

/// Send `SIGKILL` to every process in the group led by `pgid`.
#[cfg(unix)]
pub fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // Safety: killpg only delivers a signal; an empty group yields ESRCH.
    let ret = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pgid, error = %err, "Failed to kill process group");
        }
    }
}

/// Without process groups only the direct child is killed (via `kill_on_drop`).
#[cfg(not(unix))]
pub fn kill_process_group(_pgid: u32) {}

/// Read an entire output stream into a byte buffer.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = h.read_to_end(&mut buf).await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;

    fn sh(script: &str) -> std::process::Command {
        let mut cmd = std::process::Command::new("/bin/sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    fn input(stdin: Option<&[u8]>, timeout: Duration) -> ScriptInput {
        ScriptInput {
            stdin: stdin.map(<[u8]>::to_vec),
            env_vars: vec![],
            timeout,
        }
    }

    #[tokio::test]
    async fn captures_stdout_byte_exact() {
        let output = run_command(sh("printf X"), input(None, Duration::from_secs(5)))
            .await
            .expect("run");
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout, b"X");
        assert!(output.stderr.is_empty());
    }

    #[tokio::test]
    async fn pipes_stdin() {
        let output = run_command(sh("cat"), input(Some(b"hello body"), Duration::from_secs(5)))
            .await
            .expect("run");
        assert_eq!(output.stdout, b"hello body");
    }

    #[tokio::test]
    async fn null_stdin_reads_empty() {
        let output = run_command(sh("wc -c | tr -d ' '"), input(None, Duration::from_secs(5)))
            .await
            .expect("run");
        assert_eq!(output.stdout, b"0\n");
    }

    #[tokio::test]
    async fn env_overrides_are_applied() {
        let mut inp = input(None, Duration::from_secs(5));
        inp.env_vars.push(("MY_VAR".to_string(), "hello_world".to_string()));
        let output = run_command(sh("printf %s \"$MY_VAR\""), inp).await.expect("run");
        assert_eq!(output.stdout, b"hello_world");
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported() {
        let output = run_command(sh("echo err >&2; exit 3"), input(None, Duration::from_secs(5)))
            .await
            .expect("run");
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr, b"err\n");
    }

    #[tokio::test]
    async fn timeout_kills_the_process() {
        let started = Instant::now();
        let result = run_command(sh("sleep 30"), input(None, Duration::from_millis(300))).await;
        assert_matches!(result, Err(ScriptError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn background_descendant_does_not_hold_the_run_open() {
        let started = Instant::now();
        let output = run_command(
            sh("sleep 30 & printf done"),
            input(None, Duration::from_secs(10)),
        )
        .await
        .expect("run");
        assert_eq!(output.stdout, b"done");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let cmd = std::process::Command::new("/nonexistent/interpreter");
        let result = run_command(cmd, input(None, Duration::from_secs(1))).await;
        assert_matches!(result, Err(ScriptError::Spawn(_)));
    }
}
