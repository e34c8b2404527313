//! Interpreter executor.
//!
//! Runs `<interpreter> ./<file name>` from inside the script's own
//! namespace directory, so relative file access by the script stays in the
//! owner's namespace and a file name beginning with `-` is never parsed as
//! an interpreter option.

use std::path::{Path, PathBuf};

use super::executor::{ScriptError, ScriptExecutor, ScriptInput, ScriptOutput};
use super::subprocess;

/// Executor that hands the script to a configured interpreter binary.
#[derive(Debug, Clone)]
pub struct InterpreterExecutor {
    interpreter_path: String,
}

impl InterpreterExecutor {
    pub fn new(interpreter_path: impl Into<String>) -> Self {
        Self {
            interpreter_path: interpreter_path.into(),
        }
    }

    pub fn interpreter_path(&self) -> &str {
        &self.interpreter_path
    }
}

impl ScriptExecutor for InterpreterExecutor {
    async fn execute(
        &self,
        script_path: &Path,
        input: ScriptInput,
    ) -> Result<ScriptOutput, ScriptError> {
        let file_name = script_path.file_name().ok_or_else(|| {
            ScriptError::Spawn(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "script path has no file name",
            ))
        })?;

        let mut cmd = std::process::Command::new(&self.interpreter_path);
        cmd.arg(PathBuf::from(".").join(file_name));
        if let Some(dir) = script_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            cmd.current_dir(dir);
        }
        subprocess::run_command(cmd, input).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;

    /// Write `body` as `name` inside a fresh temp dir.
    fn write_temp_script(name: &str, body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(name);
        std::fs::write(&path, body).expect("write script");
        (dir, path)
    }

    fn default_input() -> ScriptInput {
        ScriptInput {
            stdin: None,
            env_vars: vec![],
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn runs_script_through_interpreter() {
        let (_dir, path) = write_temp_script("hello.sh", "printf hello");
        let output = InterpreterExecutor::new("/bin/sh")
            .execute(&path, default_input())
            .await
            .expect("execute");
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout, b"hello");
    }

    #[tokio::test]
    async fn runs_from_the_script_directory() {
        let (dir, path) = write_temp_script("where.sh", "pwd");
        let output = InterpreterExecutor::new("/bin/sh")
            .execute(&path, default_input())
            .await
            .expect("execute");
        let expected = dir.path().canonicalize().expect("canonicalize dir");
        let actual = std::path::PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        assert_eq!(actual.canonicalize().expect("canonicalize pwd"), expected);
    }

    #[tokio::test]
    async fn dash_prefixed_name_is_not_an_option() {
        let (_dir, path) = write_temp_script("-c.sh", "printf safe");
        let output = InterpreterExecutor::new("/bin/sh")
            .execute(&path, default_input())
            .await
            .expect("execute");
        assert_eq!(output.stdout, b"safe");
    }

    #[tokio::test]
    async fn missing_interpreter_is_a_spawn_error() {
        let (_dir, path) = write_temp_script("x.sh", "true");
        let result = InterpreterExecutor::new("/nonexistent/php")
            .execute(&path, default_input())
            .await;
        assert_matches!(result, Err(ScriptError::Spawn(_)));
    }
}
