//! Runs `akavecli` as a child process and turns its console output into a
//! [`CommandOutput`].

use std::{
    io,
    path::PathBuf,
    process::Stdio,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Command,
};
use tracing::{debug, error, info};

use crate::{
    error::{IpcError, Result},
    parser::{self, CommandOutput, ParserKind, UPLOAD_SUCCESS_MARKER},
};

/// Default binary name, resolved through `PATH`.
pub const DEFAULT_CLI_PATH: &str = "akavecli";

const READ_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Exit status and combined output of a finished CLI process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// stdout followed by stderr, trimmed.
    pub output: String,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct CliRunner {
    cli_path: PathBuf,
}

impl Default for CliRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CLI_PATH)
    }
}

impl CliRunner {
    pub fn new(cli_path: impl Into<PathBuf>) -> Self {
        Self {
            cli_path: cli_path.into(),
        }
    }

    /// Run the CLI with `args` and decode its output with `kind`.
    ///
    /// A zero exit whose output does not decode resolves to
    /// [`CommandOutput::Raw`] instead of failing. A non-zero exit fails with
    /// the CLI's own output as the message.
    pub async fn execute(&self, args: &[String], kind: ParserKind) -> Result<CommandOutput> {
        let command_id = nanoid::nanoid!(7);
        info!(
            command_id = %command_id,
            "Executing {} {} command",
            args.get(1).map(String::as_str).unwrap_or_default(),
            args.get(2).map(String::as_str).unwrap_or_default()
        );

        let result = self.run(args, &command_id).await.inspect_err(|e| {
            error!(command_id = %command_id, error = %e, "Process error");
        })?;

        if result.success() {
            info!(command_id = %command_id, "Command completed successfully");
            return Ok(parser::parse(&result.output, kind).unwrap_or_else(|e| {
                debug!(command_id = %command_id, error = %e, "returning raw output");
                CommandOutput::raw(&result.output)
            }));
        }

        match result.exit_code {
            Some(code) => error!(command_id = %command_id, "Command failed with code: {}", code),
            None => error!(command_id = %command_id, "Command terminated by signal"),
        }
        Err(IpcError::CommandFailed {
            code: result.exit_code,
            output: result.output,
        })
    }

    /// Spawn the CLI and wait for it to exit, draining stdout and stderr
    /// concurrently into separate buffers.
    ///
    /// The child is killed if this future is dropped before it exits.
    pub async fn run(&self, args: &[String], command_id: &str) -> Result<ExecResult> {
        let mut child = Command::new(&self.cli_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => IpcError::CliNotFound,
                _ => IpcError::Spawn { source: e },
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout, stderr, status) = tokio::try_join!(
            drain(stdout, OutputStream::Stdout, command_id),
            drain(stderr, OutputStream::Stderr, command_id),
            child.wait(),
        )?;

        let mut output = String::from_utf8_lossy(&stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&stderr));
        Ok(ExecResult {
            exit_code: status.code(),
            output: output.trim().to_string(),
        })
    }
}

async fn drain<R: AsyncRead + Unpin>(
    reader: Option<R>,
    stream: OutputStream,
    command_id: &str,
) -> io::Result<Vec<u8>> {
    let mut collected = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(collected);
    };

    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&chunk[..n]);
        // upload success is reported on stderr; it is not an error
        if stream == OutputStream::Stderr && text.contains(UPLOAD_SUCCESS_MARKER) {
            continue;
        }
        debug!(
            command_id = %command_id,
            stream = stream.as_str(),
            output = %text.trim(),
            "Command output"
        );
    }
    Ok(collected)
}

#[cfg(all(test, unix))]
mod tests {
    use std::{os::unix::fs::PermissionsExt, time::Duration};

    use tempfile::TempDir;

    use super::*;
    use crate::test_support::fake_cli;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_success_is_parsed() {
        let dir = TempDir::new().unwrap();
        let cli = fake_cli(&dir, "echo 'Bucket: Name=a, Created=x'");
        let runner = CliRunner::new(cli);

        let out = runner
            .execute(&args(&["ipc", "bucket", "view", "a"]), ParserKind::ViewBucket)
            .await
            .unwrap();
        assert_eq!(out.as_record().unwrap().name(), Some("a"));
    }

    #[tokio::test]
    async fn test_unparsable_success_becomes_raw() {
        let dir = TempDir::new().unwrap();
        let cli = fake_cli(&dir, "echo 'something unexpected'");
        let runner = CliRunner::new(cli);

        let out = runner
            .execute(&args(&["ipc", "bucket", "view", "a"]), ParserKind::ViewBucket)
            .await
            .unwrap();
        assert_eq!(out, CommandOutput::raw("something unexpected"));
    }

    #[tokio::test]
    async fn test_failure_without_output() {
        let dir = TempDir::new().unwrap();
        let cli = fake_cli(&dir, "exit 1");
        let runner = CliRunner::new(cli);

        let err = runner
            .execute(&args(&["ipc", "bucket", "list"]), ParserKind::ListBuckets)
            .await
            .unwrap_err();
        assert!(matches!(err, IpcError::CommandFailed { code: Some(1), .. }));
        assert_eq!(err.to_string(), "CLI exited with 1");
    }

    #[tokio::test]
    async fn test_failure_surfaces_cli_output() {
        let dir = TempDir::new().unwrap();
        let cli = fake_cli(&dir, "echo 'Error: bucket not found' >&2\nexit 3");
        let runner = CliRunner::new(cli);

        let err = runner
            .execute(&args(&["ipc", "bucket", "view", "x"]), ParserKind::ViewBucket)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: bucket not found");
    }

    #[tokio::test]
    async fn test_stdout_precedes_stderr() {
        let dir = TempDir::new().unwrap();
        let cli = fake_cli(&dir, "echo second >&2\necho first");
        let runner = CliRunner::new(cli);

        let result = runner.run(&args(&["ipc"]), "test").await.unwrap();
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.output, "first\nsecond");
    }

    #[tokio::test]
    async fn test_upload_success_on_stderr() {
        let dir = TempDir::new().unwrap();
        let cli = fake_cli(
            &dir,
            "echo 'File uploaded successfully: Name=a.txt, Size=3' >&2",
        );
        let runner = CliRunner::new(cli);

        let out = runner
            .execute(
                &args(&["ipc", "file", "upload", "b", "/tmp/a.txt"]),
                ParserKind::UploadFile,
            )
            .await
            .unwrap();
        assert_eq!(out.as_record().unwrap().get("Size"), Some("3"));
    }

    #[tokio::test]
    async fn test_arguments_are_not_shell_interpreted() {
        let dir = TempDir::new().unwrap();
        let cli = fake_cli(&dir, "printf '%s\\n' \"$4\"");
        let runner = CliRunner::new(cli);

        let result = runner
            .run(&args(&["ipc", "bucket", "view", "$(echo pwned); ls"]), "test")
            .await
            .unwrap();
        assert_eq!(result.output, "$(echo pwned); ls");
    }

    #[tokio::test]
    async fn test_signal_termination_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let cli = fake_cli(&dir, "kill -9 $$");
        let runner = CliRunner::new(cli);

        let err = runner
            .execute(&args(&["ipc", "bucket", "list"]), ParserKind::ListBuckets)
            .await
            .unwrap_err();
        assert!(matches!(err, IpcError::CommandFailed { code: None, .. }));
        assert_eq!(err.to_string(), "CLI terminated by signal");
    }

    #[tokio::test]
    async fn test_dropping_the_call_kills_the_child() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("marker");
        let cli = fake_cli(&dir, &format!("sleep 2\ntouch '{}'", marker.display()));
        let runner = CliRunner::new(cli);

        let result = tokio::time::timeout(
            Duration::from_millis(300),
            runner.run(&args(&["ipc", "bucket", "list"]), "test"),
        )
        .await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_non_executable_binary_is_a_spawn_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("akavecli");
        std::fs::write(&path, "#!/bin/sh\necho hi\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        let runner = CliRunner::new(path);

        let err = runner
            .execute(&args(&["ipc", "bucket", "list"]), ParserKind::ListBuckets)
            .await
            .unwrap_err();
        assert!(matches!(err, IpcError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let runner = CliRunner::new("/nonexistent/akavecli");
        let err = runner
            .execute(&args(&["ipc", "bucket", "list"]), ParserKind::ListBuckets)
            .await
            .unwrap_err();
        assert!(matches!(err, IpcError::CliNotFound));
    }
}
