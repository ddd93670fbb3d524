use std::io::ErrorKind;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

use crate::core::models::{RunContext, terminate_group};

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const STDERR_TAIL_LINES: usize = 10;

pub struct CapturedOutput {
    pub stdout: String,
    pub succeeded: bool,
}

/// Executes one external command. A total function from command to bool: it
/// never raises past its own boundary. Non-zero exit is a warning, not an
/// error; callers decide usability from the artifact itself (exists and
/// non-empty). Each child runs in its own process group so a stop request
/// can terminate tools that spawn their own subprocesses.
pub struct ProcessRunner {
    ctx: RunContext,
}

impl ProcessRunner {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    /// Spawn with stdout redirected to `output` (create-or-truncate, or
    /// create-or-append), stderr merged into the same file or captured for
    /// the warning log. Returns `true` iff the exit code is 0.
    pub async fn run_to_file(
        &self,
        tool: &str,
        argv: &[String],
        output: &Path,
        append: bool,
        merge_stderr: bool,
    ) -> bool {
        let Some((program, args)) = argv.split_first() else {
            tracing::error!("[{}] empty command line", tool);
            return false;
        };
        tracing::info!("[{}] running: {}", tool, shell_words::join(argv));

        let file = match std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(!append)
            .append(append)
            .open(output)
        {
            Ok(file) => file,
            Err(err) => {
                tracing::error!("[{}] cannot open output file {}: {}", tool, output.display(), err);
                return false;
            }
        };

        let stderr = if merge_stderr {
            match file.try_clone() {
                Ok(clone) => Stdio::from(clone),
                Err(_) => Stdio::null(),
            }
        } else {
            Stdio::piped()
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(file))
            .stderr(stderr)
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                self.log_spawn_error(tool, program, &err);
                return false;
            }
        };

        let stderr_task = child.stderr.take().map(|pipe| {
            tokio::spawn(async move { collect_tail(BufReader::new(pipe)).await })
        });

        let status = self.supervise(tool, &mut child).await;

        let stderr_tail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        self.conclude(tool, status, &stderr_tail)
    }

    /// Spawn with stdout captured in memory, optionally feeding `stdin_body`
    /// to the child (the waybackurls "cat list | tool" shape).
    pub async fn run_captured(
        &self,
        tool: &str,
        argv: &[String],
        stdin_body: Option<&str>,
    ) -> CapturedOutput {
        let failed = CapturedOutput { stdout: String::new(), succeeded: false };
        let Some((program, args)) = argv.split_first() else {
            tracing::error!("[{}] empty command line", tool);
            return failed;
        };
        tracing::info!("[{}] running: {}", tool, shell_words::join(argv));

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(if stdin_body.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                self.log_spawn_error(tool, program, &err);
                return failed;
            }
        };

        if let (Some(body), Some(mut stdin)) = (stdin_body, child.stdin.take()) {
            let body = body.to_string();
            tokio::spawn(async move {
                let _ = stdin.write_all(body.as_bytes()).await;
                let _ = stdin.shutdown().await;
            });
        }

        let stdout_task = child
            .stdout
            .take()
            .map(|pipe| tokio::spawn(async move { collect_all(BufReader::new(pipe)).await }));
        let stderr_task = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(async move { collect_tail(BufReader::new(pipe)).await }));

        let status = self.supervise(tool, &mut child).await;

        let stdout = match stdout_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        let stderr_tail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        let succeeded = self.conclude(tool, status, &stderr_tail);
        CapturedOutput { stdout, succeeded }
    }

    /// Short-timeout polling wait. Every iteration checks the shared stop
    /// flag; on stop the child's whole process group is terminated and the
    /// loop keeps waiting for the exit so the caller never outruns a live
    /// process.
    async fn supervise(&self, tool: &str, child: &mut Child) -> Option<ExitStatus> {
        let pgid = child.id();
        if let Some(pgid) = pgid {
            self.ctx.register_process(pgid, tool);
        }

        let mut signalled = false;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) => {}
                Err(err) => {
                    tracing::error!("[{}] wait failed: {}", tool, err);
                    break None;
                }
            }
            if !signalled && self.ctx.cancel.is_stopped() {
                tracing::warn!("[{}] stop requested, terminating process group", tool);
                if let Some(pgid) = pgid {
                    terminate_group(pgid);
                } else {
                    let _ = child.start_kill();
                }
                signalled = true;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        };

        if let Some(pgid) = pgid {
            self.ctx.unregister_process(pgid);
        }
        status
    }

    fn log_spawn_error(&self, tool: &str, program: &str, err: &std::io::Error) {
        if err.kind() == ErrorKind::NotFound {
            tracing::error!("[{}] executable '{}' not found in PATH", tool, program);
        } else {
            tracing::error!("[{}] failed to spawn '{}': {}", tool, program, err);
        }
    }

    fn conclude(&self, tool: &str, status: Option<ExitStatus>, stderr_tail: &str) -> bool {
        match status {
            Some(status) if status.success() => true,
            Some(status) => {
                if stderr_tail.is_empty() {
                    tracing::warn!("[{}] exited with {}", tool, status);
                } else {
                    tracing::warn!("[{}] exited with {}: {}", tool, status, stderr_tail);
                }
                false
            }
            None => false,
        }
    }
}

async fn collect_tail<R>(reader: BufReader<R>) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut tail: Vec<String> = Vec::new();
    let mut lines = reader.lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tail.push(line);
        if tail.len() > STDERR_TAIL_LINES {
            tail.remove(0);
        }
    }
    tail.join("\n")
}

async fn collect_all<R>(reader: BufReader<R>) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut out = String::new();
    let mut lines = reader.lines();
    while let Ok(Some(line)) = lines.next_line().await {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cancel::CancellationController;
    use crate::core::models::TargetSpec;
    use tempfile::tempdir;

    fn ctx(dir: &Path) -> RunContext {
        RunContext::new(
            TargetSpec::Domain("example.com".to_string()),
            dir.to_path_buf(),
            CancellationController::new(dir),
        )
    }

    #[tokio::test]
    async fn redirects_stdout_to_the_output_file() {
        let dir = tempdir().unwrap();
        let runner = ProcessRunner::new(ctx(dir.path()));
        let out = dir.path().join("echo.txt");
        let argv = vec!["echo".to_string(), "a.example.com".to_string()];
        assert!(runner.run_to_file("echo", &argv, &out, false, false).await);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a.example.com\n");
    }

    #[tokio::test]
    async fn append_mode_preserves_earlier_output() {
        let dir = tempdir().unwrap();
        let runner = ProcessRunner::new(ctx(dir.path()));
        let out = dir.path().join("echo.txt");
        let first = vec!["echo".to_string(), "one".to_string()];
        let second = vec!["echo".to_string(), "two".to_string()];
        runner.run_to_file("echo", &first, &out, false, false).await;
        runner.run_to_file("echo", &second, &out, true, false).await;
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "one\ntwo\n");
    }

    #[tokio::test]
    async fn missing_executable_reports_false_without_panicking() {
        let dir = tempdir().unwrap();
        let runner = ProcessRunner::new(ctx(dir.path()));
        let out = dir.path().join("out.txt");
        let argv = vec!["definitely-not-a-real-binary-xyz".to_string()];
        assert!(!runner.run_to_file("ghost", &argv, &out, false, false).await);
    }

    #[tokio::test]
    async fn nonzero_exit_reports_false() {
        let dir = tempdir().unwrap();
        let runner = ProcessRunner::new(ctx(dir.path()));
        let argv = vec!["false".to_string()];
        let result = runner.run_captured("false", &argv, None).await;
        assert!(!result.succeeded);
    }

    #[tokio::test]
    async fn stop_terminates_a_long_running_child_promptly() {
        let dir = tempdir().unwrap();
        let context = ctx(dir.path());
        let cancel = context.cancel.clone();
        let runner = ProcessRunner::new(context);
        let out = dir.path().join("sleep.txt");
        let argv = vec!["sleep".to_string(), "30".to_string()];

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            cancel.request_stop();
        });

        let start = std::time::Instant::now();
        let ok = runner.run_to_file("sleep", &argv, &out, false, false).await;
        stopper.await.unwrap();

        assert!(!ok, "a SIGTERMed child must not count as a success");
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "stop must interrupt the wait, not ride out the child"
        );
    }

    #[tokio::test]
    async fn captured_mode_feeds_stdin_and_returns_stdout() {
        let dir = tempdir().unwrap();
        let runner = ProcessRunner::new(ctx(dir.path()));
        let argv = vec!["cat".to_string()];
        let result = runner.run_captured("cat", &argv, Some("a.example.com\n")).await;
        assert!(result.succeeded);
        assert_eq!(result.stdout, "a.example.com\n");
    }
}
