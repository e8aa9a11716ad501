//! Single-command execution with output capture
//!
//! Each invocation owns one sink file named after the command index, so any
//! number of executors can share a working directory without coordination.

use crate::core::types::{Command, ExecutionResult};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Width of the `=` rules framing each command section
pub const RULE_WIDTH: usize = 70;

/// Internal failure that prevented a command from finishing normally
#[derive(Error, Debug)]
enum ExecFailure {
    #[error("Command timed out after {} seconds", .0.as_secs_f64())]
    TimedOut(Duration),

    #[error("Error executing command: {0}")]
    Io(#[from] io::Error),
}

/// Runs commands through the platform shell, one sink per command
#[derive(Debug, Clone)]
pub struct Executor {
    work_dir: PathBuf,
    timeout: Option<Duration>,
}

impl Executor {
    pub fn new(work_dir: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            work_dir: work_dir.into(),
            timeout,
        }
    }

    /// Location of the sink for the command at `index`
    pub fn sink_path(&self, index: usize) -> PathBuf {
        self.work_dir.join(format!("cmd_{:06}.log", index))
    }

    /// Run one command to completion
    ///
    /// Never fails: spawn errors and timeouts are folded into the result
    /// with exit code -1 and a note appended to the sink.
    pub async fn execute(&self, command: &Command) -> ExecutionResult {
        let log_path = self.sink_path(command.index);
        debug!("Executing command #{}: {}", command.number(), command.text);

        match self.run(command, &log_path).await {
            Ok(exit_code) => ExecutionResult::completed(command, exit_code, log_path),
            Err(failure) => {
                let message = failure.to_string();
                if let Err(err) = append_error_note(&log_path, &message) {
                    warn!(
                        "Could not record error for command #{} in {}: {}",
                        command.number(),
                        log_path.display(),
                        err
                    );
                }
                ExecutionResult::execution_error(command, message, log_path)
            }
        }
    }

    async fn run(&self, command: &Command, log_path: &Path) -> Result<i32, ExecFailure> {
        let mut sink = File::create(log_path)?;
        sink.write_all(section_header(command).as_bytes())?;
        sink.flush()?;

        // Both handles share the sink's file offset, so stdout and stderr
        // interleave into one stream after the header.
        let stdout = sink.try_clone()?;
        let stderr = sink.try_clone()?;

        let mut shell = shell_command(&command.text);
        shell
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true);
        #[cfg(unix)]
        shell.process_group(0);
        let mut child = shell.spawn()?;
        // Dropping this mid-run (interrupt) takes the whole group down.
        let mut group = ProcessGroup::of(&child);

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    if let Err(err) = group.kill() {
                        warn!("Failed to kill timed out command #{}: {}", command.number(), err);
                    }
                    if let Err(err) = child.kill().await {
                        debug!("Reaping timed out command #{}: {}", command.number(), err);
                    }
                    return Err(ExecFailure::TimedOut(limit));
                }
            },
            None => child.wait().await?,
        };
        group.disarm();

        let exit_code = exit_code(status);
        sink.write_all(section_footer(exit_code).as_bytes())?;
        sink.flush()?;

        debug!("Command #{} exited with {}", command.number(), exit_code);
        Ok(exit_code)
    }
}

#[cfg(unix)]
fn shell_command(text: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(text);
    cmd
}

#[cfg(windows)]
fn shell_command(text: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("cmd");
    cmd.arg("/C").arg(text);
    cmd
}

/// Process group led by a spawned shell
///
/// Killing only the shell would leave subshells and pipelines running and
/// still writing to the sink. Armed until the shell has been reaped.
struct ProcessGroup {
    #[cfg(unix)]
    pgid: Option<libc::pid_t>,
}

impl ProcessGroup {
    #[cfg(unix)]
    fn of(child: &tokio::process::Child) -> Self {
        Self {
            pgid: child.id().map(|id| id as libc::pid_t),
        }
    }

    #[cfg(not(unix))]
    fn of(_child: &tokio::process::Child) -> Self {
        Self {}
    }

    /// SIGKILL every process in the group; a no-op once disarmed
    #[cfg(unix)]
    fn kill(&mut self) -> io::Result<()> {
        let Some(pgid) = self.pgid.take() else {
            return Ok(());
        };
        // SAFETY: killpg has no memory-safety preconditions; pgid is the id of
        // a shell we spawned as group leader and have not yet reaped.
        if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    fn kill(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn disarm(&mut self) {
        #[cfg(unix)]
        {
            self.pgid = None;
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if let Err(err) = self.kill() {
            debug!("Process group already gone: {}", err);
        }
    }
}

/// Map a process status to the integer recorded in results
///
/// Signal deaths follow the shell convention of `128 + signal`, keeping -1
/// free for internal failures.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    crate::core::types::EXECUTION_ERROR_CODE
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub(crate) fn section_header(command: &Command) -> String {
    format!(
        "{rule}\nCommand #{}: {}\n{rule}\n\n",
        command.number(),
        command.text,
        rule = rule()
    )
}

pub(crate) fn section_footer(exit_code: i32) -> String {
    format!("\n{rule}\nExit Code: {}\n{rule}\n\n", exit_code, rule = rule())
}

fn append_error_note(log_path: &Path, message: &str) -> io::Result<()> {
    let mut sink = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(sink, "\nERROR: {}", message)
}
