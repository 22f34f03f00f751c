use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, ChildStdout, Command};

/// Environment variable carrying the text of the clicked word into a restarted command.
pub const SELECTED_ENV: &str = "OVERTEXT_SELECTED";

/// How a run ended. Exit codes and signals are treated alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    pub status: ExitStatus,
}

/// Lifecycle control over at most one child process.
pub trait ProcessControl {
    /// Starts the command. `selected` is exported as [SELECTED_ENV] when present.
    fn spawn(&mut self, selected: Option<&str>) -> Result<()>;

    /// Asks the running child to terminate. A no-op once it has been reaped.
    fn terminate(&mut self) -> Result<()>;

    /// Collects the child's exit without blocking. `None` while it is still running or
    /// when there is no child.
    fn reap(&mut self) -> Result<Option<ExitInfo>>;

    /// Drops the read end of the output pipe after end of stream.
    fn close_output(&mut self);
}

/// The live child: its pid and the read end of its stdout.
#[derive(Debug)]
pub struct ProcessHandle {
    pub pid: u32,
    pub output: Option<ChildStdout>,
}

/// Runs the command with stdout on a pipe.
pub struct Supervisor {
    argv: Vec<String>,
    child: Option<Child>,
    handle: Option<ProcessHandle>,
}

impl Supervisor {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            child: None,
            handle: None,
        }
    }

    pub fn handle(&self) -> Option<&ProcessHandle> {
        self.handle.as_ref()
    }

    /// The output pipe of the current run, while it is open.
    pub fn output_mut(&mut self) -> Option<&mut ChildStdout> {
        self.handle.as_mut().and_then(|h| h.output.as_mut())
    }

    fn release_handle(&mut self) {
        let output_open = self.handle.as_ref().is_some_and(|h| h.output.is_some());
        if self.child.is_none() && !output_open {
            self.handle = None;
        }
    }
}

impl ProcessControl for Supervisor {
    fn spawn(&mut self, selected: Option<&str>) -> Result<()> {
        if self.handle.is_some() {
            bail!("refusing to start a second child while one is still live");
        }
        let (program, args) = self
            .argv
            .split_first()
            .context("no command to run")?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            // stderr would scribble over the terminal we draw on
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(selected) = selected {
            command.env(SELECTED_ENV, selected);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to run `{program}`"))?;
        let output = child.stdout.take().context("child has no stdout pipe")?;
        let pid = child.id().context("child exited before it could be tracked")?;
        info!("started `{}` as pid {pid}", self.argv.join(" "));

        self.child = Some(child);
        self.handle = Some(ProcessHandle {
            pid,
            output: Some(output),
        });
        Ok(())
    }

    fn terminate(&mut self) -> Result<()> {
        let Some(pid) = self.child.as_ref().and_then(Child::id) else {
            return Ok(());
        };
        debug!("sending SIGTERM to pid {pid}");
        let pid = libc::pid_t::try_from(pid).context("pid out of range")?;
        // SAFETY: plain syscall on a pid we own and have not reaped yet.
        if unsafe { libc::kill(pid, libc::SIGTERM) } == -1 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ESRCH) {
                return Err(err).context("failed to signal child");
            }
        }
        Ok(())
    }

    fn reap(&mut self) -> Result<Option<ExitInfo>> {
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };
        let Some(status) = child.try_wait().context("failed to wait for child")? else {
            return Ok(None);
        };
        info!("child exited with {status}");
        self.child = None;
        self.release_handle();
        Ok(Some(ExitInfo { status }))
    }

    fn close_output(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.output = None;
        }
        self.release_handle();
    }
}
