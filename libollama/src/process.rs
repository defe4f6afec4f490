//! Spawning and killing the inference service process.
//!
//! On Unix the service is started in its own process group so that the
//! whole tree (the server and any runners it forks) can be killed with one
//! signal. On Windows `taskkill /T /F` does the same.

use std::io;
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

/// A running service process owned by the supervisor.
pub trait ServiceProcess: Send {
    fn id(&self) -> u32;

    /// True once the process has exited.
    fn has_exited(&mut self) -> io::Result<bool>;

    /// Forcibly kill the process and everything it started, then reap it.
    fn terminate(&mut self) -> io::Result<()>;
}

/// Starts the service.
pub trait ProcessLauncher: Send {
    fn launch(&mut self) -> io::Result<Box<dyn ServiceProcess>>;
}

/// Launches `program args...` detached from the terminal's stdio.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    command: Vec<String>,
}

impl CommandLauncher {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl ProcessLauncher for CommandLauncher {
    fn launch(&mut self) -> io::Result<Box<dyn ServiceProcess>> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty serve command"))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let child = command.spawn()?;
        debug!(program = %program, pid = child.id(), "service process spawned");
        Ok(Box::new(ChildProcess { child }))
    }
}

/// A spawned [`Child`] whose tree is killed on [`ServiceProcess::terminate`].
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
}

impl ChildProcess {
    pub fn new(child: Child) -> Self {
        Self { child }
    }
}

impl ServiceProcess for ChildProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn has_exited(&mut self) -> io::Result<bool> {
        Ok(self.child.try_wait()?.is_some())
    }

    fn terminate(&mut self) -> io::Result<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }

        if let Err(err) = kill_tree(self.child.id()) {
            warn!(pid = self.child.id(), error = %err, "tree kill failed, killing direct child");
            if let Err(err) = self.child.kill() {
                if err.kind() != io::ErrorKind::InvalidInput {
                    return Err(err);
                }
            }
        }
        self.child.wait()?;
        Ok(())
    }
}

#[cfg(unix)]
fn kill_tree(pid: u32) -> io::Result<()> {
    let pgid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: kill(2) takes plain integers and has no memory effects. A
    // negative pid addresses the process group created at spawn time.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        // group already gone
        return Ok(());
    }
    Err(err)
}

#[cfg(windows)]
fn kill_tree(pid: u32) -> io::Result<()> {
    let status = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("taskkill exited with {status}")))
    }
}

#[cfg(not(any(unix, windows)))]
fn kill_tree(_pid: u32) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "no tree kill on this platform"))
}
