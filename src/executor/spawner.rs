//! Creating one child process per stage.
//!
//! The [`Spawner`] trait is the seam the pipeline orchestrator talks to;
//! [`ForkSpawner`] is the real implementation built on `fork` and
//! `execvpe`.

use std::ffi::CString;
use std::io::{self, Write};
use log::debug;
use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execvpe, fork, ForkResult, Pid};
use thiserror::Error;
use crate::ast::Stage;
use crate::environment::Environment;
use super::executor::ExecError;
use super::fd::StageIo;
use super::redirect::{self, RedirectError};

/// Identifies one spawned child. Not `Clone`: waiting consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: Pid,
}

impl ProcessHandle {
    pub fn new(pid: Pid) -> Self {
        ProcessHandle { pid }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }
}

/// How a child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOutcome {
    Exited(i32),
    Signaled(i32),
}

impl ChildOutcome {
    /// Shell-style status: the exit code, or 128 + signal number.
    pub fn code(self) -> i32 {
        match self {
            ChildOutcome::Exited(code) => code,
            ChildOutcome::Signaled(signal) => 128 + signal,
        }
    }
}

/// Why a child could not become the requested program. Produced inside
/// the child, reported on its stderr, and turned into its exit status.
#[derive(Debug, Error)]
pub enum ChildError {
    #[error(transparent)]
    Redirect(#[from] RedirectError),
    #[error("{program}: {}", exec_reason(.source))]
    Exec {
        program: String,
        #[source]
        source: Errno,
    },
    #[error("reset SIGPIPE: {}", .0.desc())]
    Signal(Errno),
}

fn exec_reason(errno: &Errno) -> String {
    match errno {
        Errno::ENOENT => "command not found".to_string(),
        other => other.desc().to_string(),
    }
}

impl ChildError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ChildError::Redirect(_) | ChildError::Signal(_) => 1,
            ChildError::Exec { source: Errno::ENOENT, .. } => 127,
            ChildError::Exec { .. } => 126,
        }
    }
}

pub trait Spawner {
    /// Start `stage` with the given stream wiring and return without
    /// waiting. `io` is consumed: whatever descriptors it holds are
    /// closed in the caller once this returns.
    fn spawn(&mut self, stage: &Stage, io: StageIo, env: &Environment) -> Result<ProcessHandle, ExecError>;

    /// Block until the child behind `handle` terminates.
    fn wait(&mut self, handle: ProcessHandle) -> Result<ChildOutcome, ExecError>;

    /// Reap the child if it already terminated; hand the handle back otherwise.
    fn try_wait(&mut self, handle: ProcessHandle) -> Result<Result<ChildOutcome, ProcessHandle>, ExecError>;
}

/// Everything the child needs, converted before `fork` so the child
/// does no fallible conversion work of its own.
#[derive(Debug)]
pub struct PreparedCommand {
    program: CString,
    argv: Vec<CString>,
    envp: Vec<CString>,
}

impl PreparedCommand {
    pub fn new(stage: &Stage, env: &Environment) -> Result<Self, ExecError> {
        let invalid = || ExecError::InvalidArgument(stage.program().to_string());
        let argv = stage
            .argv()
            .iter()
            .map(|arg| CString::new(arg.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        let program = argv.first().cloned().ok_or_else(invalid)?;
        let envp = env.envp().map_err(|_| invalid())?;
        Ok(PreparedCommand { program, argv, envp })
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Runs in the child: apply the wiring, then replace the program image.
    /// Only returns on failure.
    fn exec(&self, io: StageIo) -> ChildError {
        if let Err(e) = restore_default_signals() {
            return e;
        }
        if let Err(e) = redirect::apply(io) {
            return e.into();
        }
        match execvpe(&self.program, &self.argv, &self.envp) {
            Ok(never) => match never {},
            Err(source) => ChildError::Exec {
                program: self.program_name(),
                source,
            },
        }
    }
}

/// The shell process runs with SIGPIPE ignored, and an ignored signal
/// stays ignored across exec. Programs expect the default disposition.
fn restore_default_signals() -> Result<(), ChildError> {
    // SAFETY: installs SIG_DFL; no handler code is registered.
    unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) }
        .map(drop)
        .map_err(ChildError::Signal)
}

#[derive(Debug, Default)]
pub struct ForkSpawner;

impl ForkSpawner {
    pub fn new() -> Self {
        ForkSpawner
    }
}

impl Spawner for ForkSpawner {
    fn spawn(&mut self, stage: &Stage, io: StageIo, env: &Environment) -> Result<ProcessHandle, ExecError> {
        let command = PreparedCommand::new(stage, env)?;

        // SAFETY: the shell is single-threaded at this point and the child
        // only rebinds descriptors before exec or _exit.
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                let failure = command.exec(io);
                let _ = writeln!(io::stderr(), "pipesh: {failure}");
                // SAFETY: leave without running the parent's atexit handlers
                // or flushing buffers the child inherited.
                unsafe { libc::_exit(failure.exit_code()) }
            }
            Ok(ForkResult::Parent { child }) => {
                debug!("spawned '{}' as pid {}", stage.program(), child);
                drop(io);
                Ok(ProcessHandle::new(child))
            }
            Err(errno) => Err(ExecError::Fork(errno)),
        }
    }

    fn wait(&mut self, handle: ProcessHandle) -> Result<ChildOutcome, ExecError> {
        loop {
            match waitpid(handle.pid, None) {
                Ok(status) => {
                    if let Some(outcome) = outcome_of(status) {
                        debug!("pid {} finished: {:?}", handle.pid, outcome);
                        return Ok(outcome);
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(source) => {
                    return Err(ExecError::Wait {
                        pid: handle.pid.as_raw(),
                        source,
                    })
                }
            }
        }
    }

    fn try_wait(&mut self, handle: ProcessHandle) -> Result<Result<ChildOutcome, ProcessHandle>, ExecError> {
        match waitpid(handle.pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(status) => Ok(outcome_of(status).ok_or(handle)),
            Err(Errno::EINTR) => Ok(Err(handle)),
            Err(source) => Err(ExecError::Wait {
                pid: handle.pid.as_raw(),
                source,
            }),
        }
    }
}

fn outcome_of(status: WaitStatus) -> Option<ChildOutcome> {
    match status {
        WaitStatus::Exited(_, code) => Some(ChildOutcome::Exited(code)),
        WaitStatus::Signaled(_, signal, _) => Some(ChildOutcome::Signaled(signal as i32)),
        _ => None,
    }
}
