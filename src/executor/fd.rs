//! Owned descriptor handles passed between the executor components.
//!
//! Every descriptor the shell creates lives in an [`OwnedFd`] held by
//! exactly one value below. Handing a descriptor to a child means moving
//! it into a [`StageIo`]; the parent's copy is closed when that value is
//! dropped at the end of the spawn call.

use std::fmt;
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};
use log::{trace, warn};
use nix::fcntl::OFlag;
use nix::unistd::{dup2, pipe2};
use crate::ast::Stage;
use super::executor::ExecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Input,
    Output,
}

impl Stream {
    pub fn fileno(self) -> RawFd {
        match self {
            Stream::Input => libc::STDIN_FILENO,
            Stream::Output => libc::STDOUT_FILENO,
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Input => write!(f, "stdin"),
            Stream::Output => write!(f, "stdout"),
        }
    }
}

/// Both ends of a freshly created pipe. Close-on-exec is set on both, so
/// only the copies installed with `dup2` survive into a new program.
#[derive(Debug)]
pub struct Pipe {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

impl Pipe {
    pub fn open() -> Result<Self, ExecError> {
        let (read, write) = pipe2(OFlag::O_CLOEXEC).map_err(ExecError::Pipe)?;
        trace!("pipe created: read={} write={}", read.as_raw_fd(), write.as_raw_fd());
        Ok(Pipe { read, write })
    }
}

/// Where one standard stream of a stage comes from or goes to.
#[derive(Debug)]
pub enum Binding {
    /// Keep whatever the running process already has.
    Inherit,
    /// A pipe end owned by this binding.
    Pipe(OwnedFd),
    /// A file opened by the process that applies the binding.
    File(PathBuf),
}

impl Binding {
    /// A file redirection always beats a pipe end. A pipe end that loses
    /// is dropped here, closing the parent's copy right away.
    pub fn choose(file: Option<&Path>, pipe: Option<OwnedFd>) -> Self {
        match (file, pipe) {
            (Some(path), _) => Binding::File(path.to_path_buf()),
            (None, Some(fd)) => Binding::Pipe(fd),
            (None, None) => Binding::Inherit,
        }
    }

    pub fn is_inherit(&self) -> bool {
        matches!(self, Binding::Inherit)
    }
}

/// The complete stdin/stdout wiring of one stage.
#[derive(Debug)]
pub struct StageIo {
    pub stdin: Binding,
    pub stdout: Binding,
}

impl StageIo {
    pub fn inherit() -> Self {
        StageIo {
            stdin: Binding::Inherit,
            stdout: Binding::Inherit,
        }
    }

    /// Combine the stage's own redirections with the pipe ends handed
    /// to it by its neighbours.
    pub fn resolve(stage: &Stage, upstream: Option<OwnedFd>, downstream: Option<OwnedFd>) -> Self {
        StageIo {
            stdin: Binding::choose(stage.input_file(), upstream),
            stdout: Binding::choose(stage.output_file(), downstream),
        }
    }
}

/// Saved copies of the shell's own stdin and stdout.
///
/// Restoring happens in [`StdioGuard::restore`] or, failing that, on drop,
/// so a redirected built-in can never leave the shell's streams bound to
/// a file.
#[derive(Debug)]
pub struct StdioGuard {
    saved: Option<(OwnedFd, OwnedFd)>,
}

impl StdioGuard {
    /// Duplicate fd 0 and fd 1. Fails if either duplication fails.
    pub fn save() -> io::Result<Self> {
        io::stdout().flush()?;
        let stdin = io::stdin().as_fd().try_clone_to_owned();
        let stdout = io::stdout().as_fd().try_clone_to_owned();
        match (stdin, stdout) {
            (Ok(stdin), Ok(stdout)) => {
                trace!("saved stdio as {} and {}", stdin.as_raw_fd(), stdout.as_raw_fd());
                Ok(StdioGuard {
                    saved: Some((stdin, stdout)),
                })
            }
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }

    pub fn restore(mut self) -> nix::Result<()> {
        self.restore_saved()
    }

    fn restore_saved(&mut self) -> nix::Result<()> {
        let Some((stdin, stdout)) = self.saved.take() else {
            return Ok(());
        };
        // Anything still buffered belongs to the redirected stream.
        let _ = io::stdout().flush();
        let restored_in = dup2(stdin.as_raw_fd(), libc::STDIN_FILENO);
        let restored_out = dup2(stdout.as_raw_fd(), libc::STDOUT_FILENO);
        restored_in.and(restored_out).map(drop)
    }
}

impl Drop for StdioGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore_saved() {
            warn!("failed to restore shell stdio: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_ends_are_distinct_and_cloexec() {
        let pipe = Pipe::open().unwrap();
        assert_ne!(pipe.read.as_raw_fd(), pipe.write.as_raw_fd());
        for fd in [&pipe.read, &pipe.write] {
            let flags = nix::fcntl::fcntl(fd.as_raw_fd(), nix::fcntl::FcntlArg::F_GETFD).unwrap();
            assert_ne!(flags & libc::FD_CLOEXEC, 0);
        }
    }

    #[test]
    fn test_file_redirection_beats_pipe() {
        let pipe = Pipe::open().unwrap();
        let binding = Binding::choose(Some(Path::new("out.txt")), Some(pipe.write));
        assert!(matches!(binding, Binding::File(ref p) if p == Path::new("out.txt")));
    }

    #[test]
    fn test_choose_pipe_and_inherit() {
        let pipe = Pipe::open().unwrap();
        assert!(matches!(Binding::choose(None, Some(pipe.read)), Binding::Pipe(_)));
        assert!(Binding::choose(None, None).is_inherit());
    }

    #[test]
    fn test_resolve_stage_io() {
        let pipe = Pipe::open().unwrap();
        let stage = Stage::new("tr", vec![]).with_output("upper.txt");
        let io = StageIo::resolve(&stage, Some(pipe.read), Some(pipe.write));
        assert!(matches!(io.stdin, Binding::Pipe(_)));
        assert!(matches!(io.stdout, Binding::File(_)));
    }

    #[test]
    fn test_stream_filenos() {
        assert_eq!(Stream::Input.fileno(), 0);
        assert_eq!(Stream::Output.fileno(), 1);
        assert_eq!(Stream::Output.to_string(), "stdout");
    }
}
