//! Binding a stage's stdin/stdout inside the process that will run it.
//!
//! For a forked child the change is permanent. For a built-in running in
//! the shell itself the caller brackets [`apply`] with a
//! [`StdioGuard`](super::fd::StdioGuard).

use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use nix::fcntl::{fcntl, open, FcntlArg, FdFlag, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::dup2;
use thiserror::Error;
use super::fd::{Binding, StageIo, Stream};

#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("open {path}: {source}", path = .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },
    #[error("dup2 {stream}: {source}")]
    Dup {
        stream: Stream,
        #[source]
        source: nix::Error,
    },
}

/// Install `io` as the current process's stdin and stdout.
///
/// Input is handled first; if it fails the output side is left alone.
pub fn apply(io: StageIo) -> Result<(), RedirectError> {
    let StageIo { stdin, stdout } = io;
    bind(stdin, Stream::Input)?;
    bind(stdout, Stream::Output)
}

fn bind(binding: Binding, stream: Stream) -> Result<(), RedirectError> {
    let fd = match binding {
        Binding::Inherit => return Ok(()),
        Binding::Pipe(fd) => fd,
        Binding::File(path) => open_target(&path, stream)?,
    };
    install(fd, stream)
}

/// Open a redirection target: read-only for input; for output
/// write-only, created if missing and truncated, mode 0666 before umask.
pub fn open_target(path: &Path, stream: Stream) -> Result<OwnedFd, RedirectError> {
    let (flags, mode) = match stream {
        Stream::Input => (OFlag::O_RDONLY, Mode::empty()),
        Stream::Output => (
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            Mode::from_bits_truncate(0o666),
        ),
    };
    let raw = open(path, flags | OFlag::O_CLOEXEC, mode).map_err(|source| RedirectError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    // SAFETY: `open` just returned this descriptor and nothing else owns it.
    Ok(unsafe { OwnedFd::from_raw_fd(raw) })
}

fn install(fd: OwnedFd, stream: Stream) -> Result<(), RedirectError> {
    let target = stream.fileno();
    if fd.as_raw_fd() == target {
        // Already in place: keep it open, and open across exec.
        let raw = fd.into_raw_fd();
        fcntl(raw, FcntlArg::F_SETFD(FdFlag::empty()))
            .map_err(|source| RedirectError::Dup { stream, source })?;
        return Ok(());
    }
    dup2(fd.as_raw_fd(), target).map_err(|source| RedirectError::Dup { stream, source })?;
    // `fd` is dropped here; only the installed copy stays open.
    Ok(())
}
