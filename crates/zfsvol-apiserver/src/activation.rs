//! Socket activation: listeners pre-opened by the service manager.

use std::env;
use std::io;
use std::os::fd::{FromRawFd, RawFd};
use std::os::unix::net::UnixListener;

/// First descriptor passed by the service manager
pub const LISTEN_FDS_START: RawFd = 3;

/// What the service manager handed over
#[derive(Debug)]
pub enum Activation {
    /// Not socket-activated; bind the well-known path
    None,
    /// Exactly one pre-opened listener
    Single(UnixListener),
    /// More listeners than the driver can serve
    Multiple(usize),
}

/// Number of descriptors passed to process `pid`
///
/// Both `LISTEN_PID` and `LISTEN_FDS` must be set, and `LISTEN_PID` must
/// name this process, or nothing was passed to us.
pub fn listen_fd_count(listen_pid: Option<&str>, listen_fds: Option<&str>, pid: u32) -> usize {
    let (Some(listen_pid), Some(listen_fds)) = (listen_pid, listen_fds) else {
        return 0;
    };
    if listen_pid.trim().parse::<u32>().ok() != Some(pid) {
        return 0;
    }
    listen_fds.trim().parse().unwrap_or(0)
}

/// Collect activated listeners passed to this process
///
/// The activation variables are left in place. Children ignore them since
/// `LISTEN_PID` names this process.
pub fn from_env() -> io::Result<Activation> {
    from_vars(
        env::var("LISTEN_PID").ok().as_deref(),
        env::var("LISTEN_FDS").ok().as_deref(),
        std::process::id(),
    )
}

fn from_vars(
    listen_pid: Option<&str>,
    listen_fds: Option<&str>,
    pid: u32,
) -> io::Result<Activation> {
    match listen_fd_count(listen_pid, listen_fds, pid) {
        0 => Ok(Activation::None),
        1 => {
            // SAFETY: the service manager passed fd 3 to this process and
            // nothing else here has taken ownership of it.
            let listener = unsafe { UnixListener::from_raw_fd(LISTEN_FDS_START) };
            listener.set_nonblocking(true)?;
            Ok(Activation::Single(listener))
        }
        n => Ok(Activation::Multiple(n)),
    }
}
