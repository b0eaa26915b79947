//! Detaching from the controlling terminal

use crate::errors::{EcFanError, Result};
use std::io::{self, Write};

/// File creation mask for the detached process
const DAEMON_UMASK: libc::mode_t = 0o077;

/// Fork into the background and start a new session.
///
/// The parent exits with status 0 right away; only the child returns. Must
/// be called before any runtime threads exist. Open files such as the port
/// handle and the status log are inherited by the child.
pub fn detach() -> Result<()> {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    // SAFETY: fork is called while the process is still single-threaded.
    let pid = unsafe { libc::fork() };
    if pid < 0 {
        return Err(EcFanError::Detach(format!(
            "fork failed: {}",
            io::Error::last_os_error()
        )));
    }
    if pid > 0 {
        std::process::exit(0);
    }

    // SAFETY: umask only changes the file creation mask of this process.
    unsafe { libc::umask(DAEMON_UMASK) };

    // SAFETY: setsid has no memory-safety preconditions; the child of a fork
    // is never a process group leader, so it can only fail on exotic systems.
    if unsafe { libc::setsid() } < 0 {
        return Err(EcFanError::Detach(format!(
            "setsid failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}
