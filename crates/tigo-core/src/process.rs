use crate::error::{Result, TigoError};
use std::time::{Duration, Instant};

/// Check whether `pid` names a live process by sending it signal 0.
///
/// `EPERM` means the process exists but belongs to someone else, so it
/// counts as alive. Pid 0 and values outside `pid_t` never do.
pub fn is_alive(pid: u32) -> bool {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    if unsafe { libc::kill(raw, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Ask `pid` to exit with `SIGTERM`.
pub fn terminate(pid: u32) -> Result<()> {
    let raw = libc::pid_t::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .ok_or(TigoError::ProcessNotFound(pid))?;
    if unsafe { libc::kill(raw, libc::SIGTERM) } == 0 {
        tracing::debug!(pid, "sent SIGTERM");
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => Err(TigoError::ProcessNotFound(pid)),
        _ => Err(TigoError::StopFailed(format!("cannot signal pid {pid}: {err}"))),
    }
}

/// Poll until `pid` is gone or `timeout` elapses. Returns whether it exited.
pub fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !is_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(EXIT_POLL);
    }
}

const EXIT_POLL: Duration = Duration::from_millis(100);
