//! Waiting for the application being updated to exit
//!
//! A PID that does not exist is treated as "already exited". Without a
//! timeout the wait blocks for as long as the process lives.

use std::time::{Duration, Instant};

use crate::error::{Result, UpdaterError};
use crate::ui::Reporter;

/// Delay between liveness checks on platforms that poll
#[cfg(unix)]
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Liveness of a process at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Exited,
}

/// Block until `pid` has exited, or until `timeout` elapses
pub fn wait_for_exit(pid: u32, timeout: Option<Duration>, reporter: &dyn Reporter) -> Result<()> {
    if probe(pid)? == ProcessState::Exited {
        reporter.step(&format!("Process {pid} already exited"));
        return Ok(());
    }

    reporter.step(&format!("Waiting for process {pid} to exit"));
    let started = Instant::now();

    imp::wait(pid, timeout)?;

    reporter.step(&format!(
        "Process {pid} exited after {:.1}s",
        started.elapsed().as_secs_f64()
    ));
    Ok(())
}

/// Liveness of `pid` right now
pub fn probe(pid: u32) -> Result<ProcessState> {
    imp::probe(pid)
}

fn timed_out(pid: u32, timeout: Duration) -> UpdaterError {
    UpdaterError::WaitTimedOut {
        pid,
        seconds: timeout.as_secs(),
    }
}

fn wait_failed(pid: u32, reason: impl ToString) -> UpdaterError {
    UpdaterError::ProcessWaitFailed {
        pid,
        reason: reason.to_string(),
    }
}

#[cfg(unix)]
mod imp {
    use std::io;
    use std::time::{Duration, Instant};

    use super::{POLL_INTERVAL, ProcessState, timed_out, wait_failed};
    use crate::error::Result;

    pub fn probe(pid: u32) -> Result<ProcessState> {
        let raw = libc::pid_t::try_from(pid).map_err(|e| wait_failed(pid, e))?;

        // Signal 0 only checks that the process exists and may be signalled
        if unsafe { libc::kill(raw, 0) } == 0 {
            return Ok(ProcessState::Running);
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => Ok(ProcessState::Exited),
            // Exists, owned by someone else
            Some(libc::EPERM) => Ok(ProcessState::Running),
            _ => Err(wait_failed(pid, err)),
        }
    }

    pub fn wait(pid: u32, timeout: Option<Duration>) -> Result<()> {
        let deadline = timeout.map(|t| (Instant::now() + t, t));

        while probe(pid)? == ProcessState::Running {
            if let Some((deadline, timeout)) = deadline {
                if Instant::now() >= deadline {
                    return Err(timed_out(pid, timeout));
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        Ok(())
    }
}

#[cfg(windows)]
mod imp {
    use std::time::Duration;

    use windows::Win32::Foundation::{
        CloseHandle, ERROR_INVALID_PARAMETER, HANDLE, WAIT_FAILED, WAIT_OBJECT_0, WAIT_TIMEOUT,
    };
    use windows::Win32::System::Threading::{
        INFINITE, OpenProcess, PROCESS_SYNCHRONIZE, WaitForSingleObject,
    };

    use super::{ProcessState, timed_out, wait_failed};
    use crate::error::Result;

    /// Process handle closed on drop
    struct OwnedHandle(HANDLE);

    impl Drop for OwnedHandle {
        fn drop(&mut self) {
            let _ = unsafe { CloseHandle(self.0) };
        }
    }

    fn open(pid: u32) -> Result<Option<OwnedHandle>> {
        match unsafe { OpenProcess(PROCESS_SYNCHRONIZE, false, pid) } {
            Ok(handle) => Ok(Some(OwnedHandle(handle))),
            // No such process
            Err(e) if e.code() == ERROR_INVALID_PARAMETER.to_hresult() => Ok(None),
            Err(e) => Err(wait_failed(pid, e)),
        }
    }

    fn wait_handle(pid: u32, handle: &OwnedHandle, millis: u32) -> Result<ProcessState> {
        let event = unsafe { WaitForSingleObject(handle.0, millis) };
        if event == WAIT_OBJECT_0 {
            Ok(ProcessState::Exited)
        } else if event == WAIT_TIMEOUT {
            Ok(ProcessState::Running)
        } else if event == WAIT_FAILED {
            Err(wait_failed(pid, std::io::Error::last_os_error()))
        } else {
            Err(wait_failed(pid, format!("unexpected wait result {}", event.0)))
        }
    }

    pub fn probe(pid: u32) -> Result<ProcessState> {
        match open(pid)? {
            Some(handle) => wait_handle(pid, &handle, 0),
            None => Ok(ProcessState::Exited),
        }
    }

    pub fn wait(pid: u32, timeout: Option<Duration>) -> Result<()> {
        let Some(handle) = open(pid)? else {
            return Ok(());
        };

        let millis = timeout.map_or(INFINITE, |t| {
            u32::try_from(t.as_millis()).unwrap_or(INFINITE - 1)
        });

        match (wait_handle(pid, &handle, millis)?, timeout) {
            (ProcessState::Exited, _) => Ok(()),
            (ProcessState::Running, Some(t)) => Err(timed_out(pid, t)),
            (ProcessState::Running, None) => Err(wait_failed(pid, "wait ended early")),
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod imp {
    use std::time::Duration;

    use super::ProcessState;
    use crate::error::Result;

    pub fn probe(_pid: u32) -> Result<ProcessState> {
        Ok(ProcessState::Exited)
    }

    pub fn wait(_pid: u32, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }
}
