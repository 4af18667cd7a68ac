//! Process signals turned into polled flags.
//!
//! Handlers only store to atomics; the event loop picks the flags up between
//! ticks.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static SUSPEND: AtomicBool = AtomicBool::new(false);
static CONTINUED: AtomicBool = AtomicBool::new(false);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    Shutdown,
    Suspend,
    /// Resumed by SIGCONT from outside
    Continued,
}

extern "C" fn on_signal(sig: libc::c_int) {
    match sig {
        libc::SIGTSTP => SUSPEND.store(true, Ordering::SeqCst),
        libc::SIGCONT => CONTINUED.store(true, Ordering::SeqCst),
        _ => SHUTDOWN.store(true, Ordering::SeqCst),
    }
}

fn handle(sig: libc::c_int) -> io::Result<()> {
    // SAFETY: the handler is async-signal-safe, it only touches atomics.
    let rc = unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(sig, &action, std::ptr::null_mut())
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub fn install() -> io::Result<()> {
    for sig in [libc::SIGINT, libc::SIGTERM, libc::SIGHUP, libc::SIGTSTP, libc::SIGCONT] {
        handle(sig)?;
    }
    Ok(())
}

/// Next pending request, shutdown first.
pub fn take() -> Option<Request> {
    if SHUTDOWN.swap(false, Ordering::SeqCst) {
        Some(Request::Shutdown)
    } else if SUSPEND.swap(false, Ordering::SeqCst) {
        Some(Request::Suspend)
    } else if CONTINUED.swap(false, Ordering::SeqCst) {
        Some(Request::Continued)
    } else {
        None
    }
}

/// Stop the process; returns once it is continued.
pub fn stop_self() -> io::Result<()> {
    // SAFETY: raise has no memory-safety preconditions.
    if unsafe { libc::raise(libc::SIGSTOP) } != 0 {
        return Err(io::Error::last_os_error());
    }
    CONTINUED.store(false, Ordering::SeqCst);
    Ok(())
}
