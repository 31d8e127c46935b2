//! Interrupt handling
//!
//! SIGINT and SIGTERM trigger the run's cancel token. Only the first
//! signal has any effect; the process keeps running so that resources
//! already being applied can finish and report.

use declarative::CancelToken;
use std::sync::OnceLock;

static TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Route SIGINT and SIGTERM to `cancel`
///
/// Only the first installed token is used.
pub fn install(cancel: &CancelToken) {
    if TOKEN.set(cancel.clone()).is_err() {
        log::debug!("Signal handlers already installed");
        return;
    }
    install_handlers();
}

#[cfg(unix)]
extern "C" fn on_signal(_signal: libc::c_int) {
    // Only atomics here: this runs in signal context
    if let Some(token) = TOKEN.get() {
        token.cancel();
    }
}

#[cfg(unix)]
fn install_handlers() {
    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signal in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only touches an initialized OnceLock and an atomic flag
        let previous = unsafe { libc::signal(signal, handler) };
        if previous == libc::SIG_ERR {
            log::warn!(
                "Could not install handler for signal {}: {}",
                signal,
                std::io::Error::last_os_error()
            );
        }
    }
    log::debug!("Installed SIGINT/SIGTERM handlers");
}

#[cfg(not(unix))]
fn install_handlers() {
    log::debug!("Signal-driven cancellation is not supported on this platform");
}
