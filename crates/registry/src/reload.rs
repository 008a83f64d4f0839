//! Broker reload trigger.
//!
//! The broker reloads its configuration on SIGHUP. After rewriting the
//! config file the registry signals the process whose id is stored in the
//! configured pid file. Failures here are logged and never fail the
//! reconciliation that triggered them.

use tracing::{debug, warn};

use crate::broker_config::BrokerConfig;

/// Signals the broker to reload its configuration.
pub(crate) fn signal_broker_reload(config: &BrokerConfig) {
    let Some(pid_file) = config.pid_file.as_deref() else {
        debug!("no pid file configured, skipping broker reload signal");
        return;
    };
    let pid = match std::fs::read_to_string(pid_file) {
        Ok(text) => match text.trim().parse::<i32>() {
            Ok(pid) => pid,
            Err(e) => {
                warn!(pid_file, error = %e, "pid file does not contain a pid");
                return;
            }
        },
        Err(e) => {
            warn!(pid_file, error = %e, "cannot read pid file");
            return;
        }
    };
    send_sighup(pid);
}

#[cfg(unix)]
fn send_sighup(pid: i32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid), Signal::SIGHUP) {
        Ok(()) => debug!(pid, "sent SIGHUP to broker"),
        Err(e) => warn!(pid, error = %e, "failed to signal broker"),
    }
}

#[cfg(not(unix))]
fn send_sighup(pid: i32) {
    warn!(pid, "broker reload signalling is only supported on unix");
}
