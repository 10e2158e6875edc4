//! Cooperative Shutdown Signal
//!
//! A single cancellation signal shared by the scanner, the batch coordinator and
//! every per-repository unit. It can be fired explicitly, by a deadline, or by
//! OS signals (Ctrl-C, SIGTERM, ...).

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Cloneable, level-triggered cancellation signal
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    state: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Create a signal that has not fired yet
    pub fn new() -> Self {
        let (state, _rx) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Fire the signal. Idempotent.
    pub fn trigger(&self) {
        self.state.send_replace(true);
    }

    /// Check whether the signal has fired
    pub fn is_triggered(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolve once the signal fires (immediately if it already has)
    pub async fn triggered(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this only returns on a fired signal.
        let _ = rx.wait_for(|fired| *fired).await;
    }

    /// Fire the signal once `deadline` elapses, unless it fires earlier
    pub fn trigger_after(&self, deadline: Duration) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(deadline) => {
                    log::warn!("Run deadline of {:?} exceeded; cancelling remaining work", deadline);
                    signal.trigger();
                }
                _ = signal.triggered() => {}
            }
        })
    }

    /// Route OS termination signals into this signal.
    ///
    /// The first signal fires cancellation; a second one exits immediately.
    pub fn install_os_handlers(&self) {
        install_os_handlers(self.clone());
    }
}

fn install_os_handlers(signal: ShutdownSignal) {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let signal_count = Arc::new(AtomicUsize::new(0));

    #[cfg(unix)]
    {
        // Restore default SIGPIPE so piping into `head` terminates quietly.
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use tokio::signal::unix::{signal as unix_signal, SignalKind};
        let kinds = [
            SignalKind::terminate(),
            SignalKind::hangup(),
            SignalKind::quit(),
        ];

        for kind in kinds {
            let signal = signal.clone();
            let counter = signal_count.clone();
            tokio::spawn(async move {
                if let Ok(mut stream) = unix_signal(kind) {
                    if stream.recv().await.is_some() {
                        if counter.fetch_add(1, Ordering::AcqRel) >= 1 {
                            std::process::exit(130);
                        }
                        signal.trigger();
                    }
                }
            });
        }
    }

    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if signal_count.fetch_add(1, Ordering::AcqRel) >= 1 {
                log::warn!("Ctrl-C received twice; exiting");
                std::process::exit(130);
            }
            log::info!("Interrupt received; finishing in-flight work");
            signal.trigger();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[test]
    fn test_signal_starts_untriggered() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
    }

    #[tokio::test]
    async fn test_trigger_is_visible_to_clones() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();

        signal.trigger();

        assert!(clone.is_triggered());
        let waited = timeout(Duration::from_millis(100), clone.triggered()).await;
        assert!(waited.is_ok(), "triggered() should resolve after trigger");
    }

    #[tokio::test]
    async fn test_waiters_registered_before_trigger_wake_up() {
        let signal = ShutdownSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.triggered().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.trigger();

        let joined = timeout(Duration::from_millis(200), waiter).await;
        assert!(joined.is_ok(), "waiter should wake after trigger");
    }

    #[tokio::test]
    async fn test_trigger_after_deadline() {
        let signal = ShutdownSignal::new();
        let _handle = signal.trigger_after(Duration::from_millis(20));

        let waited = timeout(Duration::from_secs(2), signal.triggered()).await;
        assert!(waited.is_ok());
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_untriggered_signal_does_not_resolve() {
        let signal = ShutdownSignal::new();
        let waited = timeout(Duration::from_millis(30), signal.triggered()).await;
        assert!(waited.is_err());
    }
}
