// src/exec/signals.rs

//! Scoped subscription to the hosting program's termination signals.
//!
//! A [`Subscription`] is acquired at the start of each supervised run and
//! released by dropping it, on every exit path. Deliveries that arrive while
//! nobody is subscribed are not replayed to a later run.
//!
//! Note that `tokio` keeps its process-wide handler installed once the first
//! subscription has been made, so after that the default "terminate" action
//! no longer applies between runs.

use std::future::Future;
use std::io;
use std::pin::Pin;

use nix::sys::signal::Signal;
use tokio::signal::unix::{signal, SignalKind};

/// Something that can hand out termination-signal subscriptions.
///
/// [`OsSignals`] is the production implementation; tests can provide a
/// channel-backed source instead of signalling the test process.
pub trait SignalSource: Send + Sync {
    fn subscribe(&self) -> io::Result<Box<dyn Subscription>>;
}

/// A live subscription. Dropping it unsubscribes.
pub trait Subscription: Send {
    /// Wait for the next delivered signal. `None` means the source is gone
    /// and no further signals will arrive.
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = Option<Signal>> + Send + '_>>;
}

/// SIGHUP / SIGINT / SIGTERM delivered to this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSignals;

impl SignalSource for OsSignals {
    fn subscribe(&self) -> io::Result<Box<dyn Subscription>> {
        Ok(Box::new(OsSubscription {
            hangup: signal(SignalKind::hangup())?,
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        }))
    }
}

struct OsSubscription {
    hangup: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

impl Subscription for OsSubscription {
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = Option<Signal>> + Send + '_>> {
        Box::pin(async move {
            tokio::select! {
                Some(()) = self.hangup.recv() => Some(Signal::SIGHUP),
                Some(()) = self.interrupt.recv() => Some(Signal::SIGINT),
                Some(()) = self.terminate.recv() => Some(Signal::SIGTERM),
                else => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn os_subscription_can_be_acquired_and_dropped_repeatedly() {
        for _ in 0..3 {
            let sub = OsSignals.subscribe().expect("subscribe");
            drop(sub);
        }
    }
}
