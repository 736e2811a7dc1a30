use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nix::sys::signal::Signal;
use tokio::sync::{mpsc, Mutex};

use provisioner::exec::{SignalSource, Subscription};

/// Signal source driven by the test instead of the OS.
///
/// Signals sent through [`ChannelSignals::send`] are delivered to whichever
/// subscription is live. Like OS deliveries, a signal sent while nobody is
/// subscribed is dropped, and anything a finished run left unread is not
/// handed to the next subscription. The number of live subscriptions is
/// tracked so tests can check that a run released its subscription.
#[derive(Clone)]
pub struct ChannelSignals {
    tx: mpsc::UnboundedSender<Signal>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Signal>>>,
    live: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl ChannelSignals {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            live: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Deliver `signal`. Returns `false` if nobody was subscribed.
    pub fn send(&self, signal: Signal) -> bool {
        if self.live_subscriptions() == 0 {
            return false;
        }
        self.tx.send(signal).expect("receiver lives as long as the source");
        true
    }

    /// Subscriptions currently held.
    pub fn live_subscriptions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Subscriptions ever handed out.
    pub fn total_subscriptions(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl Default for ChannelSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for ChannelSignals {
    fn subscribe(&self) -> io::Result<Box<dyn Subscription>> {
        if let Ok(mut rx) = self.rx.try_lock() {
            while rx.try_recv().is_ok() {}
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ChannelSubscription {
            rx: Arc::clone(&self.rx),
            live: Arc::clone(&self.live),
        }))
    }
}

struct ChannelSubscription {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Signal>>>,
    live: Arc<AtomicUsize>,
}

impl Subscription for ChannelSubscription {
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = Option<Signal>> + Send + '_>> {
        Box::pin(async move { self.rx.lock().await.recv().await })
    }
}

impl Drop for ChannelSubscription {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
