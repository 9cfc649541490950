// Refresh scheduling for lock state and projections.
//
// Emits a refresh on a fixed polling cadence and whenever the host signals
// that the session resumed or the user navigated. An explicit signal always
// fires and restarts the polling window, so a resume is never followed by a
// redundant poll moments later.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// What caused a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Interval,
    Resumed,
    Navigated,
}

/// Cloneable handle for signalling the scheduler from elsewhere.
#[derive(Debug, Clone)]
pub struct RefreshSignal {
    tx: mpsc::UnboundedSender<RefreshTrigger>,
}

impl RefreshSignal {
    pub fn resumed(&self) {
        let _ = self.tx.send(RefreshTrigger::Resumed);
    }

    pub fn navigated(&self) {
        let _ = self.tx.send(RefreshTrigger::Navigated);
    }
}

pub struct RefreshScheduler {
    interval: Interval,
    period: Duration,
    signals: mpsc::UnboundedReceiver<RefreshTrigger>,
    signal_tx: mpsc::UnboundedSender<RefreshTrigger>,
}

impl RefreshScheduler {
    /// The first interval refresh fires one full `period` after creation.
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let (signal_tx, signals) = mpsc::unbounded_channel();
        RefreshScheduler {
            interval,
            period,
            signals,
            signal_tx,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn signal(&self) -> RefreshSignal {
        RefreshSignal {
            tx: self.signal_tx.clone(),
        }
    }

    /// Wait for the next refresh.
    pub async fn next(&mut self) -> RefreshTrigger {
        tokio::select! {
            biased;
            Some(trigger) = self.signals.recv() => {
                self.interval.reset();
                trigger
            }
            _ = self.interval.tick() => RefreshTrigger::Interval,
        }
    }
}
