//! Countdown Clock: a periodic timer that reports time left until the next
//! scheduled conversation.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use vintel_core::clock::Clock;
use vintel_core::countdown::{Countdown, CountdownTick};

pub struct CountdownClock {
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl CountdownClock {
    pub fn new(clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self { clock, period }
    }

    /// Starts ticking immediately and then every period.
    ///
    /// Each tick recomputes the remaining time from the current target and
    /// the clock, so replacing the target through [`CountdownHandle::reanchor`]
    /// takes effect on the next tick.
    pub fn start<F>(&self, target: Option<DateTime<Utc>>, mut on_tick: F) -> CountdownHandle
    where
        F: FnMut(CountdownTick) + Send + 'static,
    {
        let (target_tx, mut target_rx) = watch::channel(target);
        let (active_tx, active_rx) = watch::channel(false);
        let cancel = CancellationToken::new();

        let clock = self.clock.clone();
        let period = self.period;
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                    changed = target_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }
                let countdown = Countdown::new(*target_rx.borrow());
                on_tick(countdown.tick(clock.now(), *active_rx.borrow()));
            }
            tracing::debug!("[Countdown] Stopped");
        });

        CountdownHandle {
            target: target_tx,
            active: active_tx,
            cancel,
            task: Some(task),
        }
    }
}

/// Controls a running countdown. Dropping it stops the timer.
pub struct CountdownHandle {
    target: watch::Sender<Option<DateTime<Utc>>>,
    active: watch::Sender<bool>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CountdownHandle {
    /// Replaces the target with the latest server value.
    pub fn reanchor(&self, target: Option<DateTime<Utc>>) {
        self.target.send_if_modified(|current| {
            if *current == target {
                return false;
            }
            tracing::debug!("[Countdown] Re-anchored to {:?}", target);
            *current = target;
            true
        });
    }

    /// Whether the conversation is currently running, which decides
    /// between "starting soon" and "live" once the target is reached.
    pub fn set_active(&self, active: bool) {
        self.active.send_replace(active);
    }

    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::sync::mpsc;
    use vintel_core::clock::ManualClock;
    use vintel_core::countdown::CountdownMode;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_the_target() {
        let clock = Arc::new(ManualClock::new(t0()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = CountdownClock::new(clock.clone(), Duration::from_secs(1)).start(
            Some(t0() + chrono::Duration::seconds(90)),
            move |tick| {
                let _ = tx.send(tick);
            },
        );

        let first = rx.recv().await.unwrap();
        assert_eq!(first.remaining_secs, 90);
        assert_eq!(first.mode, CountdownMode::Counting);

        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(rx.recv().await.unwrap().remaining_secs, 60);

        handle.reanchor(Some(t0() + chrono::Duration::seconds(40)));
        assert_eq!(rx.recv().await.unwrap().remaining_secs, 10);

        clock.advance(chrono::Duration::seconds(20));
        assert_eq!(rx.recv().await.unwrap().mode, CountdownMode::Starting);

        handle.set_active(true);
        assert_eq!(rx.recv().await.unwrap().mode, CountdownMode::Live);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_the_timer() {
        let clock = Arc::new(ManualClock::new(t0()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = CountdownClock::new(clock, Duration::from_secs(1)).start(None, move |tick| {
            let _ = tx.send(tick);
        });

        assert_eq!(rx.recv().await.unwrap().mode, CountdownMode::Unscheduled);
        drop(handle);
        while rx.recv().await.is_some() {}
    }
}
