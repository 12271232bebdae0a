//! Background trigger for the daily reset.
//!
//! Wakes at whichever comes first: the poll interval or just past the next
//! local midnight. The poll is what guarantees the reset happens; the
//! midnight wake only makes it happen sooner. Every wake calls
//! [`TodoStore::run_daily_reset`], which is a no-op once the day is done.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, TimeZone};

use crate::model::config::ResetConfig;
use crate::ops::reset;

use super::TodoStore;

/// Past midnight by this much, so the date has definitely rolled over.
const MIDNIGHT_SLACK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSchedule {
    pub poll_interval: Duration,
    pub midnight_timer: bool,
}

impl From<&ResetConfig> for ResetSchedule {
    fn from(config: &ResetConfig) -> Self {
        ResetSchedule {
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            midnight_timer: config.midnight_timer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Poll,
    Midnight,
}

/// How long to sleep from `now`, and why.
pub fn next_wake<Tz: TimeZone>(now: &DateTime<Tz>, schedule: &ResetSchedule) -> (Duration, Wake) {
    if schedule.midnight_timer
        && let Some(until) = reset::until_next_midnight(now)
    {
        let until = until + MIDNIGHT_SLACK;
        if until < schedule.poll_interval {
            return (until, Wake::Midnight);
        }
    }
    (schedule.poll_interval, Wake::Poll)
}

/// Owns the reset thread. Stopping (or dropping) cancels the pending wake
/// and joins the thread, so nothing fires against a store that is gone.
pub struct ResetCoordinator {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ResetCoordinator {
    pub fn start(store: Arc<TodoStore>, schedule: ResetSchedule) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = std::thread::Builder::new()
            .name("daylist-reset".to_owned())
            .spawn(move || {
                loop {
                    let (wait, wake) = next_wake(&store.clock().now(), &schedule);
                    log::debug!("event=reset_timer wait_secs={} kind={:?}", wait.as_secs(), wake);
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            store.run_daily_reset();
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        log::info!(
            "event=reset_coordinator status=started poll_secs={} midnight_timer={}",
            schedule.poll_interval.as_secs(),
            schedule.midnight_timer
        );

        Ok(ResetCoordinator {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Cancel the timer and wait for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("event=reset_coordinator status=panicked");
            } else {
                log::info!("event=reset_coordinator status=stopped");
            }
        }
    }
}

impl Drop for ResetCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}
