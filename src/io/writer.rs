//! Coalescing serial writer.
//!
//! Holds at most one pending document. A burst of submissions while a write
//! is in flight collapses into a single follow-up write of the newest
//! state, and writes never overlap, so an older document can't land after a
//! newer one.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crate::io::gateway::Gateway;
use crate::model::state::StoreState;

/// The latest state hasn't reached disk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("latest changes not saved: {reason}")]
pub struct FlushError {
    pub reason: String,
}

/// Counters for observing the writer from outside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStatus {
    /// Sequence number of the newest submitted state (0 = none yet)
    pub submitted: u64,
    /// Sequence number of the newest state known to be on disk
    pub durable: u64,
    pub writes: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

impl WriterStatus {
    pub fn is_settled(&self) -> bool {
        self.submitted == self.durable
    }
}

struct Pending {
    seq: u64,
    state: StoreState,
}

#[derive(Default)]
struct Slot {
    pending: Option<Pending>,
    /// Set by submit/flush. A pending state parked after a failure waits
    /// for the next kick before it is retried.
    kicked: bool,
    in_flight: bool,
    shutdown: bool,
    status: WriterStatus,
}

struct Inner {
    slot: Mutex<Slot>,
    cv: Condvar,
    gateway: Arc<dyn Gateway>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        // A panic inside the gateway must not take every later write down
        // with it, so poisoning is ignored.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct WriteSerializer {
    inner: Arc<Inner>,
    worker: Option<JoinHandle<()>>,
}

impl WriteSerializer {
    /// Spawn the writer thread.
    pub fn start(gateway: Arc<dyn Gateway>) -> std::io::Result<Self> {
        let inner = Arc::new(Inner {
            slot: Mutex::new(Slot::default()),
            cv: Condvar::new(),
            gateway,
        });

        let worker = std::thread::Builder::new()
            .name("daylist-writer".to_owned())
            .spawn({
                let inner = inner.clone();
                move || run_worker(inner)
            })?;

        Ok(WriteSerializer {
            inner,
            worker: Some(worker),
        })
    }

    /// Replace the pending document with `state` and wake the writer.
    /// Never blocks on I/O. Returns the state's sequence number.
    pub fn submit(&self, state: StoreState) -> u64 {
        let mut slot = self.inner.lock();
        slot.status.submitted += 1;
        let seq = slot.status.submitted;
        slot.pending = Some(Pending { seq, state });
        slot.kicked = true;
        self.inner.cv.notify_all();
        seq
    }

    /// Retry anything parked after a failure and wait until the writer is
    /// idle. Errors if the newest state still isn't on disk.
    pub fn flush(&self) -> Result<(), FlushError> {
        let mut slot = self.inner.lock();
        if slot.pending.is_some() {
            slot.kicked = true;
            self.inner.cv.notify_all();
        }
        while slot.in_flight || (slot.kicked && slot.pending.is_some()) {
            slot = self.inner.cv.wait(slot).unwrap_or_else(|e| e.into_inner());
        }

        if slot.status.is_settled() {
            Ok(())
        } else {
            Err(FlushError {
                reason: slot
                    .status
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "write pending".to_string()),
            })
        }
    }

    pub fn status(&self) -> WriterStatus {
        self.inner.lock().status.clone()
    }
}

impl Drop for WriteSerializer {
    /// One last attempt at whatever is pending, then join the thread.
    fn drop(&mut self) {
        {
            let mut slot = self.inner.lock();
            slot.shutdown = true;
            slot.kicked = slot.pending.is_some();
            self.inner.cv.notify_all();
        }
        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            log::error!("event=writer_join status=panicked");
        }
    }
}

fn run_worker(inner: Arc<Inner>) {
    loop {
        let job = {
            let mut slot = inner.lock();
            loop {
                if slot.kicked
                    && let Some(job) = slot.pending.take()
                {
                    slot.kicked = false;
                    slot.in_flight = true;
                    break job;
                }
                if slot.shutdown {
                    return;
                }
                slot = inner.cv.wait(slot).unwrap_or_else(|e| e.into_inner());
            }
        };

        let result = inner.gateway.save(&job.state);

        let mut slot = inner.lock();
        slot.in_flight = false;
        match result {
            Ok(()) => {
                slot.status.writes += 1;
                slot.status.durable = job.seq;
                slot.status.last_error = None;
                log::debug!("event=write status=ok seq={}", job.seq);
            }
            Err(e) => {
                slot.status.failures += 1;
                slot.status.last_error = Some(e.to_string());
                log::warn!("event=write status=failed seq={} error={}", job.seq, e);
                // Park the failed state for the next kick unless something
                // newer already replaced it.
                if slot.pending.is_none() {
                    slot.pending = Some(job);
                }
            }
        }
        inner.cv.notify_all();
    }
}
