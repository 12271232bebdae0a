use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use crate::io::gateway::{Gateway, GatewayError};
use crate::model::group::Group;
use crate::model::state::StoreState;

use super::clock::Clock;

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn at(y: i32, m: u32, d: u32, h: u32) -> Self {
        ManualClock {
            now: Mutex::new(local(y, m, d, h)),
        }
    }

    pub fn set(&self, y: i32, m: u32, d: u32, h: u32) {
        *self.now.lock().unwrap() = local(y, m, d, h);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(y, m, d, h, 0, 0).earliest().unwrap()
}

/// Keeps every saved document in memory. Saves can be switched to fail.
#[derive(Default)]
pub struct MemoryGateway {
    initial: Mutex<Option<StoreState>>,
    saved: Mutex<Vec<StoreState>>,
    failing: AtomicBool,
}

impl MemoryGateway {
    pub fn with(state: StoreState) -> Self {
        MemoryGateway {
            initial: Mutex::new(Some(state)),
            saved: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn last(&self) -> Option<StoreState> {
        self.saved.lock().unwrap().last().cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

impl Gateway for MemoryGateway {
    fn load(&self) -> Result<Option<StoreState>, GatewayError> {
        Ok(self.last().or_else(|| self.initial.lock().unwrap().clone()))
    }

    fn save(&self, state: &StoreState) -> Result<(), GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Write {
                path: "tasks.json".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.saved.lock().unwrap().push(state.clone());
        Ok(())
    }
}

/// The seeded document as of 2024-01-01.
pub fn seeded() -> StoreState {
    StoreState::seeded(
        Group::new("default".into(), "Daily".into(), "hsl(var(--primary))".into()),
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    )
}
