use std::sync::Arc;

use crate::io::gateway::{Gateway, GatewayError};
use crate::io::writer::{FlushError, WriteSerializer};
use crate::model::config::{Config, DefaultsConfig};
use crate::model::group::{DEFAULT_GROUP_ID, Group};
use crate::model::state::StoreState;
use crate::ops::check::{Repair, normalize};
use crate::ops::reset::{self, ResetOutcome};

use super::TodoStore;
use super::clock::Clock;
use super::coordinator::{ResetCoordinator, ResetSchedule};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("could not start background thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Used when seeding a new document or repairing one without it
    pub default_group: Group,
    /// Run the reset coordinator. `None` for one-shot use, where the
    /// check at open is enough.
    pub schedule: Option<ResetSchedule>,
}

impl SessionOptions {
    pub fn from_config(config: &Config, background_reset: bool) -> Self {
        SessionOptions {
            default_group: default_group(&config.defaults),
            schedule: background_reset.then(|| ResetSchedule::from(&config.reset)),
        }
    }
}

pub fn default_group(defaults: &DefaultsConfig) -> Group {
    Group::new(
        DEFAULT_GROUP_ID.to_string(),
        defaults.group_name.clone(),
        defaults.group_color.clone(),
    )
}

/// What happened while opening a session.
#[derive(Debug, Clone)]
pub struct HydrationReport {
    /// No document existed; a fresh one was created
    pub seeded: bool,
    pub repairs: Vec<Repair>,
    pub reset: ResetOutcome,
}

impl HydrationReport {
    /// Whether the opened state differs from what is on disk
    pub fn dirty(&self) -> bool {
        self.seeded || !self.repairs.is_empty() || self.reset.changed()
    }
}

/// A running store: hydrated from the gateway, writing back through the
/// serializer, optionally with the reset coordinator attached.
pub struct Session {
    store: Arc<TodoStore>,
    coordinator: Option<ResetCoordinator>,
    report: HydrationReport,
}

impl Session {
    /// Load (or seed) the document, repair it, run the reset check and
    /// start the background machinery.
    pub fn open(
        gateway: Arc<dyn Gateway>,
        clock: Arc<dyn Clock>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let today = clock.today();

        let (mut state, seeded, repairs) = match gateway.load()? {
            Some(mut state) => {
                let repairs = normalize(&mut state, &options.default_group);
                (state, false, repairs)
            }
            None => (
                StoreState::seeded(options.default_group.clone(), today),
                true,
                Vec::new(),
            ),
        };

        for repair in &repairs {
            log::warn!("event=hydrate_repair repair={:?}", repair);
        }

        let reset = reset::reset_if_due(&mut state, today);
        let report = HydrationReport {
            seeded,
            repairs,
            reset,
        };
        log::info!(
            "event=hydrate seeded={} repairs={} reset={:?} todos={} groups={}",
            report.seeded,
            report.repairs.len(),
            report.reset,
            state.todos.len(),
            state.groups.len()
        );

        let writer = WriteSerializer::start(gateway)?;
        let store = Arc::new(TodoStore::new(state, writer, clock));
        if report.dirty() {
            store.persist();
        }

        let coordinator = match options.schedule {
            Some(schedule) => Some(ResetCoordinator::start(store.clone(), schedule)?),
            None => None,
        };

        Ok(Session {
            store,
            coordinator,
            report,
        })
    }

    pub fn store(&self) -> &Arc<TodoStore> {
        &self.store
    }

    pub fn report(&self) -> &HydrationReport {
        &self.report
    }

    /// Stop the reset timer and wait for pending writes.
    pub fn close(mut self) -> Result<(), FlushError> {
        if let Some(mut coordinator) = self.coordinator.take() {
            coordinator.stop();
        }
        self.store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::todo::Todo;
    use crate::ops::check::check_state;
    use crate::store::test_helpers::{ManualClock, MemoryGateway, seeded};

    fn options() -> SessionOptions {
        SessionOptions::from_config(&Config::default(), false)
    }

    #[test]
    fn first_open_seeds_and_persists() {
        let gw = Arc::new(MemoryGateway::default());
        let clock = Arc::new(ManualClock::at(2024, 6, 1, 8));
        let session = Session::open(gw.clone(), clock.clone(), options()).unwrap();
        assert!(session.report().seeded);

        let state = session.store().snapshot();
        assert!(state.todos.is_empty());
        assert_eq!(state.groups.len(), 1);
        assert_eq!(state.groups[0].id, DEFAULT_GROUP_ID);
        assert_eq!(state.groups[0].name, "Daily");
        assert_eq!(state.groups[0].color.as_deref(), Some("hsl(var(--primary))"));
        assert_eq!(state.selected_group_id.as_deref(), Some(DEFAULT_GROUP_ID));
        assert_eq!(state.last_reset_date, Some(clock.today()));

        session.close().unwrap();
        assert_eq!(gw.last(), Some(state));
    }

    #[test]
    fn open_on_new_day_resets_and_persists() {
        let mut doc = seeded();
        let mut todo = Todo::new("t1".into(), "Floss".into(), "default".into(), 0);
        todo.completed = true;
        doc.todos.push(todo);

        let gw = Arc::new(MemoryGateway::with(doc));
        let clock = Arc::new(ManualClock::at(2024, 1, 2, 7));
        let session = Session::open(gw.clone(), clock, options()).unwrap();
        assert_eq!(session.report().reset, ResetOutcome::Reset { cleared: 1 });
        session.close().unwrap();

        let saved = gw.last().unwrap();
        assert!(!saved.todos[0].completed);
        assert_eq!(saved.last_reset_date.unwrap().to_string(), "2024-01-02");
    }

    #[test]
    fn unwritable_store_still_works_in_memory() {
        let gw = Arc::new(MemoryGateway::default());
        gw.set_failing(true);
        let clock = Arc::new(ManualClock::at(2024, 6, 1, 8));
        let session = Session::open(gw.clone(), clock, options()).unwrap();

        let id = session
            .store()
            .add_todo("Water plants", DEFAULT_GROUP_ID)
            .unwrap();
        assert!(session.store().snapshot().todo(&id).is_some());
        assert!(session.close().is_err());
        assert_eq!(gw.save_count(), 0);
    }

    #[test]
    fn clean_open_writes_nothing() {
        let gw = Arc::new(MemoryGateway::with(seeded()));
        let clock = Arc::new(ManualClock::at(2024, 1, 1, 12));
        let session = Session::open(gw.clone(), clock, options()).unwrap();
        assert!(!session.report().dirty());
        session.close().unwrap();
        assert_eq!(gw.save_count(), 0);
    }

    #[test]
    fn broken_document_is_repaired_on_open() {
        let mut doc = seeded();
        doc.groups.clear();
        doc.todos
            .push(Todo::new("t1".into(), "x".into(), "gone".into(), 0));
        let gw = Arc::new(MemoryGateway::with(doc));
        let clock = Arc::new(ManualClock::at(2024, 1, 1, 12));
        let session = Session::open(gw.clone(), clock, options()).unwrap();

        assert!(session.report().repairs.contains(&Repair::InsertedDefaultGroup));
        let state = session.store().snapshot();
        assert!(check_state(&state).valid);
        session.close().unwrap();
        assert_eq!(gw.last(), Some(state));
    }

    #[test]
    fn close_stops_coordinator() {
        let gw = Arc::new(MemoryGateway::default());
        let clock = Arc::new(ManualClock::at(2024, 1, 1, 12));
        let session = Session::open(
            gw,
            clock,
            SessionOptions::from_config(&Config::default(), true),
        )
        .unwrap();
        // Returns promptly even though the next poll is an hour away
        session.close().unwrap();
    }
}
