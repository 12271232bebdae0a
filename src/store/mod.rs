//! The entity store: the authoritative in-memory task state.
//!
//! Every mutation clones the current state, applies a pure transform from
//! `ops`, swaps the result in and hands it to the write serializer, all
//! under one lock. Readers therefore see mutations in call order, and the
//! serializer receives them in the same order.

pub mod clock;
pub mod coordinator;
pub mod session;
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::io::writer::{FlushError, WriteSerializer, WriterStatus};
use crate::model::state::StoreState;
use crate::model::todo::Todo;
use crate::ops::reset::{self, ResetOutcome};
use crate::ops::{StoreError, group_ops, todo_ops};

use clock::Clock;

pub struct TodoStore {
    state: Mutex<StoreState>,
    writer: WriteSerializer,
    clock: Arc<dyn Clock>,
}

impl TodoStore {
    /// Wrap an already hydrated state. Nothing is written until the first
    /// mutation (or [`TodoStore::persist`]).
    pub fn new(state: StoreState, writer: WriteSerializer, clock: Arc<dyn Clock>) -> Self {
        TodoStore {
            state: Mutex::new(state),
            writer,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `f` to a copy of the state. On `Ok` the copy replaces the
    /// state and is queued for writing; on `Err` nothing changes.
    fn mutate<T, E>(&self, f: impl FnOnce(&mut StoreState) -> Result<T, E>) -> Result<T, E> {
        let mut state = self.lock();
        let mut next = state.clone();
        let out = f(&mut next)?;
        *state = next.clone();
        self.writer.submit(next);
        Ok(out)
    }

    /// Like `mutate`, but skips the write when `f` reports no change.
    fn mutate_if(&self, f: impl FnOnce(&mut StoreState) -> bool) -> bool {
        let mut state = self.lock();
        let mut next = state.clone();
        if !f(&mut next) {
            return false;
        }
        *state = next.clone();
        self.writer.submit(next);
        true
    }

    fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> StoreState {
        self.lock().clone()
    }

    /// Read the current state without copying it.
    pub fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        f(&self.lock())
    }

    /// Queue the current state for writing as-is.
    pub fn persist(&self) {
        let state = self.lock();
        self.writer.submit(state.clone());
    }

    // -----------------------------------------------------------------------
    // Todos
    // -----------------------------------------------------------------------

    /// Returns the new todo's id.
    pub fn add_todo(&self, text: &str, group_id: &str) -> Result<String, StoreError> {
        let id = Self::new_id();
        let created_at = self.now_millis();
        self.mutate(|s| todo_ops::add_todo(s, id.clone(), text.to_string(), group_id, created_at))?;
        log::info!("event=todo_added id={} group={}", id, group_id);
        Ok(id)
    }

    /// Create a group seeded with one todo and select it. Returns the new
    /// group's id.
    pub fn add_todo_with_new_group(&self, text: &str, group_name: &str) -> String {
        let group_id = Self::new_id();
        let todo_id = Self::new_id();
        let created_at = self.now_millis();
        self.mutate_if(|s| {
            group_ops::add_todo_with_new_group(
                s,
                group_id.clone(),
                group_name.to_string(),
                todo_id.clone(),
                text.to_string(),
                created_at,
            );
            true
        });
        log::info!(
            "event=group_added id={} with_todo={} selected=true",
            group_id,
            todo_id
        );
        group_id
    }

    /// Flip a todo's completed flag. Unknown ids are ignored; returns
    /// whether anything changed.
    pub fn toggle_todo(&self, id: &str) -> bool {
        self.mutate_if(|s| todo_ops::toggle_todo(s, id))
    }

    /// Remove a todo. Unknown ids are ignored; returns the removed todo.
    pub fn delete_todo(&self, id: &str) -> Option<Todo> {
        let mut removed = None;
        self.mutate_if(|s| {
            removed = todo_ops::delete_todo(s, id);
            removed.is_some()
        });
        removed
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Returns the new group's id. Without a color a random hue is used.
    pub fn add_group(&self, name: &str, color: Option<&str>) -> String {
        let id = Self::new_id();
        self.mutate_if(|s| {
            group_ops::add_group(s, id.clone(), name.to_string(), color.map(str::to_string));
            true
        });
        log::info!("event=group_added id={}", id);
        id
    }

    /// Delete a group and its todos. Returns the todos that went with it.
    pub fn delete_group(&self, id: &str) -> Result<Vec<Todo>, StoreError> {
        let removed = self.mutate(|s| group_ops::delete_group(s, id))?;
        log::info!(
            "event=group_deleted id={} cascaded_todos={}",
            id,
            removed.len()
        );
        Ok(removed)
    }

    pub fn select_group(&self, id: Option<&str>) {
        self.mutate_if(|s| {
            group_ops::select_group(s, id.map(str::to_string));
            true
        });
    }

    // -----------------------------------------------------------------------
    // Daily reset
    // -----------------------------------------------------------------------

    /// The one check-and-reset entry point every trigger goes through.
    pub fn run_daily_reset(&self) -> ResetOutcome {
        let today = self.clock.today();
        let mut outcome = ResetOutcome::Current;
        self.mutate_if(|s| {
            outcome = reset::reset_if_due(s, today);
            outcome.changed()
        });
        match outcome {
            ResetOutcome::Reset { cleared } => log::info!(
                "event=daily_reset date={} cleared={}",
                reset::date_str(today),
                cleared
            ),
            ResetOutcome::AheadOfClock { last } => log::warn!(
                "event=daily_reset status=skipped reason=clock_behind today={} last={}",
                reset::date_str(today),
                reset::date_str(last)
            ),
            ResetOutcome::Current => {}
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Block until everything submitted so far has been attempted.
    pub fn flush(&self) -> Result<(), FlushError> {
        self.writer.flush()
    }

    pub fn writer_status(&self) -> WriterStatus {
        self.writer.status()
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::{ManualClock, MemoryGateway, seeded};
    use super::*;
    use crate::model::group::DEFAULT_GROUP_ID;
    use crate::ops::check::check_state;

    fn store(state: StoreState) -> (TodoStore, Arc<MemoryGateway>, Arc<ManualClock>) {
        let gw = Arc::new(MemoryGateway::default());
        let clock = Arc::new(ManualClock::at(2024, 1, 1, 9));
        let writer = WriteSerializer::start(gw.clone()).unwrap();
        (TodoStore::new(state, writer, clock.clone()), gw, clock)
    }

    #[test]
    fn add_todo_to_default() {
        let (store, gw, clock) = store(seeded());
        let id = store.add_todo("Buy milk", DEFAULT_GROUP_ID).unwrap();
        let state = store.snapshot();
        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.todos[0].id, id);
        assert!(!state.todos[0].completed);
        assert_eq!(
            state.todos[0].created_at,
            Some(clock.now().timestamp_millis())
        );

        store.flush().unwrap();
        assert_eq!(gw.last(), Some(state));
    }

    #[test]
    fn rejected_mutation_writes_nothing() {
        let (store, gw, _) = store(seeded());
        let before = store.snapshot();
        assert_eq!(
            store.add_todo("x", "nope").unwrap_err(),
            StoreError::InvalidGroup("nope".into())
        );
        assert_eq!(
            store.delete_group(DEFAULT_GROUP_ID).unwrap_err(),
            StoreError::ProtectedGroup
        );
        store.flush().unwrap();
        assert_eq!(store.snapshot(), before);
        assert_eq!(gw.save_count(), 0);
    }

    #[test]
    fn stale_ids_are_noops() {
        let (store, gw, _) = store(seeded());
        assert!(!store.toggle_todo("ghost"));
        assert!(store.delete_todo("ghost").is_none());
        store.flush().unwrap();
        assert_eq!(gw.save_count(), 0);
    }

    #[test]
    fn new_group_is_selected_immediately() {
        let (store, _, _) = store(seeded());
        let gid = store.add_todo_with_new_group("Run", "Fitness");
        let state = store.snapshot();
        assert_eq!(state.selected_group_id.as_deref(), Some(gid.as_str()));
        assert_eq!(state.todos_in(&gid).count(), 1);
        assert!(check_state(&state).valid);
    }

    #[test]
    fn ids_are_unique() {
        let (store, _, _) = store(seeded());
        let a = store.add_todo("a", DEFAULT_GROUP_ID).unwrap();
        let b = store.add_todo("b", DEFAULT_GROUP_ID).unwrap();
        let g1 = store.add_group("One", None);
        let g2 = store.add_group("Two", Some("#123456"));
        let all = [a, b, g1, g2];
        for (i, x) in all.iter().enumerate() {
            for y in &all[i + 1..] {
                assert_ne!(x, y);
            }
        }
    }

    #[test]
    fn delete_group_cascades() {
        let (store, gw, _) = store(seeded());
        let work = store.add_group("Work", None);
        store.add_todo("a", &work).unwrap();
        store.add_todo("b", &work).unwrap();
        store.select_group(Some(&work));

        let removed = store.delete_group(&work).unwrap();
        assert_eq!(removed.len(), 2);
        let state = store.snapshot();
        assert_eq!(state.groups.len(), 1);
        assert!(state.todos.is_empty());
        assert_eq!(state.selected_group_id.as_deref(), Some(DEFAULT_GROUP_ID));

        store.flush().unwrap();
        assert_eq!(gw.last(), Some(state));
    }

    #[test]
    fn failed_write_keeps_mutation_and_retries() {
        let (store, gw, _) = store(seeded());
        gw.set_failing(true);

        let id = store.add_todo("Call mom", DEFAULT_GROUP_ID).unwrap();
        assert!(store.snapshot().todo(&id).is_some());
        let err = store.flush().unwrap_err();
        assert!(err.reason.contains("disk full"));
        assert_eq!(gw.save_count(), 0);
        assert!(store.writer_status().failures >= 1);

        // The disk comes back: the next mutation carries everything forward
        gw.set_failing(false);
        store.toggle_todo(&id);
        store.flush().unwrap();
        let state = store.snapshot();
        assert!(state.todo(&id).unwrap().completed);
        assert_eq!(gw.last(), Some(state));
    }

    #[test]
    fn failed_write_is_retried_by_flush() {
        let (store, gw, _) = store(seeded());
        gw.set_failing(true);
        store.add_todo("Pay rent", DEFAULT_GROUP_ID).unwrap();
        assert!(store.flush().is_err());

        gw.set_failing(false);
        store.flush().unwrap();
        assert_eq!(gw.last(), Some(store.snapshot()));
        assert!(store.writer_status().is_settled());
    }

    #[test]
    fn reset_runs_once_per_day() {
        let (store, _, clock) = store(seeded());
        let id = store.add_todo("Stretch", DEFAULT_GROUP_ID).unwrap();
        store.toggle_todo(&id);

        assert_eq!(store.run_daily_reset(), ResetOutcome::Current);
        assert!(store.snapshot().todos[0].completed);

        clock.set(2024, 1, 2, 0);
        assert_eq!(store.run_daily_reset(), ResetOutcome::Reset { cleared: 1 });
        assert_eq!(store.run_daily_reset(), ResetOutcome::Current);
        let state = store.snapshot();
        assert!(!state.todos[0].completed);
        assert_eq!(state.last_reset_date, Some(clock.today()));
    }
}
