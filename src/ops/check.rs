use std::collections::HashSet;

use serde::Serialize;

use crate::model::group::{DEFAULT_GROUP_ID, Group};
use crate::model::state::StoreState;

/// Structured result from `dl check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A broken invariant. Hydration repairs all of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    #[serde(rename = "missing_default_group")]
    MissingDefaultGroup,
    #[serde(rename = "duplicate_group_id")]
    DuplicateGroupId { group_id: String },
    #[serde(rename = "duplicate_todo_id")]
    DuplicateTodoId { todo_id: String },
    /// A todo points at a group that doesn't exist
    #[serde(rename = "orphan_todo")]
    OrphanTodo { todo_id: String, group_id: String },
}

/// Something odd but tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Selection names a deleted group; readers treat it as `default`
    #[serde(rename = "dangling_selection")]
    DanglingSelection { group_id: String },
    #[serde(rename = "missing_reset_date")]
    MissingResetDate,
    #[serde(rename = "missing_created_at")]
    MissingCreatedAt { todo_id: String },
}

/// Validate a document against the store invariants. Read-only.
pub fn check_state(state: &StoreState) -> CheckResult {
    let mut result = CheckResult::default();

    if !state.has_group(DEFAULT_GROUP_ID) {
        result.errors.push(CheckError::MissingDefaultGroup);
    }

    let mut seen = HashSet::new();
    for group in &state.groups {
        if !seen.insert(group.id.as_str()) {
            result.errors.push(CheckError::DuplicateGroupId {
                group_id: group.id.clone(),
            });
        }
    }

    let mut seen_todos = HashSet::new();
    for todo in &state.todos {
        if !seen_todos.insert(todo.id.as_str()) {
            result.errors.push(CheckError::DuplicateTodoId {
                todo_id: todo.id.clone(),
            });
        }
        if !seen.contains(todo.group_id.as_str()) {
            result.errors.push(CheckError::OrphanTodo {
                todo_id: todo.id.clone(),
                group_id: todo.group_id.clone(),
            });
        }
        if todo.created_at.is_none() {
            result.warnings.push(CheckWarning::MissingCreatedAt {
                todo_id: todo.id.clone(),
            });
        }
    }

    if let Some(selected) = &state.selected_group_id
        && !seen.contains(selected.as_str())
    {
        result.warnings.push(CheckWarning::DanglingSelection {
            group_id: selected.clone(),
        });
    }

    if state.last_reset_date.is_none() {
        result.warnings.push(CheckWarning::MissingResetDate);
    }

    result.valid = result.errors.is_empty();
    result
}

/// One fix applied by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    InsertedDefaultGroup,
    DroppedDuplicateGroup(String),
    DroppedDuplicateTodo(String),
    ReassignedOrphan { todo_id: String, group_id: String },
    ResetSelection(String),
}

/// Bring a loaded document in line with the store invariants. Returns the
/// repairs made; an empty list means the document was already sound.
///
/// Duplicates keep their first occurrence. Orphaned todos move to the
/// default group rather than being dropped.
pub fn normalize(state: &mut StoreState, default_group: &Group) -> Vec<Repair> {
    let mut repairs = Vec::new();

    let mut seen = HashSet::new();
    state.groups.retain(|g| {
        if seen.insert(g.id.clone()) {
            true
        } else {
            repairs.push(Repair::DroppedDuplicateGroup(g.id.clone()));
            false
        }
    });

    if !seen.contains(DEFAULT_GROUP_ID) {
        state.groups.insert(0, default_group.clone());
        seen.insert(DEFAULT_GROUP_ID.to_string());
        repairs.push(Repair::InsertedDefaultGroup);
    }

    let mut seen_todos = HashSet::new();
    state.todos.retain(|t| {
        if seen_todos.insert(t.id.clone()) {
            true
        } else {
            repairs.push(Repair::DroppedDuplicateTodo(t.id.clone()));
            false
        }
    });

    for todo in &mut state.todos {
        if !seen.contains(&todo.group_id) {
            repairs.push(Repair::ReassignedOrphan {
                todo_id: todo.id.clone(),
                group_id: todo.group_id.clone(),
            });
            todo.group_id = DEFAULT_GROUP_ID.to_string();
        }
    }

    if let Some(selected) = &state.selected_group_id
        && !seen.contains(selected)
    {
        repairs.push(Repair::ResetSelection(selected.clone()));
        state.selected_group_id = Some(DEFAULT_GROUP_ID.to_string());
    }

    repairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::todo::Todo;

    fn default_group() -> Group {
        Group::new("default".into(), "Daily".into(), "red".into())
    }

    fn broken() -> StoreState {
        serde_json::from_str(
            r#"{
  "todos": [
    {"id": "a", "text": "one", "completed": false, "groupId": "work", "createdAt": 1},
    {"id": "a", "text": "dup", "completed": true, "groupId": "work", "createdAt": 2},
    {"id": "b", "text": "orphan", "completed": false, "groupId": "gone"}
  ],
  "groups": [
    {"id": "work", "name": "Work", "color": "blue"},
    {"id": "work", "name": "Work again", "color": "green"}
  ],
  "selectedGroupId": "gone"
}"#,
        )
        .unwrap()
    }

    #[test]
    fn check_reports_every_violation() {
        let result = check_state(&broken());
        assert!(!result.valid);
        assert!(result.errors.contains(&CheckError::MissingDefaultGroup));
        assert!(result.errors.contains(&CheckError::DuplicateGroupId {
            group_id: "work".into()
        }));
        assert!(result.errors.contains(&CheckError::DuplicateTodoId {
            todo_id: "a".into()
        }));
        assert!(result.errors.contains(&CheckError::OrphanTodo {
            todo_id: "b".into(),
            group_id: "gone".into()
        }));
        assert!(result.warnings.contains(&CheckWarning::DanglingSelection {
            group_id: "gone".into()
        }));
        assert!(result.warnings.contains(&CheckWarning::MissingResetDate));
        assert!(result.warnings.contains(&CheckWarning::MissingCreatedAt {
            todo_id: "b".into()
        }));
    }

    #[test]
    fn normalize_repairs_and_then_checks_clean() {
        let mut state = broken();
        let repairs = normalize(&mut state, &default_group());

        assert!(repairs.contains(&Repair::InsertedDefaultGroup));
        assert!(repairs.contains(&Repair::DroppedDuplicateGroup("work".into())));
        assert!(repairs.contains(&Repair::DroppedDuplicateTodo("a".into())));
        assert!(repairs.contains(&Repair::ResetSelection("gone".into())));

        assert_eq!(state.groups.len(), 2);
        assert_eq!(state.groups[0].id, "default");
        assert_eq!(state.groups[1].name, "Work");
        assert_eq!(state.todos.len(), 2);
        assert_eq!(state.todos[0].text, "one");
        assert_eq!(state.todos[1].group_id, "default");
        assert_eq!(state.selected_group_id.as_deref(), Some("default"));
        assert!(check_state(&state).valid);
    }

    #[test]
    fn normalize_sound_document_is_noop() {
        let mut state = StoreState::seeded(
            default_group(),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        state
            .todos
            .push(Todo::new("t".into(), "x".into(), "default".into(), 0));
        let before = state.clone();
        assert!(normalize(&mut state, &default_group()).is_empty());
        assert_eq!(state, before);
    }
}
