use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::group::{DEFAULT_GROUP_ID, Group};
use super::todo::Todo;

/// The whole persisted document. Every durable write replaces it entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(rename = "selectedGroupId", default)]
    pub selected_group_id: Option<String>,
    /// Local calendar date of the last daily reset
    #[serde(
        rename = "lastResetDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_reset_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl StoreState {
    /// A fresh document: no todos, just the default group, selected, and
    /// already reset for `today`.
    pub fn seeded(default_group: Group, today: NaiveDate) -> Self {
        StoreState {
            todos: Vec::new(),
            groups: vec![default_group],
            selected_group_id: Some(DEFAULT_GROUP_ID.to_string()),
            last_reset_date: Some(today),
            extra: IndexMap::new(),
        }
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn has_group(&self, id: &str) -> bool {
        self.group(id).is_some()
    }

    pub fn todo(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn todo_mut(&mut self, id: &str) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|t| t.id == id)
    }

    /// Todos belonging to a group, in document order
    pub fn todos_in<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = &'a Todo> + 'a {
        self.todos.iter().filter(move |t| t.group_id == group_id)
    }

    /// The selection as readers should see it: a selection pointing at a
    /// missing group reads as the default group. `None` stays `None`.
    pub fn effective_selection(&self) -> Option<&str> {
        match self.selected_group_id.as_deref() {
            Some(id) if self.has_group(id) => Some(id),
            Some(_) => Some(DEFAULT_GROUP_ID),
            None => None,
        }
    }
}
