use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single to-do item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "groupId")]
    pub group_id: String,
    /// Creation time in epoch milliseconds. Older documents may lack it.
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Todo {
    pub fn new(id: String, text: String, group_id: String, created_at: i64) -> Self {
        Todo {
            id,
            text,
            completed: false,
            group_id,
            created_at: Some(created_at),
            extra: IndexMap::new(),
        }
    }
}

// `created_at` is bookkeeping, not identity: two todos that differ only in
// when they were created compare equal.
impl PartialEq for Todo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.text == other.text
            && self.completed == other.completed
            && self.group_id == other.group_id
            && self.extra == other.extra
    }
}

impl Eq for Todo {}
