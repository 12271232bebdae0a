use serde::Serialize;

use crate::model::group::Group;
use crate::model::state::StoreState;
use crate::model::todo::Todo;

/// Length of the id prefix shown in text output
pub const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TodoJson {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub group_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

#[derive(Serialize)]
pub struct GroupJson {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub selected: bool,
    pub todos: usize,
    pub done: usize,
}

#[derive(Serialize)]
pub struct GroupListingJson {
    pub group: GroupJson,
    pub todos: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct StatusJson {
    pub data_dir: String,
    pub document: String,
    pub last_reset_date: Option<String>,
    pub selected_group_id: Option<String>,
    pub groups: usize,
    pub todos: usize,
    pub done: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn todo_to_json(todo: &Todo) -> TodoJson {
    TodoJson {
        id: todo.id.clone(),
        text: todo.text.clone(),
        completed: todo.completed,
        group_id: todo.group_id.clone(),
        created_at: todo.created_at,
    }
}

pub fn group_to_json(group: &Group, state: &StoreState) -> GroupJson {
    let (todos, done) = counts(state, &group.id);
    GroupJson {
        id: group.id.clone(),
        name: group.name.clone(),
        color: group.color.clone(),
        selected: state.effective_selection() == Some(group.id.as_str()),
        todos,
        done,
    }
}

pub fn listing_to_json(group: &Group, state: &StoreState) -> GroupListingJson {
    GroupListingJson {
        group: group_to_json(group, state),
        todos: state.todos_in(&group.id).map(todo_to_json).collect(),
    }
}

fn counts(state: &StoreState, group_id: &str) -> (usize, usize) {
    state
        .todos_in(group_id)
        .fold((0, 0), |(n, done), t| (n + 1, done + usize::from(t.completed)))
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// `[x] 1a2b3c4d  Buy milk`
pub fn format_todo_line(todo: &Todo) -> String {
    let check = if todo.completed { 'x' } else { ' ' };
    format!("[{}] {:<width$}  {}", check, short_id(&todo.id), todo.text, width = SHORT_ID_LEN)
}

/// `* Work (3f2a1b9c)  2/5`
pub fn format_group_line(group: &Group, state: &StoreState) -> String {
    let marker = if state.effective_selection() == Some(group.id.as_str()) {
        '*'
    } else {
        ' '
    };
    let (todos, done) = counts(state, &group.id);
    format!(
        "{} {} ({})  {}/{}",
        marker,
        group.name,
        short_id(&group.id),
        done,
        todos
    )
}

/// A group heading followed by its todos, indented.
pub fn format_group_listing(group: &Group, state: &StoreState) -> String {
    let mut out = format_group_line(group, state);
    out.push('\n');
    let mut any = false;
    for todo in state.todos_in(&group.id) {
        out.push_str("    ");
        out.push_str(&format_todo_line(todo));
        out.push('\n');
        any = true;
    }
    if !any {
        out.push_str("    (empty)\n");
    }
    out
}
