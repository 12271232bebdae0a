use crate::model::state::StoreState;
use crate::model::todo::Todo;

use super::StoreError;

/// Append a new, uncompleted todo to an existing group.
pub fn add_todo(
    state: &mut StoreState,
    id: String,
    text: String,
    group_id: &str,
    created_at: i64,
) -> Result<(), StoreError> {
    if !state.has_group(group_id) {
        return Err(StoreError::InvalidGroup(group_id.to_string()));
    }
    state
        .todos
        .push(Todo::new(id, text, group_id.to_string(), created_at));
    Ok(())
}

/// Flip `completed`. Returns false (and changes nothing) when the id is
/// unknown, e.g. a caller acting on a todo that was just deleted.
pub fn toggle_todo(state: &mut StoreState, id: &str) -> bool {
    match state.todo_mut(id) {
        Some(todo) => {
            todo.completed = !todo.completed;
            true
        }
        None => false,
    }
}

/// Remove a todo, returning it if it existed.
pub fn delete_todo(state: &mut StoreState, id: &str) -> Option<Todo> {
    let pos = state.todos.iter().position(|t| t.id == id)?;
    Some(state.todos.remove(pos))
}

/// Resolve a todo id from a full id or a unique prefix of one.
pub fn resolve_todo_id<'a>(state: &'a StoreState, needle: &str) -> Result<&'a str, String> {
    if let Some(todo) = state.todo(needle) {
        return Ok(todo.id.as_str());
    }
    let matches: Vec<&str> = state
        .todos
        .iter()
        .filter(|t| t.id.starts_with(needle))
        .map(|t| t.id.as_str())
        .collect();
    match matches.as_slice() {
        [] => Err(format!("todo not found: {}", needle)),
        [one] => Ok(*one),
        _ => Err(format!(
            "ambiguous todo id '{}' matches {} todos",
            needle,
            matches.len()
        )),
    }
}
