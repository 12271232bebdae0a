use rand::Rng;

use crate::model::group::{DEFAULT_GROUP_ID, Group};
use crate::model::state::StoreState;
use crate::model::todo::Todo;

use super::StoreError;

/// A random hue at fixed saturation/lightness: distinct enough to tell
/// groups apart without anyone picking colors.
pub fn random_color() -> String {
    let hue = rand::thread_rng().gen_range(0..360);
    format!("hsl({}, 70%, 50%)", hue)
}

/// Append a group. The caller supplies a fresh id.
pub fn add_group(state: &mut StoreState, id: String, name: String, color: Option<String>) {
    let color = color.unwrap_or_else(random_color);
    state.groups.push(Group::new(id, name, color));
}

/// Create a group, seed it with one todo and select it, all in one step.
pub fn add_todo_with_new_group(
    state: &mut StoreState,
    group_id: String,
    group_name: String,
    todo_id: String,
    text: String,
    created_at: i64,
) {
    add_group(state, group_id.clone(), group_name, None);
    state
        .todos
        .push(Todo::new(todo_id, text, group_id.clone(), created_at));
    state.selected_group_id = Some(group_id);
}

/// Delete a group and every todo in it. Returns the removed todos; an
/// unknown id removes nothing.
pub fn delete_group(state: &mut StoreState, id: &str) -> Result<Vec<Todo>, StoreError> {
    if id == DEFAULT_GROUP_ID {
        return Err(StoreError::ProtectedGroup);
    }

    state.groups.retain(|g| g.id != id);

    let (removed, kept): (Vec<Todo>, Vec<Todo>) = std::mem::take(&mut state.todos)
        .into_iter()
        .partition(|t| t.group_id == id);
    state.todos = kept;

    if state.selected_group_id.as_deref() == Some(id) {
        state.selected_group_id = Some(DEFAULT_GROUP_ID.to_string());
    }

    Ok(removed)
}

/// Set the selection. Not validated: a stale id reads as `default` through
/// [`StoreState::effective_selection`].
pub fn select_group(state: &mut StoreState, id: Option<String>) {
    state.selected_group_id = id;
}

/// Find a group by exact id, then by case-insensitive name.
pub fn resolve_group<'a>(state: &'a StoreState, needle: &str) -> Result<&'a Group, String> {
    if let Some(group) = state.group(needle) {
        return Ok(group);
    }
    let by_name: Vec<&Group> = state
        .groups
        .iter()
        .filter(|g| g.name.eq_ignore_ascii_case(needle))
        .collect();
    match by_name.as_slice() {
        [] => {
            // Fall back to an id prefix so generated ids can be abbreviated
            let by_prefix: Vec<&Group> = state
                .groups
                .iter()
                .filter(|g| g.id.starts_with(needle))
                .collect();
            match by_prefix.as_slice() {
                [one] => Ok(*one),
                [] => Err(format!("group not found: {}", needle)),
                _ => Err(format!("ambiguous group '{}'", needle)),
            }
        }
        [one] => Ok(*one),
        _ => Err(format!(
            "ambiguous group name '{}' matches {} groups",
            needle,
            by_name.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::todo_ops;
    use chrono::NaiveDate;

    fn state() -> StoreState {
        StoreState::seeded(
            Group::new("default".into(), "Daily".into(), "red".into()),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn random_color_shape() {
        for _ in 0..20 {
            let c = random_color();
            assert!(c.starts_with("hsl("));
            assert!(c.ends_with(", 70%, 50%)"));
            let hue: u32 = c[4..c.find(',').unwrap()].parse().unwrap();
            assert!(hue < 360);
        }
    }

    #[test]
    fn add_group_keeps_given_color() {
        let mut s = state();
        add_group(&mut s, "g1".into(), "Work".into(), Some("#ff0000".into()));
        assert_eq!(s.group("g1").unwrap().color.as_deref(), Some("#ff0000"));
        add_group(&mut s, "g2".into(), "Home".into(), None);
        assert!(s.group("g2").unwrap().color.as_deref().unwrap().starts_with("hsl("));
    }

    #[test]
    fn new_group_with_todo_selects_it() {
        let mut s = state();
        add_todo_with_new_group(&mut s, "g1".into(), "Gym".into(), "t1".into(), "Squats".into(), 7);
        assert_eq!(s.selected_group_id.as_deref(), Some("g1"));
        assert_eq!(s.todos[0].group_id, "g1");
        assert!(s.has_group("g1"));
    }

    #[test]
    fn delete_cascades_and_reselects() {
        let mut s = state();
        add_group(&mut s, "work".into(), "Work".into(), None);
        todo_ops::add_todo(&mut s, "a".into(), "x".into(), "work", 0).unwrap();
        todo_ops::add_todo(&mut s, "b".into(), "y".into(), "default", 0).unwrap();
        todo_ops::add_todo(&mut s, "c".into(), "z".into(), "work", 0).unwrap();
        select_group(&mut s, Some("work".into()));

        let removed = delete_group(&mut s, "work").unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(s.todos.len(), 1);
        assert_eq!(s.todos[0].id, "b");
        assert_eq!(s.selected_group_id.as_deref(), Some("default"));
    }

    #[test]
    fn delete_default_is_protected() {
        let mut s = state();
        let before = s.clone();
        assert_eq!(
            delete_group(&mut s, "default").unwrap_err(),
            StoreError::ProtectedGroup
        );
        assert_eq!(s, before);
    }

    #[test]
    fn resolve_by_id_name_or_prefix() {
        let mut s = state();
        add_group(&mut s, "1f2e3d".into(), "Work".into(), None);
        assert_eq!(resolve_group(&s, "default").unwrap().id, "default");
        assert_eq!(resolve_group(&s, "work").unwrap().id, "1f2e3d");
        assert_eq!(resolve_group(&s, "1f2").unwrap().id, "1f2e3d");
        assert!(resolve_group(&s, "nope").is_err());
    }
}
