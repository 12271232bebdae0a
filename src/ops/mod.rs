pub mod check;
pub mod group_ops;
pub mod reset;
pub mod todo_ops;

/// A mutation the store refused. The state is untouched when one of these
/// comes back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("group not found: {0}")]
    InvalidGroup(String),
    #[error("the default group cannot be deleted")]
    ProtectedGroup,
}
