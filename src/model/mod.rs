pub mod config;
pub mod group;
pub mod state;
pub mod todo;

pub use config::*;
pub use group::*;
pub use state::*;
pub use todo::*;
