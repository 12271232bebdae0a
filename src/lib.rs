//! daylist: a to-do list whose completed items uncheck themselves every
//! morning. Todos live in named groups; the whole state is one JSON
//! document written through a coalescing background writer.

pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod store;
pub mod util;
