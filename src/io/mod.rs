pub mod config_io;
pub mod gateway;
pub mod recovery;
pub mod writer;
