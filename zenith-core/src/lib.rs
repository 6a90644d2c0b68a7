pub mod cli;
pub mod collections;
pub mod log;
pub mod profile;
