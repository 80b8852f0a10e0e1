pub mod config;
pub mod error;
pub(crate) mod persist;
pub mod types;
