pub mod common;
pub mod interface;
pub mod manager;
pub mod notification;
pub mod protocol;
pub mod query;
pub mod testing;
pub mod transaction;

mod store;
mod trade;
