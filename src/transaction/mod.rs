mod builder;
mod factory;
mod transaction;

pub use builder::{NewTransaction, NewTransactionBuilder};
pub(crate) use factory::TransactionFactory;
pub use transaction::*;
