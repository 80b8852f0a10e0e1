mod store;

pub(crate) use store::TransactionStore;
