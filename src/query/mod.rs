mod query;

pub(crate) use query::QueryService;
pub use query::TransactionPage;
