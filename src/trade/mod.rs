mod trade;

pub(crate) use trade::{Trade, TradeAccess};
