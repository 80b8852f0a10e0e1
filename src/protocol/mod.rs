mod confirmation;

pub use confirmation::{apply, TradeAction, TradeEvent, Transition};
