//! Trade execution against the nad.fun bonding curve
//!
//! - `Quoter` prices a trade through the lens contract
//! - `AllowanceManager` gates sells on a confirmed router approval
//! - `TradeExecutor` drives a trade through its lifecycle and records it

mod allowance;
mod clock;
mod executor;
mod lifecycle;
mod quoter;
mod types;

pub use allowance::{AllowanceCheck, AllowanceManager};
pub use clock::{Clock, FixedClock, SystemClock};
pub use executor::{Execution, SellResult, TradeExecutor};
pub use lifecycle::{TradeLifecycle, TradeState};
pub use quoter::Quoter;
pub use types::{
    min_amount_out, AllowanceState, Quote, TradeDirection, TradeOutcome, TradeParams,
    TradeRequest, TradeStatus,
};
