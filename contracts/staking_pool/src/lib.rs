#![no_std]

mod contract;
mod controller;
pub mod errors;
mod events;
mod guard;
mod ledger;
mod oracle;
mod settlement;
mod staking_pool;
pub mod storage;

pub use contract::{ StakingPool, StakingPoolClient };
pub use controller::rewards::ReportOutcome;
