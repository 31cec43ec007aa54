pub mod minipool;
pub mod pool;
pub mod registry;
pub mod rewards;
pub mod scheduler;
