// TTL
pub const DAY_IN_LEDGERS: u32 = 17280;

pub const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
pub const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;

pub const PERSISTENT_BUMP_AMOUNT: u32 = 60 * DAY_IN_LEDGERS;
pub const PERSISTENT_LIFETIME_THRESHOLD: u32 = PERSISTENT_BUMP_AMOUNT - DAY_IN_LEDGERS;

// PRECISIONS
pub const BPS_DENOMINATOR: u32 = 10_000;
pub const BPS_DENOMINATOR_I128: i128 = BPS_DENOMINATOR as i128;

/// Fixed-point scale of the share exchange rate. A rate of `EXCHANGE_RATE_PRECISION` is 1:1.
pub const EXCHANGE_RATE_PRECISION: i128 = 1_000_000_000;

// COMMISSION
pub const MIN_COMMISSION_BPS: u32 = 500; // 5%
pub const MAX_COMMISSION_BPS: u32 = 2_000; // 20%

// TIME
pub const ONE_HOUR: u64 = 3_600;
pub const ONE_DAY: u64 = 86_400;
