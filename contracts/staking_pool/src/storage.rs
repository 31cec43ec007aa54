use soroban_sdk::{ contracttype, Address, BytesN, Env, Vec };
use stqrl::{
    constants::{
        BPS_DENOMINATOR,
        INSTANCE_BUMP_AMOUNT,
        INSTANCE_LIFETIME_THRESHOLD,
        MAX_COMMISSION_BPS,
        MIN_COMMISSION_BPS,
        PERSISTENT_BUMP_AMOUNT,
        PERSISTENT_LIFETIME_THRESHOLD,
    },
    validate,
};

use crate::errors::{ ErrorCode, PoolResult };

#[contracttype]
#[derive(Clone, Debug)]
pub enum DataKey {
    Initialized,
    Busy,
    Admin,
    Config,
    Pool,
    Registry,
    Oracle,
    Position(Address),
    Withdrawal(Address),
    Operator(Address),
    Minipool(u32),
}

// ################################################################
//                             Config
// ################################################################

#[contracttype]
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
pub enum PoolOperation {
    Deposit,
    Withdraw,
    Claim,
    RegisterOperator,
    Report,
    Funding,
}

/// Parameters supplied once at initialization.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolParams {
    /// Token contract of the native staking asset
    pub stake_asset: Address,
    /// Single trusted balance reporter
    pub oracle: Address,
    /// Backing required to fund one validator. Fixed for the life of the pool.
    pub validator_size: i128,
    /// The two accepted operator bonds, ascending
    pub bond_tiers: Vec<i128>,
    pub min_collateral: i128,
    pub min_deposit: i128,
    pub commission_bps: u32,
    pub max_rate_change_bps: u32,
    /// Minimum seconds between two accepted reports
    pub report_cooldown: u64,
    /// Seconds per withdrawal epoch
    pub epoch_length: u64,
    /// Upper bound on validator hand-offs in one threshold check
    pub max_fundings_per_call: u32,
}

impl PoolParams {
    pub fn validate(&self, env: &Env) -> PoolResult {
        validate!(
            env,
            self.validator_size > 0,
            ErrorCode::InvalidParams,
            "validator size must be positive"
        )?;

        validate!(
            env,
            self.bond_tiers.len() == 2,
            ErrorCode::InvalidParams,
            "exactly two bond tiers required",
            self.bond_tiers.len()
        )?;
        let low = self.bond_tiers.get(0).unwrap_or_default();
        let high = self.bond_tiers.get(1).unwrap_or_default();
        validate!(
            env,
            0 < low && low < high && high < self.validator_size,
            ErrorCode::InvalidParams,
            "bond tiers must ascend below validator size",
            low,
            high
        )?;

        validate!(
            env,
            self.min_collateral >= 0 && self.min_deposit > 0,
            ErrorCode::InvalidParams,
            "invalid collateral or deposit minimum"
        )?;
        validate!(
            env,
            self.epoch_length > 0 && self.max_fundings_per_call > 0,
            ErrorCode::InvalidParams,
            "epoch length and funding cap must be positive"
        )?;
        validate!(
            env,
            (MIN_COMMISSION_BPS..=MAX_COMMISSION_BPS).contains(&self.commission_bps),
            ErrorCode::InvalidParams,
            "commission out of bounds",
            self.commission_bps
        )?;
        validate!(
            env,
            (1..=BPS_DENOMINATOR).contains(&self.max_rate_change_bps),
            ErrorCode::InvalidParams,
            "max rate change out of bounds",
            self.max_rate_change_bps
        )?;

        Ok(())
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub stake_asset: Address,
    pub oracle: Address,
    pub validator_size: i128,
    pub bond_tiers: Vec<i128>,
    pub min_collateral: i128,
    pub min_deposit: i128,
    pub commission_bps: u32,
    pub max_rate_change_bps: u32,
    pub report_cooldown: u64,
    pub epoch_length: u64,
    pub max_fundings_per_call: u32,
    pub paused_operations: Vec<PoolOperation>,
}

impl Config {
    pub fn from_params(env: &Env, params: PoolParams) -> Self {
        Config {
            stake_asset: params.stake_asset,
            oracle: params.oracle,
            validator_size: params.validator_size,
            bond_tiers: params.bond_tiers,
            min_collateral: params.min_collateral,
            min_deposit: params.min_deposit,
            commission_bps: params.commission_bps,
            max_rate_change_bps: params.max_rate_change_bps,
            report_cooldown: params.report_cooldown,
            epoch_length: params.epoch_length,
            max_fundings_per_call: params.max_fundings_per_call,
            paused_operations: Vec::new(env),
        }
    }

    pub fn is_operation_paused(&self, operation: &PoolOperation) -> bool {
        self.paused_operations.contains(operation)
    }

    pub fn is_bond_tier(&self, bond: i128) -> bool {
        self.bond_tiers.contains(bond)
    }

    pub fn current_epoch(&self, now: u64) -> u64 {
        // epoch_length is validated non-zero at initialization
        now / self.epoch_length
    }
}

pub fn save_config(env: &Env, config: &Config) {
    env.storage().persistent().set(&DataKey::Config, config);
    env.storage()
        .persistent()
        .extend_ttl(&DataKey::Config, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

pub fn get_config(env: &Env) -> PoolResult<Config> {
    let config = env
        .storage()
        .persistent()
        .get(&DataKey::Config)
        .ok_or(ErrorCode::NotInitialized)?;

    env.storage()
        .persistent()
        .extend_ttl(&DataKey::Config, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);

    Ok(config)
}

// ################################################################
//                             Ledger
// ################################################################

/// Process-wide pool totals. All amounts are in units of the staking asset,
/// except `total_shares`.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Pool {
    pub total_shares: i128,
    /// Reserve + idle deposits + staked principal + reported net rewards - reported losses
    pub total_backing: i128,
    /// Subset of `total_backing` available for instant withdrawal
    pub liquid_reserve: i128,
    /// Deposited but not yet handed to an operator
    pub pending_deposits: i128,
}

/// Append-only operator arena plus the round-robin cursor.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Registry {
    pub operators: Vec<Address>,
    pub cursor: u32,
    pub total_validators: u32,
    pub minipool_count: u32,
}

impl Registry {
    pub fn new(env: &Env) -> Self {
        Registry {
            operators: Vec::new(env),
            cursor: 0,
            total_validators: 0,
            minipool_count: 0,
        }
    }
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OracleState {
    /// High-water mark of the aggregate validator balance
    pub last_reported_balance: i128,
    pub last_report_ts: u64,
    pub report_count: u64,
}

/// In-memory unit of work over the pool-wide records. Controllers mutate it;
/// `commit_ledger` is the only way to persist it.
#[derive(Clone, Debug)]
pub struct Ledger {
    pub pool: Pool,
    pub registry: Registry,
    pub oracle: OracleState,
}

/// Proof that the ledger was persisted during this invocation. Token payouts
/// require one, so no transfer can run ahead of bookkeeping.
#[derive(Debug)]
pub struct Committed(());

pub fn init_ledger(env: &Env) -> Committed {
    commit_ledger(env, &(Ledger {
        pool: Pool::default(),
        registry: Registry::new(env),
        oracle: OracleState::default(),
    }))
}

pub fn load_ledger(env: &Env) -> PoolResult<Ledger> {
    let storage = env.storage().persistent();
    let pool: Pool = storage.get(&DataKey::Pool).ok_or(ErrorCode::NotInitialized)?;
    let registry: Registry = storage.get(&DataKey::Registry).ok_or(ErrorCode::NotInitialized)?;
    let oracle: OracleState = storage.get(&DataKey::Oracle).ok_or(ErrorCode::NotInitialized)?;

    for key in [DataKey::Pool, DataKey::Registry, DataKey::Oracle] {
        storage.extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }

    Ok(Ledger { pool, registry, oracle })
}

pub fn commit_ledger(env: &Env, ledger: &Ledger) -> Committed {
    let storage = env.storage().persistent();
    storage.set(&DataKey::Pool, &ledger.pool);
    storage.set(&DataKey::Registry, &ledger.registry);
    storage.set(&DataKey::Oracle, &ledger.oracle);

    for key in [DataKey::Pool, DataKey::Registry, DataKey::Oracle] {
        storage.extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }

    Committed(())
}

// ################################################################
//                             Accounts
// ################################################################

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Position {
    pub shares: i128,
    pub last_update_ts: u64,
}

pub fn get_position(env: &Env, owner: &Address) -> Position {
    let key = DataKey::Position(owner.clone());
    let position = env.storage().persistent().get::<_, Position>(&key).unwrap_or_default();

    if position.shares > 0 {
        env.storage()
            .persistent()
            .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }

    position
}

pub fn save_position(env: &Env, owner: &Address, position: &Position) {
    let key = DataKey::Position(owner.clone());
    if position.shares == 0 {
        env.storage().persistent().remove(&key);
        return;
    }

    env.storage().persistent().set(&key, position);
    env.storage()
        .persistent()
        .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

// ################################################################
//                          Withdrawals
// ################################################################

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalRequest {
    pub shares: i128,
    /// Redemption value fixed when the request was made
    pub assets: i128,
    pub request_epoch: u64,
    pub requested_at: u64,
    pub settled: bool,
}

#[contracttype]
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
pub enum WithdrawalStatus {
    NoRequest,
    Pending,
    Claimable,
    Settled,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WithdrawalOutcome {
    /// Paid from the liquid reserve in the same call
    Instant(i128),
    /// Queued: (recorded assets, request epoch)
    Queued(i128, u64),
}

pub fn get_withdrawal_request(env: &Env, owner: &Address) -> Option<WithdrawalRequest> {
    let key = DataKey::Withdrawal(owner.clone());
    let request = env.storage().persistent().get::<_, WithdrawalRequest>(&key);

    if request.is_some() {
        env.storage()
            .persistent()
            .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }

    request
}

pub fn save_withdrawal_request(env: &Env, owner: &Address, request: &WithdrawalRequest) {
    let key = DataKey::Withdrawal(owner.clone());
    env.storage().persistent().set(&key, request);
    env.storage()
        .persistent()
        .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

// ################################################################
//                           Operators
// ################################################################

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operator {
    pub address: Address,
    /// Stable position in the registry arena
    pub index: u32,
    pub registered: bool,
    pub active: bool,
    pub bond_amount: i128,
    /// Bonds paid in and not yet handed off with a validator
    pub bond_escrow: i128,
    pub collateral: i128,
    pub validator_count: u32,
    pub pending_commission: i128,
    pub total_commission: i128,
    pub registered_at: u64,
}

pub fn get_operator(env: &Env, address: &Address) -> Option<Operator> {
    let key = DataKey::Operator(address.clone());
    let operator = env.storage().persistent().get::<_, Operator>(&key);

    if operator.is_some() {
        env.storage()
            .persistent()
            .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }

    operator
}

pub fn save_operator(env: &Env, operator: &Operator) {
    let key = DataKey::Operator(operator.address.clone());
    env.storage().persistent().set(&key, operator);
    env.storage()
        .persistent()
        .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

// ################################################################
//                           Minipools
// ################################################################

#[contracttype]
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
pub enum MinipoolStatus {
    Pending,
    Active,
    Exiting,
    Exited,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Minipool {
    pub id: u32,
    pub operator: Address,
    pub bond_portion: i128,
    pub pooled_portion: i128,
    pub commission_bps_at_creation: u32,
    pub status: MinipoolStatus,
    pub pubkey: Option<BytesN<48>>,
    pub created_at: u64,
}

pub fn get_minipool(env: &Env, id: u32) -> Option<Minipool> {
    let key = DataKey::Minipool(id);
    let minipool = env.storage().persistent().get::<_, Minipool>(&key);

    if minipool.is_some() {
        env.storage()
            .persistent()
            .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }

    minipool
}

pub fn save_minipool(env: &Env, minipool: &Minipool) {
    let key = DataKey::Minipool(minipool.id);
    env.storage().persistent().set(&key, minipool);
    env.storage()
        .persistent()
        .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

// ################################################################
//                             Utils
// ################################################################

pub mod utils {
    use soroban_sdk::log;

    use super::*;

    pub fn is_initialized(env: &Env) -> bool {
        env.storage().instance().get(&DataKey::Initialized).unwrap_or(false)
    }

    pub fn set_initialized(env: &Env) {
        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
    }

    pub fn save_admin(env: &Env, address: &Address) {
        env.storage().persistent().set(&DataKey::Admin, address);
        env.storage()
            .persistent()
            .extend_ttl(&DataKey::Admin, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }

    pub fn get_admin(env: &Env) -> PoolResult<Address> {
        let admin = env
            .storage()
            .persistent()
            .get(&DataKey::Admin)
            .ok_or(ErrorCode::NotInitialized)?;
        env.storage()
            .persistent()
            .extend_ttl(&DataKey::Admin, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);

        Ok(admin)
    }

    pub fn is_admin(env: &Env, sender: &Address) -> PoolResult {
        if get_admin(env)? != *sender {
            log!(env, "Staking Pool: You are not authorized!");
            return Err(ErrorCode::NotAuthorized);
        }

        Ok(())
    }

    /// Minipool lifecycle confirmations come from the admin or the oracle reporter.
    pub fn is_confirmer(env: &Env, config: &Config, sender: &Address) -> PoolResult {
        if *sender == config.oracle {
            return Ok(());
        }

        is_admin(env, sender)
    }

    pub fn bump_instance(env: &Env) {
        env.storage().instance().extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
    }
}
