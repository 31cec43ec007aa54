use soroban_sdk::{ Address, BytesN, Env, IntoVal, Symbol, Val, Vec };

use crate::storage::{ MinipoolStatus, PoolOperation };

pub struct PoolEvents {}

impl PoolEvents {
    /// Emitted when the pool is initialized
    ///
    /// - topics - `["initialize", admin: Address]`
    /// - data - `[stake_asset: Address, oracle: Address, validator_size: i128]`
    pub fn initialize(
        env: &Env,
        admin: Address,
        stake_asset: Address,
        oracle: Address,
        validator_size: i128
    ) {
        let topics = (Symbol::new(env, "initialize"), admin);
        env.events().publish(topics, (stake_asset, oracle, validator_size));
    }

    // Depositor events

    /// Emitted when a user deposits into the pool
    ///
    /// - topics - `["deposit", user: Address]`
    /// - data - `[assets: i128, shares: i128, total_shares: i128, total_backing: i128]`
    pub fn deposit(
        env: &Env,
        user: Address,
        assets: i128,
        shares: i128,
        total_shares: i128,
        total_backing: i128
    ) {
        let topics = (Symbol::new(env, "deposit"), user);
        env.events().publish(topics, (assets, shares, total_shares, total_backing));
    }

    /// Emitted when a withdrawal is paid from the liquid reserve in the same call
    ///
    /// - topics - `["withdraw_instant", user: Address]`
    /// - data - `[shares: i128, assets: i128]`
    pub fn withdraw_instant(env: &Env, user: Address, shares: i128, assets: i128) {
        let topics = (Symbol::new(env, "withdraw_instant"), user);
        env.events().publish(topics, (shares, assets));
    }

    /// Emitted when a withdrawal is queued for epoch-delayed settlement
    ///
    /// - topics - `["withdraw_request", user: Address]`
    /// - data - `[shares: i128, assets: i128, request_epoch: u64]`
    pub fn withdraw_request(
        env: &Env,
        user: Address,
        shares: i128,
        assets: i128,
        request_epoch: u64
    ) {
        let topics = (Symbol::new(env, "withdraw_request"), user);
        env.events().publish(topics, (shares, assets, request_epoch));
    }

    /// - topics - `["withdraw_claim", user: Address]`
    /// - data - `[shares: i128, assets: i128]`
    pub fn withdraw_claim(env: &Env, user: Address, shares: i128, assets: i128) {
        let topics = (Symbol::new(env, "withdraw_claim"), user);
        env.events().publish(topics, (shares, assets));
    }

    // Operator events

    /// - topics - `["operator_registered", operator: Address]`
    /// - data - `[index: u32, bond: i128, collateral: i128]`
    pub fn operator_registered(
        env: &Env,
        operator: Address,
        index: u32,
        bond: i128,
        collateral: i128
    ) {
        let topics = (Symbol::new(env, "operator_registered"), operator);
        env.events().publish(topics, (index, bond, collateral));
    }

    pub fn operator_activated(env: &Env, operator: Address) {
        let topics = (Symbol::new(env, "operator_activated"), operator);
        env.events().publish(topics, ());
    }

    /// - topics - `["operator_deactivated", operator: Address]`
    /// - data - `collateral: i128`
    pub fn operator_deactivated(env: &Env, operator: Address, collateral: i128) {
        let topics = (Symbol::new(env, "operator_deactivated"), operator);
        env.events().publish(topics, collateral);
    }

    /// Emitted when operator collateral is moved into the liquid reserve
    ///
    /// - topics - `["operator_slashed", operator: Address]`
    /// - data - `[slashed: i128, remaining_collateral: i128]`
    pub fn operator_slashed(env: &Env, operator: Address, slashed: i128, remaining: i128) {
        let topics = (Symbol::new(env, "operator_slashed"), operator);
        env.events().publish(topics, (slashed, remaining));
    }

    pub fn collateral_added(env: &Env, operator: Address, amount: i128, collateral: i128) {
        let topics = (Symbol::new(env, "collateral_added"), operator);
        env.events().publish(topics, (amount, collateral));
    }

    /// - topics - `["bond_added", operator: Address]`
    /// - data - `[amount: i128, bond_escrow: i128]`
    pub fn bond_added(env: &Env, operator: Address, amount: i128, bond_escrow: i128) {
        let topics = (Symbol::new(env, "bond_added"), operator);
        env.events().publish(topics, (amount, bond_escrow));
    }

    pub fn commission_settled(env: &Env, operator: Address, amount: i128) {
        let topics = (Symbol::new(env, "commission_settled"), operator);
        env.events().publish(topics, amount);
    }

    // Minipool events

    /// Emitted when pooled funds are handed to an operator
    ///
    /// - topics - `["minipool_created", operator: Address, id: u32]`
    /// - data - `[bond_portion: i128, pooled_portion: i128, commission_bps: u32]`
    pub fn minipool_created(
        env: &Env,
        operator: Address,
        id: u32,
        bond_portion: i128,
        pooled_portion: i128,
        commission_bps: u32
    ) {
        let topics = (Symbol::new(env, "minipool_created"), operator, id);
        env.events().publish(topics, (bond_portion, pooled_portion, commission_bps));
    }

    /// - topics - `["minipool_status", id: u32]`
    /// - data - `[status: MinipoolStatus, pubkey: Option<BytesN<48>>]`
    pub fn minipool_status(
        env: &Env,
        id: u32,
        status: MinipoolStatus,
        pubkey: Option<BytesN<48>>
    ) {
        let topics = (Symbol::new(env, "minipool_status"), id);
        env.events().publish(topics, (status, pubkey));
    }

    // Oracle events

    /// - topics - `["report_accepted", reporter: Address]`
    /// - data - `[balance: i128, gross: i128, commission: i128, net: i128, total_backing: i128]`
    pub fn report_accepted(
        env: &Env,
        reporter: Address,
        balance: i128,
        gross: i128,
        commission: i128,
        net: i128,
        total_backing: i128
    ) {
        let topics = (Symbol::new(env, "report_accepted"), reporter);
        env.events().publish(topics, (balance, gross, commission, net, total_backing));
    }

    /// Emitted when a report shows the aggregate balance below the high-water mark
    ///
    /// - topics - `["balance_shortfall", reporter: Address]`
    /// - data - `[balance: i128, high_water_mark: i128]`
    pub fn balance_shortfall(env: &Env, reporter: Address, balance: i128, high_water_mark: i128) {
        let topics = (Symbol::new(env, "balance_shortfall"), reporter);
        env.events().publish(topics, (balance, high_water_mark));
    }

    pub fn slashing_reported(env: &Env, reporter: Address, loss: i128, total_backing: i128) {
        let topics = (Symbol::new(env, "slashing_reported"), reporter);
        env.events().publish(topics, (loss, total_backing));
    }

    // Admin events

    /// - topics - `["config_updated", key: Symbol]`
    /// - data - `value`
    pub fn config_updated<V: IntoVal<Env, Val>>(env: &Env, key: &str, value: V) {
        let topics = (Symbol::new(env, "config_updated"), Symbol::new(env, key));
        env.events().publish(topics, value);
    }

    pub fn paused(env: &Env, operations: Vec<PoolOperation>) {
        env.events().publish((Symbol::new(env, "paused"),), operations);
    }

    pub fn unpaused(env: &Env, operations: Vec<PoolOperation>) {
        env.events().publish((Symbol::new(env, "unpaused"),), operations);
    }
}
