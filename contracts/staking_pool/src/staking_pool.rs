use soroban_sdk::{ Address, BytesN, Env, Vec };

use crate::{
    controller::rewards::ReportOutcome,
    errors::ErrorCode,
    storage::{
        Config,
        Minipool,
        OracleState,
        Operator,
        Pool,
        PoolOperation,
        PoolParams,
        WithdrawalOutcome,
        WithdrawalRequest,
        WithdrawalStatus,
    },
};

pub trait StakingPoolTrait {
    // ################################################################
    //                             ADMIN
    // ################################################################

    fn initialize(env: Env, admin: Address, params: PoolParams) -> Result<(), ErrorCode>;

    fn set_commission_rate(env: Env, sender: Address, commission_bps: u32) -> Result<(), ErrorCode>;

    fn set_report_cooldown(env: Env, sender: Address, cooldown: u64) -> Result<(), ErrorCode>;

    fn set_min_collateral(env: Env, sender: Address, min_collateral: i128) -> Result<(), ErrorCode>;

    fn set_min_deposit(env: Env, sender: Address, min_deposit: i128) -> Result<(), ErrorCode>;

    fn set_max_rate_change(env: Env, sender: Address, max_rate_change_bps: u32) -> Result<(), ErrorCode>;

    fn set_oracle(env: Env, sender: Address, oracle: Address) -> Result<(), ErrorCode>;

    fn set_admin(env: Env, sender: Address, new_admin: Address) -> Result<(), ErrorCode>;

    fn pause(env: Env, sender: Address, operations: Vec<PoolOperation>) -> Result<(), ErrorCode>;

    fn unpause(env: Env, sender: Address, operations: Vec<PoolOperation>) -> Result<(), ErrorCode>;

    /// Moves up to `amount` of the operator's collateral into the liquid
    /// reserve and returns the amount slashed.
    fn slash_operator(
        env: Env,
        sender: Address,
        operator: Address,
        amount: i128
    ) -> Result<i128, ErrorCode>;

    fn activate_operator(env: Env, sender: Address, operator: Address) -> Result<(), ErrorCode>;

    fn deactivate_operator(env: Env, sender: Address, operator: Address) -> Result<(), ErrorCode>;

    fn settle_commission(env: Env, sender: Address, operator: Address) -> Result<i128, ErrorCode>;

    // ################################################################
    //                            OPERATOR
    // ################################################################

    fn register_operator(env: Env, sender: Address, bond: i128) -> Result<Operator, ErrorCode>;

    /// Returns the operator's collateral after the top-up.
    fn add_collateral(env: Env, sender: Address, amount: i128) -> Result<i128, ErrorCode>;

    /// Escrows one more bond and returns the operator's escrow. Each
    /// validator handed to the operator consumes one bond.
    fn add_bond(env: Env, sender: Address) -> Result<i128, ErrorCode>;

    // ################################################################
    //                             ORACLE
    // ################################################################

    fn submit_report(env: Env, sender: Address, balance: i128) -> Result<ReportOutcome, ErrorCode>;

    /// Returns total backing after the loss.
    fn report_slashing(env: Env, sender: Address, loss: i128) -> Result<i128, ErrorCode>;

    // ################################################################
    //                            MINIPOOL
    // ################################################################

    fn activate_minipool(
        env: Env,
        sender: Address,
        id: u32,
        pubkey: BytesN<48>
    ) -> Result<(), ErrorCode>;

    fn mark_minipool_exiting(env: Env, sender: Address, id: u32) -> Result<(), ErrorCode>;

    fn mark_minipool_exited(
        env: Env,
        sender: Address,
        id: u32,
        returned: i128
    ) -> Result<(), ErrorCode>;

    // ################################################################
    //                             USER
    // ################################################################

    /// Returns the number of shares minted.
    fn deposit(env: Env, sender: Address, assets: i128) -> Result<i128, ErrorCode>;

    fn withdraw(env: Env, sender: Address, shares: i128) -> Result<WithdrawalOutcome, ErrorCode>;

    fn claim_withdrawal(env: Env, sender: Address) -> Result<i128, ErrorCode>;

    /// Maintenance entry point for queued deposits. Anyone may call it.
    fn process_pending_deposits(env: Env, sender: Address) -> Result<u32, ErrorCode>;

    // ################################################################
    //                             QUERIES
    // ################################################################

    fn query_config(env: Env) -> Result<Config, ErrorCode>;

    fn query_admin(env: Env) -> Result<Address, ErrorCode>;

    fn query_pool(env: Env) -> Result<Pool, ErrorCode>;

    fn query_exchange_rate(env: Env) -> Result<i128, ErrorCode>;

    fn query_total_backing(env: Env) -> Result<i128, ErrorCode>;

    /// `(pending_deposits, validator_size)`
    fn query_funding_progress(env: Env) -> Result<(i128, i128), ErrorCode>;

    fn query_shares(env: Env, address: Address) -> i128;

    fn query_claim_value(env: Env, address: Address) -> Result<i128, ErrorCode>;

    fn query_preview_deposit(env: Env, assets: i128) -> Result<i128, ErrorCode>;

    fn query_preview_redeem(env: Env, shares: i128) -> Result<i128, ErrorCode>;

    fn query_withdrawal_request(env: Env, address: Address) -> Option<WithdrawalRequest>;

    fn query_withdrawal_status(env: Env, address: Address) -> Result<WithdrawalStatus, ErrorCode>;

    fn query_operators(env: Env) -> Result<Vec<Operator>, ErrorCode>;

    fn query_operator(env: Env, address: Address) -> Result<Operator, ErrorCode>;

    fn query_minipool(env: Env, id: u32) -> Result<Minipool, ErrorCode>;

    fn query_minipool_count(env: Env) -> Result<u32, ErrorCode>;

    fn query_oracle_state(env: Env) -> Result<OracleState, ErrorCode>;

    fn query_current_epoch(env: Env) -> Result<u64, ErrorCode>;
}
