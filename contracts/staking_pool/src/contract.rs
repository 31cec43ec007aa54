use soroban_sdk::{ contract, contractimpl, contractmeta, log, Address, BytesN, Env, Vec };
use stqrl::{
    constants::{ BPS_DENOMINATOR, MAX_COMMISSION_BPS, MIN_COMMISSION_BPS },
    validate,
};

use crate::{
    controller,
    controller::rewards::ReportOutcome,
    errors::{ ErrorCode, PoolResult },
    events::PoolEvents,
    guard::BusyGuard,
    oracle::SingleReporter,
    settlement::Settlement,
    staking_pool::StakingPoolTrait,
    storage::{
        commit_ledger,
        get_config,
        get_minipool,
        get_operator,
        get_position,
        get_withdrawal_request,
        init_ledger,
        load_ledger,
        save_config,
        save_position,
        save_withdrawal_request,
        utils::{ bump_instance, get_admin, is_admin, is_confirmer, is_initialized, save_admin, set_initialized },
        Config,
        Ledger,
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

contractmeta!(
    key = "Description",
    val = "Liquid staking pool with epoch-delayed withdrawals and round-robin validator funding"
);

#[contract]
pub struct StakingPool;

fn ensure_not_paused(env: &Env, config: &Config, operation: PoolOperation) -> PoolResult {
    validate!(
        env,
        !config.is_operation_paused(&operation),
        ErrorCode::OperationPaused,
        "operation paused"
    )
}

/// Persists the ledger and only then moves tokens.
fn finish(env: &Env, config: &Config, ledger: &Ledger, settlement: Settlement) -> PoolResult {
    ledger.pool.check_invariants(env)?;
    let committed = commit_ledger(env, ledger);
    settlement.execute(&config.stake_asset, committed);
    Ok(())
}

fn admin_config(env: &Env, sender: &Address) -> PoolResult<Config> {
    sender.require_auth();
    bump_instance(env);
    is_admin(env, sender)?;
    get_config(env)
}

#[contractimpl]
impl StakingPoolTrait for StakingPool {
    // ################################################################
    //                             ADMIN
    // ################################################################

    fn initialize(env: Env, admin: Address, params: PoolParams) -> Result<(), ErrorCode> {
        if is_initialized(&env) {
            log!(&env, "Staking Pool: Initialize: initializing contract twice is not allowed");
            return Err(ErrorCode::AlreadyInitialized);
        }

        params.validate(&env)?;

        set_initialized(&env);
        save_admin(&env, &admin);

        let config = Config::from_params(&env, params);
        save_config(&env, &config);
        init_ledger(&env);

        PoolEvents::initialize(
            &env,
            admin,
            config.stake_asset,
            config.oracle,
            config.validator_size
        );

        Ok(())
    }

    fn set_commission_rate(env: Env, sender: Address, commission_bps: u32) -> Result<(), ErrorCode> {
        let mut config = admin_config(&env, &sender)?;

        validate!(
            &env,
            (MIN_COMMISSION_BPS..=MAX_COMMISSION_BPS).contains(&commission_bps),
            ErrorCode::CommissionOutOfBounds,
            "commission out of bounds",
            commission_bps
        )?;

        config.commission_bps = commission_bps;
        save_config(&env, &config);
        PoolEvents::config_updated(&env, "commission_bps", commission_bps);

        Ok(())
    }

    fn set_report_cooldown(env: Env, sender: Address, cooldown: u64) -> Result<(), ErrorCode> {
        let mut config = admin_config(&env, &sender)?;

        config.report_cooldown = cooldown;
        save_config(&env, &config);
        PoolEvents::config_updated(&env, "report_cooldown", cooldown);

        Ok(())
    }

    fn set_min_collateral(env: Env, sender: Address, min_collateral: i128) -> Result<(), ErrorCode> {
        let mut config = admin_config(&env, &sender)?;

        validate!(&env, min_collateral >= 0, ErrorCode::InvalidParams, "negative collateral")?;

        // applies to future checks only; existing operators are not re-evaluated
        config.min_collateral = min_collateral;
        save_config(&env, &config);
        PoolEvents::config_updated(&env, "min_collateral", min_collateral);

        Ok(())
    }

    fn set_min_deposit(env: Env, sender: Address, min_deposit: i128) -> Result<(), ErrorCode> {
        let mut config = admin_config(&env, &sender)?;

        validate!(&env, min_deposit > 0, ErrorCode::InvalidParams, "min deposit must be positive")?;

        config.min_deposit = min_deposit;
        save_config(&env, &config);
        PoolEvents::config_updated(&env, "min_deposit", min_deposit);

        Ok(())
    }

    fn set_max_rate_change(
        env: Env,
        sender: Address,
        max_rate_change_bps: u32
    ) -> Result<(), ErrorCode> {
        let mut config = admin_config(&env, &sender)?;

        validate!(
            &env,
            (1..=BPS_DENOMINATOR).contains(&max_rate_change_bps),
            ErrorCode::RateLimitOutOfBounds,
            "max rate change out of bounds",
            max_rate_change_bps
        )?;

        config.max_rate_change_bps = max_rate_change_bps;
        save_config(&env, &config);
        PoolEvents::config_updated(&env, "max_rate_change_bps", max_rate_change_bps);

        Ok(())
    }

    fn set_oracle(env: Env, sender: Address, oracle: Address) -> Result<(), ErrorCode> {
        let mut config = admin_config(&env, &sender)?;

        config.oracle = oracle.clone();
        save_config(&env, &config);
        PoolEvents::config_updated(&env, "oracle", oracle);

        Ok(())
    }

    fn set_admin(env: Env, sender: Address, new_admin: Address) -> Result<(), ErrorCode> {
        admin_config(&env, &sender)?;

        save_admin(&env, &new_admin);
        PoolEvents::config_updated(&env, "admin", new_admin);

        Ok(())
    }

    fn pause(env: Env, sender: Address, operations: Vec<PoolOperation>) -> Result<(), ErrorCode> {
        let mut config = admin_config(&env, &sender)?;

        for operation in operations.iter() {
            if !config.paused_operations.contains(operation) {
                config.paused_operations.push_back(operation);
            }
        }
        save_config(&env, &config);
        PoolEvents::paused(&env, operations);

        Ok(())
    }

    fn unpause(env: Env, sender: Address, operations: Vec<PoolOperation>) -> Result<(), ErrorCode> {
        let mut config = admin_config(&env, &sender)?;

        let mut still_paused = Vec::new(&env);
        for operation in config.paused_operations.iter() {
            if !operations.contains(operation) {
                still_paused.push_back(operation);
            }
        }
        config.paused_operations = still_paused;
        save_config(&env, &config);
        PoolEvents::unpaused(&env, operations);

        Ok(())
    }

    fn slash_operator(
        env: Env,
        sender: Address,
        operator: Address,
        amount: i128
    ) -> Result<i128, ErrorCode> {
        let config = admin_config(&env, &sender)?;
        let _guard = BusyGuard::acquire(&env)?;

        let mut ledger = load_ledger(&env)?;
        let slashed = controller::registry::slash_operator(
            &env,
            &config,
            &mut ledger,
            &operator,
            amount
        )?;

        // collateral already sits in the contract; no token movement
        finish(&env, &config, &ledger, Settlement::new(&env))?;

        Ok(slashed)
    }

    fn activate_operator(env: Env, sender: Address, operator: Address) -> Result<(), ErrorCode> {
        let config = admin_config(&env, &sender)?;
        let _guard = BusyGuard::acquire(&env)?;

        controller::registry::set_operator_active(&env, &config, &operator, true)?;

        Ok(())
    }

    fn deactivate_operator(env: Env, sender: Address, operator: Address) -> Result<(), ErrorCode> {
        let config = admin_config(&env, &sender)?;
        let _guard = BusyGuard::acquire(&env)?;

        controller::registry::set_operator_active(&env, &config, &operator, false)?;

        Ok(())
    }

    fn settle_commission(env: Env, sender: Address, operator: Address) -> Result<i128, ErrorCode> {
        let config = admin_config(&env, &sender)?;
        let _guard = BusyGuard::acquire(&env)?;

        let mut ledger = load_ledger(&env)?;
        let settled = controller::registry::settle_commission(&env, &mut ledger, &operator)?;

        finish(&env, &config, &ledger, Settlement::new(&env))?;

        Ok(settled)
    }

    // ################################################################
    //                            OPERATOR
    // ################################################################

    fn register_operator(env: Env, sender: Address, bond: i128) -> Result<Operator, ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        ensure_not_paused(&env, &config, PoolOperation::RegisterOperator)?;

        let mut ledger = load_ledger(&env)?;
        let mut settlement = Settlement::new(&env);

        let operator = controller::registry::register_operator(
            &env,
            &config,
            &mut ledger.registry,
            &sender,
            bond,
            env.ledger().timestamp(),
            &mut settlement
        )?;

        finish(&env, &config, &ledger, settlement)?;

        Ok(operator)
    }

    fn add_collateral(env: Env, sender: Address, amount: i128) -> Result<i128, ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        let ledger = load_ledger(&env)?;
        let mut settlement = Settlement::new(&env);

        let operator = controller::registry::add_collateral(&env, &sender, amount, &mut settlement)?;

        finish(&env, &config, &ledger, settlement)?;

        Ok(operator.collateral)
    }

    fn add_bond(env: Env, sender: Address) -> Result<i128, ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        let ledger = load_ledger(&env)?;
        let mut settlement = Settlement::new(&env);

        let operator = controller::registry::add_bond(&env, &sender, &mut settlement)?;

        finish(&env, &config, &ledger, settlement)?;

        Ok(operator.bond_escrow)
    }

    // ################################################################
    //                             ORACLE
    // ################################################################

    fn submit_report(env: Env, sender: Address, balance: i128) -> Result<ReportOutcome, ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        ensure_not_paused(&env, &config, PoolOperation::Report)?;

        let mut ledger = load_ledger(&env)?;
        let verifier = SingleReporter::from_config(&config);

        let outcome = controller::rewards::submit_report(
            &env,
            &config,
            &mut ledger,
            &verifier,
            &sender,
            balance,
            env.ledger().timestamp()
        )?;

        finish(&env, &config, &ledger, Settlement::new(&env))?;

        Ok(outcome)
    }

    fn report_slashing(env: Env, sender: Address, loss: i128) -> Result<i128, ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        ensure_not_paused(&env, &config, PoolOperation::Report)?;

        let mut ledger = load_ledger(&env)?;
        let verifier = SingleReporter::from_config(&config);

        let total_backing = controller::rewards::report_slashing(
            &env,
            &config,
            &mut ledger,
            &verifier,
            &sender,
            loss,
            env.ledger().timestamp()
        )?;

        finish(&env, &config, &ledger, Settlement::new(&env))?;

        Ok(total_backing)
    }

    // ################################################################
    //                            MINIPOOL
    // ################################################################

    fn activate_minipool(
        env: Env,
        sender: Address,
        id: u32,
        pubkey: BytesN<48>
    ) -> Result<(), ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        is_confirmer(&env, &config, &sender)?;

        let mut ledger = load_ledger(&env)?;
        controller::minipool::activate(&env, &config, &mut ledger, id, pubkey)?;

        finish(&env, &config, &ledger, Settlement::new(&env))
    }

    fn mark_minipool_exiting(env: Env, sender: Address, id: u32) -> Result<(), ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        is_confirmer(&env, &config, &sender)?;

        controller::minipool::mark_exiting(&env, id)?;

        Ok(())
    }

    fn mark_minipool_exited(
        env: Env,
        sender: Address,
        id: u32,
        returned: i128
    ) -> Result<(), ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        is_confirmer(&env, &config, &sender)?;

        let mut ledger = load_ledger(&env)?;
        let mut settlement = Settlement::new(&env);
        controller::minipool::mark_exited(&env, &mut ledger, &sender, id, returned, &mut settlement)?;

        finish(&env, &config, &ledger, settlement)
    }

    // ################################################################
    //                             USER
    // ################################################################

    fn deposit(env: Env, sender: Address, assets: i128) -> Result<i128, ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        ensure_not_paused(&env, &config, PoolOperation::Deposit)?;

        let mut ledger = load_ledger(&env)?;
        let mut position = get_position(&env, &sender);
        let mut settlement = Settlement::new(&env);

        let shares = controller::pool::deposit(
            &env,
            &config,
            &mut ledger,
            &sender,
            &mut position,
            assets,
            env.ledger().timestamp(),
            &mut settlement
        )?;

        save_position(&env, &sender, &position);
        finish(&env, &config, &ledger, settlement)?;

        Ok(shares)
    }

    fn withdraw(env: Env, sender: Address, shares: i128) -> Result<WithdrawalOutcome, ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        ensure_not_paused(&env, &config, PoolOperation::Withdraw)?;

        let mut ledger = load_ledger(&env)?;
        let mut position = get_position(&env, &sender);
        let mut request = get_withdrawal_request(&env, &sender);
        let mut settlement = Settlement::new(&env);

        let outcome = controller::pool::withdraw(
            &env,
            &config,
            &mut ledger,
            &sender,
            &mut position,
            &mut request,
            shares,
            env.ledger().timestamp(),
            &mut settlement
        )?;

        save_position(&env, &sender, &position);
        if let Some(request) = &request {
            save_withdrawal_request(&env, &sender, request);
        }
        finish(&env, &config, &ledger, settlement)?;

        Ok(outcome)
    }

    fn claim_withdrawal(env: Env, sender: Address) -> Result<i128, ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        ensure_not_paused(&env, &config, PoolOperation::Claim)?;

        let mut ledger = load_ledger(&env)?;
        let mut position = get_position(&env, &sender);
        let mut request = get_withdrawal_request(&env, &sender);
        let mut settlement = Settlement::new(&env);

        let assets = controller::pool::claim_withdrawal(
            &env,
            &config,
            &mut ledger,
            &sender,
            &mut position,
            &mut request,
            env.ledger().timestamp(),
            &mut settlement
        )?;

        save_position(&env, &sender, &position);
        if let Some(request) = &request {
            save_withdrawal_request(&env, &sender, request);
        }
        finish(&env, &config, &ledger, settlement)?;

        Ok(assets)
    }

    fn process_pending_deposits(env: Env, sender: Address) -> Result<u32, ErrorCode> {
        sender.require_auth();
        bump_instance(&env);
        let _guard = BusyGuard::acquire(&env)?;

        let config = get_config(&env)?;
        ensure_not_paused(&env, &config, PoolOperation::Funding)?;

        let mut ledger = load_ledger(&env)?;
        let mut settlement = Settlement::new(&env);

        let created = controller::scheduler::check_threshold(
            &env,
            &config,
            &mut ledger,
            env.ledger().timestamp(),
            &mut settlement
        )?;

        finish(&env, &config, &ledger, settlement)?;

        Ok(created)
    }

    // ################################################################
    //                             QUERIES
    // ################################################################

    fn query_config(env: Env) -> Result<Config, ErrorCode> {
        get_config(&env)
    }

    fn query_admin(env: Env) -> Result<Address, ErrorCode> {
        get_admin(&env)
    }

    fn query_pool(env: Env) -> Result<Pool, ErrorCode> {
        Ok(load_ledger(&env)?.pool)
    }

    fn query_exchange_rate(env: Env) -> Result<i128, ErrorCode> {
        load_ledger(&env)?.pool.exchange_rate(&env)
    }

    fn query_total_backing(env: Env) -> Result<i128, ErrorCode> {
        Ok(load_ledger(&env)?.pool.total_backing)
    }

    fn query_funding_progress(env: Env) -> Result<(i128, i128), ErrorCode> {
        let config = get_config(&env)?;
        let ledger = load_ledger(&env)?;

        Ok((ledger.pool.pending_deposits, config.validator_size))
    }

    fn query_shares(env: Env, address: Address) -> i128 {
        get_position(&env, &address).shares
    }

    fn query_claim_value(env: Env, address: Address) -> Result<i128, ErrorCode> {
        let shares = get_position(&env, &address).shares;
        load_ledger(&env)?.pool.assets_for_shares(&env, shares)
    }

    fn query_preview_deposit(env: Env, assets: i128) -> Result<i128, ErrorCode> {
        load_ledger(&env)?.pool.shares_for_deposit(&env, assets)
    }

    fn query_preview_redeem(env: Env, shares: i128) -> Result<i128, ErrorCode> {
        load_ledger(&env)?.pool.assets_for_shares(&env, shares)
    }

    fn query_withdrawal_request(env: Env, address: Address) -> Option<WithdrawalRequest> {
        get_withdrawal_request(&env, &address)
    }

    fn query_withdrawal_status(env: Env, address: Address) -> Result<WithdrawalStatus, ErrorCode> {
        let Some(request) = get_withdrawal_request(&env, &address) else {
            return Ok(WithdrawalStatus::NoRequest);
        };

        if request.settled {
            return Ok(WithdrawalStatus::Settled);
        }

        let config = get_config(&env)?;
        if config.current_epoch(env.ledger().timestamp()) > request.request_epoch {
            Ok(WithdrawalStatus::Claimable)
        } else {
            Ok(WithdrawalStatus::Pending)
        }
    }

    fn query_operators(env: Env) -> Result<Vec<Operator>, ErrorCode> {
        let ledger = load_ledger(&env)?;

        let mut operators = Vec::new(&env);
        for address in ledger.registry.operators.iter() {
            if let Some(operator) = get_operator(&env, &address) {
                operators.push_back(operator);
            }
        }

        Ok(operators)
    }

    fn query_operator(env: Env, address: Address) -> Result<Operator, ErrorCode> {
        get_operator(&env, &address).ok_or(ErrorCode::OperatorNotFound)
    }

    fn query_minipool(env: Env, id: u32) -> Result<Minipool, ErrorCode> {
        get_minipool(&env, id).ok_or(ErrorCode::MinipoolNotFound)
    }

    fn query_minipool_count(env: Env) -> Result<u32, ErrorCode> {
        Ok(load_ledger(&env)?.registry.minipool_count)
    }

    fn query_oracle_state(env: Env) -> Result<OracleState, ErrorCode> {
        Ok(load_ledger(&env)?.oracle)
    }

    fn query_current_epoch(env: Env) -> Result<u64, ErrorCode> {
        Ok(get_config(&env)?.current_epoch(env.ledger().timestamp()))
    }
}
