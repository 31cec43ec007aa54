use soroban_sdk::{ log, Address, Env };
use stqrl::{ math::safe_math::SafeMath, validate };

use crate::{
    controller::scheduler,
    errors::{ ErrorCode, PoolResult },
    events::PoolEvents,
    settlement::Settlement,
    storage::{
        Config,
        Ledger,
        PoolOperation,
        Position,
        WithdrawalOutcome,
        WithdrawalRequest,
    },
};

pub fn deposit(
    env: &Env,
    config: &Config,
    ledger: &mut Ledger,
    depositor: &Address,
    position: &mut Position,
    assets: i128,
    now: u64,
    settlement: &mut Settlement
) -> PoolResult<i128> {
    validate!(env, assets > 0, ErrorCode::ZeroAmount, "deposit amount must be positive")?;
    validate!(
        env,
        assets >= config.min_deposit,
        ErrorCode::DepositBelowMinimum,
        "deposit below minimum",
        assets,
        config.min_deposit
    )?;

    let shares = ledger.pool.shares_for_deposit(env, assets)?;
    validate!(
        env,
        shares > 0,
        ErrorCode::DepositBelowMinimum,
        "deposit rounds to zero shares",
        assets
    )?;

    ledger.pool.mint(env, shares)?;
    ledger.pool.total_backing = ledger.pool.total_backing.safe_add(assets, env)?;
    ledger.pool.pending_deposits = ledger.pool.pending_deposits.safe_add(assets, env)?;

    position.shares = position.shares.safe_add(shares, env)?;
    position.last_update_ts = now;

    // pulled first so that hand-offs below are funded
    settlement.receive(depositor, assets);

    PoolEvents::deposit(
        env,
        depositor.clone(),
        assets,
        shares,
        ledger.pool.total_shares,
        ledger.pool.total_backing
    );

    if config.is_operation_paused(&PoolOperation::Funding) {
        log!(env, "Staking Pool: funding paused, deposit stays queued");
    } else {
        scheduler::check_threshold(env, config, ledger, now, settlement)?;
    }

    Ok(shares)
}

/// Redeems `shares` from the liquid reserve when it can cover the full value,
/// otherwise queues a request whose value is fixed now. Queued shares stay in
/// the position, locked, until the request is claimed.
pub fn withdraw(
    env: &Env,
    config: &Config,
    ledger: &mut Ledger,
    owner: &Address,
    position: &mut Position,
    request: &mut Option<WithdrawalRequest>,
    shares: i128,
    now: u64,
    settlement: &mut Settlement
) -> PoolResult<WithdrawalOutcome> {
    validate!(env, shares > 0, ErrorCode::ZeroAmount, "withdrawal must redeem shares")?;

    if let Some(existing) = request {
        validate!(
            env,
            existing.settled,
            ErrorCode::WithdrawalRequestPending,
            "settle the outstanding request first",
            existing.shares
        )?;
    }

    validate!(
        env,
        shares <= position.shares,
        ErrorCode::InsufficientShares,
        "withdrawal exceeds share balance",
        shares,
        position.shares
    )?;

    let assets = ledger.pool.assets_for_shares(env, shares)?;
    validate!(env, assets > 0, ErrorCode::ZeroAmount, "shares redeem to nothing", shares)?;

    if ledger.pool.liquid_reserve >= assets {
        ledger.pool.burn(env, shares)?;
        ledger.pool.liquid_reserve = ledger.pool.liquid_reserve.safe_sub(assets, env)?;
        ledger.pool.total_backing = ledger.pool.total_backing.safe_sub(assets, env)?;

        position.shares = position.shares.safe_sub(shares, env)?;
        position.last_update_ts = now;

        settlement.pay(owner, assets);
        PoolEvents::withdraw_instant(env, owner.clone(), shares, assets);

        return Ok(WithdrawalOutcome::Instant(assets));
    }

    let request_epoch = config.current_epoch(now);
    *request = Some(WithdrawalRequest {
        shares,
        assets,
        request_epoch,
        requested_at: now,
        settled: false,
    });

    PoolEvents::withdraw_request(env, owner.clone(), shares, assets, request_epoch);

    Ok(WithdrawalOutcome::Queued(assets, request_epoch))
}

/// Settles a queued request once a full epoch has passed. The recorded value
/// is paid from the liquid reserve first and idle deposits second.
pub fn claim_withdrawal(
    env: &Env,
    config: &Config,
    ledger: &mut Ledger,
    owner: &Address,
    position: &mut Position,
    request: &mut Option<WithdrawalRequest>,
    now: u64,
    settlement: &mut Settlement
) -> PoolResult<i128> {
    let Some(pending) = request.as_mut() else {
        log!(env, "Staking Pool: no withdrawal request");
        return Err(ErrorCode::NoWithdrawalRequest);
    };

    validate!(env, !pending.settled, ErrorCode::WithdrawalAlreadySettled)?;

    let current_epoch = config.current_epoch(now);
    validate!(
        env,
        current_epoch > pending.request_epoch,
        ErrorCode::ClaimBeforeEpochElapsed,
        "claim opens after epoch",
        pending.request_epoch
    )?;

    let assets = pending.assets;
    let from_reserve = assets.min(ledger.pool.liquid_reserve);
    let from_pending = assets.safe_sub(from_reserve, env)?;
    validate!(
        env,
        from_pending <= ledger.pool.pending_deposits,
        ErrorCode::InsufficientLiquidity,
        "not enough on-hand funds to settle",
        assets,
        ledger.pool.liquid_reserve,
        ledger.pool.pending_deposits
    )?;
    validate!(
        env,
        pending.shares <= position.shares,
        ErrorCode::InsufficientShares,
        "locked shares missing from position",
        pending.shares,
        position.shares
    )?;

    ledger.pool.burn(env, pending.shares)?;
    ledger.pool.liquid_reserve = ledger.pool.liquid_reserve.safe_sub(from_reserve, env)?;
    ledger.pool.pending_deposits = ledger.pool.pending_deposits.safe_sub(from_pending, env)?;
    ledger.pool.total_backing = ledger.pool.total_backing.safe_sub(assets, env)?;

    position.shares = position.shares.safe_sub(pending.shares, env)?;
    position.last_update_ts = now;
    pending.settled = true;

    settlement.pay(owner, assets);
    PoolEvents::withdraw_claim(env, owner.clone(), pending.shares, assets);

    Ok(assets)
}
