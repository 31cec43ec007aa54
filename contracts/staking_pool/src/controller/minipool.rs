use soroban_sdk::{ log, Address, BytesN, Env };
use stqrl::{ math::safe_math::SafeMath, safe_decrement, validate };

use crate::{
    errors::{ ErrorCode, PoolResult },
    events::PoolEvents,
    settlement::Settlement,
    storage::{
        get_minipool,
        get_operator,
        save_minipool,
        save_operator,
        Config,
        Ledger,
        Minipool,
        MinipoolStatus,
    },
};

fn transition(env: &Env, id: u32, from: MinipoolStatus, to: MinipoolStatus) -> PoolResult<Minipool> {
    let mut minipool = get_minipool(env, id).ok_or(ErrorCode::MinipoolNotFound)?;

    if minipool.status != from {
        log!(env, "Staking Pool: invalid minipool transition", id);
        return Err(ErrorCode::InvalidMinipoolTransition);
    }

    minipool.status = to;
    Ok(minipool)
}

/// Pending -> Active. From here on the validator's balance shows up in
/// reports, so the report baseline grows by a full validator.
pub fn activate(
    env: &Env,
    config: &Config,
    ledger: &mut Ledger,
    id: u32,
    pubkey: BytesN<48>
) -> PoolResult<Minipool> {
    let mut minipool = transition(env, id, MinipoolStatus::Pending, MinipoolStatus::Active)?;
    minipool.pubkey = Some(pubkey);
    save_minipool(env, &minipool);

    ledger.oracle.last_reported_balance = ledger.oracle.last_reported_balance.safe_add(
        config.validator_size,
        env
    )?;

    PoolEvents::minipool_status(env, id, minipool.status, minipool.pubkey.clone());

    Ok(minipool)
}

pub fn mark_exiting(env: &Env, id: u32) -> PoolResult<Minipool> {
    let minipool = transition(env, id, MinipoolStatus::Active, MinipoolStatus::Exiting)?;
    save_minipool(env, &minipool);

    PoolEvents::minipool_status(env, id, minipool.status, minipool.pubkey.clone());

    Ok(minipool)
}

/// Exiting -> Exited. `returned` is the pooled stake coming back into the
/// pool from `source`; the operator keeps its bond. It may not exceed the
/// stake the pool has counted, so unreported gains wait for a report.
pub fn mark_exited(
    env: &Env,
    ledger: &mut Ledger,
    source: &Address,
    id: u32,
    returned: i128,
    settlement: &mut Settlement
) -> PoolResult<Minipool> {
    validate!(env, returned >= 0, ErrorCode::ZeroAmount, "returned amount is negative")?;

    let minipool = transition(env, id, MinipoolStatus::Exiting, MinipoolStatus::Exited)?;

    let mut operator = get_operator(env, &minipool.operator).ok_or(ErrorCode::OperatorNotFound)?;
    safe_decrement!(env, operator.validator_count, 1);
    safe_decrement!(env, ledger.registry.total_validators, 1);
    save_operator(env, &operator);

    let leaving = minipool.bond_portion.safe_add(returned, env)?;
    ledger.oracle.last_reported_balance = ledger.oracle.last_reported_balance
        .safe_sub(leaving, env)?
        .max(0);

    ledger.pool.realize_exit(env, returned)?;
    settlement.receive(source, returned);
    save_minipool(env, &minipool);

    PoolEvents::minipool_status(env, id, minipool.status, None);

    Ok(minipool)
}
