use soroban_sdk::{ log, Env };
use stqrl::{ math::safe_math::SafeMath, safe_increment };

use crate::{
    controller::registry,
    errors::PoolResult,
    events::PoolEvents,
    settlement::Settlement,
    storage::{ save_minipool, save_operator, Config, Ledger, Minipool, MinipoolStatus },
};

/// Hands pending deposits to operators while at least one validator's worth is
/// queued. Each hand-off pays out a full validator: the pooled portion from
/// pending deposits plus one bond from the operator's escrow. At most `max_fundings_per_call` minipools are created per call;
/// running out of eligible operators leaves the remainder queued. Returns the
/// number of minipools created.
pub fn check_threshold(
    env: &Env,
    config: &Config,
    ledger: &mut Ledger,
    now: u64,
    settlement: &mut Settlement
) -> PoolResult<u32> {
    let mut created = 0_u32;

    while
        created < config.max_fundings_per_call &&
        ledger.pool.pending_deposits >= config.validator_size
    {
        let Some(mut operator) = registry::next_operator(env, &mut ledger.registry) else {
            log!(env, "Staking Pool: no eligible operator, deposits stay queued");
            break;
        };

        let pooled = config.validator_size.safe_sub(operator.bond_amount, env)?;
        ledger.pool.pending_deposits = ledger.pool.pending_deposits.safe_sub(pooled, env)?;
        // the escrowed bond tops the pooled funds up to a full validator
        operator.bond_escrow = operator.bond_escrow.safe_sub(operator.bond_amount, env)?;

        let minipool = Minipool {
            id: ledger.registry.minipool_count,
            operator: operator.address.clone(),
            bond_portion: operator.bond_amount,
            pooled_portion: pooled,
            commission_bps_at_creation: config.commission_bps,
            status: MinipoolStatus::Pending,
            pubkey: None,
            created_at: now,
        };
        save_minipool(env, &minipool);

        safe_increment!(env, ledger.registry.minipool_count, 1);
        safe_increment!(env, ledger.registry.total_validators, 1);
        safe_increment!(env, operator.validator_count, 1);
        save_operator(env, &operator);

        settlement.pay(&operator.address, config.validator_size);

        PoolEvents::minipool_created(
            env,
            operator.address,
            minipool.id,
            minipool.bond_portion,
            pooled,
            config.commission_bps
        );

        created += 1;
    }

    Ok(created)
}
