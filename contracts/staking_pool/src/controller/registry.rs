use soroban_sdk::{ log, token, Address, Env };
use stqrl::{ math::{ helpers::{ apply_bps, mul_div_floor }, safe_math::SafeMath }, validate };

use crate::{
    errors::{ ErrorCode, PoolResult },
    events::PoolEvents,
    settlement::Settlement,
    storage::{ get_operator, save_operator, Config, Ledger, Operator, Registry },
};

pub fn register_operator(
    env: &Env,
    config: &Config,
    registry: &mut Registry,
    address: &Address,
    bond: i128,
    now: u64,
    settlement: &mut Settlement
) -> PoolResult<Operator> {
    validate!(
        env,
        config.is_bond_tier(bond),
        ErrorCode::InvalidBondTier,
        "bond is not an accepted tier",
        bond
    )?;

    if get_operator(env, address).is_some() {
        log!(env, "Staking Pool: operator already registered");
        return Err(ErrorCode::OperatorAlreadyRegistered);
    }

    let required = bond.safe_add(config.min_collateral, env)?;
    let balance = token::Client::new(env, &config.stake_asset).balance(address);
    validate!(
        env,
        balance >= required,
        ErrorCode::InsufficientCollateral,
        "bond and collateral not covered",
        balance,
        required
    )?;

    let operator = Operator {
        address: address.clone(),
        index: registry.operators.len(),
        registered: true,
        active: true,
        bond_amount: bond,
        bond_escrow: bond,
        collateral: config.min_collateral,
        validator_count: 0,
        pending_commission: 0,
        total_commission: 0,
        registered_at: now,
    };

    // append only: indices must stay stable for the round-robin cursor
    registry.operators.push_back(address.clone());
    save_operator(env, &operator);
    settlement.receive(address, required);

    PoolEvents::operator_registered(
        env,
        address.clone(),
        operator.index,
        bond,
        operator.collateral
    );

    Ok(operator)
}

/// An operator can take another validator while active and holding a full
/// bond in escrow.
pub fn is_eligible(operator: &Operator) -> bool {
    operator.active && operator.bond_escrow >= operator.bond_amount
}

/// Round-robin pick of the next eligible operator, starting at the cursor and
/// visiting each registered operator at most once. The cursor moves past the
/// returned operator; it is left alone when nobody is eligible.
pub fn next_operator(env: &Env, registry: &mut Registry) -> Option<Operator> {
    let count = registry.operators.len();
    if count == 0 {
        return None;
    }

    for step in 0..count {
        let index = (registry.cursor + step) % count;

        let Some(address) = registry.operators.get(index) else {
            continue;
        };

        match get_operator(env, &address) {
            Some(operator) if is_eligible(&operator) => {
                registry.cursor = (index + 1) % count;
                return Some(operator);
            }
            _ => {}
        }
    }

    None
}

/// Commission owed on a positive reward delta. Nothing is owed while no
/// validator is running.
pub fn commission_due(
    env: &Env,
    config: &Config,
    registry: &Registry,
    reward_delta: i128
) -> PoolResult<i128> {
    if reward_delta <= 0 || registry.total_validators == 0 {
        return Ok(0);
    }

    Ok(apply_bps(env, reward_delta, config.commission_bps)?)
}

/// Splits the commission on `reward_delta` across operators pro rata to their
/// validator counts and returns what is left for depositors. Each share is
/// floored; the rounding dust of the split is credited to nobody.
pub fn apply_commission(
    env: &Env,
    config: &Config,
    registry: &Registry,
    reward_delta: i128
) -> PoolResult<i128> {
    let commission = commission_due(env, config, registry, reward_delta)?;
    if commission == 0 {
        return Ok(reward_delta.max(0));
    }

    let total_validators = i128::from(registry.total_validators);
    for address in registry.operators.iter() {
        let Some(mut operator) = get_operator(env, &address) else {
            continue;
        };
        if operator.validator_count == 0 {
            continue;
        }

        let share = mul_div_floor(
            env,
            commission,
            i128::from(operator.validator_count),
            total_validators
        )?;
        if share == 0 {
            continue;
        }

        operator.pending_commission = operator.pending_commission.safe_add(share, env)?;
        operator.total_commission = operator.total_commission.safe_add(share, env)?;
        save_operator(env, &operator);
    }

    Ok(reward_delta.safe_sub(commission, env)?)
}

/// Moves up to `amount` of the operator's collateral into the liquid reserve.
/// Returns the amount actually slashed.
pub fn slash_operator(
    env: &Env,
    config: &Config,
    ledger: &mut Ledger,
    address: &Address,
    amount: i128
) -> PoolResult<i128> {
    validate!(env, amount > 0, ErrorCode::ZeroAmount)?;

    let mut operator = get_operator(env, address).ok_or(ErrorCode::OperatorNotFound)?;

    let slashed = amount.min(operator.collateral);
    operator.collateral = operator.collateral.safe_sub(slashed, env)?;
    ledger.pool.add_to_reserve(env, slashed)?;

    PoolEvents::operator_slashed(env, address.clone(), slashed, operator.collateral);

    if operator.active && operator.collateral < config.min_collateral {
        operator.active = false;
        PoolEvents::operator_deactivated(env, address.clone(), operator.collateral);
    }

    save_operator(env, &operator);

    Ok(slashed)
}

pub fn add_collateral(
    env: &Env,
    address: &Address,
    amount: i128,
    settlement: &mut Settlement
) -> PoolResult<Operator> {
    validate!(env, amount > 0, ErrorCode::ZeroAmount)?;

    let mut operator = get_operator(env, address).ok_or(ErrorCode::OperatorNotFound)?;
    operator.collateral = operator.collateral.safe_add(amount, env)?;
    save_operator(env, &operator);

    settlement.receive(address, amount);
    PoolEvents::collateral_added(env, address.clone(), amount, operator.collateral);

    Ok(operator)
}

/// Escrows one more bond so the operator can take another validator.
pub fn add_bond(
    env: &Env,
    address: &Address,
    settlement: &mut Settlement
) -> PoolResult<Operator> {
    let mut operator = get_operator(env, address).ok_or(ErrorCode::OperatorNotFound)?;

    operator.bond_escrow = operator.bond_escrow.safe_add(operator.bond_amount, env)?;
    save_operator(env, &operator);

    settlement.receive(address, operator.bond_amount);
    PoolEvents::bond_added(env, address.clone(), operator.bond_amount, operator.bond_escrow);

    Ok(operator)
}

pub fn set_operator_active(
    env: &Env,
    config: &Config,
    address: &Address,
    active: bool
) -> PoolResult<Operator> {
    let mut operator = get_operator(env, address).ok_or(ErrorCode::OperatorNotFound)?;

    if active {
        validate!(
            env,
            operator.collateral >= config.min_collateral,
            ErrorCode::InsufficientCollateral,
            "collateral below minimum",
            operator.collateral
        )?;
        if !operator.active {
            PoolEvents::operator_activated(env, address.clone());
        }
    } else {
        validate!(env, operator.active, ErrorCode::OperatorInactive, "operator already inactive")?;
        PoolEvents::operator_deactivated(env, address.clone(), operator.collateral);
    }

    operator.active = active;
    save_operator(env, &operator);

    Ok(operator)
}

/// Clears the operator's accrued commission and returns the settled amount.
/// Payment comes out of the validator balances outside the pool, so the
/// report baseline drops by the same amount.
pub fn settle_commission(env: &Env, ledger: &mut Ledger, address: &Address) -> PoolResult<i128> {
    let mut operator = get_operator(env, address).ok_or(ErrorCode::OperatorNotFound)?;

    let amount = operator.pending_commission;
    operator.pending_commission = 0;
    save_operator(env, &operator);

    ledger.oracle.last_reported_balance = ledger.oracle.last_reported_balance
        .safe_sub(amount, env)?
        .max(0);

    PoolEvents::commission_settled(env, address.clone(), amount);

    Ok(amount)
}
