use soroban_sdk::{ contracttype, Address, Env };
use stqrl::{ math::{ helpers::apply_bps, safe_math::SafeMath }, validate };

use crate::{
    controller::registry,
    errors::{ ErrorCode, PoolResult },
    events::PoolEvents,
    oracle::ReportVerifier,
    storage::{ Config, Ledger },
};

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReportOutcome {
    /// Balance growth over the high-water mark
    pub gross: i128,
    pub commission: i128,
    /// Portion credited to depositors
    pub net: i128,
}

/// Largest change of `total_backing` a single report may cause.
fn max_backing_change(env: &Env, config: &Config, ledger: &Ledger) -> PoolResult<i128> {
    Ok(apply_bps(env, ledger.pool.total_backing, config.max_rate_change_bps)?)
}

/// Applies an aggregate validator balance report. Growth over the high-water
/// mark is split into operator commission and depositor rewards. A balance
/// at or below the mark changes nothing but the report clock; losses only
/// enter through `report_slashing`.
pub fn submit_report<V: ReportVerifier>(
    env: &Env,
    config: &Config,
    ledger: &mut Ledger,
    verifier: &V,
    reporter: &Address,
    balance: i128,
    now: u64
) -> PoolResult<ReportOutcome> {
    verifier.verify_report(env, reporter, balance, now, &ledger.oracle)?;

    let high_water_mark = ledger.oracle.last_reported_balance;
    let delta = balance.safe_sub(high_water_mark, env)?;

    if delta <= 0 {
        if delta < 0 {
            PoolEvents::balance_shortfall(env, reporter.clone(), balance, high_water_mark);
        }
        ledger.oracle.last_report_ts = now;
        ledger.oracle.report_count = ledger.oracle.report_count.safe_add(1, env)?;

        return Ok(ReportOutcome::default());
    }

    let commission = registry::commission_due(env, config, &ledger.registry, delta)?;
    let expected_net = delta.safe_sub(commission, env)?;

    let limit = max_backing_change(env, config, ledger)?;
    validate!(
        env,
        expected_net <= limit,
        ErrorCode::RateChangeExceedsLimit,
        "reward exceeds max rate change",
        expected_net,
        limit
    )?;

    // the split recorded for operators decides what depositors are credited
    let net = registry::apply_commission(env, config, &ledger.registry, delta)?;
    ledger.pool.add_rewards(env, net)?;
    let commission = delta.safe_sub(net, env)?;

    ledger.oracle.last_reported_balance = balance;
    ledger.oracle.last_report_ts = now;
    ledger.oracle.report_count = ledger.oracle.report_count.safe_add(1, env)?;

    PoolEvents::report_accepted(
        env,
        reporter.clone(),
        balance,
        delta,
        commission,
        net,
        ledger.pool.total_backing
    );

    Ok(ReportOutcome { gross: delta, commission, net })
}

/// Applies a validator loss to `total_backing`. Shares are never burned, so
/// every holder absorbs the loss in proportion to their shares.
pub fn report_slashing<V: ReportVerifier>(
    env: &Env,
    config: &Config,
    ledger: &mut Ledger,
    verifier: &V,
    reporter: &Address,
    loss: i128,
    now: u64
) -> PoolResult<i128> {
    validate!(env, loss > 0, ErrorCode::ZeroAmount, "loss must be positive")?;
    verifier.verify_report(env, reporter, loss, now, &ledger.oracle)?;

    let limit = max_backing_change(env, config, ledger)?;
    validate!(
        env,
        loss <= limit,
        ErrorCode::RateChangeExceedsLimit,
        "loss exceeds max rate change",
        loss,
        limit
    )?;

    ledger.pool.apply_loss(env, loss)?;

    ledger.oracle.last_reported_balance = ledger.oracle.last_reported_balance
        .safe_sub(loss, env)?
        .max(0);
    ledger.oracle.last_report_ts = now;
    ledger.oracle.report_count = ledger.oracle.report_count.safe_add(1, env)?;

    PoolEvents::slashing_reported(env, reporter.clone(), loss, ledger.pool.total_backing);

    Ok(ledger.pool.total_backing)
}
