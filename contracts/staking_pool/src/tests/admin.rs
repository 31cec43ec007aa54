use pretty_assertions::assert_eq;
use soroban_sdk::{ testutils::Address as _, Address, Env };
use test_case::test_case;

use super::setup::{ default_params, deploy_token_contract, PoolTest, REPORT_COOLDOWN };
use crate::{
    contract::{ StakingPool, StakingPoolClient },
    errors::ErrorCode,
    storage::{ DataKey, PoolParams },
};

#[test]
fn initialize_stores_config_and_admin() {
    let t = PoolTest::new();

    let config = t.pool.query_config();
    assert_eq!(config.oracle, t.oracle);
    assert_eq!(config.stake_asset, t.token.address);
    assert_eq!(config.report_cooldown, REPORT_COOLDOWN);
    assert_eq!(config.paused_operations.len(), 0);
    assert_eq!(t.pool.query_admin(), t.admin);
    assert_eq!(t.pool.query_exchange_rate(), 1_000_000_000);
    assert_eq!(t.pool.query_current_epoch(), 0);
}

#[test]
fn initialize_twice_is_rejected() {
    let t = PoolTest::new();
    let params = default_params(&t.env, &t.token.address, &t.oracle);

    assert_eq!(t.pool.try_initialize(&t.admin, &params), Err(Ok(ErrorCode::AlreadyInitialized)));
}

#[test_case(|p| p.validator_size = 0 ; "zero validator size")]
#[test_case(|p| { p.bond_tiers.pop_back(); } ; "single bond tier")]
#[test_case(|p| p.bond_tiers.set(0, 500) ; "descending tiers")]
#[test_case(|p| p.bond_tiers.set(1, 1_000) ; "tier not below validator size")]
#[test_case(|p| p.epoch_length = 0 ; "zero epoch length")]
#[test_case(|p| p.max_fundings_per_call = 0 ; "zero funding cap")]
#[test_case(|p| p.min_deposit = 0 ; "zero minimum deposit")]
#[test_case(|p| p.commission_bps = 2_001 ; "commission above bound")]
#[test_case(|p| p.max_rate_change_bps = 0 ; "zero rate limit")]
fn initialize_rejects_inconsistent_params(breaks: fn(&mut PoolParams)) {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let oracle = Address::generate(&env);
    let (token, _) = deploy_token_contract(&env, &admin);

    let mut params = default_params(&env, &token.address, &oracle);
    breaks(&mut params);

    let pool = StakingPoolClient::new(&env, &env.register(StakingPool, ()));
    assert_eq!(pool.try_initialize(&admin, &params), Err(Ok(ErrorCode::InvalidParams)));
    assert_eq!(pool.try_query_config(), Err(Ok(ErrorCode::NotInitialized)));
}

#[test]
fn calls_before_initialize_fail() {
    let env = Env::default();
    env.mock_all_auths();
    let user = Address::generate(&env);

    let pool = StakingPoolClient::new(&env, &env.register(StakingPool, ()));

    assert_eq!(pool.try_deposit(&user, &100), Err(Ok(ErrorCode::NotInitialized)));
    assert_eq!(pool.try_query_pool(), Err(Ok(ErrorCode::NotInitialized)));
}

#[test]
fn commission_rate_is_bounded_not_clamped() {
    let t = PoolTest::new();

    assert_eq!(
        t.pool.try_set_commission_rate(&t.admin, &499),
        Err(Ok(ErrorCode::CommissionOutOfBounds))
    );
    assert_eq!(
        t.pool.try_set_commission_rate(&t.admin, &2_001),
        Err(Ok(ErrorCode::CommissionOutOfBounds))
    );
    assert_eq!(t.pool.query_config().commission_bps, 1_000);

    t.pool.set_commission_rate(&t.admin, &500);
    assert_eq!(t.pool.query_config().commission_bps, 500);
}

#[test]
fn admin_setters_validate_and_apply() {
    let t = PoolTest::new();

    assert_eq!(
        t.pool.try_set_max_rate_change(&t.admin, &0),
        Err(Ok(ErrorCode::RateLimitOutOfBounds))
    );
    assert_eq!(
        t.pool.try_set_max_rate_change(&t.admin, &10_001),
        Err(Ok(ErrorCode::RateLimitOutOfBounds))
    );
    assert_eq!(t.pool.try_set_min_deposit(&t.admin, &0), Err(Ok(ErrorCode::InvalidParams)));
    assert_eq!(t.pool.try_set_min_collateral(&t.admin, &-1), Err(Ok(ErrorCode::InvalidParams)));

    t.pool.set_max_rate_change(&t.admin, &2_500);
    t.pool.set_min_deposit(&t.admin, &25);
    t.pool.set_min_collateral(&t.admin, &75);
    t.pool.set_report_cooldown(&t.admin, &60);

    let config = t.pool.query_config();
    assert_eq!(config.max_rate_change_bps, 2_500);
    assert_eq!(config.min_deposit, 25);
    assert_eq!(config.min_collateral, 75);
    assert_eq!(config.report_cooldown, 60);
}

#[test]
fn admin_calls_are_gated() {
    let t = PoolTest::new();
    let intruder = Address::generate(&t.env);

    assert_eq!(
        t.pool.try_set_commission_rate(&intruder, &600),
        Err(Ok(ErrorCode::NotAuthorized))
    );
    assert_eq!(t.pool.try_set_oracle(&intruder, &intruder), Err(Ok(ErrorCode::NotAuthorized)));

    let successor = Address::generate(&t.env);
    t.pool.set_admin(&t.admin, &successor);
    assert_eq!(t.pool.query_admin(), successor);
    assert_eq!(
        t.pool.try_set_report_cooldown(&t.admin, &1),
        Err(Ok(ErrorCode::NotAuthorized))
    );
    t.pool.set_report_cooldown(&successor, &1);
}

#[test]
fn nested_entry_is_rejected_while_busy() {
    let t = PoolTest::new();
    let user = t.user(100);

    t.env.as_contract(&t.pool.address, || {
        t.env.storage().instance().set(&DataKey::Busy, &true);
    });
    assert_eq!(t.pool.try_deposit(&user, &100), Err(Ok(ErrorCode::Reentrant)));

    t.env.as_contract(&t.pool.address, || {
        t.env.storage().instance().remove(&DataKey::Busy);
    });
    assert_eq!(t.pool.deposit(&user, &100), 100);

    // the flag never outlives a call
    let busy = t.env.as_contract(&t.pool.address, || {
        t.env.storage().instance().has(&DataKey::Busy)
    });
    assert!(!busy);
}
