use pretty_assertions::assert_eq;
use soroban_sdk::{ testutils::Address as _, Address };

use super::setup::{ PoolTest, BOND_LOW, MIN_COLLATERAL, VALIDATOR_SIZE };
use crate::{ errors::ErrorCode, storage::{ MinipoolStatus, WithdrawalOutcome } };

#[test]
fn minipool_walks_through_its_lifecycle() {
    let t = PoolTest::new();
    let operator = t.operator(BOND_LOW);
    let alice = t.deposit(1_000);

    let minipool = t.pool.query_minipool(&0);
    assert_eq!(minipool.status, MinipoolStatus::Pending);
    assert_eq!(minipool.pubkey, None);
    assert_eq!(minipool.commission_bps_at_creation, 1_000);

    t.pool.activate_minipool(&t.oracle, &0, &t.pubkey(7));
    let minipool = t.pool.query_minipool(&0);
    assert_eq!(minipool.status, MinipoolStatus::Active);
    assert_eq!(minipool.pubkey, Some(t.pubkey(7)));
    assert_eq!(t.pool.query_oracle_state().last_reported_balance, VALIDATOR_SIZE);

    t.pool.mark_minipool_exiting(&t.admin, &0);
    assert_eq!(t.pool.query_minipool(&0).status, MinipoolStatus::Exiting);

    // the pooled 900 comes back, the operator keeps its bond
    t.token_admin.mint(&t.admin, &900);
    t.pool.mark_minipool_exited(&t.admin, &0, &900);
    assert_eq!(t.pool.query_minipool(&0).status, MinipoolStatus::Exited);

    let pool = t.pool.query_pool();
    assert_eq!(pool.liquid_reserve, 900);
    assert_eq!(pool.total_backing, 1_000);
    assert_eq!(t.pool.query_operator(&operator).validator_count, 0);
    assert_eq!(t.pool.query_oracle_state().last_reported_balance, 0);
    t.assert_invariants();

    // the returned stake is liquid again
    assert_eq!(t.pool.withdraw(&alice, &900), WithdrawalOutcome::Instant(900));
    assert_eq!(t.token.balance(&alice), 900);
    t.assert_invariants();
}

#[test]
fn exit_after_a_report_credits_gains_once() {
    let t = PoolTest::new();
    let operator = t.operator(BOND_LOW);
    let alice = t.deposit(1_000);
    t.pool.activate_minipool(&t.oracle, &0, &t.pubkey(3));

    // 50 of gains: 5 commission, 45 to depositors
    t.pool.submit_report(&t.oracle, &1_050);
    assert_eq!(t.pool.query_total_backing(), 1_045);
    assert_eq!(t.pool.query_operator(&operator).pending_commission, 5);

    t.pool.mark_minipool_exiting(&t.oracle, &0);
    t.token_admin.mint(&t.admin, &950);

    // the commission share of the gains is not depositor stake
    assert_eq!(
        t.pool.try_mark_minipool_exited(&t.admin, &0, &950),
        Err(Ok(ErrorCode::ExitExceedsStake))
    );
    assert_eq!(t.pool.query_minipool(&0).status, MinipoolStatus::Exiting);

    t.pool.mark_minipool_exited(&t.admin, &0, &945);

    let pool = t.pool.query_pool();
    assert_eq!(pool.liquid_reserve, 945);
    assert_eq!(pool.pending_deposits, 100);
    assert_eq!(pool.total_backing, 1_045);
    assert_eq!(t.pool.query_claim_value(&alice), 1_045);
    assert_eq!(t.token.balance(&t.pool.address), MIN_COLLATERAL + 1_045);
    assert_eq!(t.pool.query_oracle_state().last_reported_balance, 5);

    // paying out the commission empties what is left of the baseline
    assert_eq!(t.pool.settle_commission(&t.admin, &operator), 5);
    assert_eq!(t.pool.query_oracle_state().last_reported_balance, 0);
    t.assert_invariants();
}

#[test]
fn out_of_order_transitions_are_rejected() {
    let t = PoolTest::new();
    t.operator(BOND_LOW);
    t.deposit(1_000);

    assert_eq!(
        t.pool.try_mark_minipool_exiting(&t.oracle, &0),
        Err(Ok(ErrorCode::InvalidMinipoolTransition))
    );

    t.pool.activate_minipool(&t.oracle, &0, &t.pubkey(1));
    assert_eq!(
        t.pool.try_activate_minipool(&t.oracle, &0, &t.pubkey(1)),
        Err(Ok(ErrorCode::InvalidMinipoolTransition))
    );
    assert_eq!(
        t.pool.try_mark_minipool_exited(&t.oracle, &0, &0),
        Err(Ok(ErrorCode::InvalidMinipoolTransition))
    );

    assert_eq!(
        t.pool.try_activate_minipool(&t.oracle, &9, &t.pubkey(1)),
        Err(Ok(ErrorCode::MinipoolNotFound))
    );
}

#[test]
fn only_admin_or_oracle_confirm_transitions() {
    let t = PoolTest::new();
    t.operator(BOND_LOW);
    t.deposit(1_000);
    let stranger = Address::generate(&t.env);

    assert_eq!(
        t.pool.try_activate_minipool(&stranger, &0, &t.pubkey(1)),
        Err(Ok(ErrorCode::NotAuthorized))
    );
    assert_eq!(t.pool.query_minipool(&0).status, MinipoolStatus::Pending);
}

#[test]
fn exit_commission_and_counts_follow_active_validators() {
    let t = PoolTest::new();
    let a = t.operator(BOND_LOW);
    let b = t.operator(BOND_LOW);
    t.deposit(2_000);
    t.pool.activate_minipool(&t.oracle, &0, &t.pubkey(1));
    t.pool.activate_minipool(&t.oracle, &1, &t.pubkey(2));

    t.pool.mark_minipool_exiting(&t.oracle, &1);
    t.pool.mark_minipool_exited(&t.oracle, &1, &0);
    assert_eq!(t.pool.query_operator(&b).validator_count, 0);

    // baseline is 2_000 - 100 - 0; all commission now goes to `a`
    assert_eq!(t.pool.query_oracle_state().last_reported_balance, 1_900);
    t.pool.submit_report(&t.oracle, &2_000);
    assert_eq!(t.pool.query_operator(&a).pending_commission, 10);
    assert_eq!(t.pool.query_operator(&b).pending_commission, 0);
}
