use pretty_assertions::assert_eq;
use soroban_sdk::{ testutils::Address as _, vec, Address };

use super::setup::{ PoolTest, BOND_HIGH, BOND_LOW, MIN_COLLATERAL };
use crate::{ errors::ErrorCode, storage::{ DataKey, Operator, PoolOperation } };

#[test]
fn register_operator_escrows_bond_and_collateral() {
    let t = PoolTest::new();
    let operator = t.user(BOND_HIGH + MIN_COLLATERAL + 7);

    let registered = t.pool.register_operator(&operator, &BOND_HIGH);

    assert_eq!(
        registered,
        Operator {
            address: operator.clone(),
            index: 0,
            registered: true,
            active: true,
            bond_amount: BOND_HIGH,
            bond_escrow: BOND_HIGH,
            collateral: MIN_COLLATERAL,
            validator_count: 0,
            pending_commission: 0,
            total_commission: 0,
            registered_at: 0,
        }
    );
    assert_eq!(t.token.balance(&operator), 7);
    assert_eq!(t.token.balance(&t.pool.address), BOND_HIGH + MIN_COLLATERAL);
    // escrow is not pool backing
    assert_eq!(t.pool.query_total_backing(), 0);
}

#[test]
fn register_operator_rejections() {
    let t = PoolTest::new();
    let operator = t.user(1_000);

    assert_eq!(
        t.pool.try_register_operator(&operator, &150),
        Err(Ok(ErrorCode::InvalidBondTier))
    );

    t.pool.register_operator(&operator, &BOND_LOW);
    assert_eq!(
        t.pool.try_register_operator(&operator, &BOND_LOW),
        Err(Ok(ErrorCode::OperatorAlreadyRegistered))
    );

    let poor = t.user(BOND_LOW + MIN_COLLATERAL - 1);
    assert_eq!(
        t.pool.try_register_operator(&poor, &BOND_LOW),
        Err(Ok(ErrorCode::InsufficientCollateral))
    );

    let late = t.user(1_000);
    t.pool.pause(&t.admin, &vec![&t.env, PoolOperation::RegisterOperator]);
    assert_eq!(
        t.pool.try_register_operator(&late, &BOND_LOW),
        Err(Ok(ErrorCode::OperationPaused))
    );

    assert_eq!(t.pool.query_operators().len(), 1);
}

#[test]
fn funding_rotates_through_operators_in_order() {
    let t = PoolTest::new();
    let a = t.bonded_operator(BOND_LOW, 2);
    let b = t.operator(BOND_LOW);
    let c = t.operator(BOND_LOW);

    t.deposit(3_000);
    assert_eq!(t.pool.query_minipool_count(), 3);
    assert_eq!(t.pool.query_minipool(&0).operator, a);
    assert_eq!(t.pool.query_minipool(&1).operator, b);
    assert_eq!(t.pool.query_minipool(&2).operator, c);

    // the cursor wrapped back to the first operator
    t.deposit(900);
    assert_eq!(t.pool.query_minipool(&3).operator, a);

    assert_eq!(t.pool.query_operator(&a).validator_count, 2);
    assert_eq!(t.pool.query_operator(&b).validator_count, 1);
    assert_eq!(t.pool.query_operator(&c).validator_count, 1);
}

#[test]
fn funding_skips_inactive_operators() {
    let t = PoolTest::new();
    let a = t.bonded_operator(BOND_LOW, 3);
    let b = t.operator(BOND_LOW);
    let c = t.bonded_operator(BOND_LOW, 2);

    t.deposit(3_900);
    t.pool.deactivate_operator(&t.admin, &b);

    t.deposit(1_700);
    assert_eq!(t.pool.query_minipool_count(), 6);
    assert_eq!(t.pool.query_minipool(&4).operator, c);
    assert_eq!(t.pool.query_minipool(&5).operator, a);
    assert_eq!(t.pool.query_operator(&b).validator_count, 1);
    t.assert_invariants();
}

#[test]
fn no_active_operator_is_not_an_error() {
    let t = PoolTest::new();
    let a = t.operator(BOND_LOW);
    t.pool.deactivate_operator(&t.admin, &a);

    t.deposit(2_000);

    assert_eq!(t.pool.query_minipool_count(), 0);
    assert_eq!(t.pool.query_pool().pending_deposits, 2_000);
    assert_eq!(t.pool.try_deactivate_operator(&t.admin, &a), Err(Ok(ErrorCode::OperatorInactive)));
}

#[test]
fn slashing_clamps_to_collateral_and_deactivates() {
    let t = PoolTest::new();
    let operator = t.operator(BOND_LOW);

    assert_eq!(t.pool.slash_operator(&t.admin, &operator, &80), MIN_COLLATERAL);

    let record = t.pool.query_operator(&operator);
    assert_eq!(record.collateral, 0);
    assert!(!record.active);

    let pool = t.pool.query_pool();
    assert_eq!(pool.liquid_reserve, MIN_COLLATERAL);
    assert_eq!(pool.total_backing, MIN_COLLATERAL);

    assert_eq!(t.pool.try_slash_operator(&t.admin, &operator, &0), Err(Ok(ErrorCode::ZeroAmount)));
    let unknown = Address::generate(&t.env);
    assert_eq!(
        t.pool.try_slash_operator(&t.admin, &unknown, &10),
        Err(Ok(ErrorCode::OperatorNotFound))
    );
}

#[test]
fn partial_slash_above_minimum_keeps_operator_active() {
    let t = PoolTest::new();
    let operator = t.fund_reserve(200);

    let record = t.pool.query_operator(&operator);
    assert_eq!(record.collateral, MIN_COLLATERAL);
    assert!(record.active);
    assert_eq!(t.pool.query_pool().liquid_reserve, 200);
}

#[test]
fn reactivation_requires_minimum_collateral() {
    let t = PoolTest::new();
    let operator = t.operator(BOND_LOW);
    t.pool.slash_operator(&t.admin, &operator, &30);
    assert!(!t.pool.query_operator(&operator).active);

    assert_eq!(
        t.pool.try_activate_operator(&t.admin, &operator),
        Err(Ok(ErrorCode::InsufficientCollateral))
    );

    // topping up alone never reactivates
    t.token_admin.mint(&operator, &30);
    assert_eq!(t.pool.add_collateral(&operator, &30), MIN_COLLATERAL);
    assert!(!t.pool.query_operator(&operator).active);

    t.pool.activate_operator(&t.admin, &operator);
    assert!(t.pool.query_operator(&operator).active);
}

#[test]
fn operator_admin_actions_are_gated() {
    let t = PoolTest::new();
    let operator = t.operator(BOND_LOW);
    let intruder = Address::generate(&t.env);

    assert_eq!(
        t.pool.try_slash_operator(&intruder, &operator, &10),
        Err(Ok(ErrorCode::NotAuthorized))
    );
    assert_eq!(
        t.pool.try_deactivate_operator(&intruder, &operator),
        Err(Ok(ErrorCode::NotAuthorized))
    );
    assert_eq!(
        t.pool.try_settle_commission(&intruder, &operator),
        Err(Ok(ErrorCode::NotAuthorized))
    );
    assert_eq!(
        t.pool.try_add_collateral(&intruder, &10),
        Err(Ok(ErrorCode::OperatorNotFound))
    );
}

#[test]
fn funding_skips_operators_without_escrowed_bond() {
    let t = PoolTest::new();
    let a = t.operator(BOND_LOW);
    let b = t.operator(BOND_HIGH);

    t.deposit(1_900);
    assert_eq!(t.pool.query_minipool(&0).operator, a);
    assert_eq!(t.pool.query_minipool(&1).operator, b);
    assert_eq!(t.pool.query_minipool(&1).pooled_portion, 800);
    assert_eq!(t.pool.query_pool().pending_deposits, 200);

    // both escrows are spent, so nothing more is handed off
    t.deposit(1_000);
    assert_eq!(t.pool.query_minipool_count(), 2);
    assert_eq!(t.pool.query_pool().pending_deposits, 1_200);

    t.token_admin.mint(&b, &BOND_HIGH);
    assert_eq!(t.pool.add_bond(&b), BOND_HIGH);
    t.deposit(10);
    assert_eq!(t.pool.query_minipool(&2).operator, b);
    assert_eq!(t.pool.query_pool().pending_deposits, 410);

    let unknown = Address::generate(&t.env);
    assert_eq!(t.pool.try_add_bond(&unknown), Err(Ok(ErrorCode::OperatorNotFound)));
    t.assert_invariants();
}

#[test]
fn registry_admin_actions_respect_the_busy_flag() {
    let t = PoolTest::new();
    let operator = t.operator(BOND_LOW);

    t.env.as_contract(&t.pool.address, || {
        t.env.storage().instance().set(&DataKey::Busy, &true);
    });
    assert_eq!(
        t.pool.try_deactivate_operator(&t.admin, &operator),
        Err(Ok(ErrorCode::Reentrant))
    );
    assert_eq!(
        t.pool.try_activate_operator(&t.admin, &operator),
        Err(Ok(ErrorCode::Reentrant))
    );
    assert_eq!(
        t.pool.try_settle_commission(&t.admin, &operator),
        Err(Ok(ErrorCode::Reentrant))
    );

    t.env.as_contract(&t.pool.address, || {
        t.env.storage().instance().remove(&DataKey::Busy);
    });
    t.pool.deactivate_operator(&t.admin, &operator);
    assert!(!t.pool.query_operator(&operator).active);
}
