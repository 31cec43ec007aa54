use soroban_sdk::Env;
use stqrl::{
    constants::EXCHANGE_RATE_PRECISION,
    math::{ helpers::mul_div_floor, safe_math::SafeMath },
    validate,
};

use crate::{ errors::{ ErrorCode, PoolResult }, storage::Pool };

// Conversions always read the live totals. There is no cached rate anywhere in
// the pool, and every division floors in the pool's favour.
impl Pool {
    pub fn shares_for_deposit(&self, env: &Env, assets: i128) -> PoolResult<i128> {
        if self.total_shares == 0 {
            return Ok(assets);
        }

        validate!(
            env,
            self.total_backing > 0,
            ErrorCode::InsufficientBacking,
            "shares outstanding with zero backing",
            self.total_shares
        )?;

        Ok(mul_div_floor(env, assets, self.total_shares, self.total_backing)?)
    }

    pub fn assets_for_shares(&self, env: &Env, shares: i128) -> PoolResult<i128> {
        if self.total_shares == 0 {
            return Ok(shares);
        }

        Ok(mul_div_floor(env, shares, self.total_backing, self.total_shares)?)
    }

    /// Backing per share scaled by `EXCHANGE_RATE_PRECISION`.
    pub fn exchange_rate(&self, env: &Env) -> PoolResult<i128> {
        if self.total_shares == 0 {
            return Ok(EXCHANGE_RATE_PRECISION);
        }

        Ok(mul_div_floor(env, self.total_backing, EXCHANGE_RATE_PRECISION, self.total_shares)?)
    }

    pub(crate) fn mint(&mut self, env: &Env, shares: i128) -> PoolResult {
        self.total_shares = self.total_shares.safe_add(shares, env)?;
        Ok(())
    }

    pub(crate) fn burn(&mut self, env: &Env, shares: i128) -> PoolResult {
        validate!(
            env,
            shares <= self.total_shares,
            ErrorCode::InsufficientShares,
            "burning more than the supply",
            shares,
            self.total_shares
        )?;

        self.total_shares = self.total_shares.safe_sub(shares, env)?;
        Ok(())
    }

    /// Funds that sit in the contract and are not staked.
    pub fn on_hand(&self, env: &Env) -> PoolResult<i128> {
        Ok(self.liquid_reserve.safe_add(self.pending_deposits, env)?)
    }

    /// Backing that currently lives on the validator side.
    pub fn staked(&self, env: &Env) -> PoolResult<i128> {
        Ok(self.total_backing.safe_sub(self.on_hand(env)?, env)?.max(0))
    }

    /// Applies a reported net reward. Shares are untouched, so every holder's
    /// claim grows in the same proportion.
    pub(crate) fn add_rewards(&mut self, env: &Env, net: i128) -> PoolResult {
        self.total_backing = self.total_backing.safe_add(net, env)?;
        Ok(())
    }

    /// Applies a validator loss. The loss only ever comes out of
    /// `total_backing`, never out of `total_shares`, and is bounded by the
    /// staked portion so that on-hand funds stay covered.
    pub(crate) fn apply_loss(&mut self, env: &Env, loss: i128) -> PoolResult {
        let staked = self.staked(env)?;
        validate!(
            env,
            loss <= staked,
            ErrorCode::SlashingExceedsStake,
            "loss exceeds staked backing",
            loss,
            staked
        )?;

        self.total_backing = self.total_backing.safe_sub(loss, env)?;
        Ok(())
    }

    /// Value entering the pool from outside (slashed operator collateral).
    pub(crate) fn add_to_reserve(&mut self, env: &Env, amount: i128) -> PoolResult {
        self.liquid_reserve = self.liquid_reserve.safe_add(amount, env)?;
        self.total_backing = self.total_backing.safe_add(amount, env)?;
        Ok(())
    }

    /// Staked value coming back from an exited validator. Backing already
    /// counts it, so only the reserve moves. Gains reach backing through
    /// reports alone; a return above the counted stake waits for one.
    pub(crate) fn realize_exit(&mut self, env: &Env, returned: i128) -> PoolResult {
        let staked = self.staked(env)?;
        validate!(
            env,
            returned <= staked,
            ErrorCode::ExitExceedsStake,
            "exit returns more than the counted stake",
            returned,
            staked
        )?;

        self.liquid_reserve = self.liquid_reserve.safe_add(returned, env)?;
        Ok(())
    }

    pub fn check_invariants(&self, env: &Env) -> PoolResult {
        validate!(
            env,
            self.total_shares >= 0 && self.liquid_reserve >= 0 && self.pending_deposits >= 0,
            ErrorCode::MathError,
            "negative pool total"
        )?;
        validate!(
            env,
            self.total_backing >= self.on_hand(env)?,
            ErrorCode::InsufficientBacking,
            "backing below on-hand funds",
            self.total_backing,
            self.liquid_reserve,
            self.pending_deposits
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    fn pool(total_shares: i128, total_backing: i128) -> Pool {
        Pool {
            total_shares,
            total_backing,
            liquid_reserve: 0,
            pending_deposits: 0,
        }
    }

    #[test]
    fn empty_pool_is_one_to_one() {
        let env = Env::default();
        let empty = Pool::default();

        assert_eq!(empty.shares_for_deposit(&env, 500).unwrap(), 500);
        assert_eq!(empty.assets_for_shares(&env, 500).unwrap(), 500);
        assert_eq!(empty.exchange_rate(&env).unwrap(), EXCHANGE_RATE_PRECISION);
    }

    #[test]
    fn deposit_at_par_keeps_rate() {
        let env = Env::default();
        let mut pool = pool(1_000, 1_000);

        let shares = pool.shares_for_deposit(&env, 100).unwrap();
        pool.mint(&env, shares).unwrap();
        pool.total_backing += 100;

        assert_eq!(shares, 100);
        assert_eq!((pool.total_shares, pool.total_backing), (1_100, 1_100));
        assert_eq!(pool.exchange_rate(&env).unwrap(), EXCHANGE_RATE_PRECISION);
    }

    #[test]
    fn rewards_raise_claim_value() {
        let env = Env::default();
        let mut pool = pool(1_100, 1_100);

        pool.add_rewards(&env, 50).unwrap();

        assert_eq!(pool.total_backing, 1_150);
        assert_eq!(pool.exchange_rate(&env).unwrap(), 1_045_454_545);
        assert_eq!(pool.assets_for_shares(&env, 100).unwrap(), 104);
    }

    #[test_case(1, 1_150, 1_100 ; "single unit")]
    #[test_case(100, 1_150, 1_100 ; "after reward")]
    #[test_case(7_777, 999_999, 1_000_003 ; "after loss")]
    #[test_case(123_456_789, 3, 2 ; "coarse rate")]
    fn round_trip_never_creates_value(deposit: i128, backing: i128, shares: i128) {
        let env = Env::default();
        let mut pool = pool(shares, backing);

        let minted = pool.shares_for_deposit(&env, deposit).unwrap();
        pool.mint(&env, minted).unwrap();
        pool.total_backing += deposit;

        assert!(pool.assets_for_shares(&env, minted).unwrap() <= deposit);
    }

    #[test]
    fn loss_is_shared_proportionally() {
        let env = Env::default();
        let mut pool = pool(6_000, 6_000);
        let holders = [1_000_i128, 2_000, 3_000];

        pool.apply_loss(&env, 600).unwrap();

        for shares in holders {
            let value = pool.assets_for_shares(&env, shares).unwrap();
            // each claim drops by exactly 10%
            assert_eq!(value, shares - shares / 10);
        }
        assert_eq!(pool.total_shares, 6_000);
    }

    #[test]
    fn loss_cannot_touch_on_hand_funds() {
        let env = Env::default();
        let mut pool = pool(1_000, 1_000);
        pool.liquid_reserve = 300;
        pool.pending_deposits = 500;

        assert_eq!(pool.apply_loss(&env, 201), Err(ErrorCode::SlashingExceedsStake));
        assert_eq!(pool.apply_loss(&env, 200), Ok(()));
        assert_eq!(pool.check_invariants(&env), Ok(()));
    }

    #[test]
    fn burn_beyond_supply_fails() {
        let env = Env::default();
        let mut pool = pool(10, 10);

        assert_eq!(pool.burn(&env, 11), Err(ErrorCode::InsufficientShares));
    }

    #[test]
    fn exit_moves_stake_into_the_reserve() {
        let env = Env::default();
        let mut pool = pool(1_000, 1_045);
        pool.pending_deposits = 100;

        pool.realize_exit(&env, 945).unwrap();

        assert_eq!(pool.liquid_reserve, 945);
        assert_eq!(pool.total_backing, 1_045);
        assert_eq!(pool.check_invariants(&env), Ok(()));
    }

    #[test]
    fn exit_gain_is_not_credited_without_a_report() {
        let env = Env::default();
        let mut pool = pool(1_000, 1_000);
        pool.pending_deposits = 100;

        assert_eq!(pool.realize_exit(&env, 950), Err(ErrorCode::ExitExceedsStake));
        assert_eq!(pool.liquid_reserve, 0);
        assert_eq!(pool.total_backing, 1_000);
    }
}
