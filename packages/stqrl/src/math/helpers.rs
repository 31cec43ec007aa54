use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{ log, Env, I256 };

use crate::{
    constants::BPS_DENOMINATOR_I128,
    error::{ ErrorCode, MathResult },
};

/// `floor(value * numerator / denominator)` for non-negative operands. A
/// product that overflows `i128` is redone in `I256`; only a quotient that
/// does not fit back into `i128` is an error. Rounding always lands on the
/// side of the pool.
pub fn mul_div_floor(
    env: &Env,
    value: i128,
    numerator: i128,
    denominator: i128
) -> MathResult<i128> {
    if value < 0 || numerator < 0 || denominator <= 0 {
        log!(env, "Math error thrown: mul_div operands", value, numerator, denominator);
        return Err(ErrorCode::MathError);
    }

    if let Some(result) = value.fixed_mul_floor(numerator, denominator) {
        return Ok(result);
    }

    // operands are non-negative, so truncating division is the floor
    let wide = I256::from_i128(env, value)
        .mul(&I256::from_i128(env, numerator))
        .div(&I256::from_i128(env, denominator));

    wide.to_i128().ok_or_else(|| {
        log!(env, "Math error thrown: mul_div overflow", value, numerator, denominator);
        ErrorCode::MathError
    })
}

/// Portion of `value` expressed in basis points, floored.
pub fn apply_bps(env: &Env, value: i128, bps: u32) -> MathResult<i128> {
    mul_div_floor(env, value, i128::from(bps), BPS_DENOMINATOR_I128)
}
