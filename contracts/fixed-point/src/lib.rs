#![no_std]
//! 1e18 mantissa arithmetic shared by the money-market contracts.
//!
//! Every helper multiplies before it divides. Products that fit in `u128`
//! take the native path; larger ones are widened through the host `U256`
//! so no intermediate value is truncated. `None` means the final result
//! does not fit in `u128` (or the divisor is zero).

use soroban_sdk::{Env, U256};

/// 1.0 as a mantissa.
pub const BASE: u128 = 1_000_000_000_000_000_000u128;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rounding {
    Down,
    Up,
}

/// `a * b / denominator` with explicit rounding.
pub fn mul_div(env: &Env, a: u128, b: u128, denominator: u128, rounding: Rounding) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    if let Some(product) = a.checked_mul(b) {
        let quotient = product / denominator;
        return match rounding {
            Rounding::Up if product % denominator != 0 => quotient.checked_add(1),
            _ => Some(quotient),
        };
    }
    let wide_denominator = U256::from_u128(env, denominator);
    let product = U256::from_u128(env, a).mul(&U256::from_u128(env, b));
    let mut quotient = product.div(&wide_denominator);
    if rounding == Rounding::Up && product.rem_euclid(&wide_denominator) != U256::from_u32(env, 0) {
        quotient = quotient.add(&U256::from_u32(env, 1));
    }
    quotient.to_u128()
}

pub fn mul_div_down(env: &Env, a: u128, b: u128, denominator: u128) -> Option<u128> {
    mul_div(env, a, b, denominator, Rounding::Down)
}

pub fn mul_div_up(env: &Env, a: u128, b: u128, denominator: u128) -> Option<u128> {
    mul_div(env, a, b, denominator, Rounding::Up)
}

/// `a * b / BASE`, rounded down.
pub fn rmul(env: &Env, a: u128, b: u128) -> Option<u128> {
    mul_div(env, a, b, BASE, Rounding::Down)
}

/// `a * BASE / b`, rounded down.
pub fn rdiv(env: &Env, a: u128, b: u128) -> Option<u128> {
    mul_div(env, a, BASE, b, Rounding::Down)
}
