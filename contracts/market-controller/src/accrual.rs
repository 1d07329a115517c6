//! Per-market interest ledger.
//!
//! `accrue` is the only place a ledger moves forward in time. Everything
//! else in the crate reads the ledger after it has been brought current.

use fixed_point::{mul_div_down, mul_div_up, rmul};
use soroban_sdk::{log, Address, Env};

use crate::clients::InterestRateModelClient;
use crate::constants::{BASE, MAX_BORROW_RATE_PER_BLOCK};
use crate::errors::Error;
use crate::events::AccrueInterest;
use crate::helpers::checked;
use crate::storage::{read_ledger, write_ledger, AccountPosition, AccrualLedger};

/// Advance `market` to the current ledger sequence. A second call within
/// the same block returns the stored ledger untouched.
pub fn accrue(env: &Env, market: &Address) -> Result<AccrualLedger, Error> {
    let mut ledger = read_ledger(env, market)?;
    let now = env.ledger().sequence();
    if ledger.accrual_block >= now {
        return Ok(ledger);
    }
    let delta_blocks = (now - ledger.accrual_block) as u128;
    let rate = borrow_rate_per_block(env, &ledger)?;

    let simple_factor = checked(rate.checked_mul(delta_blocks))?;
    let interest_accumulated = checked(rmul(env, simple_factor, ledger.total_borrows))?;
    ledger.total_borrows = checked(ledger.total_borrows.checked_add(interest_accumulated))?;
    let new_reserves = checked(rmul(env, ledger.reserve_ratio, interest_accumulated))?;
    ledger.total_reserves = checked(ledger.total_reserves.checked_add(new_reserves))?;
    let index_growth = checked(rmul(env, simple_factor, ledger.borrow_index))?;
    ledger.borrow_index = checked(ledger.borrow_index.checked_add(index_growth))?;
    ledger.accrual_block = now;
    write_ledger(env, market, &ledger);

    log!(env, "accrue", market.clone(), delta_blocks, rate);
    AccrueInterest {
        market: market.clone(),
        cash: ledger.cash,
        interest_accumulated,
        borrow_index: ledger.borrow_index,
        total_borrows: ledger.total_borrows,
    }
    .publish(env);
    Ok(ledger)
}

pub fn borrow_rate_per_block(env: &Env, ledger: &AccrualLedger) -> Result<u128, Error> {
    let Some(model) = ledger.interest_rate_model.clone() else {
        return Ok(0);
    };
    let rate = InterestRateModelClient::new(env, &model).get_borrow_rate(
        &ledger.cash,
        &ledger.total_borrows,
        &ledger.total_reserves,
    );
    if rate > MAX_BORROW_RATE_PER_BLOCK {
        return Err(Error::InvalidParameter);
    }
    Ok(rate)
}

pub fn supply_rate_per_block(env: &Env, ledger: &AccrualLedger) -> u128 {
    let Some(model) = ledger.interest_rate_model.clone() else {
        return 0;
    };
    InterestRateModelClient::new(env, &model).get_supply_rate(
        &ledger.cash,
        &ledger.total_borrows,
        &ledger.total_reserves,
        &ledger.reserve_ratio,
    )
}

/// `(cash + borrows - reserves) / supply`, or 1.0 for an empty market.
pub fn exchange_rate(env: &Env, ledger: &AccrualLedger) -> Result<u128, Error> {
    if ledger.total_supply == 0 {
        return Ok(BASE);
    }
    let underlying = checked(
        ledger
            .cash
            .checked_add(ledger.total_borrows)
            .and_then(|v| v.checked_sub(ledger.total_reserves)),
    )?;
    checked(mul_div_down(env, underlying, BASE, ledger.total_supply))
}

/// Principal rebased to the ledger's current borrow index, rounded up.
pub fn borrow_balance(
    env: &Env,
    ledger: &AccrualLedger,
    position: &AccountPosition,
) -> Result<u128, Error> {
    if position.borrow_principal == 0 {
        return Ok(0);
    }
    checked(mul_div_up(
        env,
        position.borrow_principal,
        ledger.borrow_index,
        position.borrow_index,
    ))
}

/// Shares minted for `amount` of underlying, rounded down.
pub fn shares_for_mint(env: &Env, ledger: &AccrualLedger, amount: u128) -> Result<u128, Error> {
    let rate = exchange_rate(env, ledger)?;
    checked(mul_div_down(env, amount, BASE, rate))
}

/// Underlying paid out for redeeming `shares`, rounded down.
pub fn underlying_for_shares(
    env: &Env,
    ledger: &AccrualLedger,
    shares: u128,
) -> Result<u128, Error> {
    let rate = exchange_rate(env, ledger)?;
    checked(rmul(env, shares, rate))
}

/// Shares burned to withdraw exactly `amount` of underlying, rounded up.
pub fn shares_for_underlying(
    env: &Env,
    ledger: &AccrualLedger,
    amount: u128,
) -> Result<u128, Error> {
    let rate = exchange_rate(env, ledger)?;
    checked(mul_div_up(env, amount, BASE, rate))
}
