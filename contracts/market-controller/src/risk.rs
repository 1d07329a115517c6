use fixed_point::{rdiv, rmul};
use soroban_sdk::{Address, Env, Vec};

use crate::accrual::{borrow_balance, exchange_rate};
use crate::clients::PriceOracleClient;
use crate::constants::*;
use crate::errors::Error;
use crate::helpers::checked;
use crate::storage::{
    read_account_markets, read_address, read_ledger, read_market, read_owner, read_position,
    DataKey,
};

/// Who is asking to flip a pause switch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PauseRole {
    Owner,
    Guardian,
    None,
}

pub fn resolve_pause_role(env: &Env, caller: &Address) -> Result<PauseRole, Error> {
    if *caller == read_owner(env)? {
        return Ok(PauseRole::Owner);
    }
    match read_address(env, &DataKey::PauseGuardian) {
        Some(guardian) if guardian == *caller => Ok(PauseRole::Guardian),
        _ => Ok(PauseRole::None),
    }
}

/// The guardian may only ever move a switch to paused.
pub fn check_pause_transition(role: PauseRole, paused: bool) -> Result<(), Error> {
    match (role, paused) {
        (PauseRole::Owner, _) => Ok(()),
        (PauseRole::Guardian, true) => Ok(()),
        (PauseRole::Guardian, false) => Err(Error::OwnerOnlyUnpause),
        (PauseRole::None, _) => Err(Error::AccessDenied),
    }
}

pub fn authorize_pause(env: &Env, caller: &Address, paused: bool) -> Result<(), Error> {
    let role = resolve_pause_role(env, caller)?;
    check_pause_transition(role, paused)?;
    caller.require_auth();
    Ok(())
}

pub fn validate_collateral_factor(value: u128) -> Result<(), Error> {
    if value > MAX_COLLATERAL_FACTOR {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

pub fn validate_borrow_factor(value: u128) -> Result<(), Error> {
    if value == 0 || value > MAX_BORROW_FACTOR {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

pub fn validate_close_factor(value: u128) -> Result<(), Error> {
    if !(MIN_CLOSE_FACTOR..=MAX_CLOSE_FACTOR).contains(&value) {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

pub fn validate_liquidation_incentive(value: u128) -> Result<(), Error> {
    if !(MIN_LIQUIDATION_INCENTIVE..=MAX_LIQUIDATION_INCENTIVE).contains(&value) {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

/// Ratios carried by the accrual ledger must sit in (0, 1].
pub fn validate_ratio(value: u128) -> Result<(), Error> {
    if value == 0 || value > BASE {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

/// Oracle price for `market`. A missing oracle, a failing call and a zero
/// answer all mean the price is unavailable.
pub fn price_of(env: &Env, market: &Address) -> Result<u128, Error> {
    let oracle = read_address(env, &DataKey::PriceOracle).ok_or(Error::PriceUnavailable)?;
    match PriceOracleClient::new(env, &oracle).try_get_underlying_price(market) {
        Ok(Ok(price)) if price > 0 => Ok(price),
        _ => Err(Error::PriceUnavailable),
    }
}

/// A hypothetical change applied to one market while computing liquidity.
pub struct Effect<'a> {
    pub market: &'a Address,
    pub redeem_shares: u128,
    pub borrow_amount: u128,
}

/// `(liquidity, shortfall)` of `account` over its entered markets, valued
/// with stored ledgers. At most one of the two is non-zero.
pub fn account_liquidity(
    env: &Env,
    account: &Address,
    effect: Option<Effect>,
) -> Result<(u128, u128), Error> {
    let mut markets: Vec<Address> = read_account_markets(env, account);
    if let Some(effect) = effect.as_ref() {
        if effect.borrow_amount > 0 && !markets.contains(effect.market) {
            markets.push_back(effect.market.clone());
        }
    }

    let mut collateral_value: u128 = 0;
    let mut borrow_value: u128 = 0;
    for market in markets.iter() {
        let config = read_market(env, &market)?;
        let ledger = read_ledger(env, &market)?;
        let position = read_position(env, &market, account);
        let mut shares = position.shares;
        let mut borrowed = borrow_balance(env, &ledger, &position)?;
        if let Some(effect) = effect.as_ref().filter(|e| *e.market == market) {
            shares = shares
                .checked_sub(effect.redeem_shares)
                .ok_or(Error::InsufficientBalance)?;
            borrowed = checked(borrowed.checked_add(effect.borrow_amount))?;
        }
        if shares == 0 && borrowed == 0 {
            continue;
        }
        let price = price_of(env, &market)?;
        if shares > 0 && config.collateral_factor > 0 {
            let rate = exchange_rate(env, &ledger)?;
            let underlying = checked(rmul(env, shares, rate))?;
            let value = checked(rmul(env, underlying, price))?;
            let weighted = checked(rmul(env, value, config.collateral_factor))?;
            collateral_value = checked(collateral_value.checked_add(weighted))?;
        }
        if borrowed > 0 {
            let value = checked(rmul(env, borrowed, price))?;
            let weighted = checked(rdiv(env, value, config.borrow_factor))?;
            borrow_value = checked(borrow_value.checked_add(weighted))?;
        }
    }

    if collateral_value >= borrow_value {
        Ok((collateral_value - borrow_value, 0))
    } else {
        Ok((0, borrow_value - collateral_value))
    }
}

/// Collateral shares handed to a liquidator repaying `repay_amount` of
/// `borrowed_market` debt: `repay * price_b * incentive / (price_c * rate)`.
pub fn seize_shares(
    env: &Env,
    borrowed_market: &Address,
    collateral_market: &Address,
    repay_amount: u128,
) -> Result<u128, Error> {
    let price_borrowed = price_of(env, borrowed_market)?;
    let price_collateral = price_of(env, collateral_market)?;
    let incentive = crate::storage::read_u128(
        env,
        &DataKey::LiquidationIncentive,
        DEFAULT_LIQUIDATION_INCENTIVE,
    );
    let ledger = read_ledger(env, collateral_market)?;
    let rate = exchange_rate(env, &ledger)?;

    let repay_value = checked(rmul(env, repay_amount, price_borrowed))?;
    let seize_value = checked(rmul(env, repay_value, incentive))?;
    let seize_underlying = checked(rdiv(env, seize_value, price_collateral))?;
    checked(rdiv(env, seize_underlying, rate))
}
