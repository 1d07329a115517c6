//! Checkpointed reward accumulators.
//!
//! Each market carries a supply and a borrow index. An index only grows
//! while the distributor is unpaused, by `speed * blocks * BASE / units`.
//! Accounts keep a snapshot of each index; settling credits
//! `units * (index - snapshot) / BASE` and moves the snapshot up.

use fixed_point::{mul_div_down, rmul, BASE};
use soroban_sdk::{log, Address, Env, Vec};

use crate::clients::{ControllerClient, PriceOracleClient};
use crate::errors::Error;
use crate::events::{DistributionSpeedUpdated, RewardDistributed};
use crate::storage::*;

fn checked<T>(value: Option<T>) -> Result<T, Error> {
    value.ok_or(Error::MathOverflow)
}

pub fn controller(env: &Env) -> Result<ControllerClient<'_>, Error> {
    Ok(ControllerClient::new(env, &read_controller(env)?))
}

pub fn ensure_listed(controller: &ControllerClient, market: &Address) -> Result<(), Error> {
    if !controller.has_market(market) {
        return Err(Error::NotListed);
    }
    Ok(())
}

/// Bring one side of `market` to the current block and return its index.
/// While paused neither the index nor the block moves.
pub fn checkpoint(env: &Env, market: &Address, is_borrow: bool, total_units: u128) -> Result<u128, Error> {
    let now = env.ledger().sequence();
    let stored = read_state(env, market, is_borrow);
    if is_paused(env) {
        return Ok(stored.map(|s| s.index).unwrap_or(0));
    }
    let mut state = stored.unwrap_or(DistributionState { index: 0, block: now });
    let delta_blocks = now.saturating_sub(state.block) as u128;
    if delta_blocks > 0 && total_units > 0 {
        let speed = read_speed(env, market);
        if speed > 0 {
            let emitted = checked(speed.checked_mul(delta_blocks))?;
            let growth = checked(mul_div_down(env, emitted, BASE, total_units))?;
            state.index = checked(state.index.checked_add(growth))?;
        }
    }
    state.block = now;
    write_state(env, market, is_borrow, &state);
    Ok(state.index)
}

/// Credit `account` for the index growth since its last snapshot.
pub fn settle(
    env: &Env,
    market: &Address,
    is_borrow: bool,
    account: &Address,
    units: u128,
    index: u128,
) -> Result<(), Error> {
    let snapshot = read_account_index(env, market, account, is_borrow);
    if snapshot == index {
        return Ok(());
    }
    write_account_index(env, market, account, is_borrow, index);
    let delta = index.saturating_sub(snapshot);
    let amount = checked(rmul(env, units, delta))?;
    if amount == 0 {
        return Ok(());
    }
    let reward = checked(read_reward(env, account).checked_add(amount))?;
    write_reward(env, account, reward);
    RewardDistributed {
        market: market.clone(),
        account: account.clone(),
        is_borrow,
        amount,
        index,
    }
    .publish(env);
    Ok(())
}

/// Checkpoint both sides of `market` from the controller's stored totals.
pub fn checkpoint_market(
    env: &Env,
    controller: &ControllerClient,
    market: &Address,
) -> Result<(u128, u128), Error> {
    let (total_supply, total_borrows) = controller.reward_totals(market);
    let supply_index = checkpoint(env, market, false, total_supply)?;
    let borrow_index = checkpoint(env, market, true, total_borrows)?;
    Ok((supply_index, borrow_index))
}

/// Checkpoint both sides of `market` and settle `account` on each.
pub fn settle_market(
    env: &Env,
    controller: &ControllerClient,
    market: &Address,
    account: &Address,
    indices: (u128, u128),
) -> Result<(), Error> {
    let (shares, borrow_units) = controller.reward_units(market, account);
    settle(env, market, false, account, shares, indices.0)?;
    settle(env, market, true, account, borrow_units, indices.1)
}

fn market_price(env: &Env, oracle: &Option<Address>, market: &Address) -> Option<u128> {
    let oracle = oracle.as_ref()?;
    match PriceOracleClient::new(env, oracle).try_get_underlying_price(market) {
        Ok(Ok(price)) if price > 0 => Some(price),
        _ => None,
    }
}

/// Checkpoint every market at its current speed, then split the global
/// speed by `total_borrows * price * distribution_factor`. Paused, or any
/// price unavailable, resolves every speed to 0.
pub fn refresh_speeds(env: &Env) -> Result<(), Error> {
    let controller = controller(env)?;
    let markets = controller.get_markets();
    let mut borrows: Vec<u128> = Vec::new(env);
    for market in markets.iter() {
        let (total_supply, total_borrows) = controller.reward_totals(&market);
        checkpoint(env, &market, false, total_supply)?;
        checkpoint(env, &market, true, total_borrows)?;
        borrows.push_back(total_borrows);
    }

    let mut values: Vec<u128> = Vec::new(env);
    let mut total_value: u128 = 0;
    let mut priced = !is_paused(env);
    if priced {
        let oracle = controller.get_price_oracle();
        for (market, total_borrows) in markets.iter().zip(borrows.iter()) {
            let Some(price) = market_price(env, &oracle, &market) else {
                priced = false;
                break;
            };
            let factor = read_factor(env, &market).unwrap_or(0);
            let value = checked(rmul(env, total_borrows, price))?;
            let value = checked(rmul(env, value, factor))?;
            total_value = checked(total_value.checked_add(value))?;
            values.push_back(value);
        }
    }

    let global_speed = read_global_speed(env);
    for (i, market) in markets.iter().enumerate() {
        let speed = if !priced || total_value == 0 {
            0
        } else {
            let value = values.get(i as u32).unwrap_or(0);
            checked(mul_div_down(env, global_speed, value, total_value))?
        };
        write_speed(env, &market, speed);
        DistributionSpeedUpdated {
            market: market.clone(),
            speed,
        }
        .publish(env);
    }
    log!(env, "speeds refreshed", global_speed, total_value, priced);
    Ok(())
}
