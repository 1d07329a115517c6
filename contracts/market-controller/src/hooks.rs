//! Admission checks run before every balance change.
//!
//! Each hook follows the same order: listing, pause switch, accrual, reward
//! checkpoint and settlement for the accounts involved, then the solvency
//! and capacity checks specific to the action.

use fixed_point::rmul;
use soroban_sdk::{Address, Env, Vec};

use crate::accrual::{accrue, borrow_balance, exchange_rate};
use crate::clients::{AccountUnits, DistributionHint, RewardDistributorClient};
use crate::constants::DEFAULT_CLOSE_FACTOR;
use crate::errors::Error;
use crate::helpers::checked;
use crate::risk::{account_liquidity, Effect};
use crate::storage::{
    read_account_markets, read_address, read_flag, read_market, read_position, read_u128,
    write_account_markets, AccrualLedger, DataKey, MarketConfig,
};

fn listed(env: &Env, market: &Address) -> Result<MarketConfig, Error> {
    read_market(env, market)
}

fn ensure_unpaused(paused: bool) -> Result<(), Error> {
    if paused {
        return Err(Error::ActionPaused);
    }
    Ok(())
}

/// Pushes the pre-action units of `accounts` on one market side to the
/// reward distributor, if one is configured.
pub fn notify_distributor(
    env: &Env,
    market: &Address,
    ledger: &AccrualLedger,
    is_borrow: bool,
    accounts: &[&Address],
) -> Result<(), Error> {
    let Some(distributor) = read_address(env, &DataKey::RewardDistributor) else {
        return Ok(());
    };
    let mut units = Vec::new(env);
    for account in accounts {
        let position = read_position(env, market, account);
        let amount = if is_borrow {
            borrow_balance(env, ledger, &position)?
        } else {
            position.shares
        };
        units.push_back(AccountUnits {
            account: (*account).clone(),
            units: amount,
        });
    }
    let hint = DistributionHint {
        market: market.clone(),
        is_borrow,
        total_units: if is_borrow {
            ledger.total_borrows
        } else {
            ledger.total_supply
        },
        accounts: units,
    };
    RewardDistributorClient::new(env, &distributor).on_market_action(&hint);
    Ok(())
}

pub fn enter_market(env: &Env, account: &Address, market: &Address) -> bool {
    let mut entered = read_account_markets(env, account);
    if entered.contains(market) {
        return false;
    }
    entered.push_back(market.clone());
    write_account_markets(env, account, &entered);
    true
}

pub fn before_mint(
    env: &Env,
    market: &Address,
    minter: &Address,
    amount: u128,
) -> Result<AccrualLedger, Error> {
    let config = listed(env, market)?;
    ensure_unpaused(config.mint_paused)?;
    let ledger = accrue(env, market)?;
    notify_distributor(env, market, &ledger, false, &[minter])?;

    let rate = exchange_rate(env, &ledger)?;
    let supplied = checked(rmul(env, ledger.total_supply, rate))?;
    if checked(supplied.checked_add(amount))? > config.supply_capacity {
        return Err(Error::CapacityExceeded);
    }
    Ok(ledger)
}

pub fn before_redeem(
    env: &Env,
    market: &Address,
    redeemer: &Address,
    shares: u128,
) -> Result<AccrualLedger, Error> {
    let config = listed(env, market)?;
    ensure_unpaused(config.redeem_paused)?;
    let ledger = accrue(env, market)?;
    notify_distributor(env, market, &ledger, false, &[redeemer])?;

    if read_account_markets(env, redeemer).contains(market) {
        let (_, shortfall) = account_liquidity(
            env,
            redeemer,
            Some(Effect {
                market,
                redeem_shares: shares,
                borrow_amount: 0,
            }),
        )?;
        if shortfall > 0 {
            return Err(Error::InsufficientLiquidity);
        }
    }
    Ok(ledger)
}

/// Borrowing enters the market on the borrower's behalf.
pub fn before_borrow(
    env: &Env,
    market: &Address,
    borrower: &Address,
    amount: u128,
) -> Result<AccrualLedger, Error> {
    let config = listed(env, market)?;
    ensure_unpaused(config.borrow_paused)?;
    let ledger = accrue(env, market)?;
    notify_distributor(env, market, &ledger, true, &[borrower])?;

    if enter_market(env, borrower, market) {
        crate::events::MarketEntered {
            market: market.clone(),
            account: borrower.clone(),
        }
        .publish(env);
    }
    if checked(ledger.total_borrows.checked_add(amount))? > config.borrow_capacity {
        return Err(Error::CapacityExceeded);
    }
    let (_, shortfall) = account_liquidity(
        env,
        borrower,
        Some(Effect {
            market,
            redeem_shares: 0,
            borrow_amount: amount,
        }),
    )?;
    if shortfall > 0 {
        return Err(Error::InsufficientLiquidity);
    }
    Ok(ledger)
}

pub fn before_repay_borrow(
    env: &Env,
    market: &Address,
    _payer: &Address,
    borrower: &Address,
    _amount: u128,
) -> Result<AccrualLedger, Error> {
    listed(env, market)?;
    let ledger = accrue(env, market)?;
    notify_distributor(env, market, &ledger, true, &[borrower])?;
    Ok(ledger)
}

/// Requires an existing shortfall and caps the repay at the close factor.
pub fn before_liquidate_borrow(
    env: &Env,
    borrowed_market: &Address,
    collateral_market: &Address,
    _liquidator: &Address,
    borrower: &Address,
    repay_amount: u128,
) -> Result<(), Error> {
    listed(env, borrowed_market)?;
    listed(env, collateral_market)?;
    let ledger = accrue(env, borrowed_market)?;
    accrue(env, collateral_market)?;

    let (_, shortfall) = account_liquidity(env, borrower, None)?;
    if shortfall == 0 {
        return Err(Error::NoShortfall);
    }
    let position = read_position(env, borrowed_market, borrower);
    let balance = borrow_balance(env, &ledger, &position)?;
    let close_factor = read_u128(env, &DataKey::CloseFactor, DEFAULT_CLOSE_FACTOR);
    let max_repay = checked(rmul(env, balance, close_factor))?;
    if repay_amount > max_repay {
        return Err(Error::RepayTooLarge);
    }
    Ok(())
}

/// Every market is held by this single controller, so the counter-market
/// pairing check reduces to both markets being listed here. Shortfall is
/// re-validated only for a non-zero seize.
pub fn before_seize(
    env: &Env,
    collateral_market: &Address,
    borrowed_market: &Address,
    liquidator: &Address,
    borrower: &Address,
    seize_shares: u128,
) -> Result<(), Error> {
    listed(env, collateral_market)?;
    listed(env, borrowed_market)?;
    ensure_unpaused(read_flag(env, &DataKey::SeizePaused))?;
    let ledger = accrue(env, collateral_market)?;
    accrue(env, borrowed_market)?;
    notify_distributor(env, collateral_market, &ledger, false, &[borrower, liquidator])?;

    if seize_shares > 0 {
        let (_, shortfall) = account_liquidity(env, borrower, None)?;
        if shortfall == 0 {
            return Err(Error::NoShortfall);
        }
    }
    Ok(())
}

pub fn before_transfer(
    env: &Env,
    market: &Address,
    from: &Address,
    to: &Address,
    shares: u128,
) -> Result<AccrualLedger, Error> {
    listed(env, market)?;
    ensure_unpaused(read_flag(env, &DataKey::TransferPaused))?;
    let ledger = accrue(env, market)?;
    notify_distributor(env, market, &ledger, false, &[from, to])?;

    if read_account_markets(env, from).contains(market) {
        let (_, shortfall) = account_liquidity(
            env,
            from,
            Some(Effect {
                market,
                redeem_shares: shares,
                borrow_amount: 0,
            }),
        )?;
        if shortfall > 0 {
            return Err(Error::InsufficientLiquidity);
        }
    }
    Ok(ledger)
}

/// Flashloans share the borrow switch.
pub fn before_flashloan(
    env: &Env,
    market: &Address,
    _receiver: &Address,
    _amount: u128,
) -> Result<AccrualLedger, Error> {
    let config = listed(env, market)?;
    ensure_unpaused(config.borrow_paused)?;
    accrue(env, market)
}
