use soroban_sdk::{contract, contractimpl, Address, Bytes, Env, Vec};

use crate::accrual::{
    accrue, borrow_balance, borrow_rate_per_block, exchange_rate, shares_for_mint,
    shares_for_underlying, supply_rate_per_block, underlying_for_shares,
};
use crate::clients::{FlashloanReceiverClient, RewardDistributorClient};
use crate::constants::*;
use crate::errors::Error;
use crate::events::*;
use crate::helpers::*;
use crate::hooks;
use crate::risk::{self, Effect};
use crate::storage::*;

#[contract]
pub struct MarketController;

fn require_owner(env: &Env) -> Result<Address, Error> {
    let owner = read_owner(env)?;
    owner.require_auth();
    Ok(owner)
}

#[contractimpl]
impl MarketController {
    pub fn initialize(env: Env, owner: Address) -> Result<(), Error> {
        if is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        owner.require_auth();
        let instance = env.storage().instance();
        instance.set(&DataKey::Owner, &owner);
        instance.set(&DataKey::CloseFactor, &DEFAULT_CLOSE_FACTOR);
        instance.set(&DataKey::LiquidationIncentive, &DEFAULT_LIQUIDATION_INCENTIVE);
        instance.set(&DataKey::Markets, &Vec::<Address>::new(&env));
        bump_core_ttl(&env);
        OwnerUpdated { owner }.publish(&env);
        Ok(())
    }

    pub fn set_owner(env: Env, new_owner: Address) -> Result<(), Error> {
        require_owner(&env)?;
        new_owner.require_auth();
        env.storage().instance().set(&DataKey::Owner, &new_owner);
        OwnerUpdated { owner: new_owner }.publish(&env);
        Ok(())
    }

    pub fn get_owner(env: Env) -> Result<Address, Error> {
        read_owner(&env)
    }

    // ---------------------------------------------------------------------
    // Market registry
    // ---------------------------------------------------------------------

    /// List `market` (an underlying token) with its risk parameters.
    pub fn add_market(
        env: Env,
        market: Address,
        collateral_factor: u128,
        borrow_factor: u128,
        supply_capacity: u128,
        borrow_capacity: u128,
        distribution_factor: u128,
    ) -> Result<(), Error> {
        require_owner(&env)?;
        if is_listed(&env, &market) {
            return Err(Error::AlreadyListed);
        }
        risk::validate_collateral_factor(collateral_factor)?;
        risk::validate_borrow_factor(borrow_factor)?;
        let decimals = probe_market_token(&env, &market).ok_or(Error::NotMarketToken)?;
        risk::price_of(&env, &market)?;

        write_market(
            &env,
            &market,
            &MarketConfig {
                decimals,
                collateral_factor,
                borrow_factor,
                supply_capacity,
                borrow_capacity,
                distribution_factor,
                mint_paused: false,
                redeem_paused: false,
                borrow_paused: false,
            },
        );
        write_ledger(
            &env,
            &market,
            &AccrualLedger {
                cash: 0,
                total_borrows: 0,
                total_reserves: 0,
                total_supply: 0,
                borrow_index: BASE,
                accrual_block: env.ledger().sequence(),
                reserve_ratio: DEFAULT_RESERVE_RATIO,
                flashloan_fee_ratio: DEFAULT_FLASHLOAN_FEE_RATIO,
                protocol_fee_ratio: DEFAULT_PROTOCOL_FEE_RATIO,
                interest_rate_model: None,
            },
        );
        let mut markets = read_markets(&env);
        markets.push_back(market.clone());
        env.storage().instance().set(&DataKey::Markets, &markets);

        if let Some(distributor) = read_address(&env, &DataKey::RewardDistributor) {
            RewardDistributorClient::new(&env, &distributor)
                .add_recipient(&market, &distribution_factor);
        }

        MarketAdded {
            market,
            collateral_factor,
            borrow_factor,
            supply_capacity,
            borrow_capacity,
            distribution_factor,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_collateral_factor(env: Env, market: Address, value: u128) -> Result<(), Error> {
        require_owner(&env)?;
        let mut config = read_market(&env, &market)?;
        risk::validate_collateral_factor(value)?;
        risk::price_of(&env, &market)?;
        let old = config.collateral_factor;
        config.collateral_factor = value;
        write_market(&env, &market, &config);
        NewCollateralFactor {
            market,
            old_collateral_factor: old,
            new_collateral_factor: value,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_borrow_factor(env: Env, market: Address, value: u128) -> Result<(), Error> {
        require_owner(&env)?;
        let mut config = read_market(&env, &market)?;
        risk::validate_borrow_factor(value)?;
        risk::price_of(&env, &market)?;
        let old = config.borrow_factor;
        config.borrow_factor = value;
        write_market(&env, &market, &config);
        NewBorrowFactor {
            market,
            old_borrow_factor: old,
            new_borrow_factor: value,
        }
        .publish(&env);
        Ok(())
    }

    /// Caps only gate future mints; existing balances are never touched.
    pub fn set_supply_capacity(env: Env, market: Address, value: u128) -> Result<(), Error> {
        require_owner(&env)?;
        let mut config = read_market(&env, &market)?;
        let old = config.supply_capacity;
        config.supply_capacity = value;
        write_market(&env, &market, &config);
        NewSupplyCapacity {
            market,
            old_supply_capacity: old,
            new_supply_capacity: value,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_borrow_capacity(env: Env, market: Address, value: u128) -> Result<(), Error> {
        require_owner(&env)?;
        let mut config = read_market(&env, &market)?;
        let old = config.borrow_capacity;
        config.borrow_capacity = value;
        write_market(&env, &market, &config);
        NewBorrowCapacity {
            market,
            old_borrow_capacity: old,
            new_borrow_capacity: value,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_close_factor(env: Env, value: u128) -> Result<(), Error> {
        require_owner(&env)?;
        risk::validate_close_factor(value)?;
        let old = read_u128(&env, &DataKey::CloseFactor, DEFAULT_CLOSE_FACTOR);
        env.storage().instance().set(&DataKey::CloseFactor, &value);
        NewCloseFactor {
            old_close_factor: old,
            new_close_factor: value,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_liquidation_incentive(env: Env, value: u128) -> Result<(), Error> {
        require_owner(&env)?;
        risk::validate_liquidation_incentive(value)?;
        let old = read_u128(
            &env,
            &DataKey::LiquidationIncentive,
            DEFAULT_LIQUIDATION_INCENTIVE,
        );
        env.storage()
            .instance()
            .set(&DataKey::LiquidationIncentive, &value);
        NewLiquidationIncentive {
            old_liquidation_incentive: old,
            new_liquidation_incentive: value,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_price_oracle(env: Env, oracle: Address) -> Result<(), Error> {
        require_owner(&env)?;
        if read_address(&env, &DataKey::PriceOracle) == Some(oracle.clone()) {
            return Err(Error::InvalidParameter);
        }
        env.storage().instance().set(&DataKey::PriceOracle, &oracle);
        NewPriceOracle { oracle }.publish(&env);
        Ok(())
    }

    /// Markets listed before the distributor existed are registered with it
    /// at the distribution factor they were listed with.
    pub fn set_reward_distributor(env: Env, distributor: Address) -> Result<(), Error> {
        require_owner(&env)?;
        if read_address(&env, &DataKey::RewardDistributor) == Some(distributor.clone()) {
            return Err(Error::InvalidParameter);
        }
        env.storage()
            .instance()
            .set(&DataKey::RewardDistributor, &distributor);
        let client = RewardDistributorClient::new(&env, &distributor);
        for market in read_markets(&env).iter() {
            let config = read_market(&env, &market)?;
            client.add_recipient(&market, &config.distribution_factor);
        }
        NewRewardDistributor { distributor }.publish(&env);
        Ok(())
    }

    pub fn set_pause_guardian(env: Env, guardian: Address) -> Result<(), Error> {
        require_owner(&env)?;
        env.storage()
            .instance()
            .set(&DataKey::PauseGuardian, &guardian);
        NewPauseGuardian { guardian }.publish(&env);
        Ok(())
    }

    pub fn set_interest_rate_model(env: Env, market: Address, model: Address) -> Result<(), Error> {
        require_owner(&env)?;
        let mut ledger = accrue(&env, &market)?;
        ledger.interest_rate_model = Some(model.clone());
        write_ledger(&env, &market, &ledger);
        NewInterestRateModel { market, model }.publish(&env);
        Ok(())
    }

    /// Ratio setters accrue first so the old ratio covers the elapsed span.
    pub fn set_reserve_ratio(env: Env, market: Address, value: u128) -> Result<(), Error> {
        require_owner(&env)?;
        risk::validate_ratio(value)?;
        let mut ledger = accrue(&env, &market)?;
        let old = ledger.reserve_ratio;
        ledger.reserve_ratio = value;
        write_ledger(&env, &market, &ledger);
        NewReserveRatio {
            market,
            old_reserve_ratio: old,
            new_reserve_ratio: value,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_flashloan_fee_ratio(env: Env, market: Address, value: u128) -> Result<(), Error> {
        require_owner(&env)?;
        risk::validate_ratio(value)?;
        let mut ledger = accrue(&env, &market)?;
        let old = ledger.flashloan_fee_ratio;
        ledger.flashloan_fee_ratio = value;
        write_ledger(&env, &market, &ledger);
        NewFlashloanFeeRatio {
            market,
            old_flashloan_fee_ratio: old,
            new_flashloan_fee_ratio: value,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_protocol_fee_ratio(env: Env, market: Address, value: u128) -> Result<(), Error> {
        require_owner(&env)?;
        risk::validate_ratio(value)?;
        let mut ledger = accrue(&env, &market)?;
        let old = ledger.protocol_fee_ratio;
        ledger.protocol_fee_ratio = value;
        write_ledger(&env, &market, &ledger);
        NewProtocolFeeRatio {
            market,
            old_protocol_fee_ratio: old,
            new_protocol_fee_ratio: value,
        }
        .publish(&env);
        Ok(())
    }

    pub fn reduce_reserves(env: Env, market: Address, amount: u128, to: Address) -> Result<(), Error> {
        require_owner(&env)?;
        let mut ledger = accrue(&env, &market)?;
        if amount > ledger.total_reserves {
            return Err(Error::InvalidParameter);
        }
        if amount > ledger.cash {
            return Err(Error::InsufficientCash);
        }
        ledger.total_reserves -= amount;
        ledger.cash -= amount;
        write_ledger(&env, &market, &ledger);
        push_underlying(&env, &market, &to, amount)?;
        ReservesReduced {
            market,
            recipient: to,
            amount,
            total_reserves: ledger.total_reserves,
        }
        .publish(&env);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Pause switches
    // ---------------------------------------------------------------------

    pub fn set_mint_paused(env: Env, caller: Address, market: Address, paused: bool) -> Result<(), Error> {
        risk::authorize_pause(&env, &caller, paused)?;
        let mut config = read_market(&env, &market)?;
        config.mint_paused = paused;
        write_market(&env, &market, &config);
        MintPaused { market, paused }.publish(&env);
        Ok(())
    }

    pub fn set_redeem_paused(env: Env, caller: Address, market: Address, paused: bool) -> Result<(), Error> {
        risk::authorize_pause(&env, &caller, paused)?;
        let mut config = read_market(&env, &market)?;
        config.redeem_paused = paused;
        write_market(&env, &market, &config);
        RedeemPaused { market, paused }.publish(&env);
        Ok(())
    }

    pub fn set_borrow_paused(env: Env, caller: Address, market: Address, paused: bool) -> Result<(), Error> {
        risk::authorize_pause(&env, &caller, paused)?;
        let mut config = read_market(&env, &market)?;
        config.borrow_paused = paused;
        write_market(&env, &market, &config);
        BorrowPaused { market, paused }.publish(&env);
        Ok(())
    }

    pub fn set_transfer_paused(env: Env, caller: Address, paused: bool) -> Result<(), Error> {
        risk::authorize_pause(&env, &caller, paused)?;
        env.storage().instance().set(&DataKey::TransferPaused, &paused);
        TransferPaused { paused }.publish(&env);
        Ok(())
    }

    pub fn set_seize_paused(env: Env, caller: Address, paused: bool) -> Result<(), Error> {
        risk::authorize_pause(&env, &caller, paused)?;
        env.storage().instance().set(&DataKey::SeizePaused, &paused);
        SeizePaused { paused }.publish(&env);
        Ok(())
    }

    /// Owner-only: every market switch plus transfer and seize at once.
    pub fn set_all_paused(env: Env, paused: bool) -> Result<(), Error> {
        require_owner(&env)?;
        for market in read_markets(&env).iter() {
            let mut config = read_market(&env, &market)?;
            config.mint_paused = paused;
            config.redeem_paused = paused;
            config.borrow_paused = paused;
            write_market(&env, &market, &config);
            MintPaused { market: market.clone(), paused }.publish(&env);
            RedeemPaused { market: market.clone(), paused }.publish(&env);
            BorrowPaused { market, paused }.publish(&env);
        }
        env.storage().instance().set(&DataKey::TransferPaused, &paused);
        env.storage().instance().set(&DataKey::SeizePaused, &paused);
        TransferPaused { paused }.publish(&env);
        SeizePaused { paused }.publish(&env);
        Ok(())
    }

    pub fn is_mint_paused(env: Env, market: Address) -> Result<bool, Error> {
        Ok(read_market(&env, &market)?.mint_paused)
    }

    pub fn is_redeem_paused(env: Env, market: Address) -> Result<bool, Error> {
        Ok(read_market(&env, &market)?.redeem_paused)
    }

    pub fn is_borrow_paused(env: Env, market: Address) -> Result<bool, Error> {
        Ok(read_market(&env, &market)?.borrow_paused)
    }

    pub fn is_transfer_paused(env: Env) -> bool {
        read_flag(&env, &DataKey::TransferPaused)
    }

    pub fn is_seize_paused(env: Env) -> bool {
        read_flag(&env, &DataKey::SeizePaused)
    }

    // ---------------------------------------------------------------------
    // Hooks. Callable directly; the actions below run the same checks.
    // ---------------------------------------------------------------------

    pub fn before_mint(env: Env, market: Address, minter: Address, amount: u128) -> Result<(), Error> {
        hooks::before_mint(&env, &market, &minter, amount).map(|_| ())
    }

    pub fn before_redeem(env: Env, market: Address, redeemer: Address, shares: u128) -> Result<(), Error> {
        hooks::before_redeem(&env, &market, &redeemer, shares).map(|_| ())
    }

    /// Enters `market` for the borrower, so the borrower must sign.
    pub fn before_borrow(env: Env, market: Address, borrower: Address, amount: u128) -> Result<(), Error> {
        borrower.require_auth();
        hooks::before_borrow(&env, &market, &borrower, amount).map(|_| ())
    }

    pub fn before_repay_borrow(
        env: Env,
        market: Address,
        payer: Address,
        borrower: Address,
        amount: u128,
    ) -> Result<(), Error> {
        hooks::before_repay_borrow(&env, &market, &payer, &borrower, amount).map(|_| ())
    }

    pub fn before_liquidate_borrow(
        env: Env,
        borrowed_market: Address,
        collateral_market: Address,
        liquidator: Address,
        borrower: Address,
        repay_amount: u128,
    ) -> Result<(), Error> {
        hooks::before_liquidate_borrow(
            &env,
            &borrowed_market,
            &collateral_market,
            &liquidator,
            &borrower,
            repay_amount,
        )
    }

    pub fn before_seize(
        env: Env,
        collateral_market: Address,
        borrowed_market: Address,
        liquidator: Address,
        borrower: Address,
        seize_shares: u128,
    ) -> Result<(), Error> {
        hooks::before_seize(
            &env,
            &collateral_market,
            &borrowed_market,
            &liquidator,
            &borrower,
            seize_shares,
        )
    }

    pub fn before_transfer(
        env: Env,
        market: Address,
        from: Address,
        to: Address,
        shares: u128,
    ) -> Result<(), Error> {
        hooks::before_transfer(&env, &market, &from, &to, shares).map(|_| ())
    }

    pub fn before_flashloan(env: Env, market: Address, receiver: Address, amount: u128) -> Result<(), Error> {
        hooks::before_flashloan(&env, &market, &receiver, amount).map(|_| ())
    }

    // ---------------------------------------------------------------------
    // Membership
    // ---------------------------------------------------------------------

    pub fn enter_markets(env: Env, account: Address, markets: Vec<Address>) -> Result<(), Error> {
        account.require_auth();
        for market in markets.iter() {
            if !is_listed(&env, &market) {
                return Err(Error::NotListed);
            }
            if hooks::enter_market(&env, &account, &market) {
                MarketEntered {
                    market,
                    account: account.clone(),
                }
                .publish(&env);
            }
        }
        Ok(())
    }

    /// Leaving is refused while the account owes in `market` or while the
    /// remaining collateral would not cover its other borrows.
    pub fn exit_market(env: Env, account: Address, market: Address) -> Result<(), Error> {
        account.require_auth();
        read_market(&env, &market)?;
        let entered = read_account_markets(&env, &account);
        let Some(index) = entered.first_index_of(&market) else {
            return Ok(());
        };
        let ledger = accrue(&env, &market)?;
        let position = read_position(&env, &market, &account);
        if borrow_balance(&env, &ledger, &position)? > 0 {
            return Err(Error::OutstandingBorrow);
        }
        let mut remaining = entered.clone();
        remaining.remove(index);
        write_account_markets(&env, &account, &remaining);
        let (_, shortfall) = risk::account_liquidity(&env, &account, None)?;
        if shortfall > 0 {
            return Err(Error::InsufficientLiquidity);
        }
        MarketExited { market, account }.publish(&env);
        Ok(())
    }

    pub fn get_account_markets(env: Env, account: Address) -> Vec<Address> {
        read_account_markets(&env, &account)
    }

    // ---------------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------------

    /// Supply `amount` of underlying; returns the shares minted.
    pub fn mint(env: Env, minter: Address, market: Address, amount: u128) -> Result<u128, Error> {
        minter.require_auth();
        if amount == 0 {
            return Ok(0);
        }
        let mut ledger = hooks::before_mint(&env, &market, &minter, amount)?;
        let shares = shares_for_mint(&env, &ledger, amount)?;
        if shares == 0 {
            return Err(Error::InvalidParameter);
        }
        pull_underlying(&env, &market, &minter, amount)?;

        ledger.cash = checked(ledger.cash.checked_add(amount))?;
        ledger.total_supply = checked(ledger.total_supply.checked_add(shares))?;
        write_ledger(&env, &market, &ledger);
        let mut position = read_position(&env, &market, &minter);
        position.shares = checked(position.shares.checked_add(shares))?;
        write_position(&env, &market, &minter, &position);

        Mint {
            market,
            minter,
            mint_amount: amount,
            mint_shares: shares,
        }
        .publish(&env);
        Ok(shares)
    }

    /// Burn `shares`; returns the underlying paid out.
    pub fn redeem(env: Env, redeemer: Address, market: Address, shares: u128) -> Result<u128, Error> {
        redeemer.require_auth();
        if shares == 0 {
            return Ok(0);
        }
        let ledger = hooks::before_redeem(&env, &market, &redeemer, shares)?;
        let amount = underlying_for_shares(&env, &ledger, shares)?;
        Self::redeem_fresh(&env, &redeemer, &market, ledger, shares, amount)?;
        Ok(amount)
    }

    /// Withdraw exactly `amount` of underlying; returns the shares burned.
    pub fn redeem_underlying(env: Env, redeemer: Address, market: Address, amount: u128) -> Result<u128, Error> {
        redeemer.require_auth();
        if amount == 0 {
            return Ok(0);
        }
        let ledger = accrue(&env, &market)?;
        let shares = shares_for_underlying(&env, &ledger, amount)?;
        let ledger = hooks::before_redeem(&env, &market, &redeemer, shares)?;
        Self::redeem_fresh(&env, &redeemer, &market, ledger, shares, amount)?;
        Ok(shares)
    }

    pub fn borrow(env: Env, borrower: Address, market: Address, amount: u128) -> Result<(), Error> {
        borrower.require_auth();
        if amount == 0 {
            return Ok(());
        }
        let mut ledger = hooks::before_borrow(&env, &market, &borrower, amount)?;
        if amount > ledger.cash {
            return Err(Error::InsufficientCash);
        }
        let mut position = read_position(&env, &market, &borrower);
        let account_borrows = checked(borrow_balance(&env, &ledger, &position)?.checked_add(amount))?;
        position.borrow_principal = account_borrows;
        position.borrow_index = ledger.borrow_index;
        write_position(&env, &market, &borrower, &position);
        ledger.total_borrows = checked(ledger.total_borrows.checked_add(amount))?;
        ledger.cash -= amount;
        write_ledger(&env, &market, &ledger);
        push_underlying(&env, &market, &borrower, amount)?;

        Borrow {
            market,
            borrower,
            borrow_amount: amount,
            account_borrows,
            total_borrows: ledger.total_borrows,
        }
        .publish(&env);
        Ok(())
    }

    /// Repay up to `amount` of the caller's own debt; returns what was repaid.
    pub fn repay_borrow(env: Env, borrower: Address, market: Address, amount: u128) -> Result<u128, Error> {
        Self::repay_borrow_behalf(env, borrower.clone(), borrower, market, amount)
    }

    pub fn repay_borrow_behalf(
        env: Env,
        payer: Address,
        borrower: Address,
        market: Address,
        amount: u128,
    ) -> Result<u128, Error> {
        payer.require_auth();
        if amount == 0 {
            return Ok(0);
        }
        let ledger = hooks::before_repay_borrow(&env, &market, &payer, &borrower, amount)?;
        Self::repay_fresh(&env, &payer, &borrower, &market, ledger, amount)
    }

    /// Repay part of `borrower`'s debt in `borrowed_market` and receive
    /// discounted collateral shares of `collateral_market`.
    pub fn liquidate_borrow(
        env: Env,
        liquidator: Address,
        borrower: Address,
        borrowed_market: Address,
        collateral_market: Address,
        repay_amount: u128,
    ) -> Result<u128, Error> {
        liquidator.require_auth();
        if liquidator == borrower {
            return Err(Error::InvalidParameter);
        }
        if repay_amount == 0 {
            return Ok(0);
        }
        hooks::before_liquidate_borrow(
            &env,
            &borrowed_market,
            &collateral_market,
            &liquidator,
            &borrower,
            repay_amount,
        )?;
        let ledger =
            hooks::before_repay_borrow(&env, &borrowed_market, &liquidator, &borrower, repay_amount)?;
        let seize = risk::seize_shares(&env, &borrowed_market, &collateral_market, repay_amount)?;
        if seize > read_position(&env, &collateral_market, &borrower).shares {
            return Err(Error::InsufficientBalance);
        }
        hooks::before_seize(
            &env,
            &collateral_market,
            &borrowed_market,
            &liquidator,
            &borrower,
            seize,
        )?;

        let repaid = Self::repay_fresh(&env, &liquidator, &borrower, &borrowed_market, ledger, repay_amount)?;
        let mut from = read_position(&env, &collateral_market, &borrower);
        from.shares -= seize;
        write_position(&env, &collateral_market, &borrower, &from);
        let mut to = read_position(&env, &collateral_market, &liquidator);
        to.shares = checked(to.shares.checked_add(seize))?;
        write_position(&env, &collateral_market, &liquidator, &to);

        LiquidateBorrow {
            borrower,
            liquidator,
            borrowed_market,
            collateral_market,
            repay_amount: repaid,
            seize_shares: seize,
        }
        .publish(&env);
        Ok(seize)
    }

    pub fn transfer(env: Env, from: Address, to: Address, market: Address, shares: u128) -> Result<(), Error> {
        from.require_auth();
        if from == to {
            return Err(Error::InvalidParameter);
        }
        if shares == 0 {
            return Ok(());
        }
        hooks::before_transfer(&env, &market, &from, &to, shares)?;
        let mut source = read_position(&env, &market, &from);
        source.shares = source
            .shares
            .checked_sub(shares)
            .ok_or(Error::InsufficientBalance)?;
        write_position(&env, &market, &from, &source);
        let mut dest = read_position(&env, &market, &to);
        dest.shares = checked(dest.shares.checked_add(shares))?;
        write_position(&env, &market, &to, &dest);
        Transfer {
            market,
            from,
            to,
            shares,
        }
        .publish(&env);
        Ok(())
    }

    /// Lend `amount` to `receiver` for the duration of its `on_flashloan`
    /// callback. The callback must send back `amount + fee`.
    pub fn flashloan(
        env: Env,
        receiver: Address,
        market: Address,
        amount: u128,
        data: Bytes,
    ) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let mut ledger = hooks::before_flashloan(&env, &market, &receiver, amount)?;
        if amount > ledger.cash {
            return Err(Error::InsufficientCash);
        }
        let fee = checked(fixed_point::rmul(&env, amount, ledger.flashloan_fee_ratio))?;
        let protocol_fee = checked(fixed_point::rmul(&env, fee, ledger.protocol_fee_ratio))?;

        let balance_before = underlying_balance(&env, &market);
        push_underlying(&env, &market, &receiver, amount)?;
        FlashloanReceiverClient::new(&env, &receiver).on_flashloan(&market, &amount, &fee, &data);
        let balance_after = underlying_balance(&env, &market);
        let required = checked(balance_before.checked_add(fee))?;
        if balance_after < required {
            return Err(Error::FlashloanNotRepaid);
        }

        ledger.cash = checked(ledger.cash.checked_add(balance_after - balance_before))?;
        ledger.total_reserves = checked(ledger.total_reserves.checked_add(protocol_fee))?;
        write_ledger(&env, &market, &ledger);
        Flashloan {
            market,
            receiver,
            amount,
            fee,
            protocol_fee,
        }
        .publish(&env);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    pub fn account_liquidity(env: Env, account: Address) -> Result<(u128, u128), Error> {
        risk::account_liquidity(&env, &account, None)
    }

    pub fn hypothetical_liquidity(
        env: Env,
        account: Address,
        market: Address,
        redeem_shares: u128,
        borrow_amount: u128,
    ) -> Result<(u128, u128), Error> {
        read_market(&env, &market)?;
        risk::account_liquidity(
            &env,
            &account,
            Some(Effect {
                market: &market,
                redeem_shares,
                borrow_amount,
            }),
        )
    }

    pub fn liquidate_calculate_seize_shares(
        env: Env,
        borrowed_market: Address,
        collateral_market: Address,
        repay_amount: u128,
    ) -> Result<u128, Error> {
        risk::seize_shares(&env, &borrowed_market, &collateral_market, repay_amount)
    }

    pub fn accrue_interest(env: Env, market: Address) -> Result<(), Error> {
        accrue(&env, &market).map(|_| ())
    }

    pub fn exchange_rate_stored(env: Env, market: Address) -> Result<u128, Error> {
        exchange_rate(&env, &read_ledger(&env, &market)?)
    }

    pub fn exchange_rate_current(env: Env, market: Address) -> Result<u128, Error> {
        exchange_rate(&env, &accrue(&env, &market)?)
    }

    pub fn borrow_balance_stored(env: Env, market: Address, account: Address) -> Result<u128, Error> {
        let ledger = read_ledger(&env, &market)?;
        borrow_balance(&env, &ledger, &read_position(&env, &market, &account))
    }

    pub fn borrow_rate_per_block(env: Env, market: Address) -> Result<u128, Error> {
        borrow_rate_per_block(&env, &read_ledger(&env, &market)?)
    }

    pub fn supply_rate_per_block(env: Env, market: Address) -> Result<u128, Error> {
        Ok(supply_rate_per_block(&env, &read_ledger(&env, &market)?))
    }

    pub fn get_ledger(env: Env, market: Address) -> Result<AccrualLedger, Error> {
        read_ledger(&env, &market)
    }

    pub fn get_market(env: Env, market: Address) -> Result<MarketConfig, Error> {
        read_market(&env, &market)
    }

    pub fn get_position(env: Env, market: Address, account: Address) -> AccountPosition {
        read_position(&env, &market, &account)
    }

    pub fn get_cash(env: Env, market: Address) -> Result<u128, Error> {
        Ok(read_ledger(&env, &market)?.cash)
    }

    pub fn get_markets(env: Env) -> Vec<Address> {
        read_markets(&env)
    }

    pub fn has_market(env: Env, market: Address) -> bool {
        is_listed(&env, &market)
    }

    pub fn get_close_factor(env: Env) -> u128 {
        read_u128(&env, &DataKey::CloseFactor, DEFAULT_CLOSE_FACTOR)
    }

    pub fn get_liquidation_incentive(env: Env) -> u128 {
        read_u128(
            &env,
            &DataKey::LiquidationIncentive,
            DEFAULT_LIQUIDATION_INCENTIVE,
        )
    }

    pub fn get_price_oracle(env: Env) -> Option<Address> {
        read_address(&env, &DataKey::PriceOracle)
    }

    pub fn get_reward_distributor(env: Env) -> Option<Address> {
        read_address(&env, &DataKey::RewardDistributor)
    }

    pub fn get_pause_guardian(env: Env) -> Option<Address> {
        read_address(&env, &DataKey::PauseGuardian)
    }

    /// `(total_supply, total_borrows)` as stored, for reward checkpoints.
    pub fn reward_totals(env: Env, market: Address) -> Result<(u128, u128), Error> {
        let ledger = read_ledger(&env, &market)?;
        Ok((ledger.total_supply, ledger.total_borrows))
    }

    /// `(shares, borrow_units)` of `account`, borrow units rebased with
    /// ceiling division.
    pub fn reward_units(env: Env, market: Address, account: Address) -> Result<(u128, u128), Error> {
        let ledger = read_ledger(&env, &market)?;
        let position = read_position(&env, &market, &account);
        Ok((position.shares, borrow_balance(&env, &ledger, &position)?))
    }
}

impl MarketController {
    fn redeem_fresh(
        env: &Env,
        redeemer: &Address,
        market: &Address,
        mut ledger: AccrualLedger,
        shares: u128,
        amount: u128,
    ) -> Result<(), Error> {
        let mut position = read_position(env, market, redeemer);
        position.shares = position
            .shares
            .checked_sub(shares)
            .ok_or(Error::InsufficientBalance)?;
        if amount > ledger.cash {
            return Err(Error::InsufficientCash);
        }
        write_position(env, market, redeemer, &position);
        ledger.total_supply = checked(ledger.total_supply.checked_sub(shares))?;
        ledger.cash -= amount;
        write_ledger(env, market, &ledger);
        push_underlying(env, market, redeemer, amount)?;

        Redeem {
            market: market.clone(),
            redeemer: redeemer.clone(),
            redeem_amount: amount,
            redeem_shares: shares,
        }
        .publish(env);
        Ok(())
    }

    /// Repays at most the current balance. `total_borrows` saturates because
    /// rounded-up balances can sum to slightly more than the aggregate.
    fn repay_fresh(
        env: &Env,
        payer: &Address,
        borrower: &Address,
        market: &Address,
        mut ledger: AccrualLedger,
        amount: u128,
    ) -> Result<u128, Error> {
        let mut position = read_position(env, market, borrower);
        let balance = borrow_balance(env, &ledger, &position)?;
        let repay = amount.min(balance);
        if repay == 0 {
            return Ok(0);
        }
        pull_underlying(env, market, payer, repay)?;

        let account_borrows = balance - repay;
        position.borrow_principal = account_borrows;
        position.borrow_index = ledger.borrow_index;
        write_position(env, market, borrower, &position);
        ledger.total_borrows = ledger.total_borrows.saturating_sub(repay);
        ledger.cash = checked(ledger.cash.checked_add(repay))?;
        write_ledger(env, market, &ledger);

        RepayBorrow {
            market: market.clone(),
            borrower: borrower.clone(),
            payer: payer.clone(),
            repay_amount: repay,
            account_borrows,
            total_borrows: ledger.total_borrows,
        }
        .publish(env);
        Ok(repay)
    }
}
