use soroban_sdk::{contract, contractimpl, token, Address, Env, Vec};

use crate::clients::DistributionHint;
use crate::distribution::{
    checkpoint, checkpoint_market, controller, ensure_listed, refresh_speeds, settle, settle_market,
};
use crate::errors::Error;
use crate::events::*;
use crate::storage::*;

#[contract]
pub struct RewardDistributor;

fn require_owner(env: &Env) -> Result<Address, Error> {
    let owner = read_owner(env)?;
    owner.require_auth();
    Ok(owner)
}

fn require_controller(env: &Env) -> Result<(), Error> {
    read_controller(env)?.require_auth();
    bump_core_ttl(env);
    Ok(())
}

#[contractimpl]
impl RewardDistributor {
    /// Starts paused with a zero global speed.
    pub fn initialize(env: Env, owner: Address, controller: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Owner) {
            return Err(Error::AlreadyInitialized);
        }
        owner.require_auth();
        let instance = env.storage().instance();
        instance.set(&DataKey::Owner, &owner);
        instance.set(&DataKey::Controller, &controller);
        write_paused(&env, true);
        write_global_speed(&env, 0);
        bump_core_ttl(&env);
        Ok(())
    }

    pub fn set_owner(env: Env, new_owner: Address) -> Result<(), Error> {
        require_owner(&env)?;
        new_owner.require_auth();
        env.storage().instance().set(&DataKey::Owner, &new_owner);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Controller callbacks
    // ---------------------------------------------------------------------

    /// Registers a newly listed market. Already known markets keep their
    /// factor and state.
    pub fn add_recipient(env: Env, market: Address, distribution_factor: u128) -> Result<(), Error> {
        require_controller(&env)?;
        if read_factor(&env, &market).is_some() {
            return Ok(());
        }
        write_factor(&env, &market, distribution_factor);
        let state = DistributionState {
            index: 0,
            block: env.ledger().sequence(),
        };
        write_state(&env, &market, false, &state);
        write_state(&env, &market, true, &state);
        write_speed(&env, &market, 0);
        NewRecipient {
            market,
            distribution_factor,
        }
        .publish(&env);
        Ok(())
    }

    /// Checkpoint one market side and settle the acting accounts with the
    /// units they held before the action. Ignored while paused.
    pub fn on_market_action(env: Env, hint: DistributionHint) -> Result<(), Error> {
        require_controller(&env)?;
        if is_paused(&env) {
            return Ok(());
        }
        let index = checkpoint(&env, &hint.market, hint.is_borrow, hint.total_units)?;
        for entry in hint.accounts.iter() {
            settle(&env, &hint.market, hint.is_borrow, &entry.account, entry.units, index)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Public accrual and claims
    // ---------------------------------------------------------------------

    pub fn update_distribution_state(env: Env, market: Address, is_borrow: bool) -> Result<(), Error> {
        let controller = controller(&env)?;
        ensure_listed(&controller, &market)?;
        if is_paused(&env) {
            return Ok(());
        }
        let (total_supply, total_borrows) = controller.reward_totals(&market);
        let units = if is_borrow { total_borrows } else { total_supply };
        checkpoint(&env, &market, is_borrow, units)?;
        Ok(())
    }

    pub fn update_reward(env: Env, market: Address, account: Address, is_borrow: bool) -> Result<(), Error> {
        let controller = controller(&env)?;
        ensure_listed(&controller, &market)?;
        if is_paused(&env) {
            return Ok(());
        }
        let (total_supply, total_borrows) = controller.reward_totals(&market);
        let (shares, borrow_units) = controller.reward_units(&market, &account);
        let index = if is_borrow {
            checkpoint(&env, &market, true, total_borrows)?
        } else {
            checkpoint(&env, &market, false, total_supply)?
        };
        let units = if is_borrow { borrow_units } else { shares };
        settle(&env, &market, is_borrow, &account, units, index)
    }

    /// Settlement pass over every (market, holder) pair without payout.
    /// Runs while paused too, against the frozen indices.
    pub fn update_reward_batch(env: Env, holders: Vec<Address>, markets: Vec<Address>) -> Result<(), Error> {
        Self::settle_all(&env, &holders, &markets)
    }

    /// Settle and pay out the full accrued reward of every holder.
    pub fn claim_reward(env: Env, holders: Vec<Address>, markets: Vec<Address>) -> Result<(), Error> {
        Self::settle_all(&env, &holders, &markets)?;
        Self::pay_out(&env, &holders)
    }

    pub fn claim_all_reward(env: Env, holders: Vec<Address>) -> Result<(), Error> {
        let markets = controller(&env)?.get_markets();
        Self::settle_all(&env, &holders, &markets)?;
        Self::pay_out(&env, &holders)
    }

    /// Refused with `CallerNotEOA` while the distribution lock is held.
    pub fn update_distribution_speed(env: Env) -> Result<(), Error> {
        if is_locked(&env) {
            return Err(Error::CallerNotEOA);
        }
        set_lock(&env, true);
        refresh_speeds(&env)?;
        set_lock(&env, false);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Owner configuration
    // ---------------------------------------------------------------------

    pub fn set_global_distribution_speed(env: Env, speed: u128) -> Result<(), Error> {
        require_owner(&env)?;
        if is_paused(&env) {
            return Err(Error::InvalidParameter);
        }
        write_global_speed(&env, speed);
        GlobalSpeedUpdated { speed }.publish(&env);
        refresh_speeds(&env)
    }

    pub fn set_distribution_factors(env: Env, markets: Vec<Address>, factors: Vec<u128>) -> Result<(), Error> {
        require_owner(&env)?;
        if markets.len() != factors.len() {
            return Err(Error::LengthMismatch);
        }
        let controller = controller(&env)?;
        for (market, factor) in markets.iter().zip(factors.iter()) {
            ensure_listed(&controller, &market)?;
            let old = read_factor(&env, &market).unwrap_or(0);
            write_factor(&env, &market, factor);
            NewDistributionFactor {
                market,
                old_distribution_factor: old,
                new_distribution_factor: factor,
            }
            .publish(&env);
        }
        refresh_speeds(&env)
    }

    pub fn set_reward_token(env: Env, reward_token: Address) -> Result<(), Error> {
        require_owner(&env)?;
        if read_reward_token(&env) == Some(reward_token.clone()) {
            return Err(Error::InvalidParameter);
        }
        env.storage()
            .instance()
            .set(&DataKey::RewardToken, &reward_token);
        NewRewardToken {
            token: reward_token,
        }
        .publish(&env);
        Ok(())
    }

    /// Checkpoint every market at its running speed, then stop all growth.
    pub fn pause(env: Env) -> Result<(), Error> {
        require_owner(&env)?;
        let controller = controller(&env)?;
        for market in controller.get_markets().iter() {
            checkpoint_market(&env, &controller, &market)?;
        }
        write_paused(&env, true);
        refresh_speeds(&env)?;
        Paused { paused: true }.publish(&env);
        Ok(())
    }

    /// Checkpoints restart at the current block, so the paused window is
    /// never credited.
    pub fn unpause(env: Env, global_speed: u128) -> Result<(), Error> {
        require_owner(&env)?;
        write_paused(&env, false);
        write_global_speed(&env, global_speed);
        Paused { paused: false }.publish(&env);
        GlobalSpeedUpdated {
            speed: global_speed,
        }
        .publish(&env);
        refresh_speeds(&env)
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    pub fn get_owner(env: Env) -> Result<Address, Error> {
        read_owner(&env)
    }

    pub fn get_controller(env: Env) -> Result<Address, Error> {
        read_controller(&env)
    }

    pub fn paused(env: Env) -> bool {
        is_paused(&env)
    }

    pub fn reward_token(env: Env) -> Option<Address> {
        read_reward_token(&env)
    }

    pub fn global_distribution_speed(env: Env) -> u128 {
        read_global_speed(&env)
    }

    pub fn distribution_speed(env: Env, market: Address) -> u128 {
        read_speed(&env, &market)
    }

    pub fn distribution_factor(env: Env, market: Address) -> u128 {
        read_factor(&env, &market).unwrap_or(0)
    }

    pub fn distribution_supply_state(env: Env, market: Address) -> Option<DistributionState> {
        read_state(&env, &market, false)
    }

    pub fn distribution_borrow_state(env: Env, market: Address) -> Option<DistributionState> {
        read_state(&env, &market, true)
    }

    pub fn distribution_supplier_index(env: Env, market: Address, account: Address) -> u128 {
        read_account_index(&env, &market, &account, false)
    }

    pub fn distribution_borrower_index(env: Env, market: Address, account: Address) -> u128 {
        read_account_index(&env, &market, &account, true)
    }

    pub fn reward(env: Env, account: Address) -> u128 {
        read_reward(&env, &account)
    }
}

impl RewardDistributor {
    fn settle_all(env: &Env, holders: &Vec<Address>, markets: &Vec<Address>) -> Result<(), Error> {
        let controller = controller(env)?;
        for market in markets.iter() {
            ensure_listed(&controller, &market)?;
            let indices = checkpoint_market(env, &controller, &market)?;
            for holder in holders.iter() {
                settle_market(env, &controller, &market, &holder, indices)?;
            }
        }
        Ok(())
    }

    /// The lock stays held while the reward token has control.
    fn pay_out(env: &Env, holders: &Vec<Address>) -> Result<(), Error> {
        let reward_token = read_reward_token(env).ok_or(Error::InvalidParameter)?;
        let client = token::Client::new(env, &reward_token);
        set_lock(env, true);
        for holder in holders.iter() {
            let amount = read_reward(env, &holder);
            if amount == 0 {
                continue;
            }
            write_reward(env, &holder, 0);
            let amount_i128 = i128::try_from(amount).map_err(|_| Error::MathOverflow)?;
            match client.try_transfer(&env.current_contract_address(), &holder, &amount_i128) {
                Ok(Ok(())) => {}
                _ => return Err(Error::TransferFailed),
            }
            RewardClaimed {
                account: holder,
                amount,
            }
            .publish(env);
        }
        set_lock(env, false);
        Ok(())
    }
}
