use soroban_sdk::{contracttype, Address, Env, IntoVal, Val};

use crate::errors::Error;

#[contracttype]
pub enum DataKey {
    Owner,
    Controller,
    GlobalSpeed,      // u128 reward units per block
    Paused,           // bool, a fresh distributor starts paused
    RewardToken,      // Address (optional)
    DistributionLock, // bool, held while control is handed out
    Factor(Address),  // u128 scaled 1e18; present once the market is registered
    Speed(Address),   // u128 per block, shared by both sides
    SupplyState(Address),
    BorrowState(Address),
    SupplierIndex(Address, Address), // (market, account)
    BorrowerIndex(Address, Address), // (market, account)
    Reward(Address),
}

const TTL_THRESHOLD: u32 = 100_000;
const TTL_EXTEND_TO: u32 = 200_000;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributionState {
    pub index: u128,
    pub block: u32,
}

pub fn bump_core_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

fn bump<K: IntoVal<Env, Val>>(env: &Env, key: &K) {
    let persistent = env.storage().persistent();
    if persistent.has(key) {
        persistent.extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

pub fn read_owner(env: &Env) -> Result<Address, Error> {
    bump_core_ttl(env);
    env.storage()
        .instance()
        .get(&DataKey::Owner)
        .ok_or(Error::NotInitialized)
}

pub fn read_controller(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Controller)
        .ok_or(Error::NotInitialized)
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(true)
}

pub fn write_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
}

pub fn read_global_speed(env: &Env) -> u128 {
    env.storage()
        .instance()
        .get(&DataKey::GlobalSpeed)
        .unwrap_or(0)
}

pub fn write_global_speed(env: &Env, speed: u128) {
    env.storage().instance().set(&DataKey::GlobalSpeed, &speed);
}

pub fn read_reward_token(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::RewardToken)
}

pub fn is_locked(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::DistributionLock)
        .unwrap_or(false)
}

pub fn set_lock(env: &Env, locked: bool) {
    if locked {
        env.storage()
            .instance()
            .set(&DataKey::DistributionLock, &true);
    } else {
        env.storage().instance().remove(&DataKey::DistributionLock);
    }
}

pub fn read_factor(env: &Env, market: &Address) -> Option<u128> {
    let key = DataKey::Factor(market.clone());
    bump(env, &key);
    env.storage().persistent().get(&key)
}

pub fn write_factor(env: &Env, market: &Address, factor: u128) {
    let key = DataKey::Factor(market.clone());
    env.storage().persistent().set(&key, &factor);
    bump(env, &key);
}

pub fn read_speed(env: &Env, market: &Address) -> u128 {
    let key = DataKey::Speed(market.clone());
    bump(env, &key);
    env.storage().persistent().get(&key).unwrap_or(0)
}

pub fn write_speed(env: &Env, market: &Address, speed: u128) {
    let key = DataKey::Speed(market.clone());
    env.storage().persistent().set(&key, &speed);
    bump(env, &key);
}

pub fn state_key(market: &Address, is_borrow: bool) -> DataKey {
    if is_borrow {
        DataKey::BorrowState(market.clone())
    } else {
        DataKey::SupplyState(market.clone())
    }
}

pub fn read_state(env: &Env, market: &Address, is_borrow: bool) -> Option<DistributionState> {
    let key = state_key(market, is_borrow);
    bump(env, &key);
    env.storage().persistent().get(&key)
}

pub fn write_state(env: &Env, market: &Address, is_borrow: bool, state: &DistributionState) {
    let key = state_key(market, is_borrow);
    env.storage().persistent().set(&key, state);
    bump(env, &key);
}

fn account_index_key(market: &Address, account: &Address, is_borrow: bool) -> DataKey {
    if is_borrow {
        DataKey::BorrowerIndex(market.clone(), account.clone())
    } else {
        DataKey::SupplierIndex(market.clone(), account.clone())
    }
}

pub fn read_account_index(env: &Env, market: &Address, account: &Address, is_borrow: bool) -> u128 {
    let key = account_index_key(market, account, is_borrow);
    bump(env, &key);
    env.storage().persistent().get(&key).unwrap_or(0)
}

pub fn write_account_index(
    env: &Env,
    market: &Address,
    account: &Address,
    is_borrow: bool,
    index: u128,
) {
    let key = account_index_key(market, account, is_borrow);
    env.storage().persistent().set(&key, &index);
    bump(env, &key);
}

pub fn read_reward(env: &Env, account: &Address) -> u128 {
    let key = DataKey::Reward(account.clone());
    bump(env, &key);
    env.storage().persistent().get(&key).unwrap_or(0)
}

pub fn write_reward(env: &Env, account: &Address, amount: u128) {
    let key = DataKey::Reward(account.clone());
    if amount == 0 {
        env.storage().persistent().remove(&key);
        return;
    }
    env.storage().persistent().set(&key, &amount);
    bump(env, &key);
}
