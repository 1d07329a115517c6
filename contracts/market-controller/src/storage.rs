use soroban_sdk::{contracttype, Address, Env, IntoVal, Val, Vec};

use crate::errors::Error;

#[contracttype]
pub enum DataKey {
    Owner,
    PauseGuardian,          // Address (optional)
    PriceOracle,            // Address (optional until set)
    RewardDistributor,      // Address (optional)
    CloseFactor,            // u128 scaled 1e18
    LiquidationIncentive,   // u128 scaled 1e18
    TransferPaused,         // bool
    SeizePaused,            // bool
    Markets,                // Vec<Address>, listing order
    Market(Address),        // MarketConfig
    Ledger(Address),        // AccrualLedger
    Position(Address, Address), // (market, account) -> AccountPosition
    AccountMarkets(Address),    // Vec<Address> entered by account
}

const TTL_THRESHOLD: u32 = 100_000;
const TTL_EXTEND_TO: u32 = 200_000;

/// Risk configuration of one listed market. Keyed by the underlying token.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketConfig {
    pub decimals: u32,
    pub collateral_factor: u128,
    pub borrow_factor: u128,
    pub supply_capacity: u128,
    pub borrow_capacity: u128,
    /// Weight handed to the reward distributor when the market is registered.
    pub distribution_factor: u128,
    pub mint_paused: bool,
    pub redeem_paused: bool,
    pub borrow_paused: bool,
}

/// Interest accounting for one market. The exchange rate is derived from
/// these fields on every read and is never stored.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccrualLedger {
    pub cash: u128,
    pub total_borrows: u128,
    pub total_reserves: u128,
    pub total_supply: u128,
    pub borrow_index: u128,
    pub accrual_block: u32,
    pub reserve_ratio: u128,
    pub flashloan_fee_ratio: u128,
    pub protocol_fee_ratio: u128,
    pub interest_rate_model: Option<Address>,
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccountPosition {
    pub shares: u128,
    pub borrow_principal: u128,
    /// Ledger borrow index at the account's last borrow interaction.
    pub borrow_index: u128,
}

pub fn bump_core_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

fn bump_persistent<K: IntoVal<Env, Val>>(env: &Env, key: &K) {
    let persistent = env.storage().persistent();
    if persistent.has(key) {
        persistent.extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Owner)
}

pub fn read_owner(env: &Env) -> Result<Address, Error> {
    bump_core_ttl(env);
    env.storage()
        .instance()
        .get(&DataKey::Owner)
        .ok_or(Error::NotInitialized)
}

pub fn read_address(env: &Env, key: &DataKey) -> Option<Address> {
    env.storage().instance().get(key)
}

pub fn read_u128(env: &Env, key: &DataKey, default: u128) -> u128 {
    env.storage().instance().get(key).unwrap_or(default)
}

pub fn read_flag(env: &Env, key: &DataKey) -> bool {
    env.storage().instance().get(key).unwrap_or(false)
}

pub fn read_markets(env: &Env) -> Vec<Address> {
    env.storage()
        .instance()
        .get(&DataKey::Markets)
        .unwrap_or(Vec::new(env))
}

pub fn is_listed(env: &Env, market: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Market(market.clone()))
}

pub fn read_market(env: &Env, market: &Address) -> Result<MarketConfig, Error> {
    let key = DataKey::Market(market.clone());
    bump_persistent(env, &key);
    env.storage().persistent().get(&key).ok_or(Error::NotListed)
}

pub fn write_market(env: &Env, market: &Address, config: &MarketConfig) {
    let key = DataKey::Market(market.clone());
    env.storage().persistent().set(&key, config);
    bump_persistent(env, &key);
}

pub fn read_ledger(env: &Env, market: &Address) -> Result<AccrualLedger, Error> {
    let key = DataKey::Ledger(market.clone());
    bump_persistent(env, &key);
    env.storage().persistent().get(&key).ok_or(Error::NotListed)
}

pub fn write_ledger(env: &Env, market: &Address, ledger: &AccrualLedger) {
    let key = DataKey::Ledger(market.clone());
    env.storage().persistent().set(&key, ledger);
    bump_persistent(env, &key);
}

pub fn read_position(env: &Env, market: &Address, account: &Address) -> AccountPosition {
    let key = DataKey::Position(market.clone(), account.clone());
    bump_persistent(env, &key);
    env.storage().persistent().get(&key).unwrap_or_default()
}

pub fn write_position(env: &Env, market: &Address, account: &Address, position: &AccountPosition) {
    let key = DataKey::Position(market.clone(), account.clone());
    if position.shares == 0 && position.borrow_principal == 0 {
        env.storage().persistent().remove(&key);
        return;
    }
    env.storage().persistent().set(&key, position);
    bump_persistent(env, &key);
}

pub fn read_account_markets(env: &Env, account: &Address) -> Vec<Address> {
    let key = DataKey::AccountMarkets(account.clone());
    bump_persistent(env, &key);
    env.storage()
        .persistent()
        .get(&key)
        .unwrap_or(Vec::new(env))
}

pub fn write_account_markets(env: &Env, account: &Address, markets: &Vec<Address>) {
    let key = DataKey::AccountMarkets(account.clone());
    env.storage().persistent().set(&key, markets);
    bump_persistent(env, &key);
}
