use soroban_sdk::{contracttype, Address, Env, Vec};

#[soroban_sdk::contractclient(name = "ControllerClient")]
pub trait Controller {
    fn get_markets(env: Env) -> Vec<Address>;
    fn has_market(env: Env, market: Address) -> bool;
    fn get_price_oracle(env: Env) -> Option<Address>;
    /// `(total_supply, total_borrows)`.
    fn reward_totals(env: Env, market: Address) -> (u128, u128);
    /// `(shares, borrow_units)`.
    fn reward_units(env: Env, market: Address, account: Address) -> (u128, u128);
}

#[soroban_sdk::contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    fn get_underlying_price(env: Env, market: Address) -> u128;
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountUnits {
    pub account: Address,
    pub units: u128,
}

/// Pushed by the controller from inside its before-action hooks.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributionHint {
    pub market: Address,
    pub is_borrow: bool,
    pub total_units: u128,
    pub accounts: Vec<AccountUnits>,
}
