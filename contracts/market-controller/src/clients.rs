use soroban_sdk::{contracttype, Address, Bytes, Env, Vec};

#[soroban_sdk::contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    /// 1e18 mantissa scaled for the underlying's decimals; 0 when unavailable.
    fn get_underlying_price(env: Env, market: Address) -> u128;
}

#[soroban_sdk::contractclient(name = "InterestRateModelClient")]
pub trait InterestRateModel {
    fn get_borrow_rate(env: Env, cash: u128, borrows: u128, reserves: u128) -> u128;
    fn get_supply_rate(
        env: Env,
        cash: u128,
        borrows: u128,
        reserves: u128,
        reserve_ratio: u128,
    ) -> u128;
}

#[soroban_sdk::contractclient(name = "RewardDistributorClient")]
pub trait RewardDistributor {
    fn add_recipient(env: Env, market: Address, distribution_factor: u128);
    fn on_market_action(env: Env, hint: DistributionHint);
}

#[soroban_sdk::contractclient(name = "FlashloanReceiverClient")]
pub trait FlashloanReceiver {
    fn on_flashloan(env: Env, market: Address, amount: u128, fee: u128, data: Bytes);
}

/// Units an account holds on one side of a market right before an action.
#[contracttype(export = false)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountUnits {
    pub account: Address,
    pub units: u128,
}

/// Everything the distributor needs to checkpoint one market side and
/// settle the acting accounts without reading back from the controller.
#[contracttype(export = false)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributionHint {
    pub market: Address,
    pub is_borrow: bool,
    pub total_units: u128,
    pub accounts: Vec<AccountUnits>,
}
