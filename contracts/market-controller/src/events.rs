use soroban_sdk::{contractevent, Address};

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketAdded {
    #[topic]
    pub market: Address,
    pub collateral_factor: u128,
    pub borrow_factor: u128,
    pub supply_capacity: u128,
    pub borrow_capacity: u128,
    pub distribution_factor: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewCollateralFactor {
    #[topic]
    pub market: Address,
    pub old_collateral_factor: u128,
    pub new_collateral_factor: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewBorrowFactor {
    #[topic]
    pub market: Address,
    pub old_borrow_factor: u128,
    pub new_borrow_factor: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewSupplyCapacity {
    #[topic]
    pub market: Address,
    pub old_supply_capacity: u128,
    pub new_supply_capacity: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewBorrowCapacity {
    #[topic]
    pub market: Address,
    pub old_borrow_capacity: u128,
    pub new_borrow_capacity: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewCloseFactor {
    pub old_close_factor: u128,
    pub new_close_factor: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewLiquidationIncentive {
    pub old_liquidation_incentive: u128,
    pub new_liquidation_incentive: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewPriceOracle {
    #[topic]
    pub oracle: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewRewardDistributor {
    #[topic]
    pub distributor: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewPauseGuardian {
    #[topic]
    pub guardian: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OwnerUpdated {
    #[topic]
    pub owner: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintPaused {
    #[topic]
    pub market: Address,
    pub paused: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RedeemPaused {
    #[topic]
    pub market: Address,
    pub paused: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BorrowPaused {
    #[topic]
    pub market: Address,
    pub paused: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransferPaused {
    pub paused: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SeizePaused {
    pub paused: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketEntered {
    #[topic]
    pub market: Address,
    #[topic]
    pub account: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketExited {
    #[topic]
    pub market: Address,
    #[topic]
    pub account: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewInterestRateModel {
    #[topic]
    pub market: Address,
    pub model: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewReserveRatio {
    #[topic]
    pub market: Address,
    pub old_reserve_ratio: u128,
    pub new_reserve_ratio: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewFlashloanFeeRatio {
    #[topic]
    pub market: Address,
    pub old_flashloan_fee_ratio: u128,
    pub new_flashloan_fee_ratio: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewProtocolFeeRatio {
    #[topic]
    pub market: Address,
    pub old_protocol_fee_ratio: u128,
    pub new_protocol_fee_ratio: u128,
}

/// Emitted whenever a market's ledger is advanced to a new block.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccrueInterest {
    #[topic]
    pub market: Address,
    pub cash: u128,
    pub interest_accumulated: u128,
    pub borrow_index: u128,
    pub total_borrows: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReservesReduced {
    #[topic]
    pub market: Address,
    pub recipient: Address,
    pub amount: u128,
    pub total_reserves: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mint {
    #[topic]
    pub market: Address,
    #[topic]
    pub minter: Address,
    pub mint_amount: u128,
    pub mint_shares: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Redeem {
    #[topic]
    pub market: Address,
    #[topic]
    pub redeemer: Address,
    pub redeem_amount: u128,
    pub redeem_shares: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Borrow {
    #[topic]
    pub market: Address,
    #[topic]
    pub borrower: Address,
    pub borrow_amount: u128,
    pub account_borrows: u128,
    pub total_borrows: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RepayBorrow {
    #[topic]
    pub market: Address,
    #[topic]
    pub borrower: Address,
    pub payer: Address,
    pub repay_amount: u128,
    pub account_borrows: u128,
    pub total_borrows: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiquidateBorrow {
    #[topic]
    pub borrower: Address,
    #[topic]
    pub liquidator: Address,
    pub borrowed_market: Address,
    pub collateral_market: Address,
    pub repay_amount: u128,
    pub seize_shares: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
    #[topic]
    pub market: Address,
    #[topic]
    pub from: Address,
    #[topic]
    pub to: Address,
    pub shares: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Flashloan {
    #[topic]
    pub market: Address,
    #[topic]
    pub receiver: Address,
    pub amount: u128,
    pub fee: u128,
    pub protocol_fee: u128,
}
