pub use fixed_point::BASE;

pub const MAX_COLLATERAL_FACTOR: u128 = BASE / 10 * 9;
pub const MAX_BORROW_FACTOR: u128 = BASE;
pub const MIN_CLOSE_FACTOR: u128 = BASE / 100 * 5;
pub const MAX_CLOSE_FACTOR: u128 = BASE / 10 * 9;
pub const MIN_LIQUIDATION_INCENTIVE: u128 = BASE;
pub const MAX_LIQUIDATION_INCENTIVE: u128 = BASE / 10 * 15;

pub const DEFAULT_CLOSE_FACTOR: u128 = BASE / 2;
pub const DEFAULT_LIQUIDATION_INCENTIVE: u128 = BASE / 10 * 11;
pub const DEFAULT_RESERVE_RATIO: u128 = BASE / 1_000 * 75; // 7.5%
pub const DEFAULT_FLASHLOAN_FEE_RATIO: u128 = BASE / 10_000 * 9; // 0.09%
pub const DEFAULT_PROTOCOL_FEE_RATIO: u128 = BASE / 10; // 10% of flashloan fees

pub const MAX_BORROW_RATE_PER_BLOCK: u128 = BASE / 1_000; // 0.1% per ledger
