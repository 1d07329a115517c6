#![no_std]

mod accrual;
mod clients;
mod constants;
mod contract;
mod errors;
mod events;
mod helpers;
mod hooks;
mod risk;
mod storage;

pub use crate::clients::{AccountUnits, DistributionHint};
pub use crate::constants::BASE;
pub use crate::contract::{MarketController, MarketControllerClient};
pub use crate::errors::Error;
pub use crate::storage::{AccountPosition, AccrualLedger, MarketConfig};

mod test;
