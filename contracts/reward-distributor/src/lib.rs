#![no_std]

mod clients;
mod contract;
mod distribution;
mod errors;
mod events;
mod storage;

pub use crate::clients::{AccountUnits, DistributionHint};
pub use crate::contract::{RewardDistributor, RewardDistributorClient};
pub use crate::errors::Error;
pub use crate::storage::DistributionState;
