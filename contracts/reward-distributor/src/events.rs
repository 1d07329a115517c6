use soroban_sdk::{contractevent, Address};

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewRecipient {
    #[topic]
    pub market: Address,
    pub distribution_factor: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributionSpeedUpdated {
    #[topic]
    pub market: Address,
    pub speed: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GlobalSpeedUpdated {
    pub speed: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewDistributionFactor {
    #[topic]
    pub market: Address,
    pub old_distribution_factor: u128,
    pub new_distribution_factor: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewRewardToken {
    #[topic]
    pub token: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Paused {
    pub paused: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardDistributed {
    #[topic]
    pub market: Address,
    #[topic]
    pub account: Address,
    pub is_borrow: bool,
    pub amount: u128,
    pub index: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardClaimed {
    #[topic]
    pub account: Address,
    pub amount: u128,
}
