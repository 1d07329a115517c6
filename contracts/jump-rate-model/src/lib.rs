#![no_std]
use soroban_sdk::{contract, contractevent, contractimpl, contracttype, Address, Env};

/// Rates, utilization and the kink are 1e18 mantissas.
pub const BASE: u128 = 1_000_000_000_000_000_000u128;
/// Ledgers per year at a ~5s close time.
pub const BLOCKS_PER_YEAR: u128 = 6_307_200u128;
const MAX_YEARLY_MULTIPLIER: u128 = 10 * BASE; // 1000% APR
const TTL_THRESHOLD: u32 = 100_000;
const TTL_EXTEND_TO: u32 = 200_000;

#[contracttype]
pub enum DataKey {
    BaseRatePerBlock,       // u128 scaled 1e18
    MultiplierPerBlock,     // u128 scaled 1e18
    JumpMultiplierPerBlock, // u128 scaled 1e18
    Kink,                   // u128 scaled 1e18
    Admin,                  // Address
}

#[contract]
pub struct JumpRateModel;

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewInterestParams {
    pub base_rate_per_block: u128,
    pub multiplier_per_block: u128,
    pub jump_multiplier_per_block: u128,
    pub kink: u128,
}

#[contractimpl]
impl JumpRateModel {
    /// Yearly parameters are converted to per-block rates once, here.
    pub fn initialize(
        env: Env,
        base_per_year: u128,
        multiplier_per_year: u128,
        jump_multiplier_per_year: u128,
        kink: u128,
        admin: Address,
    ) {
        if env
            .storage()
            .persistent()
            .get::<_, Address>(&DataKey::Admin)
            .is_some()
        {
            panic!("already initialized");
        }
        admin.require_auth();
        env.storage().persistent().set(&DataKey::Admin, &admin);
        write_params(
            &env,
            base_per_year,
            multiplier_per_year,
            jump_multiplier_per_year,
            kink,
        );
    }

    pub fn update_jump_rate_model(
        env: Env,
        base_per_year: u128,
        multiplier_per_year: u128,
        jump_multiplier_per_year: u128,
        kink: u128,
    ) {
        require_admin(&env);
        write_params(
            &env,
            base_per_year,
            multiplier_per_year,
            jump_multiplier_per_year,
            kink,
        );
    }

    /// Per-block borrow rate for the given pool state.
    pub fn get_borrow_rate(env: Env, cash: u128, borrows: u128, reserves: u128) -> u128 {
        ensure_initialized(&env);
        bump_ttl(&env);
        let util = Self::utilization_rate(cash, borrows, reserves);
        let base = read(&env, DataKey::BaseRatePerBlock);
        let mult = read(&env, DataKey::MultiplierPerBlock);
        let jump = read(&env, DataKey::JumpMultiplierPerBlock);
        let kink = read(&env, DataKey::Kink);
        if util <= kink {
            base.saturating_add(util.saturating_mul(mult) / BASE)
        } else {
            let normal = base.saturating_add(kink.saturating_mul(mult) / BASE);
            let excess = util - kink;
            normal.saturating_add(excess.saturating_mul(jump) / BASE)
        }
    }

    /// Per-block rate earned by suppliers once `reserve_ratio` is carved out.
    pub fn get_supply_rate(
        env: Env,
        cash: u128,
        borrows: u128,
        reserves: u128,
        reserve_ratio: u128,
    ) -> u128 {
        let one_minus_rr = BASE.saturating_sub(reserve_ratio);
        let borrow_rate = Self::get_borrow_rate(env.clone(), cash, borrows, reserves);
        let rate_to_pool = borrow_rate.saturating_mul(one_minus_rr) / BASE;
        let util = Self::utilization_rate(cash, borrows, reserves);
        util.saturating_mul(rate_to_pool) / BASE
    }

    pub fn utilization_rate(cash: u128, borrows: u128, reserves: u128) -> u128 {
        if borrows == 0 {
            return 0;
        }
        let denom = cash.saturating_add(borrows).saturating_sub(reserves);
        if denom == 0 {
            return 0;
        }
        borrows.saturating_mul(BASE) / denom
    }

    pub fn get_admin(env: Env) -> Address {
        env.storage()
            .persistent()
            .get(&DataKey::Admin)
            .expect("model not initialized")
    }
}

fn write_params(env: &Env, base: u128, multiplier: u128, jump: u128, kink: u128) {
    if kink > BASE {
        panic!("invalid kink");
    }
    if multiplier > MAX_YEARLY_MULTIPLIER || jump > MAX_YEARLY_MULTIPLIER {
        panic!("invalid rate params");
    }
    let base_per_block = base / BLOCKS_PER_YEAR;
    let multiplier_per_block = multiplier / BLOCKS_PER_YEAR;
    let jump_per_block = jump / BLOCKS_PER_YEAR;
    let persistent = env.storage().persistent();
    persistent.set(&DataKey::BaseRatePerBlock, &base_per_block);
    persistent.set(&DataKey::MultiplierPerBlock, &multiplier_per_block);
    persistent.set(&DataKey::JumpMultiplierPerBlock, &jump_per_block);
    persistent.set(&DataKey::Kink, &kink);
    bump_ttl(env);
    NewInterestParams {
        base_rate_per_block: base_per_block,
        multiplier_per_block,
        jump_multiplier_per_block: jump_per_block,
        kink,
    }
    .publish(env);
}

fn read(env: &Env, key: DataKey) -> u128 {
    env.storage().persistent().get(&key).unwrap_or(0u128)
}

fn ensure_initialized(env: &Env) {
    if !env.storage().persistent().has(&DataKey::Admin) {
        panic!("model not initialized");
    }
}

fn require_admin(env: &Env) {
    let stored: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Admin)
        .expect("admin not set");
    bump_ttl(env);
    stored.require_auth();
}

fn bump_ttl(env: &Env) {
    let persistent = env.storage().persistent();
    for key in [
        DataKey::Admin,
        DataKey::BaseRatePerBlock,
        DataKey::MultiplierPerBlock,
        DataKey::JumpMultiplierPerBlock,
        DataKey::Kink,
    ] {
        if persistent.has(&key) {
            persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::testutils::Address as _;

    fn setup(env: &Env) -> JumpRateModelClient<'_> {
        env.mock_all_auths();
        let admin = Address::generate(env);
        let id = env.register(JumpRateModel, ());
        let client = JumpRateModelClient::new(env, &id);
        // base 0, 8% below the kink, 100% above it, kink at 75% utilization
        client.initialize(&0u128, &(BASE / 100 * 8), &BASE, &(BASE / 100 * 75), &admin);
        client
    }

    #[test]
    fn model_rates() {
        let env = Env::default();
        let client = setup(&env);
        let br_low = client.get_borrow_rate(&1_000u128, &100u128, &0u128);
        let br_high = client.get_borrow_rate(&10u128, &1_000u128, &0u128);
        assert!(br_high > br_low);
        let sr = client.get_supply_rate(&1_000u128, &500u128, &0u128, &(BASE / 10));
        assert!(sr > 0);
        assert!(sr < client.get_borrow_rate(&1_000u128, &500u128, &0u128));
    }

    #[test]
    fn rate_is_per_block() {
        let env = Env::default();
        let client = setup(&env);
        // 50% utilization: 0.5 * 8% / year
        let rate = client.get_borrow_rate(&500u128, &500u128, &0u128);
        let multiplier_per_block = (BASE / 100 * 8) / BLOCKS_PER_YEAR;
        assert_eq!(rate, (BASE / 2) * multiplier_per_block / BASE);
    }

    #[test]
    fn jump_applies_above_kink() {
        let env = Env::default();
        let client = setup(&env);
        let kink = BASE / 100 * 75;
        let mult = (BASE / 100 * 8) / BLOCKS_PER_YEAR;
        let jump = BASE / BLOCKS_PER_YEAR;
        // 90% utilization
        let rate = client.get_borrow_rate(&100u128, &900u128, &0u128);
        let util = BASE / 100 * 90;
        let expected = kink * mult / BASE + (util - kink) * jump / BASE;
        assert_eq!(rate, expected);
    }

    #[test]
    fn no_borrows_means_no_utilization() {
        assert_eq!(JumpRateModel::utilization_rate(1_000, 0, 0), 0);
        assert_eq!(JumpRateModel::utilization_rate(0, 10, 10), 0);
        assert_eq!(JumpRateModel::utilization_rate(0, 10, 0), BASE);
    }

    #[test]
    #[should_panic(expected = "invalid kink")]
    fn kink_above_one_rejected() {
        let env = Env::default();
        env.mock_all_auths();
        let admin = Address::generate(&env);
        let id = env.register(JumpRateModel, ());
        let client = JumpRateModelClient::new(&env, &id);
        client.initialize(&0u128, &0u128, &0u128, &(BASE + 1), &admin);
    }

    #[test]
    #[should_panic(expected = "already initialized")]
    fn initialize_once() {
        let env = Env::default();
        let client = setup(&env);
        client.initialize(&0u128, &0u128, &0u128, &0u128, &client.get_admin());
    }

    #[test]
    fn admin_updates_params() {
        let env = Env::default();
        let client = setup(&env);
        client.update_jump_rate_model(&(BASE / 100 * 2), &0u128, &0u128, &BASE);
        assert_eq!(
            client.get_borrow_rate(&1_000u128, &0u128, &0u128),
            (BASE / 100 * 2) / BLOCKS_PER_YEAR
        );
    }
}
