#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env, Vec};

#[contracttype]
enum DataKey {
    Admin,
    Price(Address),
    Paused,
}

/// Settable price feed keyed by market. Prices are 1e18 mantissas already
/// adjusted for the underlying's decimals; 0 means unavailable.
#[contract]
pub struct MockPriceOracle;

#[contractimpl]
impl MockPriceOracle {
    pub fn initialize(env: Env, admin: Address) {
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
    }

    pub fn set_price(env: Env, market: Address, price: u128) {
        require_admin(&env);
        env.storage()
            .persistent()
            .set(&DataKey::Price(market), &price);
    }

    pub fn set_prices(env: Env, markets: Vec<Address>, prices: Vec<u128>) {
        require_admin(&env);
        if markets.len() != prices.len() {
            panic!("length mismatch");
        }
        for (market, price) in markets.iter().zip(prices.iter()) {
            env.storage()
                .persistent()
                .set(&DataKey::Price(market), &price);
        }
    }

    pub fn set_paused(env: Env, paused: bool) {
        require_admin(&env);
        env.storage().instance().set(&DataKey::Paused, &paused);
    }

    pub fn get_underlying_price(env: Env, market: Address) -> u128 {
        if env
            .storage()
            .instance()
            .get::<_, bool>(&DataKey::Paused)
            .unwrap_or(false)
        {
            return 0;
        }
        env.storage()
            .persistent()
            .get(&DataKey::Price(market))
            .unwrap_or(0u128)
    }
}

fn require_admin(env: &Env) {
    let admin: Address = env
        .storage()
        .instance()
        .get(&DataKey::Admin)
        .expect("admin not set");
    admin.require_auth();
}
