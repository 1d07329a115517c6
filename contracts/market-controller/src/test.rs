#![cfg(test)]

use super::*;
use crate::constants::MAX_BORROW_RATE_PER_BLOCK;
use jump_rate_model::{JumpRateModel, JumpRateModelClient};
use mock_price_oracle::{MockPriceOracle, MockPriceOracleClient};
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{contract, contractimpl, contracttype, token, vec, Address, Bytes, Env};

const CF: u128 = BASE / 10 * 9;
const SUPPLIED: u128 = 10_000_000_000;

#[contracttype]
#[derive(Clone)]
enum TestKey {
    Rate,
    Controller,
}

/// Constant per-block borrow rate.
#[contract]
pub struct FixedRateModel;

#[contractimpl]
impl FixedRateModel {
    pub fn configure(env: Env, rate: u128) {
        env.storage().instance().set(&TestKey::Rate, &rate);
    }

    pub fn get_borrow_rate(env: Env, _cash: u128, _borrows: u128, _reserves: u128) -> u128 {
        env.storage().instance().get(&TestKey::Rate).unwrap_or(0)
    }

    pub fn get_supply_rate(
        _env: Env,
        _cash: u128,
        _borrows: u128,
        _reserves: u128,
        _reserve_ratio: u128,
    ) -> u128 {
        0
    }
}

#[contract]
pub struct FlashloanRepayer;

#[contractimpl]
impl FlashloanRepayer {
    pub fn configure(env: Env, controller: Address) {
        env.storage().instance().set(&TestKey::Controller, &controller);
    }

    pub fn on_flashloan(env: Env, market: Address, amount: u128, fee: u128, _data: Bytes) {
        let controller: Address = env.storage().instance().get(&TestKey::Controller).unwrap();
        token::Client::new(&env, &market).transfer(
            &env.current_contract_address(),
            &controller,
            &((amount + fee) as i128),
        );
    }
}

#[contract]
pub struct FlashloanRenegade;

#[contractimpl]
impl FlashloanRenegade {
    pub fn configure(env: Env, controller: Address) {
        env.storage().instance().set(&TestKey::Controller, &controller);
    }

    pub fn on_flashloan(env: Env, market: Address, amount: u128, _fee: u128, _data: Bytes) {
        let controller: Address = env.storage().instance().get(&TestKey::Controller).unwrap();
        token::Client::new(&env, &market).transfer(
            &env.current_contract_address(),
            &controller,
            &(amount as i128),
        );
    }
}

struct Fixture<'a> {
    env: Env,
    owner: Address,
    controller: MarketControllerClient<'a>,
    controller_id: Address,
    oracle: MockPriceOracleClient<'a>,
    oracle_id: Address,
}

fn setup(env: &Env) -> Fixture<'_> {
    env.mock_all_auths();
    let owner = Address::generate(env);

    let oracle_id = env.register(MockPriceOracle, ());
    let oracle = MockPriceOracleClient::new(env, &oracle_id);
    oracle.initialize(&owner);

    let controller_id = env.register(MarketController, ());
    let controller = MarketControllerClient::new(env, &controller_id);
    controller.initialize(&owner);
    controller.set_price_oracle(&oracle_id);

    Fixture {
        env: env.clone(),
        owner,
        controller,
        controller_id,
        oracle,
        oracle_id,
    }
}

fn new_token(env: &Env) -> Address {
    env.register_stellar_asset_contract_v2(Address::generate(env))
        .address()
}

fn list_market(f: &Fixture) -> Address {
    let market = new_token(&f.env);
    f.oracle.set_price(&market, &BASE);
    f.controller
        .add_market(&market, &CF, &BASE, &u128::MAX, &u128::MAX, &BASE);
    market
}

fn fund(f: &Fixture, market: &Address, to: &Address, amount: u128) {
    token::StellarAssetClient::new(&f.env, market).mint(to, &(amount as i128));
}

fn supply(f: &Fixture, market: &Address, account: &Address, amount: u128) {
    fund(f, market, account, amount);
    f.controller.mint(account, market, &amount);
}

fn balance(f: &Fixture, market: &Address, account: &Address) -> i128 {
    token::Client::new(&f.env, market).balance(account)
}

fn advance(env: &Env, blocks: u32) {
    env.ledger().with_mut(|li| li.sequence_number += blocks);
}

fn fixed_rate_model(env: &Env, rate: u128) -> Address {
    let id = env.register(FixedRateModel, ());
    FixedRateModelClient::new(env, &id).configure(&rate);
    id
}

// -------------------------------------------------------------------------
// Registry and risk parameters
// -------------------------------------------------------------------------

#[test]
fn initialize_sets_defaults() {
    let env = Env::default();
    let f = setup(&env);
    assert_eq!(f.controller.get_owner(), f.owner);
    assert_eq!(f.controller.get_close_factor(), BASE / 2);
    assert_eq!(f.controller.get_liquidation_incentive(), BASE / 10 * 11);
    assert_eq!(f.controller.get_price_oracle(), Some(f.oracle_id.clone()));
    assert_eq!(f.controller.get_reward_distributor(), None);
    assert_eq!(
        f.controller.try_initialize(&f.owner),
        Err(Ok(Error::AlreadyInitialized))
    );
}

#[test]
fn add_market_records_ledger_defaults() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);

    assert!(f.controller.has_market(&market));
    assert_eq!(f.controller.get_markets(), vec![&env, market.clone()]);
    let config = f.controller.get_market(&market);
    assert_eq!(config.decimals, 7);
    assert_eq!(config.collateral_factor, CF);
    let ledger = f.controller.get_ledger(&market);
    assert_eq!(ledger.borrow_index, BASE);
    assert_eq!(ledger.accrual_block, env.ledger().sequence());
    assert_eq!(ledger.reserve_ratio, BASE / 1_000 * 75);
    assert_eq!(ledger.flashloan_fee_ratio, BASE / 10_000 * 9);
    assert_eq!(ledger.protocol_fee_ratio, BASE / 10);
    assert_eq!(ledger.interest_rate_model, None);
    assert_eq!(f.controller.exchange_rate_stored(&market), BASE);
}

#[test]
fn add_market_validates_parameters() {
    let env = Env::default();
    let f = setup(&env);
    let market = new_token(&env);
    f.oracle.set_price(&market, &BASE);

    assert_eq!(
        f.controller
            .try_add_market(&market, &(BASE / 100 * 101), &BASE, &0, &0, &BASE),
        Err(Ok(Error::InvalidParameter))
    );
    assert_eq!(
        f.controller.try_add_market(&market, &CF, &0, &0, &0, &BASE),
        Err(Ok(Error::InvalidParameter))
    );
    f.controller
        .add_market(&market, &CF, &BASE, &0, &0, &BASE);
    assert_eq!(
        f.controller.try_add_market(&market, &CF, &BASE, &0, &0, &BASE),
        Err(Ok(Error::AlreadyListed))
    );
    assert_eq!(
        f.controller
            .try_set_collateral_factor(&market, &(BASE / 10_000 * 9_001)),
        Err(Ok(Error::InvalidParameter))
    );
    f.controller.set_collateral_factor(&market, &(BASE / 2));
    assert_eq!(f.controller.get_market(&market).collateral_factor, BASE / 2);
}

#[test]
fn add_market_requires_price_and_token() {
    let env = Env::default();
    let f = setup(&env);

    let unpriced = new_token(&env);
    assert_eq!(
        f.controller
            .try_add_market(&unpriced, &CF, &BASE, &0, &0, &BASE),
        Err(Ok(Error::PriceUnavailable))
    );
    // The oracle contract has no `decimals` entry point.
    assert_eq!(
        f.controller
            .try_add_market(&f.oracle_id, &CF, &BASE, &0, &0, &BASE),
        Err(Ok(Error::NotMarketToken))
    );
    assert!(!f.controller.has_market(&unpriced));
}

#[test]
fn close_factor_and_incentive_bounds() {
    let env = Env::default();
    let f = setup(&env);

    assert_eq!(
        f.controller.try_set_close_factor(&(BASE / 10_000 * 499)),
        Err(Ok(Error::InvalidParameter))
    );
    f.controller.set_close_factor(&(BASE / 100 * 5));
    assert_eq!(
        f.controller.try_set_close_factor(&(BASE / 10_000 * 9_001)),
        Err(Ok(Error::InvalidParameter))
    );
    f.controller.set_close_factor(&(BASE / 10 * 9));
    assert_eq!(f.controller.get_close_factor(), BASE / 10 * 9);

    assert_eq!(
        f.controller
            .try_set_liquidation_incentive(&(BASE / 100 * 99)),
        Err(Ok(Error::InvalidParameter))
    );
    f.controller.set_liquidation_incentive(&BASE);
    assert_eq!(
        f.controller
            .try_set_liquidation_incentive(&(BASE / 10_000 * 15_001)),
        Err(Ok(Error::InvalidParameter))
    );
    f.controller.set_liquidation_incentive(&(BASE / 10 * 15));
    assert_eq!(f.controller.get_liquidation_incentive(), BASE / 10 * 15);
}

#[test]
fn oracle_must_change() {
    let env = Env::default();
    let f = setup(&env);
    assert_eq!(
        f.controller.try_set_price_oracle(&f.oracle_id),
        Err(Ok(Error::InvalidParameter))
    );
}

#[test]
fn unlisted_market_is_rejected() {
    let env = Env::default();
    let f = setup(&env);
    let stranger = new_token(&env);
    let alice = Address::generate(&env);
    fund(&f, &stranger, &alice, 100);

    assert_eq!(
        f.controller.try_mint(&alice, &stranger, &100),
        Err(Ok(Error::NotListed))
    );
    assert_eq!(
        f.controller
            .try_enter_markets(&alice, &vec![&env, stranger.clone()]),
        Err(Ok(Error::NotListed))
    );
    assert_eq!(
        f.controller.try_set_reserve_ratio(&stranger, &BASE),
        Err(Ok(Error::NotListed))
    );
}

// -------------------------------------------------------------------------
// Pause switches
// -------------------------------------------------------------------------

#[test]
fn guardian_can_only_pause() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let guardian = Address::generate(&env);
    let stranger = Address::generate(&env);
    f.controller.set_pause_guardian(&guardian);

    f.controller.set_mint_paused(&guardian, &market, &true);
    assert!(f.controller.is_mint_paused(&market));
    assert_eq!(
        f.controller.try_set_mint_paused(&guardian, &market, &false),
        Err(Ok(Error::OwnerOnlyUnpause))
    );
    assert_eq!(
        f.controller.try_set_borrow_paused(&stranger, &market, &true),
        Err(Ok(Error::AccessDenied))
    );
    f.controller.set_mint_paused(&f.owner, &market, &false);
    assert!(!f.controller.is_mint_paused(&market));

    f.controller.set_transfer_paused(&guardian, &true);
    f.controller.set_seize_paused(&guardian, &true);
    assert_eq!(
        f.controller.try_set_seize_paused(&guardian, &false),
        Err(Ok(Error::OwnerOnlyUnpause))
    );
    f.controller.set_transfer_paused(&f.owner, &false);
    assert!(!f.controller.is_transfer_paused());
    assert!(f.controller.is_seize_paused());
}

#[test]
fn borrow_hook_needs_borrower_signature() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let victim = Address::generate(&env);

    env.set_auths(&[]);
    assert!(f.controller.try_before_borrow(&market, &victim, &0).is_err());
    assert!(f.controller.get_account_markets(&victim).is_empty());
}

#[test]
fn all_paused_blocks_every_hook() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);
    let bob = Address::generate(&env);

    f.controller.set_all_paused(&true);
    assert_eq!(
        f.controller.try_before_mint(&market, &alice, &1),
        Err(Ok(Error::ActionPaused))
    );
    assert_eq!(
        f.controller.try_before_redeem(&market, &alice, &1),
        Err(Ok(Error::ActionPaused))
    );
    assert_eq!(
        f.controller.try_before_borrow(&market, &alice, &1),
        Err(Ok(Error::ActionPaused))
    );
    assert_eq!(
        f.controller.try_before_flashloan(&market, &alice, &1),
        Err(Ok(Error::ActionPaused))
    );
    assert_eq!(
        f.controller.try_before_transfer(&market, &alice, &bob, &1),
        Err(Ok(Error::ActionPaused))
    );
    assert_eq!(
        f.controller
            .try_before_seize(&market, &market, &alice, &bob, &0),
        Err(Ok(Error::ActionPaused))
    );

    f.controller.set_all_paused(&false);
    f.controller.before_seize(&market, &market, &alice, &bob, &0);
    f.controller.before_mint(&market, &alice, &1);
    f.controller.before_repay_borrow(&market, &alice, &bob, &1);
}

// -------------------------------------------------------------------------
// Accrual
// -------------------------------------------------------------------------

#[test]
fn interest_accrues_into_borrows_reserves_and_index() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);

    supply(&f, &market, &alice, SUPPLIED);
    f.controller.borrow(&alice, &market, &1_000_000_000);
    let model = fixed_rate_model(&env, BASE / 10_000);
    f.controller.set_interest_rate_model(&market, &model);
    assert_eq!(f.controller.borrow_rate_per_block(&market), BASE / 10_000);

    advance(&env, 10);
    f.controller.accrue_interest(&market);
    let ledger = f.controller.get_ledger(&market);
    assert_eq!(ledger.total_borrows, 1_001_000_000);
    assert_eq!(ledger.total_reserves, 75_000);
    assert_eq!(ledger.borrow_index, BASE + BASE / 1_000);
    assert_eq!(ledger.accrual_block, env.ledger().sequence());
    assert_eq!(ledger.cash, 9_000_000_000);
    assert_eq!(
        f.controller.borrow_balance_stored(&market, &alice),
        1_001_000_000
    );
    assert_eq!(
        f.controller.exchange_rate_stored(&market),
        1_000_092_500_000_000_000
    );

    // A second accrual in the same block changes nothing.
    f.controller.accrue_interest(&market);
    assert_eq!(f.controller.get_ledger(&market), ledger);
}

#[test]
fn idle_market_keeps_exchange_rate() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);
    let model = fixed_rate_model(&env, BASE / 10_000);
    f.controller.set_interest_rate_model(&market, &model);

    supply(&f, &market, &alice, SUPPLIED);
    advance(&env, 20);
    assert_eq!(f.controller.exchange_rate_current(&market), BASE);
    assert_eq!(f.controller.get_ledger(&market).total_reserves, 0);
}

#[test]
fn excessive_borrow_rate_rejected() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let model = fixed_rate_model(&env, MAX_BORROW_RATE_PER_BLOCK + 1);
    f.controller.set_interest_rate_model(&market, &model);

    advance(&env, 1);
    assert_eq!(
        f.controller.try_accrue_interest(&market),
        Err(Ok(Error::InvalidParameter))
    );
}

#[test]
fn jump_rate_model_drives_accrual() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);

    let model_id = env.register(JumpRateModel, ());
    let model = JumpRateModelClient::new(&env, &model_id);
    model.initialize(
        &(BASE / 50),
        &(BASE / 5),
        &(2 * BASE),
        &(BASE / 10 * 8),
        &f.owner,
    );
    f.controller.set_interest_rate_model(&market, &model_id);

    supply(&f, &market, &alice, SUPPLIED);
    f.controller.borrow(&alice, &market, &5_000_000_000);
    let ledger = f.controller.get_ledger(&market);
    let rate = model.get_borrow_rate(&ledger.cash, &ledger.total_borrows, &ledger.total_reserves);
    assert!(rate > 0);
    assert_eq!(f.controller.borrow_rate_per_block(&market), rate);
    assert_eq!(
        f.controller.supply_rate_per_block(&market),
        model.get_supply_rate(
            &ledger.cash,
            &ledger.total_borrows,
            &ledger.total_reserves,
            &ledger.reserve_ratio
        )
    );

    advance(&env, 1);
    f.controller.accrue_interest(&market);
    assert_eq!(f.controller.get_ledger(&market).borrow_index, BASE + rate);
}

// -------------------------------------------------------------------------
// Supply side
// -------------------------------------------------------------------------

#[test]
fn mint_and_redeem_round_in_the_pools_favor() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);
    let bob = Address::generate(&env);

    supply(&f, &market, &alice, SUPPLIED);
    f.controller.borrow(&alice, &market, &1_000_000_000);
    let model = fixed_rate_model(&env, BASE / 10_000);
    f.controller.set_interest_rate_model(&market, &model);
    advance(&env, 10);

    fund(&f, &market, &bob, 1_000);
    assert_eq!(f.controller.mint(&bob, &market, &1_000), 999);
    assert_eq!(f.controller.redeem_underlying(&bob, &market, &500), 500);
    assert_eq!(f.controller.redeem(&bob, &market, &499), 499);
    assert_eq!(f.controller.get_position(&market, &bob).shares, 0);
    assert_eq!(balance(&f, &market, &bob), 999);
}

#[test]
fn zero_amounts_are_no_ops() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);

    assert_eq!(f.controller.mint(&alice, &market, &0), 0);
    assert_eq!(f.controller.redeem(&alice, &market, &0), 0);
    f.controller.borrow(&alice, &market, &0);
    assert_eq!(f.controller.repay_borrow(&alice, &market, &0), 0);
    assert!(f.controller.get_account_markets(&alice).is_empty());
}

#[test]
fn supply_capacity_gates_mints() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);
    f.controller.set_supply_capacity(&market, &SUPPLIED);

    supply(&f, &market, &alice, SUPPLIED);
    fund(&f, &market, &alice, 1);
    assert_eq!(
        f.controller.try_mint(&alice, &market, &1),
        Err(Ok(Error::CapacityExceeded))
    );
}

#[test]
fn redeem_respects_entered_collateral() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);

    supply(&f, &market, &alice, SUPPLIED);
    f.controller.borrow(&alice, &market, &8_000_000_000);
    assert_eq!(
        f.controller.try_redeem(&alice, &market, &2_000_000_000),
        Err(Ok(Error::InsufficientLiquidity))
    );
    assert_eq!(f.controller.redeem(&alice, &market, &1_000_000_000), 1_000_000_000);
    assert_eq!(f.controller.get_cash(&market), 1_000_000_000);
}

// -------------------------------------------------------------------------
// Borrow side
// -------------------------------------------------------------------------

#[test]
fn borrow_limited_by_collateral_and_enters_market() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);

    supply(&f, &market, &alice, SUPPLIED);
    assert!(f.controller.get_account_markets(&alice).is_empty());
    assert_eq!(
        f.controller.try_borrow(&alice, &market, &9_000_000_001),
        Err(Ok(Error::InsufficientLiquidity))
    );
    f.controller.borrow(&alice, &market, &9_000_000_000);
    assert_eq!(
        f.controller.get_account_markets(&alice),
        vec![&env, market.clone()]
    );
    assert_eq!(f.controller.account_liquidity(&alice), (0, 0));
    assert_eq!(balance(&f, &market, &alice), 9_000_000_000);
}

#[test]
fn borrow_capacity_and_cash_limits() {
    let env = Env::default();
    let f = setup(&env);
    let a = list_market(&f);
    let b = list_market(&f);
    let alice = Address::generate(&env);
    let lender = Address::generate(&env);

    supply(&f, &a, &alice, SUPPLIED);
    f.controller.enter_markets(&alice, &vec![&env, a.clone()]);
    supply(&f, &b, &lender, 1_000_000_000);
    f.controller.set_borrow_capacity(&b, &500_000_000);

    assert_eq!(
        f.controller.try_borrow(&alice, &b, &600_000_000),
        Err(Ok(Error::CapacityExceeded))
    );
    f.controller.set_borrow_capacity(&b, &u128::MAX);
    assert_eq!(
        f.controller.try_borrow(&alice, &b, &1_000_000_001),
        Err(Ok(Error::InsufficientCash))
    );
    f.controller.borrow(&alice, &b, &1_000_000_000);
    assert_eq!(f.controller.get_cash(&b), 0);
}

#[test]
fn hypothetical_liquidity_includes_pending_borrow() {
    let env = Env::default();
    let f = setup(&env);
    let a = list_market(&f);
    let b = list_market(&f);
    let alice = Address::generate(&env);

    supply(&f, &a, &alice, SUPPLIED);
    f.controller.enter_markets(&alice, &vec![&env, a.clone()]);
    assert_eq!(f.controller.account_liquidity(&alice), (9_000_000_000, 0));
    assert_eq!(
        f.controller
            .hypothetical_liquidity(&alice, &b, &0, &10_000_000_000),
        (0, 1_000_000_000)
    );
    assert_eq!(
        f.controller
            .hypothetical_liquidity(&alice, &a, &5_000_000_000, &0),
        (4_500_000_000, 0)
    );
}

#[test]
fn repay_is_capped_at_the_balance() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);
    let bob = Address::generate(&env);

    supply(&f, &market, &alice, SUPPLIED);
    f.controller.borrow(&alice, &market, &1_000_000_000);
    fund(&f, &market, &bob, 300_000_000);
    assert_eq!(
        f.controller
            .repay_borrow_behalf(&bob, &alice, &market, &300_000_000),
        300_000_000
    );
    assert_eq!(
        f.controller.repay_borrow(&alice, &market, &2_000_000_000),
        700_000_000
    );
    assert_eq!(f.controller.borrow_balance_stored(&market, &alice), 0);
    assert_eq!(f.controller.get_ledger(&market).total_borrows, 0);
    assert_eq!(balance(&f, &market, &alice), 300_000_000);
}

#[test]
fn exit_market_guards() {
    let env = Env::default();
    let f = setup(&env);
    let a = list_market(&f);
    let b = list_market(&f);
    let alice = Address::generate(&env);
    let lender = Address::generate(&env);

    supply(&f, &a, &alice, SUPPLIED);
    supply(&f, &b, &lender, SUPPLIED);
    f.controller.borrow(&alice, &a, &1_000_000_000);
    assert_eq!(
        f.controller.try_exit_market(&alice, &a),
        Err(Ok(Error::OutstandingBorrow))
    );
    f.controller.repay_borrow(&alice, &a, &1_000_000_000);

    f.controller.borrow(&alice, &b, &1_000_000_000);
    assert_eq!(
        f.controller.try_exit_market(&alice, &a),
        Err(Ok(Error::InsufficientLiquidity))
    );
    f.controller.repay_borrow(&alice, &b, &1_000_000_000);
    f.controller.exit_market(&alice, &b);
    f.controller.exit_market(&alice, &a);
    assert!(f.controller.get_account_markets(&alice).is_empty());
}

// -------------------------------------------------------------------------
// Liquidation
// -------------------------------------------------------------------------

#[test]
fn liquidation_requires_shortfall_and_respects_close_factor() {
    let env = Env::default();
    let f = setup(&env);
    let collateral = list_market(&f);
    let borrowed = list_market(&f);
    let alice = Address::generate(&env);
    let lender = Address::generate(&env);
    let liquidator = Address::generate(&env);

    supply(&f, &borrowed, &lender, SUPPLIED);
    supply(&f, &collateral, &alice, SUPPLIED);
    f.controller
        .enter_markets(&alice, &vec![&env, collateral.clone()]);
    f.controller.borrow(&alice, &borrowed, &8_000_000_000);
    fund(&f, &borrowed, &liquidator, 1_000_000_000);

    assert_eq!(
        f.controller
            .try_liquidate_borrow(&liquidator, &alice, &borrowed, &collateral, &1_000_000_000),
        Err(Ok(Error::NoShortfall))
    );

    f.oracle.set_price(&collateral, &(BASE / 10 * 8));
    assert_eq!(f.controller.account_liquidity(&alice), (0, 800_000_000));
    assert_eq!(
        f.controller
            .try_liquidate_borrow(&liquidator, &alice, &borrowed, &collateral, &4_000_000_001),
        Err(Ok(Error::RepayTooLarge))
    );
    assert_eq!(
        f.controller
            .try_liquidate_borrow(&alice, &alice, &borrowed, &collateral, &1_000_000_000),
        Err(Ok(Error::InvalidParameter))
    );
    assert_eq!(
        f.controller
            .liquidate_calculate_seize_shares(&borrowed, &collateral, &1_000_000_000),
        1_375_000_000
    );

    let seized = f
        .controller
        .liquidate_borrow(&liquidator, &alice, &borrowed, &collateral, &1_000_000_000);
    assert_eq!(seized, 1_375_000_000);
    assert_eq!(
        f.controller.get_position(&collateral, &alice).shares,
        SUPPLIED - 1_375_000_000
    );
    assert_eq!(
        f.controller.get_position(&collateral, &liquidator).shares,
        1_375_000_000
    );
    assert_eq!(
        f.controller.borrow_balance_stored(&borrowed, &alice),
        7_000_000_000
    );
    assert_eq!(balance(&f, &borrowed, &liquidator), 0);
}

#[test]
fn seize_paused_blocks_liquidation() {
    let env = Env::default();
    let f = setup(&env);
    let collateral = list_market(&f);
    let borrowed = list_market(&f);
    let alice = Address::generate(&env);
    let lender = Address::generate(&env);
    let liquidator = Address::generate(&env);

    supply(&f, &borrowed, &lender, SUPPLIED);
    supply(&f, &collateral, &alice, SUPPLIED);
    f.controller
        .enter_markets(&alice, &vec![&env, collateral.clone()]);
    f.controller.borrow(&alice, &borrowed, &8_000_000_000);
    fund(&f, &borrowed, &liquidator, 1_000_000_000);
    f.oracle.set_price(&collateral, &(BASE / 10 * 8));

    f.controller.set_seize_paused(&f.owner, &true);
    assert_eq!(
        f.controller
            .try_liquidate_borrow(&liquidator, &alice, &borrowed, &collateral, &1_000_000_000),
        Err(Ok(Error::ActionPaused))
    );
    assert_eq!(
        f.controller.borrow_balance_stored(&borrowed, &alice),
        8_000_000_000
    );
}

#[test]
fn seize_pairs_any_two_listed_markets() {
    let env = Env::default();
    let f = setup(&env);
    let collateral = list_market(&f);
    let borrowed = list_market(&f);
    let unlisted = new_token(&env);
    let alice = Address::generate(&env);
    let liquidator = Address::generate(&env);

    assert_eq!(
        f.controller
            .try_before_seize(&collateral, &unlisted, &liquidator, &alice, &0),
        Err(Ok(Error::NotListed))
    );
    assert_eq!(
        f.controller
            .try_before_seize(&unlisted, &borrowed, &liquidator, &alice, &0),
        Err(Ok(Error::NotListed))
    );
    f.controller
        .before_seize(&collateral, &borrowed, &liquidator, &alice, &0);
}

// -------------------------------------------------------------------------
// Transfers and flashloans
// -------------------------------------------------------------------------

#[test]
fn transfer_checks_sender_liquidity() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);
    let bob = Address::generate(&env);

    supply(&f, &market, &alice, SUPPLIED);
    f.controller.borrow(&alice, &market, &8_000_000_000);
    assert_eq!(
        f.controller.try_transfer(&alice, &alice, &market, &1),
        Err(Ok(Error::InvalidParameter))
    );
    assert_eq!(
        f.controller
            .try_transfer(&alice, &bob, &market, &2_000_000_000),
        Err(Ok(Error::InsufficientLiquidity))
    );
    f.controller.transfer(&alice, &bob, &market, &1_000_000_000);
    assert_eq!(f.controller.get_position(&market, &bob).shares, 1_000_000_000);
    assert_eq!(
        f.controller
            .try_transfer(&bob, &alice, &market, &1_000_000_001),
        Err(Ok(Error::InsufficientBalance))
    );

    f.controller.set_transfer_paused(&f.owner, &true);
    assert_eq!(
        f.controller.try_transfer(&bob, &alice, &market, &1),
        Err(Ok(Error::ActionPaused))
    );
}

#[test]
fn flashloan_collects_fee_and_protocol_share() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let lender = Address::generate(&env);
    supply(&f, &market, &lender, SUPPLIED);

    let receiver = env.register(FlashloanRepayer, ());
    FlashloanRepayerClient::new(&env, &receiver).configure(&f.controller_id);
    fund(&f, &market, &receiver, 900_000);

    f.controller
        .flashloan(&receiver, &market, &1_000_000_000, &Bytes::new(&env));
    let ledger = f.controller.get_ledger(&market);
    assert_eq!(ledger.cash, SUPPLIED + 900_000);
    assert_eq!(ledger.total_reserves, 90_000);
    assert_eq!(balance(&f, &market, &receiver), 0);
    assert_eq!(balance(&f, &market, &f.controller_id), (SUPPLIED + 900_000) as i128);
}

#[test]
fn flashloan_must_be_repaid_with_fee() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let lender = Address::generate(&env);
    supply(&f, &market, &lender, SUPPLIED);

    let receiver = env.register(FlashloanRenegade, ());
    FlashloanRenegadeClient::new(&env, &receiver).configure(&f.controller_id);
    fund(&f, &market, &receiver, 900_000);

    assert_eq!(
        f.controller
            .try_flashloan(&receiver, &market, &1_000_000_000, &Bytes::new(&env)),
        Err(Ok(Error::FlashloanNotRepaid))
    );
    assert_eq!(
        f.controller
            .try_flashloan(&receiver, &market, &(SUPPLIED + 1), &Bytes::new(&env)),
        Err(Ok(Error::InsufficientCash))
    );
    assert_eq!(f.controller.get_cash(&market), SUPPLIED);
    assert_eq!(balance(&f, &market, &receiver), 900_000);
}

// -------------------------------------------------------------------------
// Reserves and ratios
// -------------------------------------------------------------------------

#[test]
fn ratio_setters_validate_range() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);

    assert_eq!(
        f.controller.try_set_reserve_ratio(&market, &0),
        Err(Ok(Error::InvalidParameter))
    );
    assert_eq!(
        f.controller.try_set_flashloan_fee_ratio(&market, &(BASE + 1)),
        Err(Ok(Error::InvalidParameter))
    );
    f.controller.set_reserve_ratio(&market, &(BASE / 5));
    f.controller.set_flashloan_fee_ratio(&market, &(BASE / 100));
    f.controller.set_protocol_fee_ratio(&market, &BASE);
    let ledger = f.controller.get_ledger(&market);
    assert_eq!(ledger.reserve_ratio, BASE / 5);
    assert_eq!(ledger.flashloan_fee_ratio, BASE / 100);
    assert_eq!(ledger.protocol_fee_ratio, BASE);
}

#[test]
fn reduce_reserves_pays_out_accrued_reserves() {
    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);
    let alice = Address::generate(&env);
    let treasury = Address::generate(&env);

    supply(&f, &market, &alice, SUPPLIED);
    f.controller.borrow(&alice, &market, &1_000_000_000);
    let model = fixed_rate_model(&env, BASE / 10_000);
    f.controller.set_interest_rate_model(&market, &model);
    advance(&env, 10);

    assert_eq!(
        f.controller.try_reduce_reserves(&market, &75_001, &treasury),
        Err(Ok(Error::InvalidParameter))
    );
    f.controller.reduce_reserves(&market, &75_000, &treasury);
    assert_eq!(balance(&f, &market, &treasury), 75_000);
    let ledger = f.controller.get_ledger(&market);
    assert_eq!(ledger.total_reserves, 0);
    assert_eq!(ledger.cash, 9_000_000_000 - 75_000);
}

// -------------------------------------------------------------------------
// Reward distributor wiring
// -------------------------------------------------------------------------

#[test]
fn distributor_registers_existing_markets() {
    use reward_distributor::{RewardDistributor, RewardDistributorClient};

    let env = Env::default();
    let f = setup(&env);
    let market = list_market(&f);

    let distributor_id = env.register(RewardDistributor, ());
    let distributor = RewardDistributorClient::new(&env, &distributor_id);
    distributor.initialize(&f.owner, &f.controller_id);
    f.controller.set_reward_distributor(&distributor_id);
    assert_eq!(f.controller.get_reward_distributor(), Some(distributor_id.clone()));
    assert_eq!(distributor.distribution_factor(&market), BASE);
    assert_eq!(
        f.controller.try_set_reward_distributor(&distributor_id),
        Err(Ok(Error::InvalidParameter))
    );

    let later = new_token(&env);
    f.oracle.set_price(&later, &BASE);
    f.controller
        .add_market(&later, &CF, &BASE, &u128::MAX, &u128::MAX, &(2 * BASE));
    assert_eq!(distributor.distribution_factor(&later), 2 * BASE);
}

#[test]
fn late_distributor_receives_listing_factor() {
    use reward_distributor::{RewardDistributor, RewardDistributorClient};

    let env = Env::default();
    let f = setup(&env);
    let market = new_token(&env);
    f.oracle.set_price(&market, &BASE);
    f.controller
        .add_market(&market, &CF, &BASE, &u128::MAX, &u128::MAX, &(2 * BASE));
    assert_eq!(f.controller.get_market(&market).distribution_factor, 2 * BASE);

    let distributor_id = env.register(RewardDistributor, ());
    let distributor = RewardDistributorClient::new(&env, &distributor_id);
    distributor.initialize(&f.owner, &f.controller_id);
    f.controller.set_reward_distributor(&distributor_id);
    assert_eq!(distributor.distribution_factor(&market), 2 * BASE);
}
