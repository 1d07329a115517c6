use soroban_sdk::{token, Address, Env, InvokeError, Symbol, Val, Vec};

use crate::errors::Error;

pub fn to_i128(amount: u128) -> Result<i128, Error> {
    i128::try_from(amount).map_err(|_| Error::MathOverflow)
}

pub fn checked<T>(value: Option<T>) -> Result<T, Error> {
    value.ok_or(Error::MathOverflow)
}

/// Fungible-token capability probe. Any failure or trap in the callee
/// counts as "not a market token".
pub fn probe_market_token(env: &Env, market: &Address) -> Option<u32> {
    let args: Vec<Val> = Vec::new(env);
    match env.try_invoke_contract::<u32, InvokeError>(market, &Symbol::new(env, "decimals"), args) {
        Ok(Ok(decimals)) => Some(decimals),
        _ => None,
    }
}

pub fn pull_underlying(env: &Env, market: &Address, from: &Address, amount: u128) -> Result<(), Error> {
    let amount = to_i128(amount)?;
    token::Client::new(env, market).transfer(from, &env.current_contract_address(), &amount);
    Ok(())
}

pub fn push_underlying(env: &Env, market: &Address, to: &Address, amount: u128) -> Result<(), Error> {
    let amount = to_i128(amount)?;
    token::Client::new(env, market).transfer(&env.current_contract_address(), to, &amount);
    Ok(())
}

pub fn underlying_balance(env: &Env, market: &Address) -> u128 {
    let balance = token::Client::new(env, market).balance(&env.current_contract_address());
    u128::try_from(balance).unwrap_or(0)
}
