//! Bonded proof-of-stake accounting.
//!
//! The [Keeper] owns every staking record in the store: validators and their
//! power ranking, delegations, unbonding delegations and redelegations with
//! their maturity queues, the token [Pool], and the [Params]. All mutating
//! operations run inside [Context::transact], so a failed call leaves the
//! store untouched.

use log::debug;

use crate::coins::{Address, BankKeeper};
use crate::context::Context;
use crate::encoding::{Decode, Encode};
use crate::store::{Read, Store, Write};
use crate::{Error, Result};

mod delegate;
mod delegation;
pub mod genesis;
mod hooks;
pub mod keys;
mod params;
mod pool;
pub mod query;
mod queue;
mod slash;
mod validator;
mod validator_set;

pub use delegation::*;
pub use genesis::GenesisState;
pub use hooks::StakingHooks;
pub use params::*;
pub use pool::Pool;
pub use validator::*;
pub use validator_set::ValidatorUpdate;


use keys::*;

/// Store prefix the keeper uses when none is given.
pub const DEFAULT_PREFIX: &[u8] = b"staking/";

pub struct Keeper {
    prefix: Vec<u8>,
    bank: Box<dyn BankKeeper>,
    hooks: Option<Box<dyn StakingHooks>>,
}

impl Keeper {
    pub fn new(bank: Box<dyn BankKeeper>) -> Self {
        Self::with_prefix(DEFAULT_PREFIX.to_vec(), bank)
    }

    pub fn with_prefix(prefix: Vec<u8>, bank: Box<dyn BankKeeper>) -> Self {
        Keeper {
            prefix,
            bank,
            hooks: None,
        }
    }

    /// Registers the lifecycle observer. Only one may be registered.
    pub fn with_hooks(mut self, hooks: Box<dyn StakingHooks>) -> Self {
        if self.hooks.is_some() {
            panic!("Cannot set staking hooks twice");
        }
        self.hooks = Some(hooks);
        self
    }

    fn store(&self, ctx: &Context) -> Store {
        ctx.store.sub(&self.prefix)
    }

    fn call_hooks<F>(&mut self, ctx: &mut Context, op: F) -> Result<()>
    where
        F: FnOnce(&mut dyn StakingHooks, &mut Context) -> Result<()>,
    {
        match self.hooks.as_mut() {
            Some(hooks) => op(hooks.as_mut(), ctx),
            None => Ok(()),
        }
    }

    // Params & pool

    pub fn params(&self, ctx: &Context) -> Result<Params> {
        Ok(load(&self.store(ctx), &params_key())?.unwrap_or_default())
    }

    pub fn set_params(&mut self, ctx: &mut Context, params: Params) -> Result<()> {
        params.validate()?;
        save(&mut self.store(ctx), params_key(), &params)
    }

    /// Panics if the pool record is missing; it is written at genesis.
    pub fn pool(&self, ctx: &Context) -> Result<Pool> {
        match load(&self.store(ctx), &pool_key())? {
            Some(pool) => Ok(pool),
            None => panic!("Stored pool should not have been nil"),
        }
    }

    pub fn set_pool(&mut self, ctx: &mut Context, pool: Pool) -> Result<()> {
        save(&mut self.store(ctx), pool_key(), &pool)
    }

    fn update_pool<F: FnOnce(&mut Pool)>(&mut self, ctx: &mut Context, op: F) -> Result<()> {
        let mut pool = self.pool(ctx)?;
        op(&mut pool);
        self.set_pool(ctx, pool)
    }

    pub fn last_total_power(&self, ctx: &Context) -> Result<u64> {
        Ok(load(&self.store(ctx), &last_total_power_key())?.unwrap_or_default())
    }

    fn set_last_total_power(&mut self, ctx: &mut Context, power: u64) -> Result<()> {
        save(&mut self.store(ctx), last_total_power_key(), &power)
    }

    pub fn intra_tx_counter(&self, ctx: &Context) -> Result<i16> {
        Ok(load(&self.store(ctx), &intra_tx_counter_key())?.unwrap_or_default())
    }

    /// Returns the counter for the next validator created in this block.
    fn next_intra_tx_counter(&mut self, ctx: &mut Context) -> Result<i16> {
        let counter = self.intra_tx_counter(ctx)?;
        let next = counter.checked_add(1).ok_or(Error::Overflow)?;
        save(&mut self.store(ctx), intra_tx_counter_key(), &next)?;
        Ok(counter)
    }

    fn reset_intra_tx_counter(&mut self, ctx: &mut Context) -> Result<()> {
        save(&mut self.store(ctx), intra_tx_counter_key(), &0i16)
    }

    // Validators

    pub fn get_validator(&self, ctx: &Context, operator: Address) -> Result<Option<Validator>> {
        load(&self.store(ctx), &validator_key(operator))
    }

    pub fn validator(&self, ctx: &Context, operator: Address) -> Result<Validator> {
        self.get_validator(ctx, operator)?
            .ok_or(Error::ValidatorNotFound(operator))
    }

    pub fn get_validator_by_cons_addr(
        &self,
        ctx: &Context,
        cons_addr: Address,
    ) -> Result<Option<Validator>> {
        let store = self.store(ctx);
        match store.get(&validator_by_cons_addr_key(cons_addr))? {
            Some(operator) => {
                let operator = Address::from_slice(&operator)?;
                load(&store, &validator_key(operator))
            }
            None => Ok(None),
        }
    }

    /// Writes a validator along with its consensus address and power index
    /// entries. A jailed validator is left out of the power index.
    pub fn set_validator(&mut self, ctx: &mut Context, validator: &Validator) -> Result<()> {
        let mut store = self.store(ctx);
        let operator = validator.operator;

        let prev: Option<Validator> = load(&store, &validator_key(operator))?;
        if let Some(prev) = prev {
            store.delete(&validator_power_key(&prev))?;
        }

        save(&mut store, validator_key(operator), validator)?;
        store.put(
            validator_by_cons_addr_key(validator.cons_address()),
            operator.as_slice().to_vec(),
        )?;
        if !validator.jailed {
            store.put(validator_power_key(validator), operator.as_slice().to_vec())?;
        }

        Ok(())
    }

    /// Deletes a validator and its index entries.
    ///
    /// Panics if the validator still holds tokens.
    pub fn remove_validator(&mut self, ctx: &mut Context, operator: Address) -> Result<()> {
        let validator = match self.get_validator(ctx, operator)? {
            Some(validator) => validator,
            None => return Ok(()),
        };
        if !validator.tokens.is_zero() {
            panic!("Attempted to remove validator {} which still holds tokens", operator);
        }

        let mut store = self.store(ctx);
        store.delete(&validator_key(operator))?;
        store.delete(&validator_by_cons_addr_key(validator.cons_address()))?;
        store.delete(&validator_power_key(&validator))?;
        store.delete(&last_validator_power_key(operator))?;

        debug!("Removed validator {}", operator);
        self.call_hooks(ctx, |hooks, ctx| {
            hooks.after_validator_removed(ctx, validator.cons_address(), operator)
        })
    }

    /// Removes `operator` if it is unbonded, holds nothing, and no unbonding
    /// delegation or redelegation refers to it.
    fn try_remove_validator(&mut self, ctx: &mut Context, operator: Address) -> Result<bool> {
        let validator = match self.get_validator(ctx, operator)? {
            Some(validator) => validator,
            None => return Ok(false),
        };
        if validator.status != BondStatus::Unbonded
            || !validator.tokens.is_zero()
            || !validator.delegator_shares.is_zero()
        {
            return Ok(false);
        }

        let store = self.store(ctx);
        let referenced = store.iter_prefix(&ubds_by_val_prefix(operator)).next().is_some()
            || store.iter_prefix(&reds_by_src_prefix(operator)).next().is_some()
            || store.iter_prefix(&reds_by_dst_prefix(operator)).next().is_some();
        if referenced {
            return Ok(false);
        }

        self.remove_validator(ctx, operator)?;
        Ok(true)
    }

    /// Up to `max_retrieve` validators in power index order. Jailed
    /// validators are not ranked and so are not returned.
    pub fn get_validators(&self, ctx: &Context, max_retrieve: usize) -> Result<Vec<Validator>> {
        let store = self.store(ctx);
        let mut validators = vec![];
        for entry in store.iter_prefix(&[VALIDATOR_BY_POWER]).take(max_retrieve) {
            let (_, operator) = entry?;
            validators.push(self.validator(ctx, Address::from_slice(&operator)?)?);
        }
        Ok(validators)
    }

    /// Every validator, jailed or not, in operator address order.
    pub fn all_validators(&self, ctx: &Context) -> Result<Vec<Validator>> {
        collect_prefix(&self.store(ctx), &[VALIDATOR])
    }

    /// The active set persisted by the last validator set update, as
    /// `(operator, power)` in operator address order.
    pub fn last_validator_powers(&self, ctx: &Context) -> Result<Vec<(Address, u64)>> {
        let store = self.store(ctx);
        let mut powers = vec![];
        for entry in store.iter_prefix(&[LAST_VALIDATOR_POWER]) {
            let (key, value) = entry?;
            let operator = Address::from_slice(&key[1..])?;
            powers.push((operator, u64::decode(value.as_slice())?));
        }
        Ok(powers)
    }

    pub fn last_validator_power(&self, ctx: &Context, operator: Address) -> Result<Option<u64>> {
        load(&self.store(ctx), &last_validator_power_key(operator))
    }

    // Delegations

    pub fn get_delegation(
        &self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<Option<Delegation>> {
        load(&self.store(ctx), &delegation_key(delegator, validator))
    }

    pub fn set_delegation(&mut self, ctx: &mut Context, delegation: &Delegation) -> Result<()> {
        let mut store = self.store(ctx);
        save(
            &mut store,
            delegation_key(delegation.delegator, delegation.validator),
            delegation,
        )?;
        store.put(
            delegation_by_val_key(delegation.validator, delegation.delegator),
            vec![],
        )
    }

    pub fn remove_delegation(&mut self, ctx: &mut Context, delegation: &Delegation) -> Result<()> {
        let (delegator, validator) = (delegation.delegator, delegation.validator);
        self.call_hooks(ctx, |hooks, ctx| {
            hooks.before_delegation_removed(ctx, delegator, validator)
        })?;

        let mut store = self.store(ctx);
        store.delete(&delegation_key(delegator, validator))?;
        store.delete(&delegation_by_val_key(validator, delegator))
    }

    pub fn get_delegator_delegations(
        &self,
        ctx: &Context,
        delegator: Address,
    ) -> Result<Vec<Delegation>> {
        collect_prefix(&self.store(ctx), &delegations_prefix(delegator))
    }

    pub fn get_validator_delegations(
        &self,
        ctx: &Context,
        validator: Address,
    ) -> Result<Vec<Delegation>> {
        let store = self.store(ctx);
        let prefix = delegations_by_val_prefix(validator);
        let mut delegations = vec![];
        for entry in store.iter_prefix(&prefix) {
            let (key, _) = entry?;
            let delegator = Address::from_slice(&key[prefix.len()..])?;
            if let Some(delegation) = self.get_delegation(ctx, delegator, validator)? {
                delegations.push(delegation);
            }
        }
        Ok(delegations)
    }

    fn all_delegations(&self, ctx: &Context) -> Result<Vec<Delegation>> {
        collect_prefix(&self.store(ctx), &[DELEGATION])
    }

    // Unbonding delegations

    pub fn get_unbonding_delegation(
        &self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<Option<UnbondingDelegation>> {
        load(&self.store(ctx), &ubd_key(delegator, validator))
    }

    pub fn set_unbonding_delegation(
        &mut self,
        ctx: &mut Context,
        ubd: &UnbondingDelegation,
    ) -> Result<()> {
        let mut store = self.store(ctx);
        save(&mut store, ubd_key(ubd.delegator, ubd.validator), ubd)?;
        store.put(ubd_by_val_key(ubd.validator, ubd.delegator), vec![])
    }

    pub fn remove_unbonding_delegation(
        &mut self,
        ctx: &mut Context,
        ubd: &UnbondingDelegation,
    ) -> Result<()> {
        let mut store = self.store(ctx);
        store.delete(&ubd_key(ubd.delegator, ubd.validator))?;
        store.delete(&ubd_by_val_key(ubd.validator, ubd.delegator))
    }

    pub fn get_delegator_unbonding_delegations(
        &self,
        ctx: &Context,
        delegator: Address,
    ) -> Result<Vec<UnbondingDelegation>> {
        collect_prefix(&self.store(ctx), &ubds_prefix(delegator))
    }

    pub fn get_validator_unbonding_delegations(
        &self,
        ctx: &Context,
        validator: Address,
    ) -> Result<Vec<UnbondingDelegation>> {
        let store = self.store(ctx);
        let prefix = ubds_by_val_prefix(validator);
        let mut ubds = vec![];
        for entry in store.iter_prefix(&prefix) {
            let (key, _) = entry?;
            let delegator = Address::from_slice(&key[prefix.len()..])?;
            if let Some(ubd) = self.get_unbonding_delegation(ctx, delegator, validator)? {
                ubds.push(ubd);
            }
        }
        Ok(ubds)
    }

    fn all_unbonding_delegations(&self, ctx: &Context) -> Result<Vec<UnbondingDelegation>> {
        collect_prefix(&self.store(ctx), &[UNBONDING_DELEGATION])
    }

    // Redelegations

    pub fn get_redelegation(
        &self,
        ctx: &Context,
        delegator: Address,
        src: Address,
        dst: Address,
    ) -> Result<Option<Redelegation>> {
        load(&self.store(ctx), &red_key(delegator, src, dst))
    }

    pub fn set_redelegation(&mut self, ctx: &mut Context, red: &Redelegation) -> Result<()> {
        let mut store = self.store(ctx);
        save(&mut store, red_key(red.delegator, red.src, red.dst), red)?;
        store.put(red_by_src_key(red.src, red.delegator, red.dst), vec![])?;
        store.put(red_by_dst_key(red.dst, red.delegator, red.src), vec![])
    }

    pub fn remove_redelegation(&mut self, ctx: &mut Context, red: &Redelegation) -> Result<()> {
        let mut store = self.store(ctx);
        store.delete(&red_key(red.delegator, red.src, red.dst))?;
        store.delete(&red_by_src_key(red.src, red.delegator, red.dst))?;
        store.delete(&red_by_dst_key(red.dst, red.delegator, red.src))
    }

    pub fn get_delegator_redelegations(
        &self,
        ctx: &Context,
        delegator: Address,
    ) -> Result<Vec<Redelegation>> {
        collect_prefix(&self.store(ctx), &reds_prefix(delegator))
    }

    /// Redelegations out of `src`.
    pub fn get_redelegations_from_validator(
        &self,
        ctx: &Context,
        src: Address,
    ) -> Result<Vec<Redelegation>> {
        let store = self.store(ctx);
        let prefix = reds_by_src_prefix(src);
        let mut reds = vec![];
        for entry in store.iter_prefix(&prefix) {
            let (key, _) = entry?;
            let addrs = split_addresses(&key[prefix.len()..], 2)?;
            if let Some(red) = self.get_redelegation(ctx, addrs[0], src, addrs[1])? {
                reds.push(red);
            }
        }
        Ok(reds)
    }

    /// Redelegations by `delegator` into `dst`.
    fn get_incoming_redelegations(
        &self,
        ctx: &Context,
        delegator: Address,
        dst: Address,
    ) -> Result<Vec<Redelegation>> {
        let store = self.store(ctx);
        let prefix = reds_by_dst_delegator_prefix(dst, delegator);
        let mut reds = vec![];
        for entry in store.iter_prefix(&prefix) {
            let (key, _) = entry?;
            let src = Address::from_slice(&key[prefix.len()..])?;
            if let Some(red) = self.get_redelegation(ctx, delegator, src, dst)? {
                reds.push(red);
            }
        }
        Ok(reds)
    }

    fn all_redelegations(&self, ctx: &Context) -> Result<Vec<Redelegation>> {
        collect_prefix(&self.store(ctx), &[REDELEGATION])
    }
}

fn load<T: Decode>(store: &Store, key: &[u8]) -> Result<Option<T>> {
    match store.get(key)? {
        Some(bytes) => Ok(Some(T::decode(bytes.as_slice())?)),
        None => Ok(None),
    }
}

fn save<T: Encode>(store: &mut Store, key: Vec<u8>, value: &T) -> Result<()> {
    store.put(key, value.encode()?)
}

fn collect_prefix<T: Decode>(store: &Store, prefix: &[u8]) -> Result<Vec<T>> {
    store
        .iter_prefix(prefix)
        .map(|entry| {
            let (_, value) = entry?;
            Ok(T::decode(value.as_slice())?)
        })
        .collect()
}
