use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::keys::*;
use super::{save, BondStatus, Keeper, Validator};
use crate::coins::Address;
use crate::context::Context;
use crate::store::Write;
use crate::{Error, Result};

/// A change to a validator's voting power, for the consensus engine. A power
/// of zero removes the validator from the active set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub consensus_key: [u8; 32],
    pub power: u64,
}

impl Keeper {
    /// Completes matured queue entries, then recomputes the active set.
    /// Returns the validator set changes for the consensus engine.
    pub fn end_block(&mut self, ctx: &mut Context) -> Result<Vec<ValidatorUpdate>> {
        ctx.transact(|ctx| {
            self.process_queues(ctx)?;
            let updates = self.apply_validator_set_updates(ctx)?;
            self.reset_intra_tx_counter(ctx)?;
            Ok(updates)
        })
    }

    /// Recomputes the active set from the power index and returns the power
    /// changes since the previous call, in the order they were determined:
    /// validators in the new set by rank, then validators leaving the set by
    /// operator address.
    ///
    /// Validators entering the set become bonded and validators leaving it
    /// begin unbonding, with the pool moving their tokens accordingly.
    pub fn apply_and_return_validator_set_updates(
        &mut self,
        ctx: &mut Context,
    ) -> Result<Vec<ValidatorUpdate>> {
        ctx.transact(|ctx| self.apply_validator_set_updates(ctx))
    }

    fn apply_validator_set_updates(&mut self, ctx: &mut Context) -> Result<Vec<ValidatorUpdate>> {
        let max_validators = self.params(ctx)?.max_validators as usize;
        let mut last: BTreeMap<Address, u64> = self.last_validator_powers(ctx)?.into_iter().collect();

        let ranked: Vec<Address> = {
            let store = self.store(ctx);
            let mut ranked = Vec::with_capacity(max_validators);
            for entry in store.iter_prefix(&[VALIDATOR_BY_POWER]).take(max_validators) {
                let (_, operator) = entry?;
                ranked.push(Address::from_slice(&operator)?);
            }
            ranked
        };

        let mut updates = vec![];
        let mut total_power: u64 = 0;

        for operator in ranked {
            let mut validator = match self.get_validator(ctx, operator)? {
                Some(validator) => validator,
                None => panic!("Power index refers to missing validator {}", operator),
            };
            if validator.jailed {
                panic!("Jailed validator {} found in power index", operator);
            }
            if validator.tokens.is_zero() {
                break;
            }

            if !validator.is_bonded() {
                validator = self.bond_validator(ctx, validator)?;
            }

            let power = validator.potential_power();
            if last.remove(&operator) != Some(power) {
                updates.push(ValidatorUpdate {
                    consensus_key: validator.consensus_key,
                    power,
                });
                save(
                    &mut self.store(ctx),
                    last_validator_power_key(operator),
                    &power,
                )?;
            }

            total_power = total_power.checked_add(power).ok_or(Error::Overflow)?;
        }

        for operator in last.into_keys() {
            let validator = match self.get_validator(ctx, operator)? {
                Some(validator) => validator,
                None => panic!("Active set refers to missing validator {}", operator),
            };
            let validator = self.begin_unbonding_validator(ctx, validator)?;

            self.store(ctx).delete(&last_validator_power_key(operator))?;
            updates.push(ValidatorUpdate {
                consensus_key: validator.consensus_key,
                power: 0,
            });
        }

        if !updates.is_empty() {
            self.set_last_total_power(ctx, total_power)?;
            info!(
                "Validator set updated at height {}: {} changes, total power {}",
                ctx.height,
                updates.len(),
                total_power
            );
        }

        Ok(updates)
    }

    fn bond_validator(&mut self, ctx: &mut Context, mut validator: Validator) -> Result<Validator> {
        if validator.status == BondStatus::Unbonding {
            self.store(ctx).delete(&validator_queue_key(
                validator.unbonding_completion_time,
                validator.operator,
            ))?;
        }

        validator.status = BondStatus::Bonded;
        self.set_validator(ctx, &validator)?;
        let tokens = validator.tokens;
        self.update_pool(ctx, |pool| pool.not_bonded_to_bonded(tokens))?;

        debug!("Validator {} bonded with {} tokens", validator.operator, tokens);
        let (cons_addr, operator) = (validator.cons_address(), validator.operator);
        self.call_hooks(ctx, |hooks, ctx| {
            hooks.after_validator_bonded(ctx, cons_addr, operator)
        })?;

        Ok(validator)
    }

    fn begin_unbonding_validator(
        &mut self,
        ctx: &mut Context,
        mut validator: Validator,
    ) -> Result<Validator> {
        if !validator.is_bonded() {
            panic!(
                "Validator {} left the active set without being bonded",
                validator.operator
            );
        }
        let params = self.params(ctx)?;

        validator.status = BondStatus::Unbonding;
        validator.unbonding_height = ctx.height;
        validator.unbonding_completion_time = ctx
            .time_seconds
            .checked_add(params.unbonding_time)
            .ok_or(Error::Overflow)?;
        self.set_validator(ctx, &validator)?;

        let tokens = validator.tokens;
        self.update_pool(ctx, |pool| pool.bonded_to_not_bonded(tokens))?;

        self.store(ctx).put(
            validator_queue_key(validator.unbonding_completion_time, validator.operator),
            vec![],
        )?;

        debug!(
            "Validator {} began unbonding, completes at {}",
            validator.operator, validator.unbonding_completion_time
        );
        let (cons_addr, operator) = (validator.cons_address(), validator.operator);
        self.call_hooks(ctx, |hooks, ctx| {
            hooks.after_validator_begin_unbonding(ctx, cons_addr, operator)
        })?;

        Ok(validator)
    }

    /// Removes the validator with consensus address `cons_addr` from the
    /// power ranking. It leaves the active set at the next validator set
    /// update.
    pub fn jail(&mut self, ctx: &mut Context, cons_addr: Address) -> Result<()> {
        ctx.transact(|ctx| {
            let validator = self
                .get_validator_by_cons_addr(ctx, cons_addr)?
                .ok_or(Error::ValidatorNotFound(cons_addr))?;
            if validator.jailed {
                return Err(Error::ValidatorJailed(validator.operator));
            }

            self.jail_validator(ctx, validator)?;
            Ok(())
        })
    }

    /// Returns a jailed validator to the power ranking. The operator must
    /// still hold a self-delegation.
    pub fn unjail(&mut self, ctx: &mut Context, operator: Address) -> Result<()> {
        ctx.transact(|ctx| {
            let mut validator = self.validator(ctx, operator)?;
            if !validator.jailed {
                return Err(Error::ValidatorNotJailed(operator));
            }
            if self.get_delegation(ctx, operator, operator)?.is_none() {
                return Err(Error::DelegationNotFound {
                    delegator: operator,
                    validator: operator,
                });
            }

            validator.jailed = false;
            self.set_validator(ctx, &validator)?;
            info!("Unjailed validator {}", operator);
            Ok(())
        })
    }

    pub(super) fn jail_validator(
        &mut self,
        ctx: &mut Context,
        mut validator: Validator,
    ) -> Result<Validator> {
        if !validator.jailed {
            validator.jailed = true;
            self.set_validator(ctx, &validator)?;
            info!("Jailed validator {}", validator.operator);
        }
        Ok(validator)
    }
}
