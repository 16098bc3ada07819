use log::info;
use serde::{Deserialize, Serialize};

use super::keys::*;
use super::{
    save, BondStatus, Delegation, Keeper, Params, Pool, Redelegation, UnbondingDelegation,
    Validator, ValidatorUpdate,
};
use crate::coins::Address;
use crate::context::Context;
use crate::store::Write;
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastValidatorPower {
    pub operator: Address,
    pub power: u64,
}

/// The complete staking state, as loaded at chain start or exported from a
/// running chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub pool: Pool,
    #[serde(default)]
    pub last_total_power: u64,
    #[serde(default)]
    pub last_validator_powers: Vec<LastValidatorPower>,
    #[serde(default)]
    pub validators: Vec<Validator>,
    #[serde(default)]
    pub delegations: Vec<Delegation>,
    #[serde(default)]
    pub unbonding_delegations: Vec<UnbondingDelegation>,
    #[serde(default)]
    pub redelegations: Vec<Redelegation>,
}

impl GenesisState {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that the pool holds exactly the tokens of every validator and
    /// unbonding entry.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;

        let mut bonded: u64 = 0;
        let mut not_bonded: u64 = 0;
        for validator in self.validators.iter() {
            if validator.tokens.is_zero() != validator.delegator_shares.is_zero() {
                return Err(Error::InvalidParams(format!(
                    "Validator {} has {} tokens and {} shares",
                    validator.operator, validator.tokens, validator.delegator_shares
                )));
            }
            let bucket = if validator.is_bonded() {
                &mut bonded
            } else {
                &mut not_bonded
            };
            *bucket = bucket
                .checked_add(validator.tokens.value())
                .ok_or(Error::Overflow)?;
        }
        for ubd in self.unbonding_delegations.iter() {
            not_bonded = not_bonded
                .checked_add(ubd.total_balance().value())
                .ok_or(Error::Overflow)?;
        }

        if bonded != self.pool.bonded_tokens.value() {
            return Err(Error::InvalidParams(format!(
                "Pool bonded tokens {} do not match bonded validator tokens {}",
                self.pool.bonded_tokens, bonded
            )));
        }
        if not_bonded != self.pool.not_bonded_tokens.value() {
            return Err(Error::InvalidParams(format!(
                "Pool not bonded tokens {} do not match unbonded holdings {}",
                self.pool.not_bonded_tokens, not_bonded
            )));
        }

        Ok(())
    }
}

impl Keeper {
    /// Writes `genesis` to an empty store and returns the initial validator
    /// set.
    ///
    /// Exported state carries the previous active set, which is restored and
    /// returned as is. Otherwise the active set is computed from the power
    /// index.
    pub fn init_genesis(
        &mut self,
        ctx: &mut Context,
        genesis: &GenesisState,
    ) -> Result<Vec<ValidatorUpdate>> {
        genesis.validate()?;

        ctx.transact(|ctx| {
            self.set_params(ctx, genesis.params.clone())?;
            self.set_pool(ctx, genesis.pool)?;
            self.set_last_total_power(ctx, genesis.last_total_power)?;

            for validator in genesis.validators.iter() {
                self.set_validator(ctx, validator)?;
                if validator.status == BondStatus::Unbonding {
                    self.store(ctx).put(
                        validator_queue_key(validator.unbonding_completion_time, validator.operator),
                        vec![],
                    )?;
                }
            }
            for delegation in genesis.delegations.iter() {
                self.set_delegation(ctx, delegation)?;
            }
            for ubd in genesis.unbonding_delegations.iter() {
                self.set_unbonding_delegation(ctx, ubd)?;
                for entry in ubd.entries.iter() {
                    self.store(ctx).put(
                        ubd_queue_key(entry.completion_time, ubd.delegator, ubd.validator),
                        vec![],
                    )?;
                }
            }
            for red in genesis.redelegations.iter() {
                self.set_redelegation(ctx, red)?;
                for entry in red.entries.iter() {
                    self.store(ctx).put(
                        red_queue_key(entry.completion_time, red.delegator, red.src, red.dst),
                        vec![],
                    )?;
                }
            }

            info!(
                "Initialized staking genesis with {} validators and {} delegations",
                genesis.validators.len(),
                genesis.delegations.len()
            );

            if genesis.last_validator_powers.is_empty() {
                return self.apply_and_return_validator_set_updates(ctx);
            }

            let mut updates = vec![];
            for last in genesis.last_validator_powers.iter() {
                let validator = self.validator(ctx, last.operator)?;
                save(
                    &mut self.store(ctx),
                    last_validator_power_key(last.operator),
                    &last.power,
                )?;
                updates.push(ValidatorUpdate {
                    consensus_key: validator.consensus_key,
                    power: last.power,
                });
            }
            Ok(updates)
        })
    }

    pub fn export_genesis(&self, ctx: &Context) -> Result<GenesisState> {
        Ok(GenesisState {
            params: self.params(ctx)?,
            pool: self.pool(ctx)?,
            last_total_power: self.last_total_power(ctx)?,
            last_validator_powers: self
                .last_validator_powers(ctx)?
                .into_iter()
                .map(|(operator, power)| LastValidatorPower { operator, power })
                .collect(),
            validators: self.all_validators(ctx)?,
            delegations: self.all_delegations(ctx)?,
            unbonding_delegations: self.all_unbonding_delegations(ctx)?,
            redelegations: self.all_redelegations(ctx)?,
        })
    }
}
