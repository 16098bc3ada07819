//! Read-only JSON queries over staking state.
//!
//! Requests carry their parameters as JSON; responses are the JSON form of
//! the stored records.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Delegation, Keeper};
use crate::coins::Address;
use crate::context::Context;
use crate::{Error, Result};

pub const QUERY_VALIDATORS: &str = "validators";
pub const QUERY_VALIDATOR: &str = "validator";
pub const QUERY_VALIDATOR_DELEGATIONS: &str = "validatorDelegations";
pub const QUERY_VALIDATOR_UNBONDING_DELEGATIONS: &str = "validatorUnbondingDelegations";
pub const QUERY_VALIDATOR_REDELEGATIONS: &str = "validatorRedelegations";
pub const QUERY_DELEGATOR_DELEGATIONS: &str = "delegatorDelegations";
pub const QUERY_DELEGATOR_UNBONDING_DELEGATIONS: &str = "delegatorUnbondingDelegations";
pub const QUERY_DELEGATOR_REDELEGATIONS: &str = "delegatorRedelegations";
pub const QUERY_DELEGATOR_VALIDATORS: &str = "delegatorValidators";
pub const QUERY_DELEGATOR_VALIDATOR: &str = "delegatorValidator";
pub const QUERY_DELEGATION: &str = "delegation";
pub const QUERY_UNBONDING_DELEGATION: &str = "unbondingDelegation";
pub const QUERY_POOL: &str = "pool";
pub const QUERY_PARAMETERS: &str = "parameters";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDelegatorParams {
    pub delegator_addr: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorParams {
    pub validator_addr: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBondsParams {
    pub delegator_addr: Address,
    pub validator_addr: Address,
}

fn params<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(data)?)
}

fn respond<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

impl Keeper {
    /// Answers the query at `path` with request parameters `data`.
    pub fn query(&self, ctx: &Context, path: &str, data: &[u8]) -> Result<Vec<u8>> {
        match path {
            QUERY_VALIDATORS => respond(&self.all_validators(ctx)?),
            QUERY_VALIDATOR => {
                let req: QueryValidatorParams = params(data)?;
                respond(&self.validator(ctx, req.validator_addr)?)
            }
            QUERY_VALIDATOR_DELEGATIONS => {
                let req: QueryValidatorParams = params(data)?;
                respond(&self.get_validator_delegations(ctx, req.validator_addr)?)
            }
            QUERY_VALIDATOR_UNBONDING_DELEGATIONS => {
                let req: QueryValidatorParams = params(data)?;
                respond(&self.get_validator_unbonding_delegations(ctx, req.validator_addr)?)
            }
            QUERY_VALIDATOR_REDELEGATIONS => {
                let req: QueryValidatorParams = params(data)?;
                respond(&self.get_redelegations_from_validator(ctx, req.validator_addr)?)
            }
            QUERY_DELEGATOR_DELEGATIONS => {
                let req: QueryDelegatorParams = params(data)?;
                respond(&self.get_delegator_delegations(ctx, req.delegator_addr)?)
            }
            QUERY_DELEGATOR_UNBONDING_DELEGATIONS => {
                let req: QueryDelegatorParams = params(data)?;
                respond(&self.get_delegator_unbonding_delegations(ctx, req.delegator_addr)?)
            }
            QUERY_DELEGATOR_REDELEGATIONS => {
                let req: QueryDelegatorParams = params(data)?;
                respond(&self.get_delegator_redelegations(ctx, req.delegator_addr)?)
            }
            QUERY_DELEGATOR_VALIDATORS => {
                let req: QueryDelegatorParams = params(data)?;
                let validators = self
                    .get_delegator_delegations(ctx, req.delegator_addr)?
                    .into_iter()
                    .map(|delegation| self.validator(ctx, delegation.validator))
                    .collect::<Result<Vec<_>>>()?;
                respond(&validators)
            }
            QUERY_DELEGATOR_VALIDATOR => {
                let req: QueryBondsParams = params(data)?;
                self.bonded_delegation(ctx, &req)?;
                respond(&self.validator(ctx, req.validator_addr)?)
            }
            QUERY_DELEGATION => {
                let req: QueryBondsParams = params(data)?;
                respond(&self.bonded_delegation(ctx, &req)?)
            }
            QUERY_UNBONDING_DELEGATION => {
                let req: QueryBondsParams = params(data)?;
                let ubd = self
                    .get_unbonding_delegation(ctx, req.delegator_addr, req.validator_addr)?
                    .ok_or(Error::UnbondingDelegationNotFound {
                        delegator: req.delegator_addr,
                        validator: req.validator_addr,
                    })?;
                respond(&ubd)
            }
            QUERY_POOL => respond(&self.pool(ctx)?),
            QUERY_PARAMETERS => respond(&self.params(ctx)?),
            _ => Err(Error::UnknownQuery(path.to_string())),
        }
    }

    fn bonded_delegation(&self, ctx: &Context, req: &QueryBondsParams) -> Result<Delegation> {
        self.get_delegation(ctx, req.delegator_addr, req.validator_addr)?
            .ok_or(Error::DelegationNotFound {
                delegator: req.delegator_addr,
                validator: req.validator_addr,
            })
    }
}
