use log::{debug, info};

use super::keys::*;
use super::{
    BondStatus, Commission, Delegation, Description, Keeper, Redelegation, UnbondingDelegation,
    Validator,
};
use crate::coins::{Address, Amount, Coin, Decimal};
use crate::context::Context;
use crate::store::Write;
use crate::{Error, Result};

impl Keeper {
    /// Registers a new validator and bonds its operator's self-delegation.
    pub fn create_validator(
        &mut self,
        ctx: &mut Context,
        operator: Address,
        consensus_key: [u8; 32],
        description: Description,
        commission: Commission,
        self_delegation: Coin,
    ) -> Result<()> {
        ctx.transact(|ctx| {
            if self.get_validator(ctx, operator)?.is_some() {
                return Err(Error::ValidatorExists(operator));
            }
            let cons_addr = Address::from_pubkey(&consensus_key);
            if self.get_validator_by_cons_addr(ctx, cons_addr)?.is_some() {
                return Err(Error::ConsensusKeyInUse);
            }
            description.validate()?;
            commission.validate()?;
            let amount = self.check_bond_coin(ctx, &self_delegation)?;

            let mut validator = Validator::new(operator, consensus_key, description, commission);
            validator.commission.update_time = ctx.time_seconds;
            validator.bond_height = ctx.height;
            validator.bond_intra_tx_counter = self.next_intra_tx_counter(ctx)?;
            self.set_validator(ctx, &validator)?;

            info!(
                "Created validator {} at height {} ({})",
                operator, ctx.height, validator.bond_intra_tx_counter
            );
            self.call_hooks(ctx, |hooks, ctx| hooks.after_validator_created(ctx, operator))?;

            self.bond(ctx, operator, validator, amount, true)?;
            Ok(())
        })
    }

    /// Updates a validator's description and/or commission rate.
    pub fn edit_validator(
        &mut self,
        ctx: &mut Context,
        operator: Address,
        description: Option<Description>,
        commission_rate: Option<Decimal>,
    ) -> Result<()> {
        ctx.transact(|ctx| {
            let mut validator = self.validator(ctx, operator)?;

            if let Some(description) = description {
                description.validate()?;
                validator.description = description;
            }
            if let Some(rate) = commission_rate {
                validator
                    .commission
                    .validate_new_rate(rate, ctx.time_seconds)?;
                validator.commission.rate = rate;
                validator.commission.update_time = ctx.time_seconds;
            }

            self.set_validator(ctx, &validator)
        })
    }

    /// Bonds `coin` from the delegator's account to an existing validator and
    /// returns the shares issued.
    pub fn delegate(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
        coin: Coin,
    ) -> Result<Decimal> {
        ctx.transact(|ctx| {
            let amount = self.check_bond_coin(ctx, &coin)?;
            let validator = self.validator(ctx, validator)?;
            if validator.jailed && delegator != validator.operator {
                return Err(Error::ValidatorJailed(validator.operator));
            }

            self.bond(ctx, delegator, validator, amount, true)
        })
    }

    fn check_bond_coin(&self, ctx: &Context, coin: &Coin) -> Result<Amount> {
        let params = self.params(ctx)?;
        if coin.denom != params.bond_denom {
            return Err(Error::BadDenomination {
                expected: params.bond_denom,
                got: coin.denom.clone(),
            });
        }
        if coin.amount.is_zero() {
            return Err(Error::InvalidAmount("Amount must be positive".into()));
        }
        Ok(coin.amount)
    }

    /// Adds `amount` tokens to `validator` on behalf of `delegator`. With
    /// `from_account` the tokens are taken from the delegator's balance and
    /// enter the pool; otherwise the caller has already accounted for them.
    pub(super) fn bond(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        mut validator: Validator,
        amount: Amount,
        from_account: bool,
    ) -> Result<Decimal> {
        let operator = validator.operator;
        if validator.shares_from_tokens(amount)?.is_zero() {
            return Err(Error::InvalidAmount(format!(
                "{} tokens would be issued no shares of {}",
                amount, operator
            )));
        }
        let mut delegation = match self.get_delegation(ctx, delegator, operator)? {
            Some(delegation) => {
                self.call_hooks(ctx, |hooks, ctx| {
                    hooks.before_delegation_shares_modified(ctx, delegator, operator)
                })?;
                delegation
            }
            None => {
                self.call_hooks(ctx, |hooks, ctx| {
                    hooks.before_delegation_created(ctx, delegator, operator)
                })?;
                Delegation::new(delegator, operator)
            }
        };

        if from_account {
            let coin = Coin::new(self.params(ctx)?.bond_denom, amount);
            self.bank
                .move_tokens_from_account_to_module(ctx, delegator, &coin)?;

            let bonded = validator.is_bonded();
            self.update_pool(ctx, |pool| {
                pool.add_not_bonded(amount);
                if bonded {
                    pool.not_bonded_to_bonded(amount);
                }
            })?;
        }

        let issued = validator.add_tokens_from_del(amount)?;
        self.set_validator(ctx, &validator)?;

        delegation.shares = (delegation.shares + issued)?;
        self.set_delegation(ctx, &delegation)?;

        debug!(
            "{} delegated {} to {} for {} shares",
            delegator, amount, operator, issued
        );
        self.call_hooks(ctx, |hooks, ctx| {
            hooks.after_delegation_modified(ctx, delegator, operator)
        })?;

        Ok(issued)
    }

    /// Redeems `shares` of a delegation and returns the tokens released along
    /// with the validator's status at the time. The caller decides where the
    /// tokens go.
    pub(super) fn unbond(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        operator: Address,
        shares: Decimal,
    ) -> Result<(Amount, BondStatus)> {
        if shares.is_negative() || shares.is_zero() {
            return Err(Error::InvalidAmount("Shares must be positive".into()));
        }
        let mut delegation = self
            .get_delegation(ctx, delegator, operator)?
            .ok_or(Error::DelegationNotFound {
                delegator,
                validator: operator,
            })?;
        if shares > delegation.shares {
            return Err(Error::InsufficientShares {
                have: delegation.shares,
                need: shares,
            });
        }
        let mut validator = self.validator(ctx, operator)?;

        self.call_hooks(ctx, |hooks, ctx| {
            hooks.before_delegation_shares_modified(ctx, delegator, operator)
        })?;

        delegation.shares = (delegation.shares - shares)?;

        // an operator withdrawing all of its self-bond may not stay ranked
        if delegator == operator && !validator.jailed && delegation.shares.is_zero() {
            validator = self.jail_validator(ctx, validator)?;
        }

        if delegation.shares.is_zero() {
            self.remove_delegation(ctx, &delegation)?;
        } else {
            self.set_delegation(ctx, &delegation)?;
            self.call_hooks(ctx, |hooks, ctx| {
                hooks.after_delegation_modified(ctx, delegator, operator)
            })?;
        }

        let status = validator.status;
        let amount = validator.remove_del_shares(shares)?;
        self.set_validator(ctx, &validator)?;

        Ok((amount, status))
    }

    /// Undelegates `shares` from `validator`. The tokens are held until the
    /// returned completion time, then paid out by queue maturation.
    pub fn begin_unbonding(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
        shares: Decimal,
    ) -> Result<i64> {
        ctx.transact(|ctx| {
            let params = self.params(ctx)?;
            let mut ubd = self
                .get_unbonding_delegation(ctx, delegator, validator)?
                .unwrap_or_else(|| UnbondingDelegation::new(delegator, validator));
            if ubd.entries.len() >= params.max_entries as usize {
                return Err(Error::MaxUnbondingEntries);
            }

            let (amount, status) = self.unbond(ctx, delegator, validator, shares)?;
            if amount.is_zero() {
                return Err(Error::InvalidAmount(format!(
                    "{} shares of {} are worth no tokens",
                    shares, validator
                )));
            }
            if status == BondStatus::Bonded {
                self.update_pool(ctx, |pool| pool.bonded_to_not_bonded(amount))?;
            }

            let completion_time = ctx
                .time_seconds
                .checked_add(params.unbonding_time)
                .ok_or(Error::Overflow)?;
            ubd.add_entry(ctx.height, completion_time, amount);
            self.set_unbonding_delegation(ctx, &ubd)?;
            self.store(ctx)
                .put(ubd_queue_key(completion_time, delegator, validator), vec![])?;

            debug!(
                "{} began unbonding {} from {}, completes at {}",
                delegator, amount, validator, completion_time
            );
            Ok(completion_time)
        })
    }

    /// Moves `shares` of a delegation from `src` to `dst`. The tokens stay
    /// staked; the move remains slashable for faults at `src` until the
    /// returned completion time.
    pub fn begin_redelegation(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        src: Address,
        dst: Address,
        shares: Decimal,
    ) -> Result<i64> {
        ctx.transact(|ctx| {
            if src == dst {
                return Err(Error::SelfRedelegation);
            }
            let dst_validator = self
                .get_validator(ctx, dst)?
                .ok_or(Error::BadRedelegationDst(dst))?;
            if dst_validator.jailed && delegator != dst {
                return Err(Error::ValidatorJailed(dst));
            }

            let now = ctx.time_seconds;
            let incoming = self.get_incoming_redelegations(ctx, delegator, src)?;
            if incoming.iter().any(|red| red.has_immature(now)) {
                return Err(Error::TransitiveRedelegation(src));
            }

            let params = self.params(ctx)?;
            let mut red = self
                .get_redelegation(ctx, delegator, src, dst)?
                .unwrap_or_else(|| Redelegation::new(delegator, src, dst));
            if red.entries.len() >= params.max_entries as usize {
                return Err(Error::MaxRedelegationEntries);
            }

            let (amount, src_status) = self.unbond(ctx, delegator, src, shares)?;
            if amount.is_zero() {
                return Err(Error::TinyRedelegation);
            }

            let dst_validator = self.validator(ctx, dst)?;
            let dst_bonded = dst_validator.is_bonded();
            match (src_status == BondStatus::Bonded, dst_bonded) {
                (true, false) => self.update_pool(ctx, |pool| pool.bonded_to_not_bonded(amount))?,
                (false, true) => self.update_pool(ctx, |pool| pool.not_bonded_to_bonded(amount))?,
                _ => {}
            }

            let shares_dst = self.bond(ctx, delegator, dst_validator, amount, false)?;

            let completion_time = now
                .checked_add(params.unbonding_time)
                .ok_or(Error::Overflow)?;
            red.add_entry(ctx.height, completion_time, amount, shares_dst);
            self.set_redelegation(ctx, &red)?;
            self.store(ctx)
                .put(red_queue_key(completion_time, delegator, src, dst), vec![])?;

            debug!(
                "{} redelegated {} from {} to {}, completes at {}",
                delegator, amount, src, dst, completion_time
            );
            Ok(completion_time)
        })
    }

    /// Pays out every matured entry of an unbonding delegation and returns
    /// the total paid.
    pub fn complete_unbonding(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
    ) -> Result<Amount> {
        ctx.transact(|ctx| {
            let mut ubd = self
                .get_unbonding_delegation(ctx, delegator, validator)?
                .ok_or(Error::UnbondingDelegationNotFound {
                    delegator,
                    validator,
                })?;

            let denom = self.params(ctx)?.bond_denom;
            let mut paid = Amount::ZERO;
            for entry in ubd.take_matured(ctx.time_seconds) {
                if entry.balance.is_zero() {
                    continue;
                }
                self.update_pool(ctx, |pool| pool.remove_not_bonded(entry.balance))?;
                self.bank.move_tokens_from_module_to_account(
                    ctx,
                    delegator,
                    &Coin::new(denom.clone(), entry.balance),
                )?;
                paid = (paid + entry.balance)?;
            }

            if ubd.entries.is_empty() {
                self.remove_unbonding_delegation(ctx, &ubd)?;
            } else {
                self.set_unbonding_delegation(ctx, &ubd)?;
            }
            self.try_remove_validator(ctx, validator)?;

            info!(
                "Completed unbonding of {} from {}: paid {}",
                delegator, validator, paid
            );
            Ok(paid)
        })
    }

    /// Drops every matured entry of a redelegation.
    pub fn complete_redelegation(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        src: Address,
        dst: Address,
    ) -> Result<()> {
        ctx.transact(|ctx| {
            let mut red = self
                .get_redelegation(ctx, delegator, src, dst)?
                .ok_or(Error::RedelegationNotFound {
                    delegator,
                    src,
                    dst,
                })?;

            let removed = red.remove_matured(ctx.time_seconds);
            if red.entries.is_empty() {
                self.remove_redelegation(ctx, &red)?;
            } else {
                self.set_redelegation(ctx, &red)?;
            }
            self.try_remove_validator(ctx, src)?;
            self.try_remove_validator(ctx, dst)?;

            debug!(
                "Completed {} redelegation entries of {} from {} to {}",
                removed, delegator, src, dst
            );
            Ok(())
        })
    }
}
