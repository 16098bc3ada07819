use log::{info, warn};

use super::{BondStatus, Keeper, Redelegation, UnbondingDelegation};
use crate::coins::{Address, Amount, Coin, Decimal};
use crate::context::Context;
use crate::{Error, Result};

impl Keeper {
    /// Burns `fraction` of the stake that backed the validator with consensus
    /// address `cons_addr` at `infraction_height`, when it had voting power
    /// `power`. Returns the tokens burned.
    ///
    /// Unbonding delegations and redelegations begun at or after the
    /// infraction are slashed first. The remainder is taken from the
    /// validator's tokens, which lowers its exchange rate.
    pub fn slash(
        &mut self,
        ctx: &mut Context,
        cons_addr: Address,
        infraction_height: u64,
        power: u64,
        fraction: Decimal,
    ) -> Result<Amount> {
        if fraction.is_negative() || fraction >= Decimal::one() {
            return Err(Error::InvalidAmount(format!(
                "Slash fraction must be in [0, 1), got {}",
                fraction
            )));
        }
        if infraction_height > ctx.height {
            return Err(Error::InvalidAmount(format!(
                "Cannot slash for future infraction at height {}",
                infraction_height
            )));
        }

        ctx.transact(|ctx| {
            let validator = match self.get_validator_by_cons_addr(ctx, cons_addr)? {
                Some(validator) => validator,
                None => {
                    warn!("Ignored slash of nonexistent validator {}", cons_addr);
                    return Ok(Amount::ZERO);
                }
            };
            let operator = validator.operator;

            self.call_hooks(ctx, |hooks, ctx| {
                hooks.before_validator_slashed(ctx, operator, fraction)
            })?;

            let slash_amount = (Decimal::from(power) * fraction)?.floor_amount()?;
            let mut remaining = slash_amount;
            let mut burned = Amount::ZERO;

            if infraction_height < ctx.height {
                for ubd in self.get_validator_unbonding_delegations(ctx, operator)? {
                    let amount =
                        self.slash_unbonding_delegation(ctx, ubd, infraction_height, fraction)?;
                    remaining = remaining.saturating_sub(amount);
                    burned = (burned + amount)?;
                }
                for red in self.get_redelegations_from_validator(ctx, operator)? {
                    let (intended, amount) =
                        self.slash_redelegation(ctx, red, infraction_height, fraction)?;
                    remaining = remaining.saturating_sub(intended);
                    burned = (burned + amount)?;
                }
            }

            let mut validator = self.validator(ctx, operator)?;
            let mut to_burn = remaining.min(validator.tokens);
            if !validator.delegator_shares.is_zero() && to_burn == validator.tokens {
                to_burn = validator.tokens.saturating_sub(1u64.into());
            }
            if !to_burn.is_zero() {
                validator.remove_tokens(to_burn)?;
                self.set_validator(ctx, &validator)?;
                let bonded = validator.status == BondStatus::Bonded;
                self.burn(ctx, to_burn, bonded)?;
                burned = (burned + to_burn)?;
            }

            info!(
                "Slashed validator {} by {} for infraction at height {}: burned {} of {}",
                operator, fraction, infraction_height, burned, slash_amount
            );
            Ok(burned)
        })
    }

    fn burn(&mut self, ctx: &mut Context, amount: Amount, bonded: bool) -> Result<()> {
        self.update_pool(ctx, |pool| {
            if bonded {
                pool.remove_bonded(amount)
            } else {
                pool.remove_not_bonded(amount)
            }
        })?;
        let coin = Coin::new(self.params(ctx)?.bond_denom, amount);
        self.bank.burn_module_tokens(ctx, &coin)
    }

    /// Slashes the entries of `ubd` created at or after `infraction_height`
    /// which have not yet matured. Returns the tokens burned.
    fn slash_unbonding_delegation(
        &mut self,
        ctx: &mut Context,
        mut ubd: UnbondingDelegation,
        infraction_height: u64,
        fraction: Decimal,
    ) -> Result<Amount> {
        let now = ctx.time_seconds;
        let mut burned = Amount::ZERO;

        for entry in ubd.entries.iter_mut() {
            if entry.creation_height < infraction_height || entry.is_mature(now) {
                continue;
            }
            let slash_amount =
                (Decimal::from(entry.initial_balance) * fraction)?.floor_amount()?;
            let amount = slash_amount.min(entry.balance);
            entry.balance = (entry.balance - amount)?;
            burned = (burned + amount)?;
        }

        if !burned.is_zero() {
            self.set_unbonding_delegation(ctx, &ubd)?;
            self.burn(ctx, burned, false)?;
        }

        Ok(burned)
    }

    /// Slashes the entries of `red` created at or after `infraction_height`
    /// which have not yet matured, by unbonding and burning the shares they
    /// added at the destination. Returns the amount the entries were liable
    /// for and the tokens actually burned.
    fn slash_redelegation(
        &mut self,
        ctx: &mut Context,
        red: Redelegation,
        infraction_height: u64,
        fraction: Decimal,
    ) -> Result<(Amount, Amount)> {
        let now = ctx.time_seconds;
        let mut intended = Amount::ZERO;
        let mut burned = Amount::ZERO;
        let (delegator, src, dst) = (red.delegator, red.src, red.dst);

        for entry in red.entries.iter() {
            if entry.creation_height < infraction_height || entry.is_mature(now) {
                continue;
            }
            let slash_amount =
                (Decimal::from(entry.initial_balance) * fraction)?.floor_amount()?;
            intended = (intended + slash_amount)?;

            let mut shares = (entry.shares_dst * fraction)?.truncate();
            if shares.is_zero() {
                continue;
            }
            let delegation = match self.get_delegation(ctx, delegator, dst)? {
                Some(delegation) => delegation,
                None => continue,
            };
            shares = shares.min(delegation.shares);

            self.call_hooks(ctx, |hooks, ctx| {
                hooks.before_redelegation_slashed(ctx, delegator, src, dst, fraction)
            })?;

            let (amount, status) = self.unbond(ctx, delegator, dst, shares)?;
            if !amount.is_zero() {
                self.burn(ctx, amount, status == BondStatus::Bonded)?;
                burned = (burned + amount)?;
            }
        }

        Ok((intended, burned))
    }
}
