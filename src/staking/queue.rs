use log::{debug, info};

use super::keys::*;
use super::{BondStatus, Keeper};
use crate::context::Context;
use crate::store::{Store, Write, KV};
use crate::{Error, Result};

/// Entries in a time-ordered queue whose completion time is at or before
/// `now`, in key order.
fn matured(store: &Store, queue: u8, now: i64) -> Result<Vec<KV>> {
    store
        .range(vec![queue]..queue_end(queue, now))
        .collect()
}

impl Keeper {
    /// Completes the unbonding delegations, redelegations and validator
    /// unbondings which have matured by the current block time.
    pub fn process_queues(&mut self, ctx: &mut Context) -> Result<()> {
        ctx.transact(|ctx| {
            self.process_validator_queue(ctx)?;
            self.process_unbonding_queue(ctx)?;
            self.process_redelegation_queue(ctx)
        })
    }

    fn process_validator_queue(&mut self, ctx: &mut Context) -> Result<()> {
        let now = ctx.time_seconds;
        for (key, _) in matured(&self.store(ctx), VALIDATOR_QUEUE, now)? {
            self.store(ctx).delete(&key)?;
            let operator = split_addresses(&key[9..], 1)?[0];

            let mut validator = match self.get_validator(ctx, operator)? {
                Some(validator) => validator,
                None => continue,
            };
            if validator.status != BondStatus::Unbonding
                || validator.unbonding_completion_time > now
            {
                continue;
            }

            validator.status = BondStatus::Unbonded;
            self.set_validator(ctx, &validator)?;
            info!("Validator {} is now unbonded", operator);

            self.try_remove_validator(ctx, operator)?;
        }

        Ok(())
    }

    fn process_unbonding_queue(&mut self, ctx: &mut Context) -> Result<()> {
        let now = ctx.time_seconds;
        let entries = matured(&self.store(ctx), UNBONDING_QUEUE, now)?;
        if !entries.is_empty() {
            debug!("{} matured unbonding queue entries", entries.len());
        }

        for (key, _) in entries {
            self.store(ctx).delete(&key)?;
            let addrs = split_addresses(&key[9..], 2)?;
            match self.complete_unbonding(ctx, addrs[0], addrs[1]) {
                Ok(_) | Err(Error::UnbondingDelegationNotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    fn process_redelegation_queue(&mut self, ctx: &mut Context) -> Result<()> {
        let now = ctx.time_seconds;
        let entries = matured(&self.store(ctx), REDELEGATION_QUEUE, now)?;
        if !entries.is_empty() {
            debug!("{} matured redelegation queue entries", entries.len());
        }

        for (key, _) in entries {
            self.store(ctx).delete(&key)?;
            let addrs = split_addresses(&key[9..], 3)?;
            match self.complete_redelegation(ctx, addrs[0], addrs[1], addrs[2]) {
                Ok(()) | Err(Error::RedelegationNotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}
