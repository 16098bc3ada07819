use crate::coins::{Address, Decimal};
use crate::context::Context;
use crate::Result;

/// Observer of validator and delegation lifecycle events, registered by
/// modules such as slashing and distribution.
///
/// Every method defaults to a no-op. Hooks run inside the keeper's
/// transaction: returning `Err` aborts the triggering operation and
/// discards all of its writes, including any the hook made itself.
#[allow(unused_variables)]
pub trait StakingHooks {
    fn after_validator_created(&mut self, ctx: &mut Context, operator: Address) -> Result<()> {
        Ok(())
    }

    fn after_validator_removed(
        &mut self,
        ctx: &mut Context,
        cons_addr: Address,
        operator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn after_validator_bonded(
        &mut self,
        ctx: &mut Context,
        cons_addr: Address,
        operator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn after_validator_begin_unbonding(
        &mut self,
        ctx: &mut Context,
        cons_addr: Address,
        operator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn before_validator_slashed(
        &mut self,
        ctx: &mut Context,
        operator: Address,
        fraction: Decimal,
    ) -> Result<()> {
        Ok(())
    }

    fn before_delegation_created(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn before_delegation_shares_modified(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn before_delegation_removed(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn after_delegation_modified(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        Ok(())
    }

    /// Called for each redelegation entry burned when its source validator
    /// is slashed.
    fn before_redelegation_slashed(
        &mut self,
        ctx: &mut Context,
        delegator: Address,
        src: Address,
        dst: Address,
        fraction: Decimal,
    ) -> Result<()> {
        Ok(())
    }
}
