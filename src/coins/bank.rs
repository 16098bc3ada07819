use super::{Address, Coin};
use crate::context::Context;
use crate::Result;

/// Moves fungible tokens between accounts and the staking module's holdings.
///
/// Implementations write through `ctx.store` so their effects commit or roll
/// back together with the keeper operation that called them. A transfer
/// which would overdraw an account fails with `Error::InsufficientFunds`.
pub trait BankKeeper {
    fn move_tokens_from_account_to_module(
        &mut self,
        ctx: &mut Context,
        from: Address,
        coin: &Coin,
    ) -> Result<()>;

    fn move_tokens_from_module_to_account(
        &mut self,
        ctx: &mut Context,
        to: Address,
        coin: &Coin,
    ) -> Result<()>;

    /// Destroys tokens held by the module, reducing total supply.
    fn burn_module_tokens(&mut self, ctx: &mut Context, coin: &Coin) -> Result<()>;
}
