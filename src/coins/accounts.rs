use super::{Address, Amount, BankKeeper, Coin};
use crate::context::Context;
use crate::encoding::{Decode, Encode};
use crate::store::{Read, Store, Write};
use crate::{Error, Result};

const ACCOUNT: u8 = 0x01;
const MODULE: u8 = 0x02;
const SUPPLY: u8 = 0x03;

/// Store-backed token balances implementing [BankKeeper].
///
/// Balances live under `prefix` in the context's store, keyed by address and
/// denomination. The staking module's holdings are a single balance per
/// denomination.
#[derive(Clone, Debug)]
pub struct Accounts {
    prefix: Vec<u8>,
}

impl Default for Accounts {
    fn default() -> Self {
        Accounts::new(b"bank/".to_vec())
    }
}

impl Accounts {
    pub fn new(prefix: Vec<u8>) -> Self {
        Accounts { prefix }
    }

    fn store(&self, ctx: &Context) -> Store {
        ctx.store.sub(&self.prefix)
    }

    fn account_key(address: Address, denom: &str) -> Vec<u8> {
        let mut key = vec![ACCOUNT];
        key.extend_from_slice(address.as_slice());
        key.extend_from_slice(denom.as_bytes());
        key
    }

    fn module_key(denom: &str) -> Vec<u8> {
        let mut key = vec![MODULE];
        key.extend_from_slice(denom.as_bytes());
        key
    }

    fn supply_key(denom: &str) -> Vec<u8> {
        let mut key = vec![SUPPLY];
        key.extend_from_slice(denom.as_bytes());
        key
    }

    fn read(store: &Store, key: &[u8]) -> Result<Amount> {
        match store.get(key)? {
            Some(bytes) => Ok(Amount::decode(bytes.as_slice())?),
            None => Ok(Amount::ZERO),
        }
    }

    fn write(store: &mut Store, key: Vec<u8>, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            store.delete(&key)
        } else {
            store.put(key, amount.encode()?)
        }
    }

    fn take(store: &mut Store, key: Vec<u8>, amount: Amount) -> Result<()> {
        let have = Self::read(store, &key)?;
        if have < amount {
            return Err(Error::InsufficientFunds { have, need: amount });
        }
        Self::write(store, key, (have - amount)?)
    }

    fn give(store: &mut Store, key: Vec<u8>, amount: Amount) -> Result<()> {
        let have = Self::read(store, &key)?;
        Self::write(store, key, (have + amount)?)
    }

    pub fn balance(&self, ctx: &Context, address: Address, denom: &str) -> Result<Amount> {
        Self::read(&self.store(ctx), &Self::account_key(address, denom))
    }

    pub fn module_balance(&self, ctx: &Context, denom: &str) -> Result<Amount> {
        Self::read(&self.store(ctx), &Self::module_key(denom))
    }

    pub fn supply(&self, ctx: &Context, denom: &str) -> Result<Amount> {
        Self::read(&self.store(ctx), &Self::supply_key(denom))
    }

    /// Mints `coin` into the account of `address`.
    pub fn deposit(&mut self, ctx: &mut Context, address: Address, coin: &Coin) -> Result<()> {
        let mut store = self.store(ctx);
        Self::give(&mut store, Self::supply_key(&coin.denom), coin.amount)?;
        Self::give(
            &mut store,
            Self::account_key(address, &coin.denom),
            coin.amount,
        )
    }

    pub fn transfer(
        &mut self,
        ctx: &mut Context,
        from: Address,
        to: Address,
        coin: &Coin,
    ) -> Result<()> {
        ctx.transact(|ctx| {
            let mut store = self.store(ctx);
            Self::take(&mut store, Self::account_key(from, &coin.denom), coin.amount)?;
            Self::give(&mut store, Self::account_key(to, &coin.denom), coin.amount)
        })
    }
}

impl BankKeeper for Accounts {
    fn move_tokens_from_account_to_module(
        &mut self,
        ctx: &mut Context,
        from: Address,
        coin: &Coin,
    ) -> Result<()> {
        ctx.transact(|ctx| {
            let mut store = self.store(ctx);
            Self::take(&mut store, Self::account_key(from, &coin.denom), coin.amount)?;
            Self::give(&mut store, Self::module_key(&coin.denom), coin.amount)
        })
    }

    fn move_tokens_from_module_to_account(
        &mut self,
        ctx: &mut Context,
        to: Address,
        coin: &Coin,
    ) -> Result<()> {
        ctx.transact(|ctx| {
            let mut store = self.store(ctx);
            Self::take(&mut store, Self::module_key(&coin.denom), coin.amount)?;
            Self::give(&mut store, Self::account_key(to, &coin.denom), coin.amount)
        })
    }

    fn burn_module_tokens(&mut self, ctx: &mut Context, coin: &Coin) -> Result<()> {
        ctx.transact(|ctx| {
            let mut store = self.store(ctx);
            Self::take(&mut store, Self::module_key(&coin.denom), coin.amount)?;
            Self::take(&mut store, Self::supply_key(&coin.denom), coin.amount)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        [n; 20].into()
    }

    #[test]
    fn deposit_and_transfer() -> Result<()> {
        let mut ctx = Context::in_memory();
        let mut bank = Accounts::default();

        bank.deposit(&mut ctx, addr(1), &Coin::new("stake", 100u64))?;
        bank.transfer(&mut ctx, addr(1), addr(2), &Coin::new("stake", 30u64))?;

        assert_eq!(bank.balance(&ctx, addr(1), "stake")?, Amount::new(70));
        assert_eq!(bank.balance(&ctx, addr(2), "stake")?, Amount::new(30));
        assert_eq!(bank.balance(&ctx, addr(2), "atom")?, Amount::ZERO);
        assert_eq!(bank.supply(&ctx, "stake")?, Amount::new(100));
        Ok(())
    }

    #[test]
    fn insufficient_funds() -> Result<()> {
        let mut ctx = Context::in_memory();
        let mut bank = Accounts::default();
        bank.deposit(&mut ctx, addr(1), &Coin::new("stake", 10u64))?;

        let res = bank.move_tokens_from_account_to_module(
            &mut ctx,
            addr(1),
            &Coin::new("stake", 11u64),
        );
        assert!(matches!(res, Err(Error::InsufficientFunds { .. })));
        assert_eq!(bank.balance(&ctx, addr(1), "stake")?, Amount::new(10));
        assert_eq!(bank.module_balance(&ctx, "stake")?, Amount::ZERO);
        Ok(())
    }

    #[test]
    fn module_roundtrip_and_burn() -> Result<()> {
        let mut ctx = Context::in_memory();
        let mut bank = Accounts::default();
        bank.deposit(&mut ctx, addr(1), &Coin::new("stake", 50u64))?;

        let coin = Coin::new("stake", 40u64);
        bank.move_tokens_from_account_to_module(&mut ctx, addr(1), &coin)?;
        bank.move_tokens_from_module_to_account(&mut ctx, addr(3), &Coin::new("stake", 15u64))?;
        bank.burn_module_tokens(&mut ctx, &Coin::new("stake", 5u64))?;

        assert_eq!(bank.balance(&ctx, addr(1), "stake")?, Amount::new(10));
        assert_eq!(bank.balance(&ctx, addr(3), "stake")?, Amount::new(15));
        assert_eq!(bank.module_balance(&ctx, "stake")?, Amount::new(20));
        assert_eq!(bank.supply(&ctx, "stake")?, Amount::new(45));
        Ok(())
    }
}
