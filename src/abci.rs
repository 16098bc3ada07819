//! Glue between the staking keeper and an ABCI consensus engine.

use std::convert::TryFrom;

use tendermint_proto::v0_34::abci::{
    RequestBeginBlock, RequestEndBlock, ResponseEndBlock, ValidatorUpdate as AbciValidatorUpdate,
};
use tendermint_proto::v0_34::crypto::{public_key::Sum, PublicKey};

use crate::context::Context;
use crate::staking::{Keeper, ValidatorUpdate};
use crate::{Error, Result};

impl TryFrom<ValidatorUpdate> for AbciValidatorUpdate {
    type Error = Error;

    fn try_from(update: ValidatorUpdate) -> Result<Self> {
        let power = i64::try_from(update.power).map_err(|_| Error::Overflow)?;
        let sum = Some(Sum::Ed25519(update.consensus_key.to_vec()));
        Ok(AbciValidatorUpdate {
            pub_key: Some(PublicKey { sum }),
            power,
        })
    }
}

impl TryFrom<AbciValidatorUpdate> for ValidatorUpdate {
    type Error = Error;

    fn try_from(update: AbciValidatorUpdate) -> Result<Self> {
        let key = match update.pub_key.and_then(|key| key.sum) {
            Some(Sum::Ed25519(key)) => key,
            _ => return Err(Error::InvalidParams("Expected ed25519 public key".into())),
        };
        let consensus_key: [u8; 32] = key
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidParams(format!("Invalid key length {}", key.len())))?;
        let power = u64::try_from(update.power)
            .map_err(|_| Error::InvalidAmount(format!("Negative power {}", update.power)))?;

        Ok(ValidatorUpdate {
            consensus_key,
            power,
        })
    }
}

/// Block lifecycle handlers of a module driven by ABCI requests.
///
/// Both methods have a default implementation which does nothing.
pub trait Application {
    fn begin_block(&mut self, _ctx: &mut Context, _req: &RequestBeginBlock) -> Result<()> {
        Ok(())
    }

    fn end_block(&mut self, _ctx: &mut Context, _req: &RequestEndBlock) -> Result<ResponseEndBlock> {
        Ok(Default::default())
    }
}

/// Moves `ctx` to the height and time in the block header.
pub fn enter_block(ctx: &mut Context, req: &RequestBeginBlock) -> Result<()> {
    let header = req
        .header
        .as_ref()
        .ok_or_else(|| Error::InvalidParams("Missing block header".into()))?;
    let height = u64::try_from(header.height)
        .map_err(|_| Error::InvalidParams(format!("Invalid height {}", header.height)))?;
    let time = header.time.as_ref().map_or(0, |time| time.seconds);

    ctx.begin_block(height, time);
    Ok(())
}

impl Application for Keeper {
    fn begin_block(&mut self, ctx: &mut Context, req: &RequestBeginBlock) -> Result<()> {
        enter_block(ctx, req)
    }

    fn end_block(&mut self, ctx: &mut Context, _req: &RequestEndBlock) -> Result<ResponseEndBlock> {
        let validator_updates = ctx.transact(|ctx| {
            Keeper::end_block(self, ctx)?
                .into_iter()
                .map(AbciValidatorUpdate::try_from)
                .collect::<Result<_>>()
        })?;

        Ok(ResponseEndBlock {
            validator_updates,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tendermint_proto::google::protobuf::Timestamp;
    use tendermint_proto::v0_34::types::Header;

    use crate::coins::{Accounts, Address, Coin};
    use crate::staking::{BondStatus, Commission, Description, GenesisState};

    #[test]
    fn update_to_proto() {
        let update = ValidatorUpdate {
            consensus_key: [7; 32],
            power: 42,
        };
        let proto = AbciValidatorUpdate::try_from(update.clone()).unwrap();
        assert_eq!(proto.power, 42);
        assert_eq!(
            proto.pub_key.clone().and_then(|key| key.sum),
            Some(Sum::Ed25519(vec![7; 32]))
        );
        assert_eq!(ValidatorUpdate::try_from(proto).unwrap(), update);
    }

    #[test]
    fn power_overflow() {
        let update = ValidatorUpdate {
            consensus_key: [1; 32],
            power: u64::MAX,
        };
        assert!(matches!(
            AbciValidatorUpdate::try_from(update),
            Err(Error::Overflow)
        ));
    }

    #[test]
    fn rejects_bad_key() {
        let update = AbciValidatorUpdate {
            pub_key: Some(PublicKey {
                sum: Some(Sum::Ed25519(vec![1; 31])),
            }),
            power: 1,
        };
        assert!(ValidatorUpdate::try_from(update).is_err());
        assert!(ValidatorUpdate::try_from(AbciValidatorUpdate::default()).is_err());
    }

    #[test]
    fn enter_block_from_header() {
        let mut ctx = Context::in_memory();
        let req = RequestBeginBlock {
            header: Some(Header {
                height: 12,
                time: Some(Timestamp {
                    seconds: 1_000,
                    nanos: 5,
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        enter_block(&mut ctx, &req).unwrap();
        assert_eq!(ctx.height, 12);
        assert_eq!(ctx.time_seconds, 1_000);

        assert!(enter_block(&mut ctx, &RequestBeginBlock::default()).is_err());
    }

    #[test]
    fn unrepresentable_power_leaves_block_open() {
        let mut ctx = Context::in_memory();
        ctx.begin_block(1, 1_000);
        let mut bank = Accounts::default();
        let mut keeper = Keeper::new(Box::new(Accounts::default()));
        keeper
            .init_genesis(&mut ctx, &GenesisState::default())
            .unwrap();

        let operator = Address::from([1; 20]);
        let stake = Coin::new("stake", 10_000_000_000_000_000_000u64);
        bank.deposit(&mut ctx, operator, &stake).unwrap();
        keeper
            .create_validator(
                &mut ctx,
                operator,
                [1; 32],
                Description::new("whale"),
                Commission::default(),
                stake,
            )
            .unwrap();

        let res = Application::end_block(&mut keeper, &mut ctx, &RequestEndBlock::default());
        assert!(matches!(res, Err(Error::Overflow)));

        let validator = keeper.validator(&ctx, operator).unwrap();
        assert_eq!(validator.status, BondStatus::Unbonded);
        assert_eq!(keeper.last_validator_power(&ctx, operator).unwrap(), None);
        assert_eq!(keeper.pool(&ctx).unwrap().bonded_tokens.value(), 0);
    }
}
