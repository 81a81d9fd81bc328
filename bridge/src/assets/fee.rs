// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Decimal normalisation and bridge fee arithmetic.

use crate::error::{BridgeError, BridgeResult};
use crate::hedera::{AccountAmount, AccountId};
use ethers::types::{U256, U512};
use rust_decimal::Decimal;

/// Fee percentages are expressed in thousandths of a percent.
pub const FEE_MAX_PERCENTAGE: u64 = 100_000;

/// Largest precision whose unit, `10^decimals`, fits in 256 bits.
pub const MAX_DECIMALS: usize = 77;

/// Re-expresses `amount` from `from_decimals` to `to_decimals`.
///
/// Fails when the result underflows to zero or does not fit in 256 bits.
pub fn convert_decimals(amount: U256, from_decimals: u8, to_decimals: u8) -> BridgeResult<U256> {
    let converted = if to_decimals >= from_decimals {
        let factor = pow10(to_decimals - from_decimals)?;
        amount.checked_mul(factor).ok_or_else(|| {
            BridgeError::AmountOverflow(format!(
                "{amount} from {from_decimals} to {to_decimals} decimals"
            ))
        })?
    } else {
        amount / pow10(from_decimals - to_decimals)?
    };
    if converted.is_zero() {
        return Err(BridgeError::ZeroAmount(format!(
            "{amount} from {from_decimals} to {to_decimals} decimals"
        )));
    }
    Ok(converted)
}

fn pow10(exp: u8) -> BridgeResult<U256> {
    U256::from(10u8)
        .checked_pow(U256::from(exp))
        .ok_or_else(|| BridgeError::AmountOverflow(format!("10^{exp}")))
}

pub fn calculate_fee(amount: u64, fee_percentage: u64) -> u64 {
    ((amount as u128 * fee_percentage as u128) / FEE_MAX_PERCENTAGE as u128) as u64
}

/// Transfer list for releasing `amount` from the bridge account.
///
/// The fee is rounded down to a multiple of the member count and split evenly. Whatever is
/// not distributed goes to the receiver.
pub fn fee_transfers(
    amount: i64,
    fee_percentage: u64,
    bridge_account: AccountId,
    receiver: AccountId,
    members: &[AccountId],
) -> BridgeResult<Vec<AccountAmount>> {
    if amount <= 0 {
        return Err(BridgeError::ZeroAmount(amount.to_string()));
    }
    let fee = calculate_fee(amount as u64, fee_percentage) as i64;
    let member_count = members.len() as i64;
    let share = if member_count == 0 { 0 } else { fee / member_count };
    let valid_fee = share * member_count;

    let mut transfers = Vec::with_capacity(members.len() + 2);
    transfers.push(AccountAmount {
        account: bridge_account,
        amount: -amount,
    });
    transfers.push(AccountAmount {
        account: receiver,
        amount: amount - valid_fee,
    });
    if share > 0 {
        transfers.extend(members.iter().map(|m| AccountAmount {
            account: *m,
            amount: share,
        }));
    }
    Ok(transfers)
}

/// Smallest amount, in units of an asset with `decimals`, whose fee covers `min_fee_usd`.
///
/// Both decimals are taken as `mantissa / 10^scale` and the quotient is computed on 512 bit
/// integers, so any price and up to 77 decimals stay exact.
pub fn min_amount_with_fee(
    min_fee_usd: Decimal,
    usd_price: Decimal,
    decimals: u8,
    fee_percentage: u64,
) -> BridgeResult<U256> {
    if min_fee_usd.is_zero() || fee_percentage == 0 {
        return Ok(U256::zero());
    }
    if usd_price <= Decimal::ZERO || min_fee_usd < Decimal::ZERO {
        return Err(BridgeError::InternalError(format!(
            "cannot price a fee of {min_fee_usd} usd at {usd_price} usd"
        )));
    }
    let overflow = || BridgeError::AmountOverflow(format!("min amount for {decimals} decimals"));
    if usize::from(decimals) > MAX_DECIMALS {
        return Err(overflow());
    }
    let mantissa = |value: Decimal| U512::from(value.mantissa().unsigned_abs());
    let exp10 = |scale: u32| U512::exp10(scale as usize);

    // min_fee * FEE_MAX * 10^decimals / (price * fee_percentage)
    let numerator = mantissa(min_fee_usd)
        .checked_mul(exp10(usd_price.scale()))
        .and_then(|v| v.checked_mul(U512::from(FEE_MAX_PERCENTAGE)))
        .and_then(|v| v.checked_mul(U512::exp10(usize::from(decimals))))
        .ok_or_else(overflow)?;
    let denominator = mantissa(usd_price)
        .checked_mul(exp10(min_fee_usd.scale()))
        .and_then(|v| v.checked_mul(U512::from(fee_percentage)))
        .ok_or_else(overflow)?;
    let (quotient, remainder) = numerator.div_mod(denominator);
    let amount = if remainder.is_zero() {
        quotient
    } else {
        quotient + U512::one()
    };
    U256::try_from(amount).map_err(|_| overflow())
}

/// Parses a decimal string amount into a ledger amount.
pub fn ledger_amount(amount: &str) -> BridgeResult<i64> {
    let value = U256::from_dec_str(amount)
        .map_err(|e| BridgeError::Generic(format!("invalid amount {amount}: {e}")))?;
    if value > U256::from(i64::MAX as u64) {
        return Err(BridgeError::AmountOverflow(format!(
            "{amount} exceeds ledger amount range"
        )));
    }
    Ok(value.as_u64() as i64)
}
