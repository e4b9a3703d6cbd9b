//! Fixed-point conversion between ledgers with different decimal precision
//!
//! Amounts are always expressed in a ledger's smallest unit. Moving an amount
//! to a ledger with more decimals is exact; moving it to a ledger with fewer
//! decimals loses the remainder, which is either discarded (`Truncate`) or
//! rounded towards the receiver (`Up`).

use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest-unit precision of Cardano-style ledgers (lovelace / dfm)
pub const DFM_DECIMALS: u32 = 6;

/// Smallest-unit precision of EVM-style ledgers (wei)
pub const WEI_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount {amount} overflows when scaling from {from} to {to} decimals")]
    Overflow { amount: Uint256, from: u32, to: u32 },

    #[error("cannot scale {direction} from {from} to {to} decimals")]
    WrongDirection {
        direction: &'static str,
        from: u32,
        to: u32,
    },

    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// Policy applied when precision is lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Discard the remainder; never credits more than was sent
    Truncate,
    /// Add one smallest unit when a remainder exists; the receiver gets at least the amount
    Up,
}

/// `10^diff`, failing once it no longer fits in 256 bits
fn scale_factor(diff: u32, amount: Uint256, from: u32, to: u32) -> Result<Uint256, AmountError> {
    Uint256::from(10u128)
        .checked_pow(diff)
        .map_err(|_| AmountError::Overflow { amount, from, to })
}

/// Scale an amount to a ledger with at least as many decimals. Exact.
pub fn scale_up(amount: Uint256, from: u32, to: u32) -> Result<Uint256, AmountError> {
    if to < from {
        return Err(AmountError::WrongDirection {
            direction: "up",
            from,
            to,
        });
    }

    let factor = scale_factor(to - from, amount, from, to)?;
    amount
        .checked_mul(factor)
        .map_err(|_| AmountError::Overflow { amount, from, to })
}

/// Scale an amount to a ledger with at most as many decimals, discarding the remainder
pub fn scale_down_truncating(amount: Uint256, from: u32, to: u32) -> Result<Uint256, AmountError> {
    let (quotient, _) = div_rem(amount, from, to)?;
    Ok(quotient)
}

/// Scale an amount to a ledger with at most as many decimals, rounding a remainder up
pub fn scale_down_round_up(amount: Uint256, from: u32, to: u32) -> Result<Uint256, AmountError> {
    let (quotient, remainder) = div_rem(amount, from, to)?;
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        // quotient <= MAX / 10 so this cannot overflow
        Ok(quotient + Uint256::one())
    }
}

fn div_rem(amount: Uint256, from: u32, to: u32) -> Result<(Uint256, Uint256), AmountError> {
    if to > from {
        return Err(AmountError::WrongDirection {
            direction: "down",
            from,
            to,
        });
    }

    // 10^78 does not fit, but then every amount divides to zero
    let factor = match Uint256::from(10u128).checked_pow(from - to) {
        Ok(factor) => factor,
        Err(_) => return Ok((Uint256::zero(), amount)),
    };

    Ok((amount / factor, amount % factor))
}

/// Convert an amount between two precisions in either direction
pub fn convert(
    amount: Uint256,
    from: u32,
    to: u32,
    rounding: Rounding,
) -> Result<Uint256, AmountError> {
    if to >= from {
        return scale_up(amount, from, to);
    }

    match rounding {
        Rounding::Truncate => scale_down_truncating(amount, from, to),
        Rounding::Up => scale_down_round_up(amount, from, to),
    }
}

/// Parse a non-negative integer amount
pub fn parse_amount(raw: &str) -> Result<Uint256, AmountError> {
    let trimmed = raw.trim().replace('_', "");
    if trimmed.is_empty() {
        return Err(AmountError::Invalid("empty amount".to_string()));
    }

    trimmed
        .parse::<Uint256>()
        .map_err(|e| AmountError::Invalid(format!("{raw}: {e}")))
}
