use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint256;

use crate::decimals::{convert, scale_up, AmountError, Rounding};

/// A chain with its own account namespace and smallest-unit precision
#[cw_serde]
#[derive(Eq, Hash)]
pub struct Ledger {
    /// Symbolic chain name (e.g., "prime", "nexus")
    pub chain_id: String,

    /// Decimal exponent of the smallest unit
    pub decimals: u32,
}

impl Ledger {
    pub fn new(chain_id: impl Into<String>, decimals: u32) -> Self {
        Self {
            chain_id: chain_id.into(),
            decimals,
        }
    }

    /// Express a whole-unit amount in this ledger's smallest unit
    pub fn to_smallest_unit(&self, whole: Uint256) -> Result<Uint256, AmountError> {
        scale_up(whole, 0, self.decimals)
    }

    /// Convert an amount in this ledger's smallest unit to another ledger's
    pub fn convert_to(
        &self,
        amount: Uint256,
        other: &Ledger,
        rounding: Rounding,
    ) -> Result<Uint256, AmountError> {
        convert(amount, self.decimals, other.decimals, rounding)
    }
}

/// A party that sends or receives transfers
#[cw_serde]
#[derive(Eq, Hash, PartialOrd, Ord)]
pub struct Account {
    /// Opaque identity, resolved to a chain address by the collaborators
    pub id: String,
}

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}
