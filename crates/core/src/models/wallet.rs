//! Actor funds

use crate::errors::{Error, Result};
use crate::types::Gold;
use serde::{Deserialize, Serialize};

/// One of the two independent fund stores of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundSource {
    /// Coins carried on hand
    Primary,
    /// Bank reserve, only tapped for high-value purchases
    Reserve,
}

/// An actor's two fund sources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub primary: Gold,
    pub reserve: Gold,
}

impl Wallet {
    pub fn new(primary: Gold, reserve: Gold) -> Self {
        Self { primary, reserve }
    }

    pub fn balance(&self, source: FundSource) -> Gold {
        match source {
            FundSource::Primary => self.primary,
            FundSource::Reserve => self.reserve,
        }
    }

    /// Withdraw the whole amount from a single source, or nothing at all
    pub fn withdraw(&mut self, source: FundSource, amount: Gold) -> Result<()> {
        let slot = match source {
            FundSource::Primary => &mut self.primary,
            FundSource::Reserve => &mut self.reserve,
        };
        let remaining = slot.checked_sub(amount).ok_or(Error::InsufficientFunds {
            required: amount,
            available: *slot,
        })?;
        *slot = remaining;
        Ok(())
    }
}

/// Money handed to an actor by a vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Payout {
    /// Raw coins into the primary store
    Coins(Gold),
    /// One consolidated high-value instrument (a bank check)
    BankCheck(Gold),
}

impl Payout {
    pub fn amount(&self) -> Gold {
        match self {
            Payout::Coins(g) | Payout::BankCheck(g) => *g,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdraw_never_overdraws_a_source() {
        let mut w = Wallet::new(Gold(50), Gold(500));
        let err = w.withdraw(FundSource::Primary, Gold(60)).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientFunds {
                required: Gold(60),
                available: Gold(50)
            }
        );
        assert_eq!(w.primary, Gold(50));

        w.withdraw(FundSource::Reserve, Gold(60)).unwrap();
        assert_eq!(w.reserve, Gold(440));
        assert_eq!(w.primary, Gold(50));
    }
}
