use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const INR_CURRENCY_CODE: &str = "INR";

//--------------------------------------       Paise        ---------------------------------------------------------
/// An amount of Indian rupees, held in paise (1/100 of a rupee), the smallest unit the payment gateway accepts.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Paise(i64);

op!(binary Paise, Add, add);
op!(binary Paise, Sub, sub);
op!(inplace Paise, AddAssign, add_assign);

impl Sum for Paise {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paise: {0}")]
pub struct PaiseConversionError(String);

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Paise {
    type Error = PaiseConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| PaiseConversionError(format!("Value {value} is too large to convert to Paise")))
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}₹{}.{:02}", abs / 100, abs % 100)
    }
}

impl Paise {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    /// Gateways reject zero and negative amounts
    pub fn is_chargeable(&self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
mod test {
    use super::Paise;

    #[test]
    fn display() {
        assert_eq!(Paise::from(12_345).to_string(), "₹123.45");
        assert_eq!(Paise::from(5).to_string(), "₹0.05");
        assert_eq!(Paise::from(-250).to_string(), "-₹2.50");
        assert_eq!(Paise::from_rupees(40).to_string(), "₹40.00");
    }

    #[test]
    fn arithmetic() {
        let total: Paise = [Paise::from(100), Paise::from(250)].into_iter().sum();
        assert_eq!(total, Paise::from(350));
        assert!(total.is_chargeable());
        assert!(!Paise::default().is_chargeable());
        assert!(Paise::try_from(u64::MAX).is_err());
    }
}
