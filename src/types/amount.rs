use crate::types::errors::AmountError;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// An exact, strictly positive decimal quantity.
///
/// Construction is the only place positivity is checked; once a value exists the
/// storage layer can hold it without re-validating.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value.to_string()));
        }

        Ok(Amount(value))
    }
}

impl Display for Amount {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.is_empty() {
            return Err(AmountError::InvalidFormat("Value is an empty string".to_string()));
        }

        //NOTE: from_str would round digits beyond what Decimal holds, from_str_exact refuses them instead
        let decimal = Decimal::from_str_exact(value).map_err(|error| {
            AmountError::InvalidFormat(format!("Value '{value}' is not a decimal: {error}"))
        })?;

        Amount::try_from(decimal)
    }
}
