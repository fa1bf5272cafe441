use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------       Tokens        ---------------------------------------------------------
/// An amount of the auction token, in its smallest indivisible unit.
///
/// Bid amounts, refunds and awards are all expressed in `Tokens`. Amounts are never fractional; values derived from
/// floating point scores are floored before they become `Tokens` (see [`Tokens::floor_from_f64`]).
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Tokens(i64);

macro_rules! delegate_arithmetic {
    ($($op:ident::$op_fn:ident, $assign:ident::$assign_fn:ident);+) => {$(
        impl $op for Tokens {
            type Output = Self;

            fn $op_fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$op_fn(rhs.0))
            }
        }

        impl $assign for Tokens {
            fn $assign_fn(&mut self, rhs: Self) {
                self.0.$assign_fn(rhs.0)
            }
        }
    )+};
}

delegate_arithmetic!(Add::add, AddAssign::add_assign; Sub::sub, SubAssign::sub_assign);

impl Mul<i64> for Tokens {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Tokens {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a token amount: {0}")]
pub struct TokensConversionError(String);

impl From<i64> for Tokens {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Tokens {
    type Error = TokensConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(TokensConversionError(format!("Value {value} is too large to convert to Tokens")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}₮", self.0)
    }
}

impl Tokens {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Floors a non-negative, finite floating point value into a token amount.
    pub fn floor_from_f64(value: f64) -> Result<Self, TokensConversionError> {
        if !value.is_finite() || value < 0.0 {
            return Err(TokensConversionError(format!("{value} is not a finite, non-negative number")));
        }
        let floored = value.floor();
        if floored >= i64::MAX as f64 {
            return Err(TokensConversionError(format!("{value} is too large to convert to Tokens")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(floored as i64))
    }
}
