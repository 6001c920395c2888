//! Money is a decimal amount with three fraction digits, carried over the
//! wire and stored in the database as a string like `"25.500"`.
use std::fmt;
use std::io::Write;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::VarChar;
use failure::Error as FailureError;
use rust_decimal::Decimal;
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::{Serialize, Serializer};

use errors::Error;

pub const MONEY_SCALE: u32 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, AsExpression, FromSqlRow)]
#[sql_type = "VarChar"]
pub struct Money(Decimal);

impl Money {
    pub fn new(value: Decimal) -> Self {
        Money(value.round_dp(MONEY_SCALE))
    }

    pub fn zero() -> Self {
        Money(Decimal::new(0, MONEY_SCALE))
    }

    pub fn decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Line amount for `quantity` units, saturates at the decimal bounds
    pub fn times(&self, quantity: i32) -> Money {
        Money::new(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Line amount for `quantity` units, `None` on overflow
    pub fn checked_times(&self, quantity: i32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money::new)
    }

    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money::new)
    }
}

impl FromStr for Money {
    type Err = FailureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money::new)
            .map_err(|e| format_err!("Invalid amount {:?}: {}", s, e).context(Error::Parse).into())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut value = self.0;
        value.rescale(MONEY_SCALE);
        write!(f, "{}", value)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::new(self.0.saturating_add(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a decimal amount as a string or a number")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Money, E> {
        Money::from_str(value).map_err(|_| E::custom(format!("invalid amount: {}", value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Money, E> {
        Ok(Money::new(Decimal::from(value)))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Money, E> {
        Ok(Money::new(Decimal::from(value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Money, E> {
        self.visit_str(&value.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

impl ToSql<VarChar, Pg> for Money {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
        out.write_all(self.to_string().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<VarChar, Pg> for Money {
    fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
        let value = <String as FromSql<VarChar, Pg>>::from_sql(bytes)?;
        Decimal::from_str(&value)
            .map(Money::new)
            .map_err(|e| format!("Invalid money value {:?}: {}", value, e).into())
    }
}
