//! Currency amounts as whole minor units (§3 — every example in spec.md uses
//! integral amounts; there is no fractional-currency requirement in scope).
//! Kept as a plain `i64` newtype rather than `BigDecimal` so the budget
//! solver (§4.6) and bid pipeline (§4.4) stay pure integer arithmetic; the
//! persistence boundary converts to/from the `NUMERIC` column at the edge
//! (see `crate::persistence::dto`).

use {
    serde::{Deserialize, Serialize},
    std::{
        fmt,
        iter::Sum,
        ops::{Add, Sub},
    },
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn saturating_sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }

    pub fn max(self, rhs: Money) -> Money {
        Money(self.0.max(rhs.0))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
