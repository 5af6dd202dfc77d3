//! Tenure based accrual.
//!
//! Every balance is derived from whole months elapsed between the hire date
//! and an as-of date. Nothing here is persisted and nothing is deducted for
//! leave already taken.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use crate::leave::availability::Availability;
use crate::model::leave_request::LeaveType;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const SICK_DAYS_PER_MONTH: u64 = 2;
/// 1.5 days a month, kept in half days.
const ANNUAL_HALF_DAYS_PER_MONTH: u64 = 3;
const COMPASSIONATE_DAYS_PER_QUARTER: u64 = 7;
const MATERNITY_DAYS_PER_YEAR: u64 = 90;

/// Calendar date in `YYYY-MM-DD` form, `None` for anything else.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Whole months between `hire_date` and `as_of`.
///
/// The running month only counts once `as_of` reaches the hire day of month.
/// Returns 0 when `as_of` precedes the hire date.
pub fn months_elapsed(hire_date: NaiveDate, as_of: NaiveDate) -> u32 {
    if as_of < hire_date {
        return 0;
    }

    let years = as_of.year() - hire_date.year();
    let months = as_of.month() as i32 - hire_date.month() as i32;
    let mut total = years * 12 + months;
    if as_of.day() < hire_date.day() {
        total -= 1;
    }

    u32::try_from(total).unwrap_or(0)
}

/// Exact leave quantity in half-day steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Days {
    halves: u64,
}

impl Days {
    pub const fn whole(days: u64) -> Self {
        Self {
            halves: days.saturating_mul(2),
        }
    }

    pub const fn from_halves(halves: u64) -> Self {
        Self { halves }
    }

    pub fn as_f64(self) -> f64 {
        self.halves as f64 / 2.0
    }

    /// True when `requested` whole days fit in this quantity.
    pub fn covers(self, requested: u64) -> bool {
        requested.saturating_mul(2) <= self.halves
    }
}

impl fmt::Display for Days {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tenths = if self.halves % 2 == 1 { 5 } else { 0 };
        write!(f, "{}.{}", self.halves / 2, tenths)
    }
}

impl Serialize for Days {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct BalanceSnapshot {
    #[schema(example = 20)]
    pub sick_days: u64,
    #[schema(example = 15.0, value_type = f64)]
    pub annual_days: Days,
    #[schema(example = 21)]
    pub compassionate_days: u64,
    #[schema(example = 75)]
    pub maternity_days: u64,
}

impl BalanceSnapshot {
    pub fn from_months(months: u32) -> Self {
        let m = u64::from(months);
        Self {
            sick_days: m * SICK_DAYS_PER_MONTH,
            annual_days: Days::from_halves(m * ANNUAL_HALF_DAYS_PER_MONTH),
            compassionate_days: (m / 3) * COMPASSIONATE_DAYS_PER_QUARTER,
            maternity_days: m * MATERNITY_DAYS_PER_YEAR / 12,
        }
    }

    pub fn availability(&self, leave_type: &LeaveType) -> Availability {
        match leave_type {
            LeaveType::Sick => Availability::Limited(Days::whole(self.sick_days)),
            LeaveType::Annual => Availability::Limited(self.annual_days),
            LeaveType::Compassionate => Availability::Limited(Days::whole(self.compassionate_days)),
            LeaveType::Maternity => Availability::Limited(Days::whole(self.maternity_days)),
            LeaveType::Unpaid | LeaveType::Other(_) => Availability::Unlimited,
        }
    }
}

/// Balances as of `as_of`; all zero without a hire date.
pub fn compute_balances(hire_date: Option<NaiveDate>, as_of: NaiveDate) -> BalanceSnapshot {
    match hire_date {
        Some(hire_date) => BalanceSnapshot::from_months(months_elapsed(hire_date, as_of)),
        None => BalanceSnapshot::default(),
    }
}
