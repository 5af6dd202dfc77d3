use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::leave::accrual::{Days, compute_balances};
use crate::model::leave_request::LeaveType;

/// What a leave type allows as of a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Limited(Days),
    /// Unpaid and unrecognised types; never blocks a submission.
    Unlimited,
}

impl Availability {
    pub fn allows(&self, requested_days: u64) -> bool {
        match self {
            Availability::Limited(days) => days.covers(requested_days),
            Availability::Unlimited => true,
        }
    }

    pub fn limit(&self) -> Option<Days> {
        match self {
            Availability::Limited(days) => Some(*days),
            Availability::Unlimited => None,
        }
    }
}

impl Serialize for Availability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Availability::Limited(days) => days.serialize(serializer),
            Availability::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

pub fn available_for(
    leave_type: &LeaveType,
    hire_date: Option<NaiveDate>,
    as_of: NaiveDate,
) -> Availability {
    compute_balances(hire_date, as_of).availability(leave_type)
}
