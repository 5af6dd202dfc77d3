//! Gate in front of the request store.
//!
//! Missing fields and reversed ranges are hard failures. Going over balance
//! is only advisory: it surfaces on the validated request and the submitter
//! has to confirm before it becomes a pending request.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::leave::accrual::{Days, parse_date};
use crate::leave::availability::{Availability, available_for};
use crate::model::leave_request::{LeaveType, NewLeaveRequest, leave_title};

/// Raw form input, every field optional until validated.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LeaveDraft {
    #[schema(example = "Sick")]
    pub leave_type: Option<String>,
    #[schema(example = "2026-01-01", format = "date")]
    pub start_date: Option<String>,
    #[schema(example = "2026-01-03", format = "date")]
    pub end_date: Option<String>,
    #[schema(example = "Flu")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please complete {}", .missing.join(", "))]
    IncompleteFields { missing: Vec<&'static str> },

    #[error("end date {end} must be the same or after start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("requested days ({requested_days}) exceed available balance ({available})")]
    OverBalanceNotConfirmed { requested_days: u64, available: Days },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverBalance {
    pub requested_days: u64,
    pub available: Days,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub requested_days: u64,
    pub available: Availability,
}

impl ValidatedRequest {
    pub fn over_balance(&self) -> Option<OverBalance> {
        if self.available.allows(self.requested_days) {
            return None;
        }
        self.available.limit().map(|available| OverBalance {
            requested_days: self.requested_days,
            available,
        })
    }

    /// Turns the request into a pending submission.
    ///
    /// An over-balance request needs `confirmed`; without it the error
    /// carries requested and available days for the prompt.
    pub fn into_submission(
        self,
        confirmed: bool,
        submitted_by: &str,
        now: DateTime<Utc>,
    ) -> Result<NewLeaveRequest, SubmissionError> {
        if let Some(over) = self.over_balance() {
            if !confirmed {
                return Err(SubmissionError::OverBalanceNotConfirmed {
                    requested_days: over.requested_days,
                    available: over.available,
                });
            }
        }

        Ok(NewLeaveRequest {
            title: leave_title(&self.leave_type, self.start_date, self.end_date),
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            reason: self.reason,
            submitted_by: submitted_by.to_string(),
            created_at: now,
            image: None,
        })
    }
}

/// Inclusive day count, never negative.
pub fn requested_days(start: NaiveDate, end: NaiveDate) -> u64 {
    u64::try_from((end - start).num_days() + 1).unwrap_or(0)
}

pub fn validate(
    draft: &LeaveDraft,
    hire_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<ValidatedRequest, ValidationError> {
    let leave_type = draft.leave_type.as_deref().and_then(LeaveType::parse);
    let start = draft.start_date.as_deref().and_then(parse_date);
    let end = draft.end_date.as_deref().and_then(parse_date);

    let (leave_type, start_date, end_date) = match (leave_type, start, end) {
        (Some(leave_type), Some(start), Some(end)) => (leave_type, start, end),
        (leave_type, start, end) => {
            let missing = [
                ("leave_type", leave_type.is_none()),
                ("start_date", start.is_none()),
                ("end_date", end.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(ValidationError::IncompleteFields { missing });
        }
    };

    if end_date < start_date {
        return Err(ValidationError::InvalidDateRange {
            start: start_date,
            end: end_date,
        });
    }

    let available = available_for(&leave_type, hire_date, today);

    Ok(ValidatedRequest {
        requested_days: requested_days(start_date, end_date),
        leave_type,
        start_date,
        end_date,
        reason: draft.reason.as_deref().unwrap_or_default().trim().to_string(),
        available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::accrual::months_elapsed;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(leave_type: &str, start: &str, end: &str) -> LeaveDraft {
        LeaveDraft {
            leave_type: Some(leave_type.into()),
            start_date: Some(start.into()),
            end_date: Some(end.into()),
            reason: Some("  family  ".into()),
        }
    }

    #[test]
    fn missing_fields_are_listed() {
        let err = validate(&LeaveDraft::default(), None, date(2024, 3, 1)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompleteFields {
                missing: vec!["leave_type", "start_date", "end_date"]
            }
        );

        let mut partial = draft("Sick", "2024-03-01", "2024-03-05");
        partial.end_date = Some("   ".into());
        let err = validate(&partial, None, date(2024, 3, 1)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompleteFields {
                missing: vec!["end_date"]
            }
        );
    }

    #[test]
    fn unparsable_date_counts_as_missing() {
        let err = validate(&draft("Sick", "01/03/2024", "2024-03-05"), None, date(2024, 3, 1))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompleteFields {
                missing: vec!["start_date"]
            }
        );
    }

    #[test]
    fn reversed_range_is_rejected_whatever_the_type() {
        for leave_type in ["Sick", "Unpaid", "Study"] {
            let err = validate(
                &draft(leave_type, "2024-03-05", "2024-03-01"),
                Some(date(2000, 1, 1)),
                date(2024, 3, 1),
            )
            .unwrap_err();
            assert_eq!(
                err,
                ValidationError::InvalidDateRange {
                    start: date(2024, 3, 5),
                    end: date(2024, 3, 1)
                }
            );
        }
    }

    #[test]
    fn single_day_request_counts_one_day() {
        assert_eq!(requested_days(date(2024, 3, 1), date(2024, 3, 1)), 1);
        assert_eq!(requested_days(date(2024, 2, 28), date(2024, 3, 1)), 3);
        assert_eq!(requested_days(date(2024, 3, 5), date(2024, 3, 1)), 0);
    }

    #[test]
    fn over_balance_is_flagged_not_rejected() {
        // Two months of tenure gives 4 sick days.
        let hire = date(2024, 1, 1);
        let today = date(2024, 3, 1);
        assert_eq!(months_elapsed(hire, today), 2);

        let validated = validate(&draft("Sick", "2024-03-01", "2024-03-05"), Some(hire), today)
            .unwrap();
        assert_eq!(validated.requested_days, 5);
        assert_eq!(
            validated.over_balance(),
            Some(OverBalance {
                requested_days: 5,
                available: Days::whole(4)
            })
        );
    }

    #[test]
    fn over_balance_needs_confirmation() {
        let hire = Some(date(2024, 1, 1));
        let today = date(2024, 3, 1);
        let validated =
            validate(&draft("Sick", "2024-03-01", "2024-03-05"), hire, today).unwrap();

        let err = validated
            .clone()
            .into_submission(false, "jdoe", Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            SubmissionError::OverBalanceNotConfirmed {
                requested_days: 5,
                available: Days::whole(4)
            }
        );
        assert_eq!(
            err.to_string(),
            "requested days (5) exceed available balance (4.0)"
        );

        let submission = validated.into_submission(true, "jdoe", Utc::now()).unwrap();
        assert_eq!(submission.submitted_by, "jdoe");
        assert_eq!(submission.reason, "family");
        assert_eq!(submission.title, "Sick leave (2024-03-01 → 2024-03-05)");
    }

    #[test]
    fn within_balance_submits_without_confirmation() {
        let validated = validate(
            &draft("annual", "2024-03-01", "2024-03-03"),
            Some(date(2024, 1, 1)),
            date(2024, 3, 1),
        )
        .unwrap();
        assert_eq!(validated.leave_type, LeaveType::Annual);
        assert_eq!(validated.available, Availability::Limited(Days::whole(3)));
        assert_eq!(validated.over_balance(), None);
        assert!(validated.into_submission(false, "jdoe", Utc::now()).is_ok());
    }

    #[test]
    fn unpaid_never_goes_over_balance() {
        let validated =
            validate(&draft("Unpaid", "2024-01-01", "2024-12-31"), None, date(2024, 1, 1))
                .unwrap();
        assert_eq!(validated.requested_days, 366);
        assert_eq!(validated.over_balance(), None);
    }

    #[test]
    fn half_day_balance_is_compared_exactly() {
        // One month of annual accrual is 1.5 days.
        let hire = Some(date(2024, 1, 1));
        let today = date(2024, 2, 1);
        let one = validate(&draft("Annual", "2024-02-01", "2024-02-01"), hire, today).unwrap();
        assert_eq!(one.over_balance(), None);
        let two = validate(&draft("Annual", "2024-02-01", "2024-02-02"), hire, today).unwrap();
        assert!(two.over_balance().is_some());
    }
}
