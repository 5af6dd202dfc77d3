use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::utils::list_view::ListFields;

/// Leave categories. Anything outside the accruing set is kept verbatim as
/// `Other` and, like `Unpaid`, never runs out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeaveType {
    Sick,
    Annual,
    Compassionate,
    Maternity,
    Unpaid,
    Other(String),
}

impl LeaveType {
    /// `None` for a blank label.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }

        Some(match label.to_ascii_lowercase().as_str() {
            "sick" => LeaveType::Sick,
            "annual" => LeaveType::Annual,
            "compassionate" => LeaveType::Compassionate,
            "maternity" => LeaveType::Maternity,
            "unpaid" => LeaveType::Unpaid,
            _ => LeaveType::Other(label.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            LeaveType::Sick => "Sick",
            LeaveType::Annual => "Annual",
            LeaveType::Compassionate => "Compassionate",
            LeaveType::Maternity => "Maternity",
            LeaveType::Unpaid => "Unpaid",
            LeaveType::Other(label) => label,
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LeaveType {
    fn from(value: String) -> Self {
        LeaveType::parse(&value).unwrap_or(LeaveType::Other(value))
    }
}

impl From<LeaveType> for String {
    fn from(value: LeaveType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Sick leave (2026-01-01 → 2026-01-03)")]
    pub title: String,
    #[schema(example = "Sick", value_type = String)]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Flu")]
    pub reason: String,
    #[schema(example = "jdoe")]
    pub submitted_by: String,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    pub status: LeaveStatus,
    #[schema(example = "admin", nullable = true)]
    pub approver: Option<String>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub approved_at: Option<DateTime<Utc>>,
    /// image attachment as a data URL
    #[schema(nullable = true)]
    pub image: Option<String>,
}

impl LeaveRequest {
    pub fn from_new(id: u64, new: NewLeaveRequest) -> Self {
        Self {
            id,
            title: new.title,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            reason: new.reason,
            submitted_by: new.submitted_by,
            created_at: new.created_at,
            status: LeaveStatus::Pending,
            approver: None,
            approved_at: None,
            image: new.image,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == LeaveStatus::Pending
    }

    /// Applies an approval decision. Only pending requests move.
    pub fn decide(&mut self, decision: &StatusChange) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = decision.status;
        self.approver = Some(decision.actor.clone());
        self.approved_at = match decision.status {
            LeaveStatus::Approved => Some(decision.at),
            _ => None,
        };
        true
    }
}

/// A validated submission, not yet assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub title: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: LeaveStatus,
    pub actor: String,
    pub at: DateTime<Utc>,
}

pub fn leave_title(leave_type: &LeaveType, start: NaiveDate, end: NaiveDate) -> String {
    format!("{leave_type} leave ({start} → {end})")
}

fn request_title(request: &LeaveRequest) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(request.title.as_str()))
}

fn request_submitter(request: &LeaveRequest) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(request.submitted_by.as_str()))
}

fn request_created(request: &LeaveRequest) -> Option<Cow<'_, str>> {
    Some(Cow::Owned(request.created_at.to_rfc3339()))
}

/// Sort/search fields for leave request lists.
pub const LIST_FIELDS: ListFields<LeaveRequest> = ListFields {
    name: request_title,
    identity: request_submitter,
    date: request_created,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_type_parse_is_case_insensitive_and_keeps_unknown_labels() {
        assert_eq!(LeaveType::parse("sick"), Some(LeaveType::Sick));
        assert_eq!(LeaveType::parse(" MATERNITY "), Some(LeaveType::Maternity));
        assert_eq!(
            LeaveType::parse("Study"),
            Some(LeaveType::Other("Study".to_string()))
        );
        assert_eq!(LeaveType::parse("  "), None);
    }

    #[test]
    fn leave_type_serializes_as_label() {
        let json = serde_json::to_string(&LeaveType::Compassionate).unwrap();
        assert_eq!(json, "\"Compassionate\"");
        let back: LeaveType = serde_json::from_str("\"annual\"").unwrap();
        assert_eq!(back, LeaveType::Annual);
    }

    #[test]
    fn status_round_trips_through_strum() {
        assert_eq!("Approved".parse::<LeaveStatus>().unwrap(), LeaveStatus::Approved);
        assert_eq!(LeaveStatus::Pending.to_string(), "pending");
    }

    #[test]
    fn decide_moves_only_pending_requests() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut request = LeaveRequest::from_new(
            7,
            NewLeaveRequest {
                title: leave_title(&LeaveType::Sick, start, start),
                leave_type: LeaveType::Sick,
                start_date: start,
                end_date: start,
                reason: String::new(),
                submitted_by: "jdoe".into(),
                created_at: Utc::now(),
                image: None,
            },
        );
        let approve = StatusChange {
            status: LeaveStatus::Approved,
            actor: "admin".into(),
            at: Utc::now(),
        };
        let reject = StatusChange {
            status: LeaveStatus::Rejected,
            ..approve.clone()
        };

        assert!(request.decide(&approve));
        assert_eq!(request.status, LeaveStatus::Approved);
        assert!(request.approved_at.is_some());
        assert!(!request.decide(&reject));
        assert_eq!(request.status, LeaveStatus::Approved);
    }

    #[test]
    fn title_names_type_and_range() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            leave_title(&LeaveType::Annual, start, end),
            "Annual leave (2024-03-01 → 2024-03-05)"
        );
    }
}
