use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::leave::accrual::parse_date;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HireProfile {
    #[schema(example = "jdoe")]
    pub user_id: String,

    #[schema(example = "2024-01-15", format = "date", value_type = String, nullable = true)]
    pub hire_date: Option<NaiveDate>,
}

impl HireProfile {
    /// Builds a profile from the stored text value.
    ///
    /// A value that does not parse is a malformed profile: it is logged and
    /// read back as "no hire date", so every balance computes to zero.
    pub fn from_stored(user_id: impl Into<String>, raw: Option<&str>) -> Self {
        let user_id = user_id.into();
        let hire_date = match raw.map(str::trim).filter(|v| !v.is_empty()) {
            None => None,
            Some(value) => {
                let parsed = parse_date(value);
                if parsed.is_none() {
                    warn!(user_id = %user_id, value, "Malformed hire date, treating as absent");
                }
                parsed
            }
        };

        Self { user_id, hire_date }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_date_is_parsed() {
        let profile = HireProfile::from_stored("jdoe", Some("2024-01-15"));
        assert_eq!(profile.hire_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn malformed_date_reads_as_absent() {
        assert_eq!(HireProfile::from_stored("jdoe", Some("15/01/2024")).hire_date, None);
        assert_eq!(HireProfile::from_stored("jdoe", Some("2024-02-30")).hire_date, None);
        assert_eq!(HireProfile::from_stored("jdoe", Some("   ")).hire_date, None);
        assert_eq!(HireProfile::from_stored("jdoe", None).hire_date, None);
    }
}
