use std::borrow::Cow;
use std::cmp::Reverse;

use strum::{AsRefStr, EnumString};

/// Sort orders offered by every list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum SortKey {
    #[strum(to_string = "name-asc", serialize = "name_asc")]
    NameAsc,
    #[strum(to_string = "name-desc", serialize = "name_desc")]
    NameDesc,
    #[strum(to_string = "date-newest", serialize = "date_newest")]
    DateNewest,
    #[strum(to_string = "date-oldest", serialize = "date_oldest")]
    DateOldest,
}

pub type Accessor<T> = for<'a> fn(&'a T) -> Option<Cow<'a, str>>;

/// Which fields of a record a list view sorts and searches on.
pub struct ListFields<T> {
    /// display name, used for name sorting and search
    pub name: Accessor<T>,
    /// owner identity, searched alongside the name
    pub identity: Accessor<T>,
    /// ISO-8601 date text
    pub date: Accessor<T>,
}

impl<T> ListFields<T> {
    fn name_key(&self, item: &T) -> String {
        (self.name)(item)
            .map(|name| name.to_lowercase())
            .unwrap_or_default()
    }

    /// Blank dates map to `None` so they can be pushed last.
    fn date_key<'a>(&self, item: &'a T) -> Option<Cow<'a, str>> {
        (self.date)(item).filter(|date| !date.trim().is_empty())
    }

    pub fn matches(&self, item: &T, needle: &str) -> bool {
        [(self.name)(item), (self.identity)(item)]
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(needle))
    }
}

/// Returns a sorted copy of `items`.
///
/// Sorting is stable. Names compare case-insensitively, dates compare as
/// text, and records without a date come last in both directions.
/// `None` keeps the input order.
pub fn apply_sort<T: Clone>(items: &[T], key: Option<SortKey>, fields: &ListFields<T>) -> Vec<T> {
    let mut sorted = items.to_vec();
    let Some(key) = key else {
        return sorted;
    };

    match key {
        SortKey::NameAsc => sorted.sort_by_cached_key(|item| fields.name_key(item)),
        SortKey::NameDesc => sorted.sort_by_cached_key(|item| Reverse(fields.name_key(item))),
        SortKey::DateOldest => sorted.sort_by_cached_key(|item| {
            let date = fields.date_key(item).map(Cow::into_owned);
            (date.is_none(), date)
        }),
        SortKey::DateNewest => sorted.sort_by_cached_key(|item| {
            let date = fields.date_key(item).map(Cow::into_owned);
            (date.is_none(), Reverse(date))
        }),
    }

    sorted
}

/// Keeps records whose name or identity contains `term`, ignoring case.
pub fn apply_filter<T: Clone>(items: &[T], term: Option<&str>, fields: &ListFields<T>) -> Vec<T> {
    let needle = term.map(|t| t.trim().to_lowercase()).unwrap_or_default();
    if needle.is_empty() {
        return items.to_vec();
    }

    items
        .iter()
        .filter(|item| fields.matches(item, &needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        name: Option<&'static str>,
        username: &'static str,
        date: Option<&'static str>,
    }

    fn row_name(row: &Row) -> Option<Cow<'_, str>> {
        row.name.map(Cow::Borrowed)
    }

    fn row_username(row: &Row) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(row.username))
    }

    fn row_date(row: &Row) -> Option<Cow<'_, str>> {
        row.date.map(Cow::Borrowed)
    }

    const FIELDS: ListFields<Row> = ListFields {
        name: row_name,
        identity: row_username,
        date: row_date,
    };

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, name: Some("carol"), username: "c.jones", date: Some("2024-05-01") },
            Row { id: 2, name: Some("Alice"), username: "asmith", date: None },
            Row { id: 3, name: Some("bob"), username: "bob", date: Some("2023-01-10") },
            Row { id: 4, name: None, username: "ghost", date: Some("") },
            Row { id: 5, name: Some("alice"), username: "alice2", date: Some("2024-05-01") },
        ]
    }

    fn ids(rows: &[Row]) -> Vec<u32> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn sort_keys_parse_both_spellings() {
        assert_eq!("name-asc".parse::<SortKey>().unwrap(), SortKey::NameAsc);
        assert_eq!("DATE_NEWEST".parse::<SortKey>().unwrap(), SortKey::DateNewest);
        assert!("newest".parse::<SortKey>().is_err());
        assert_eq!(SortKey::DateOldest.as_ref(), "date-oldest");
    }

    #[test]
    fn name_sort_ignores_case_and_is_stable() {
        assert_eq!(
            ids(&apply_sort(&rows(), Some(SortKey::NameAsc), &FIELDS)),
            vec![4, 2, 5, 3, 1]
        );
        assert_eq!(
            ids(&apply_sort(&rows(), Some(SortKey::NameDesc), &FIELDS)),
            vec![1, 3, 2, 5, 4]
        );
    }

    #[test]
    fn blank_dates_sink_in_both_directions() {
        assert_eq!(
            ids(&apply_sort(&rows(), Some(SortKey::DateOldest), &FIELDS)),
            vec![3, 1, 5, 2, 4]
        );
        assert_eq!(
            ids(&apply_sort(&rows(), Some(SortKey::DateNewest), &FIELDS)),
            vec![1, 5, 3, 2, 4]
        );
    }

    #[test]
    fn no_key_returns_a_copy_in_input_order() {
        let input = rows();
        let sorted = apply_sort(&input, Some(SortKey::NameAsc), &FIELDS);
        assert_ne!(ids(&sorted), ids(&input));

        let restored = apply_sort(&input, None, &FIELDS);
        assert_eq!(restored, input);
        assert_ne!(apply_sort(&sorted, None, &FIELDS), input);
    }

    #[test]
    fn filter_matches_name_or_identity() {
        assert_eq!(ids(&apply_filter(&rows(), Some("ALI"), &FIELDS)), vec![2, 5]);
        assert_eq!(ids(&apply_filter(&rows(), Some(" jones "), &FIELDS)), vec![1]);
        assert_eq!(ids(&apply_filter(&rows(), Some("gho"), &FIELDS)), vec![4]);
        assert!(apply_filter(&rows(), Some("zzz"), &FIELDS).is_empty());
    }

    #[test]
    fn blank_term_keeps_everything() {
        assert_eq!(apply_filter(&rows(), None, &FIELDS), rows());
        assert_eq!(apply_filter(&rows(), Some("   "), &FIELDS), rows());
    }
}
