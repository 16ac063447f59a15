use std::collections::BTreeSet;

use indexmap::IndexSet;
use tracing::debug;

use crate::models::{FellowTable, Field};

/// Allowed values for the two sidebar dimensions. `None` stands for a blank
/// cell so fellows without a college or date can still be selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub colleges: BTreeSet<Option<String>>,
    pub graduation_dates: BTreeSet<Option<String>>,
}

impl FilterSelection {
    /// Selection that keeps every row of `table`.
    pub fn full_domain(table: &FellowTable) -> Self {
        Self {
            colleges: distinct_values(table, Field::College).into_iter().collect(),
            graduation_dates: distinct_values(table, Field::GraduationDate)
                .into_iter()
                .collect(),
        }
    }
}

/// Form value standing for a blank cell. Present values are prefixed with
/// [`VALUE_PREFIX`], so no cell text can collide with it.
pub const BLANK_TOKEN: &str = "blank";
pub const VALUE_PREFIX: &str = "v:";

pub fn option_token(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{VALUE_PREFIX}{value}"),
        None => BLANK_TOKEN.to_string(),
    }
}

/// Inverse of [`option_token`]. Unrecognised tokens yield `None`.
pub fn parse_token(token: &str) -> Option<Option<String>> {
    if token == BLANK_TOKEN {
        return Some(None);
    }
    token
        .strip_prefix(VALUE_PREFIX)
        .map(|value| Some(value.to_string()))
}

/// Command-line values for one sidebar dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgValues<'a> {
    pub values: &'a [String],
    /// Also select blank cells.
    pub blank: bool,
}

impl ArgValues<'_> {
    fn narrows(&self) -> bool {
        !self.values.is_empty() || self.blank
    }

    fn selected(&self) -> BTreeSet<Option<String>> {
        let mut selected: BTreeSet<Option<String>> =
            self.values.iter().map(|v| Some(v.clone())).collect();
        if self.blank {
            selected.insert(None);
        }
        selected
    }
}

/// Builds a selection from command-line values. A dimension with neither
/// values nor the blank flag keeps its full domain. Values are taken
/// literally, the empty string included.
pub fn selection_from_args(
    table: &FellowTable,
    colleges: ArgValues<'_>,
    graduation_dates: ArgValues<'_>,
) -> FilterSelection {
    let mut selection = FilterSelection::full_domain(table);
    if colleges.narrows() {
        selection.colleges = colleges.selected();
    }
    if graduation_dates.narrows() {
        selection.graduation_dates = graduation_dates.selected();
    }
    selection
}

/// Distinct values of a column in first-seen order.
pub fn distinct_values(table: &FellowTable, field: Field) -> Vec<Option<String>> {
    let values: IndexSet<Option<String>> = table
        .rows
        .iter()
        .map(|row| row.get(field).label())
        .collect();
    values.into_iter().collect()
}

/// Keeps rows whose college and graduation date are both selected. An empty
/// set on either dimension keeps nothing.
pub fn apply_filter(table: &FellowTable, selection: &FilterSelection) -> FellowTable {
    let rows = table
        .rows
        .iter()
        .filter(|row| {
            selection.colleges.contains(&row.get(Field::College).label())
                && selection
                    .graduation_dates
                    .contains(&row.get(Field::GraduationDate).label())
        })
        .cloned()
        .collect::<Vec<_>>();

    debug!(
        total = table.rows.len(),
        kept = rows.len(),
        "applied college and graduation filter"
    );
    table.with_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, FellowRow};
    use chrono::Utc;

    fn row(college: Option<&str>, date: Option<&str>) -> FellowRow {
        let mut row = FellowRow::default();
        let cell = |value: Option<&str>| match value {
            Some(v) => Cell::Scalar(v.to_string()),
            None => Cell::Absent,
        };
        row.cells.insert(Field::College, cell(college));
        row.cells.insert(Field::GraduationDate, cell(date));
        row
    }

    fn table(rows: Vec<FellowRow>) -> FellowTable {
        FellowTable {
            fields: vec![Field::College, Field::GraduationDate],
            rows,
            fetched_at: Utc::now(),
        }
    }

    fn three_rows() -> FellowTable {
        table(vec![
            row(Some("A"), Some("2023")),
            row(Some("A"), Some("2022")),
            row(Some("B"), Some("2023")),
        ])
    }

    fn set(values: &[&str]) -> BTreeSet<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn filters_on_both_dimensions() {
        let full = three_rows();
        let selection = FilterSelection {
            colleges: set(&["A"]),
            graduation_dates: set(&["2023"]),
        };
        let filtered = apply_filter(&full, &selection);
        assert_eq!(filtered.rows, vec![full.rows[0].clone()]);
    }

    #[test]
    fn full_domain_is_identity() {
        let full = three_rows();
        let filtered = apply_filter(&full, &FilterSelection::full_domain(&full));
        assert_eq!(filtered, full);
    }

    #[test]
    fn filtering_is_idempotent() {
        let full = three_rows();
        let selection = FilterSelection {
            colleges: set(&["A", "B"]),
            graduation_dates: set(&["2023"]),
        };
        let once = apply_filter(&full, &selection);
        let twice = apply_filter(&once, &selection);
        assert_eq!(once, twice);
        assert_eq!(once.rows.len(), 2);
    }

    #[test]
    fn empty_selection_yields_no_rows() {
        let full = three_rows();
        let no_colleges = FilterSelection {
            colleges: BTreeSet::new(),
            graduation_dates: set(&["2022", "2023"]),
        };
        let no_dates = FilterSelection {
            colleges: set(&["A", "B"]),
            graduation_dates: BTreeSet::new(),
        };
        assert!(apply_filter(&full, &no_colleges).rows.is_empty());
        assert!(apply_filter(&full, &no_dates).rows.is_empty());
    }

    #[test]
    fn blank_values_are_selectable() {
        let full = table(vec![row(None, Some("2024")), row(Some("A"), Some("2024"))]);
        assert_eq!(
            distinct_values(&full, Field::College),
            vec![None, Some("A".to_string())]
        );
        let selection = FilterSelection {
            colleges: [None].into_iter().collect(),
            graduation_dates: set(&["2024"]),
        };
        assert_eq!(apply_filter(&full, &selection).rows.len(), 1);
    }

    #[test]
    fn cli_values_narrow_only_named_dimensions() {
        let full = three_rows();
        let named = ["B".to_string()];
        let selection = selection_from_args(
            &full,
            ArgValues { values: &named, blank: false },
            ArgValues::default(),
        );
        assert_eq!(selection.colleges, set(&["B"]));
        assert_eq!(selection.graduation_dates, set(&["2023", "2022"]));
        assert_eq!(apply_filter(&full, &selection).rows, vec![full.rows[2].clone()]);
    }

    #[test]
    fn cli_blank_flag_is_distinct_from_empty_text() {
        let full = table(vec![
            row(None, Some("2024")),
            row(Some(""), Some("2024")),
            row(Some("A"), Some("2024")),
        ]);

        let blank = selection_from_args(
            &full,
            ArgValues { values: &[], blank: true },
            ArgValues::default(),
        );
        assert_eq!(blank.colleges, [None].into_iter().collect());
        assert_eq!(apply_filter(&full, &blank).rows, vec![full.rows[0].clone()]);

        let empty_text = [String::new()];
        let literal = selection_from_args(
            &full,
            ArgValues { values: &empty_text, blank: false },
            ArgValues::default(),
        );
        assert_eq!(literal.colleges, set(&[""]));
        assert_eq!(apply_filter(&full, &literal).rows, vec![full.rows[1].clone()]);
    }

    #[test]
    fn form_tokens_never_collide_with_values() {
        for value in [None, Some(""), Some("blank"), Some("__blank__"), Some("v:2023")] {
            assert_eq!(parse_token(&option_token(value)), Some(value.map(str::to_string)));
        }
        assert_ne!(option_token(None), option_token(Some("blank")));
        assert_eq!(parse_token("2023"), None);
    }

    #[test]
    fn domain_lists_values_in_first_seen_order() {
        let full = table(vec![
            row(Some("Zeta"), Some("2024")),
            row(Some("Alpha"), Some("2022")),
            row(Some("Zeta"), Some("2023")),
        ]);
        assert_eq!(
            distinct_values(&full, Field::GraduationDate),
            vec![
                Some("2024".to_string()),
                Some("2022".to_string()),
                Some("2023".to_string())
            ]
        );
    }
}
