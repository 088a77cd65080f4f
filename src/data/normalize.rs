//! One-time column clean-up run right after loading.

use super::model::{ColumnData, Table};

/// Parse a cell as a plain number. NaN reads as missing.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn strip_chars(s: &str, chars: &[char]) -> String {
    s.chars().filter(|c| !chars.contains(c)).collect()
}

/// Trim surrounding whitespace from every column name.
pub fn strip_column_names(table: &mut Table) {
    for col in table.columns_mut() {
        let trimmed = col.name.trim();
        if trimmed.len() != col.name.len() {
            col.name = trimmed.to_string();
        }
    }
}

/// Turn text columns numeric when enough of their values parse.
///
/// Each value has `,` and `%` removed before parsing. A column converts when
/// the count of parsed values exceeds `threshold * row_count`; values that
/// fail to parse become missing. Returns the names of converted columns.
pub fn coerce_numeric_columns(table: &mut Table, threshold: f64) -> Vec<String> {
    let rows = table.row_count();
    let mut converted = Vec::new();

    // values are mapped one-for-one, so each column keeps `rows` entries
    for col in table.columns_mut() {
        let ColumnData::Text(values) = &col.data else {
            continue;
        };
        let parsed = parse_all(values, &[',', '%']);
        let ok = parsed.iter().filter(|v| v.is_some()).count();

        if ok as f64 > rows as f64 * threshold {
            log::debug!("Column '{}' coerced to numeric ({ok}/{rows} parsed)", col.name);
            col.data = ColumnData::Numeric(parsed);
            converted.push(col.name.clone());
        }
    }
    converted
}

/// Unconditionally coerce one column, stripping `,` only.
///
/// Already-numeric columns are left alone. Returns `false` when the column
/// does not exist.
pub fn force_numeric(table: &mut Table, name: &str) -> bool {
    let parsed = match table.column(name).map(|c| &c.data) {
        None => return false,
        Some(ColumnData::Numeric(_)) => return true,
        Some(ColumnData::Text(values)) => parse_all(values, &[',']),
    };
    matches!(table.replace_data(name, ColumnData::Numeric(parsed)), Ok(true))
}

fn parse_all(values: &[Option<String>], strip: &[char]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|v| v.as_deref().and_then(|s| parse_number(&strip_chars(s, strip))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn table(columns: Vec<Column>) -> Table {
        Table::new(columns).unwrap()
    }

    #[test]
    fn majority_numeric_column_converts() {
        let mut t = table(vec![Column::text(
            "Amt",
            vec![Some("1,000"), Some("2,500"), Some("abc"), Some("3,000")],
        )]);

        let converted = coerce_numeric_columns(&mut t, 0.5);

        assert_eq!(converted, vec!["Amt".to_string()]);
        assert_eq!(
            t.column("Amt").unwrap().data,
            ColumnData::Numeric(vec![Some(1000.0), Some(2500.0), None, Some(3000.0)])
        );
    }

    #[test]
    fn half_is_not_a_majority() {
        let mut t = table(vec![Column::text(
            "Mixed",
            vec![Some("12%"), Some("x"), Some("7"), None],
        )]);

        assert!(coerce_numeric_columns(&mut t, 0.5).is_empty());
        assert!(!t.column("Mixed").unwrap().is_numeric());
    }

    #[test]
    fn percent_signs_are_stripped() {
        let mut t = table(vec![Column::text("BT Percentage", vec![Some("12.5%"), Some(" 3 %")])]);
        coerce_numeric_columns(&mut t, 0.5);
        assert_eq!(t.column("BT Percentage").unwrap().number(0), Some(12.5));
        assert_eq!(t.column("BT Percentage").unwrap().number(1), Some(3.0));
    }

    #[test]
    fn nan_text_counts_as_missing() {
        let mut t = table(vec![Column::text("v", vec![Some("nan"), Some("NaN"), Some("1")])]);
        assert!(coerce_numeric_columns(&mut t, 0.5).is_empty());
    }

    #[test]
    fn names_are_trimmed() {
        let mut t = table(vec![
            Column::numeric(" TN No ", vec![]),
            Column::numeric("AS (L)", vec![]),
        ]);
        strip_column_names(&mut t);
        assert_eq!(t.column_names(), vec!["TN No", "AS (L)"]);
    }

    #[test]
    fn forced_coercion_keeps_percent_as_failure() {
        let mut t = table(vec![Column::text("Total Amt", vec![Some("1,250"), Some("5%"), None])]);

        assert!(force_numeric(&mut t, "Total Amt"));
        assert!(!force_numeric(&mut t, "Absent"));
        assert_eq!(
            t.column("Total Amt").unwrap().data,
            ColumnData::Numeric(vec![Some(1250.0), None, None])
        );
    }
}
