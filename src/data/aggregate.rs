//! Grouped sums and totals over resolved amount columns.

use std::collections::BTreeMap;

use super::model::{CellValue, Table};

/// One group's key and its per-column sums.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: CellValue,
    pub sums: Vec<f64>,
}

/// Result of [`group_sum`]: a small table keyed by one column.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedSums {
    pub key_column: String,
    pub value_columns: Vec<String>,
    pub rows: Vec<GroupRow>,
}

impl GroupedSums {
    /// Rows ordered by descending sum of `value_columns[index]`.
    pub fn sorted_desc_by(mut self, index: usize) -> Self {
        self.rows.sort_by(|a, b| b.sums[index].total_cmp(&a.sums[index]));
        self
    }

    /// Prefix every value column name, e.g. `AS (L)` → `Sum AS (L)`.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        for name in &mut self.value_columns {
            *name = format!("{prefix}{name}");
        }
        self
    }

    /// Sum of one value column across all groups.
    pub fn total(&self, index: usize) -> f64 {
        self.rows.iter().map(|r| r.sums[index]).sum()
    }
}

/// Sum `values` per distinct value of `key`.
///
/// Rows with a missing key are left out; missing values add nothing. Groups
/// come out in sorted key order. Returns `None` if any named column is absent.
pub fn group_sum(table: &Table, key: &str, values: &[&str]) -> Option<GroupedSums> {
    let key_col = table.column(key)?;
    let value_cols = values
        .iter()
        .map(|name| table.column(name))
        .collect::<Option<Vec<_>>>()?;

    let mut groups: BTreeMap<CellValue, Vec<f64>> = BTreeMap::new();
    for row in 0..table.row_count() {
        let k = key_col.cell(row);
        if k.is_missing() {
            continue;
        }
        let sums = groups.entry(k).or_insert_with(|| vec![0.0; value_cols.len()]);
        for (slot, col) in sums.iter_mut().zip(&value_cols) {
            if let Some(v) = col.number(row) {
                *slot += v;
            }
        }
    }

    Some(GroupedSums {
        key_column: key.to_string(),
        value_columns: values.iter().map(|s| s.to_string()).collect(),
        rows: groups
            .into_iter()
            .map(|(key, sums)| GroupRow { key, sums })
            .collect(),
    })
}

/// Sum of the non-missing numbers in `column`; 0 when absent or text.
pub fn column_sum(table: &Table, column: &str) -> f64 {
    table.column(column).map_or(0.0, |c| c.numbers().sum())
}

/// Rows whose `column` equals `label` (after trimming) are left out of totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub column: String,
    pub label: String,
}

impl Exclusion {
    pub fn new(column: impl Into<String>, label: impl Into<String>) -> Self {
        Exclusion {
            column: column.into(),
            label: label.into(),
        }
    }

    fn excludes(&self, table: &Table, row: usize) -> bool {
        table
            .column(&self.column)
            .and_then(|c| c.text_at(row))
            .is_some_and(|v| v.trim() == self.label)
    }
}

/// Sum of `amount`, skipping rows the exclusion matches.
pub fn sum_excluding(table: &Table, amount: &str, exclusion: Option<&Exclusion>) -> f64 {
    let Some(col) = table.column(amount) else {
        return 0.0;
    };
    (0..table.row_count())
        .filter(|&row| !exclusion.is_some_and(|e| e.excludes(table, row)))
        .filter_map(|row| col.number(row))
        .sum()
}

/// Filtered total as a share of the full total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalShare {
    pub full_total: f64,
    pub filtered_total: f64,
    /// `filtered / full * 100`, or 0 when the full total is not positive.
    pub percentage: f64,
}

pub fn share_of_total(
    full: &Table,
    filtered: &Table,
    amount: &str,
    exclusion: Option<&Exclusion>,
) -> TotalShare {
    let full_total = sum_excluding(full, amount, exclusion);
    let filtered_total = sum_excluding(filtered, amount, exclusion);
    let percentage = if full_total > 0.0 {
        filtered_total / full_total * 100.0
    } else {
        0.0
    };
    TotalShare {
        full_total,
        filtered_total,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn estimate() -> Table {
        Table::new(vec![
            Column::numeric("Amt", vec![Some(100.0), Some(200.0), None, Some(300.0)]),
            Column::text("Items", vec![Some("A"), Some("A"), Some("B"), Some("Lumpsum ")]),
        ])
        .unwrap()
    }

    #[test]
    fn lumpsum_excluded_share() {
        let full = estimate();
        let filtered = full.take_rows(&[0, 1]);
        let lumpsum = Exclusion::new("Items", "Lumpsum");

        let share = share_of_total(&full, &filtered, "Amt", Some(&lumpsum));
        assert_eq!(share.full_total, 300.0);
        assert_eq!(share.filtered_total, 300.0);
        assert!((share.percentage - 100.0).abs() < 1e-9);

        let share = share_of_total(&full, &filtered, "Amt", None);
        assert_eq!(share.full_total, 600.0);
        assert!((share.percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_total_gives_zero_share() {
        let t = Table::new(vec![Column::numeric("Amt", vec![Some(-5.0), Some(5.0)])]).unwrap();
        let share = share_of_total(&t, &t.take_rows(&[1]), "Amt", None);
        assert_eq!(share.full_total, 0.0);
        assert_eq!(share.percentage, 0.0);
    }

    #[test]
    fn groups_merge_and_sort() {
        let t = Table::new(vec![
            Column::text("Contractor", vec![Some("Beta"), Some("Alpha"), Some("Beta"), None]),
            Column::numeric("AS (L)", vec![Some(10.0), Some(25.0), Some(20.0), Some(99.0)]),
            Column::numeric("CV (L)", vec![Some(1.0), None, Some(2.0), Some(9.0)]),
        ])
        .unwrap();

        let grouped = group_sum(&t, "Contractor", &["AS (L)", "CV (L)"]).unwrap();
        let keys: Vec<String> = grouped.rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["Alpha", "Beta"]);
        assert_eq!(grouped.rows[1].sums, vec![30.0, 3.0]);
        assert_eq!(grouped.rows[0].sums, vec![25.0, 0.0]);

        let summary = grouped.sorted_desc_by(0).with_prefix("Sum ");
        assert_eq!(summary.rows[0].key, CellValue::Text("Beta".into()));
        assert_eq!(summary.value_columns, vec!["Sum AS (L)", "Sum CV (L)"]);
    }

    #[test]
    fn missing_columns_give_no_groups() {
        assert!(group_sum(&estimate(), "TN No", &["Amt"]).is_none());
        assert!(group_sum(&estimate(), "Items", &["AS (L)"]).is_none());
        assert_eq!(column_sum(&estimate(), "Items"), 0.0);
        assert_eq!(column_sum(&estimate(), "Amt"), 600.0);
    }
}
