use std::collections::BTreeSet;

use super::model::{Column, ColumnData, Table};

// ---------------------------------------------------------------------------
// Per-column filter state
// ---------------------------------------------------------------------------

/// What the sidebar offers for one column, together with the user's choice.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    /// Text column with few enough distinct values for a pick list.
    /// `options` is sorted; `selected` defaults to all of them.
    Categorical {
        options: Vec<String>,
        selected: BTreeSet<String>,
    },
    /// Text column with too many distinct values. Never constrains rows.
    TooManyValues { distinct: usize },
    /// Numeric column: inclusive `[low, high]` within `[min, max]`.
    Range {
        min: f64,
        max: f64,
        low: f64,
        high: f64,
    },
}

impl ColumnFilter {
    /// Initial filter for a column, or `None` when there is nothing to offer
    /// (a numeric column with no values).
    fn for_column(column: &Column, max_categorical: usize) -> Option<Self> {
        match &column.data {
            ColumnData::Text(values) => {
                let distinct: BTreeSet<String> = values.iter().flatten().cloned().collect();
                if distinct.len() > max_categorical {
                    return Some(ColumnFilter::TooManyValues {
                        distinct: distinct.len(),
                    });
                }
                Some(ColumnFilter::Categorical {
                    options: distinct.iter().cloned().collect(),
                    selected: distinct,
                })
            }
            ColumnData::Numeric(_) => {
                let (min, max) = column
                    .numbers()
                    .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                        None => Some((v, v)),
                        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                    })?;
                Some(ColumnFilter::Range {
                    min,
                    max,
                    low: min,
                    high: max,
                })
            }
        }
    }

    /// Whether this filter lets every row through whatever the data.
    ///
    /// An empty categorical selection counts as "show all", and so does one
    /// that covers every option.
    pub fn is_unconstrained(&self) -> bool {
        match self {
            ColumnFilter::Categorical { options, selected } => {
                selected.is_empty() || options.iter().all(|o| selected.contains(o))
            }
            ColumnFilter::TooManyValues { .. } => true,
            ColumnFilter::Range { .. } => false,
        }
    }

    fn keeps(&self, column: &Column, row: usize) -> bool {
        match self {
            ColumnFilter::Categorical { selected, .. } => column
                .text_at(row)
                .is_some_and(|v| selected.contains(&v)),
            ColumnFilter::TooManyValues { .. } => true,
            ColumnFilter::Range { low, high, .. } => column
                .number(row)
                .is_some_and(|v| v >= *low && v <= *high),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterSpec – every column's filter, in table column order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    filters: Vec<(String, ColumnFilter)>,
}

impl FilterSpec {
    /// Build default filters from the full, unfiltered table.
    /// Columns in `excluded` get no filter at all.
    pub fn build(table: &Table, excluded: &BTreeSet<String>, max_categorical: usize) -> Self {
        let filters = table
            .columns()
            .iter()
            .filter(|c| !excluded.contains(&c.name))
            .filter_map(|c| {
                ColumnFilter::for_column(c, max_categorical).map(|f| (c.name.clone(), f))
            })
            .collect();
        FilterSpec { filters }
    }

    /// Keep only the filters for the named columns.
    pub fn restricted_to(mut self, columns: &[&str]) -> Self {
        self.filters.retain(|(name, _)| columns.contains(&name.as_str()));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnFilter)> {
        self.filters.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ColumnFilter)> {
        self.filters.iter_mut().map(|(n, f)| (n.as_str(), f))
    }

    pub fn get(&self, column: &str) -> Option<&ColumnFilter> {
        self.filters.iter().find(|(n, _)| n == column).map(|(_, f)| f)
    }

    pub fn get_mut(&mut self, column: &str) -> Option<&mut ColumnFilter> {
        self.filters
            .iter_mut()
            .find(|(n, _)| n == column)
            .map(|(_, f)| f)
    }

    /// Replace the selection of a categorical column.
    pub fn select<I, S>(&mut self, column: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(ColumnFilter::Categorical { selected, .. }) = self.get_mut(column) {
            *selected = values.into_iter().map(Into::into).collect();
        }
    }

    /// Set the bounds of a numeric column.
    pub fn set_range(&mut self, column: &str, new_low: f64, new_high: f64) {
        if let Some(ColumnFilter::Range { low, high, .. }) = self.get_mut(column) {
            *low = new_low;
            *high = new_high;
        }
    }

    /// Indices of rows passing every filter (logical AND), in table order.
    pub fn kept_rows(&self, table: &Table) -> Vec<usize> {
        let active: Vec<(&Column, &ColumnFilter)> = self
            .filters
            .iter()
            .filter(|(_, f)| !f.is_unconstrained())
            .filter_map(|(name, f)| table.column(name).map(|c| (c, f)))
            .collect();

        (0..table.row_count())
            .filter(|&row| active.iter().all(|(col, f)| f.keeps(col, row)))
            .collect()
    }

    /// The filtered view of `table`.
    pub fn apply(&self, table: &Table) -> Table {
        let rows = self.kept_rows(table);
        log::debug!("Filters kept {} of {} rows", rows.len(), table.row_count());
        table.take_rows(&rows)
    }
}
