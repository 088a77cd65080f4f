//! Property-based tests for the filter and aggregate invariants.
//!
//! ```bash
//! cargo test --test property_tests
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```

use std::collections::BTreeSet;

use proptest::prelude::*;

use tender_dash::data::aggregate::{column_sum, group_sum, share_of_total, Exclusion};
use tender_dash::data::filter::{ColumnFilter, FilterSpec};
use tender_dash::data::model::{Column, Table};

// =============================================================================
// Test Strategies
// =============================================================================

/// Rows of (category index, optional amount).
fn rows() -> impl Strategy<Value = Vec<(u8, Option<f64>)>> {
    prop::collection::vec((0u8..5, prop::option::of(-1000.0f64..1000.0)), 0..60)
}

fn table(rows: &[(u8, Option<f64>)]) -> Table {
    let cats: Vec<Option<String>> = rows
        .iter()
        .map(|(c, _)| Some(if *c == 4 { "Lumpsum".to_string() } else { format!("c{c}") }))
        .collect();
    let amounts: Vec<Option<f64>> = rows.iter().map(|(_, a)| *a).collect();
    Table::new(vec![Column::text("Items", cats), Column::numeric("Amt", amounts)]).unwrap()
}

fn exclude(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Filter properties
// =============================================================================

proptest! {
    #[test]
    fn full_or_empty_selection_keeps_every_row(rows in rows(), empty in any::<bool>()) {
        let t = table(&rows);
        let mut spec = FilterSpec::build(&t, &exclude(&["Amt"]), 100);
        if empty {
            spec.select("Items", Vec::<String>::new());
        }
        prop_assert_eq!(spec.apply(&t).row_count(), t.row_count());
    }

    #[test]
    fn full_range_drops_exactly_missing(rows in rows()) {
        let t = table(&rows);
        let spec = FilterSpec::build(&t, &exclude(&["Items"]), 100);
        let filtered = spec.apply(&t);

        let present: Vec<usize> = (0..t.row_count())
            .filter(|&r| t.column("Amt").unwrap().number(r).is_some())
            .collect();
        if present.is_empty() {
            // an all-missing column offers no range, so nothing is dropped
            prop_assert!(spec.get("Amt").is_none());
            prop_assert_eq!(filtered.row_count(), t.row_count());
        } else {
            prop_assert_eq!(filtered.row_count(), present.len());
            for (i, &r) in present.iter().enumerate() {
                prop_assert_eq!(
                    filtered.column("Items").unwrap().text_at(i),
                    t.column("Items").unwrap().text_at(r)
                );
            }
        }
    }

    #[test]
    fn filters_commute(rows in rows(), pick in prop::collection::btree_set(0u8..5, 0..5), cut in -1000.0f64..1000.0) {
        let t = table(&rows);
        let mut spec = FilterSpec::build(&t, &exclude(&[]), 100);
        let chosen: Vec<String> = match spec.get("Items") {
            Some(ColumnFilter::Categorical { options, .. }) => options
                .iter()
                .filter(|o| pick.iter().any(|p| **o == format!("c{p}")))
                .cloned()
                .collect(),
            _ => Vec::new(),
        };
        spec.select("Items", chosen);
        if let Some(ColumnFilter::Range { max, .. }) = spec.get("Amt").cloned() {
            spec.set_range("Amt", cut.min(max), max);
        }

        let by_items = spec.clone().restricted_to(&["Items"]);
        let by_amount = spec.clone().restricted_to(&["Amt"]);
        let together = spec.apply(&t);
        prop_assert_eq!(&by_amount.apply(&by_items.apply(&t)), &together);
        prop_assert_eq!(&by_items.apply(&by_amount.apply(&t)), &together);
    }
}

// =============================================================================
// Aggregate properties
// =============================================================================

proptest! {
    #[test]
    fn group_totals_add_up(rows in rows()) {
        let t = table(&rows);
        let grouped = group_sum(&t, "Items", &["Amt"]).unwrap();
        prop_assert!((grouped.total(0) - column_sum(&t, "Amt")).abs() < 1e-6);

        let keys: BTreeSet<String> = grouped.rows.iter().map(|r| r.key.to_string()).collect();
        prop_assert_eq!(keys.len(), grouped.rows.len());
    }

    #[test]
    fn share_is_zero_or_exact_ratio(rows in rows(), keep in 0usize..60) {
        let t = table(&rows);
        let kept: Vec<usize> = (0..t.row_count().min(keep)).collect();
        let filtered = t.take_rows(&kept);
        let lumpsum = Exclusion::new("Items", "Lumpsum");

        let share = share_of_total(&t, &filtered, "Amt", Some(&lumpsum));
        if share.full_total <= 0.0 {
            prop_assert_eq!(share.percentage, 0.0);
        } else {
            let expected = share.filtered_total / share.full_total * 100.0;
            prop_assert!((share.percentage - expected).abs() < 1e-9);
        }
    }
}
