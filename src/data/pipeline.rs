//! Load → normalize → resolve → filter → aggregate, for one dashboard page.
//!
//! [`Dataset::prepare`] runs once per source; [`Dataset::evaluate`] is pure
//! and runs again on every selection change.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::DashboardConfig;

use super::aggregate::{self, Exclusion, GroupedSums, TotalShare};
use super::error::Result;
use super::filter::FilterSpec;
use super::loader::{self, HeaderMode, Source};
use super::model::Table;
use super::normalize;
use super::resolve::{resolve_roles, ColumnRoles, Role, RoleRule};

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// The two sheet layouts the dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetProfile {
    /// Restoration tender: header first, every column filterable.
    Tender,
    /// Estimate details: title row, header second, filtered by item.
    Estimate,
}

impl DatasetProfile {
    pub fn page_title(self) -> &'static str {
        match self {
            DatasetProfile::Tender => "Restoration Tender",
            DatasetProfile::Estimate => "KU Estimate Details",
        }
    }

    pub fn header_mode(self) -> HeaderMode {
        match self {
            DatasetProfile::Tender => HeaderMode::Direct,
            DatasetProfile::Estimate => HeaderMode::TitleThenHeader,
        }
    }

    pub fn default_paths(self, config: &DashboardConfig) -> Vec<PathBuf> {
        match self {
            DatasetProfile::Tender => vec![config.tender_path()],
            DatasetProfile::Estimate => config.estimate_paths(),
        }
    }

    fn role_rules(self, config: &DashboardConfig) -> Vec<(Role, RoleRule)> {
        match self {
            DatasetProfile::Tender => vec![
                (Role::Amount, RoleRule::markers(&["AS", "L"], Some("AS"), None)),
                (Role::Quantity, RoleRule::markers(&["CV", "L"], None, Some("CV (L)"))),
                (Role::GroupKey, RoleRule::exact(&config.tender.group_key)),
                (
                    Role::Category,
                    RoleRule::keyword(&config.tender.contractor, &config.tender.contractor_keyword),
                ),
            ],
            DatasetProfile::Estimate => vec![
                (Role::Amount, RoleRule::exact(&config.estimate.amount)),
                (
                    Role::Item,
                    RoleRule::keyword(&config.estimate.items, &config.estimate.items_keyword),
                ),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Colour family of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    /// Money totals (blue).
    Amount,
    /// Contract value or share (green).
    Secondary,
}

/// A label and an already formatted value.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub label: String,
    pub value: String,
    pub kind: TileKind,
}

impl Tile {
    fn new(label: impl Into<String>, value: String, kind: TileKind) -> Self {
        Tile {
            label: label.into(),
            value,
            kind,
        }
    }
}

/// User choices for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Selections {
    pub filters: FilterSpec,
    /// When false, rows labelled with the excluded item stay out of totals.
    pub include_excluded_label: bool,
}

/// Everything one render pass shows.
#[derive(Debug, Clone)]
pub struct Report {
    pub filtered: Table,
    /// Overall totals of the filtered rows.
    pub overall: Vec<Tile>,
    /// Tile pairs per group key value, in key order.
    pub per_group: Vec<(String, Vec<Tile>)>,
    /// Per-contractor sums, largest amount first.
    pub summary: Option<GroupedSums>,
    pub share: Option<TotalShare>,
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// A loaded, normalized table with its resolved roles.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub profile: DatasetProfile,
    pub source_name: String,
    /// Caption shown above the page body.
    pub title: String,
    pub table: Table,
    pub roles: ColumnRoles,
    filter_exclude: BTreeSet<String>,
    max_categorical: usize,
    excluded_label: String,
}

impl Dataset {
    /// Load `source` (or the profile's default file) and prepare it.
    pub fn prepare(
        profile: DatasetProfile,
        source: Option<Source>,
        config: &DashboardConfig,
    ) -> Result<Self> {
        let source = match source {
            Some(s) => s,
            None => loader::default_source(&profile.default_paths(config))?,
        };
        let loaded = loader::load(&source, profile.header_mode())?;
        let mut table = loaded.table;
        normalize::strip_column_names(&mut table);

        if profile == DatasetProfile::Tender {
            let converted =
                normalize::coerce_numeric_columns(&mut table, config.filters.numeric_coercion_threshold);
            log::debug!("Numeric after coercion: {converted:?}");
        }

        let roles = resolve_roles(&table.column_names(), &profile.role_rules(config));
        for role in [Role::Amount, Role::Quantity] {
            if let Some(name) = roles.get(role) {
                normalize::force_numeric(&mut table, name);
            }
        }

        let (title, filter_exclude, max_categorical) = match profile {
            DatasetProfile::Tender => (
                profile.page_title().to_string(),
                config.tender.filter_exclude.clone(),
                config.filters.max_categorical_values,
            ),
            DatasetProfile::Estimate => (
                loaded
                    .title
                    .unwrap_or_else(|| config.estimate.default_title.clone()),
                BTreeSet::new(),
                usize::MAX,
            ),
        };

        Ok(Dataset {
            profile,
            source_name: source.name(),
            title,
            table,
            roles,
            filter_exclude,
            max_categorical,
            excluded_label: config.estimate.excluded_total_label.clone(),
        })
    }

    /// The label the "include in total" toggle refers to.
    pub fn excluded_label(&self) -> &str {
        &self.excluded_label
    }

    /// Default selections: every value, full ranges, excluded label counted.
    pub fn default_selections(&self) -> Selections {
        let spec = FilterSpec::build(&self.table, &self.filter_exclude, self.max_categorical);
        let filters = match self.profile {
            DatasetProfile::Tender => spec,
            DatasetProfile::Estimate => match self.roles.get(Role::Item) {
                Some(item) => spec.restricted_to(&[item]),
                None => FilterSpec::default(),
            },
        };
        Selections {
            filters,
            include_excluded_label: true,
        }
    }

    /// Filter and aggregate. Sections whose roles are unresolved are empty.
    pub fn evaluate(&self, selections: &Selections) -> Report {
        let filtered = selections.filters.apply(&self.table);
        let mut report = Report {
            filtered,
            overall: Vec::new(),
            per_group: Vec::new(),
            summary: None,
            share: None,
        };
        match self.profile {
            DatasetProfile::Tender => self.tender_sections(&mut report),
            DatasetProfile::Estimate => self.estimate_sections(selections, &mut report),
        }
        report
    }

    fn tender_sections(&self, report: &mut Report) {
        let (Some(amount), Some(quantity)) =
            (self.roles.get(Role::Amount), self.roles.get(Role::Quantity))
        else {
            return;
        };
        let filtered = &report.filtered;

        report.overall = vec![
            Tile::new(
                format!("Overall Total {amount}"),
                format_grouped(aggregate::column_sum(filtered, amount), 2),
                TileKind::Amount,
            ),
            Tile::new(
                format!("Overall Total {quantity}"),
                format_grouped(aggregate::column_sum(filtered, quantity), 2),
                TileKind::Secondary,
            ),
        ];

        if let Some(by_key) = self
            .roles
            .get(Role::GroupKey)
            .and_then(|key| aggregate::group_sum(filtered, key, &[amount, quantity]))
        {
            report.per_group = by_key
                .rows
                .iter()
                .map(|row| {
                    let key = row.key.to_string();
                    let tiles = vec![
                        Tile::new(
                            format!("{key} - Total {amount}"),
                            format_grouped(row.sums[0], 2),
                            TileKind::Amount,
                        ),
                        Tile::new(
                            format!("{key} - Total {quantity}"),
                            format_grouped(row.sums[1], 2),
                            TileKind::Secondary,
                        ),
                    ];
                    (key, tiles)
                })
                .collect();
        }

        report.summary = self
            .roles
            .get(Role::Category)
            .and_then(|c| aggregate::group_sum(filtered, c, &[amount, quantity]))
            .map(|g| g.sorted_desc_by(0).with_prefix("Sum "));
    }

    fn estimate_sections(&self, selections: &Selections, report: &mut Report) {
        let Some(amount) = self.roles.get(Role::Amount) else {
            return;
        };
        let exclusion = match self.roles.get(Role::Item) {
            Some(item) if !selections.include_excluded_label => {
                Some(Exclusion::new(item, self.excluded_label.clone()))
            }
            _ => None,
        };

        let share =
            aggregate::share_of_total(&self.table, &report.filtered, amount, exclusion.as_ref());
        report.overall = vec![
            Tile::new(
                format!("{amount} (filtered)"),
                format_grouped(share.filtered_total, 0),
                TileKind::Amount,
            ),
            Tile::new(
                "% of Total",
                format!("{:.1}%", share.percentage),
                TileKind::Secondary,
            ),
        ];
        report.share = Some(share);
    }
}

/// `1234567.891` with 2 decimals → `1,234,567.89`.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_separators() {
        assert_eq!(format_grouped(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_grouped(999.0, 2), "999.00");
        assert_eq!(format_grouped(1000.0, 0), "1,000");
        assert_eq!(format_grouped(-12345.5, 1), "-12,345.5");
        assert_eq!(format_grouped(0.0, 0), "0");
    }
}
