//! Locating the columns each dashboard section depends on.
//!
//! Sheets arrive with slightly different headers (`AS (L)`, `AS(L)`,
//! `Contractor Name`...), so every role is matched by a rule with a fixed
//! precedence. A role that no rule matches is simply absent.

use std::collections::BTreeMap;

/// Semantic role a column can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Money column (administrative sanction, total amount).
    Amount,
    /// Second summed column (contract value).
    Quantity,
    /// Who the row belongs to (contractor).
    Category,
    /// Line item description.
    Item,
    /// Tile grouping key (tender number).
    GroupKey,
}

/// How one role is matched against the column names.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleRule {
    /// First column containing every marker (case-sensitive), else the first
    /// containing `loose`, else `exact` if such a column exists.
    Markers {
        all_of: Vec<String>,
        loose: Option<String>,
        exact: Option<String>,
    },
    /// `exact` if present, else the first column whose lower-cased name
    /// contains `keyword`.
    Keyword {
        exact: String,
        keyword: Option<String>,
    },
}

impl RoleRule {
    pub fn markers(all_of: &[&str], loose: Option<&str>, exact: Option<&str>) -> Self {
        RoleRule::Markers {
            all_of: all_of.iter().map(|s| s.to_string()).collect(),
            loose: loose.map(String::from),
            exact: exact.map(String::from),
        }
    }

    pub fn exact(name: &str) -> Self {
        RoleRule::Keyword {
            exact: name.to_string(),
            keyword: None,
        }
    }

    pub fn keyword(exact: &str, keyword: &str) -> Self {
        RoleRule::Keyword {
            exact: exact.to_string(),
            keyword: Some(keyword.to_lowercase()),
        }
    }

    /// The matching column name, if any.
    pub fn resolve<'a>(&self, columns: &[&'a str]) -> Option<&'a str> {
        match self {
            RoleRule::Markers {
                all_of,
                loose,
                exact,
            } => {
                let by_markers = || {
                    if all_of.is_empty() {
                        return None;
                    }
                    columns
                        .iter()
                        .find(|c| all_of.iter().all(|m| c.contains(m.as_str())))
                        .copied()
                };
                let by_loose = || {
                    let marker = loose.as_deref()?;
                    columns.iter().find(|c| c.contains(marker)).copied()
                };
                let by_exact = || {
                    let name = exact.as_deref()?;
                    columns.iter().find(|c| **c == name).copied()
                };
                by_markers().or_else(by_loose).or_else(by_exact)
            }
            RoleRule::Keyword { exact, keyword } => columns
                .iter()
                .find(|c| **c == exact.as_str())
                .or_else(|| {
                    let kw = keyword.as_deref()?;
                    columns.iter().find(|c| c.to_lowercase().contains(kw))
                })
                .copied(),
        }
    }
}

/// Role → resolved column name. Roles without a match are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRoles {
    resolved: BTreeMap<Role, String>,
}

impl ColumnRoles {
    pub fn get(&self, role: Role) -> Option<&str> {
        self.resolved.get(&role).map(String::as_str)
    }

    pub fn insert(&mut self, role: Role, column: impl Into<String>) {
        self.resolved.insert(role, column.into());
    }
}

/// Resolve every rule against the given column names.
pub fn resolve_roles(columns: &[&str], rules: &[(Role, RoleRule)]) -> ColumnRoles {
    let mut roles = ColumnRoles::default();
    for (role, rule) in rules {
        match rule.resolve(columns) {
            Some(name) => {
                log::debug!("{role:?} resolved to column '{name}'");
                roles.insert(*role, name);
            }
            None => log::debug!("{role:?} not found among {} columns", columns.len()),
        }
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tender_rules() -> Vec<(Role, RoleRule)> {
        vec![
            (Role::Amount, RoleRule::markers(&["AS", "L"], Some("AS"), None)),
            (Role::Quantity, RoleRule::markers(&["CV", "L"], None, Some("CV (L)"))),
            (Role::Category, RoleRule::keyword("Contractor", "contractor")),
            (Role::GroupKey, RoleRule::exact("TN No")),
        ]
    }

    #[test]
    fn substring_markers_find_amount_columns() {
        let cols = ["Sl.No", "TN No", "AS (L)", "CV", "CV (L)", "Contractor"];
        let roles = resolve_roles(&cols, &tender_rules());

        assert_eq!(roles.get(Role::Amount), Some("AS (L)"));
        assert_eq!(roles.get(Role::Quantity), Some("CV (L)"));
        assert_eq!(roles.get(Role::Category), Some("Contractor"));
        assert_eq!(roles.get(Role::GroupKey), Some("TN No"));
    }

    #[test]
    fn spacing_differences_still_match() {
        let cols = ["AS(L)", "CV(Lakhs)"];
        let roles = resolve_roles(&cols, &tender_rules());
        assert_eq!(roles.get(Role::Amount), Some("AS(L)"));
        assert_eq!(roles.get(Role::Quantity), Some("CV(Lakhs)"));
    }

    #[test]
    fn loose_marker_is_the_fallback() {
        let cols = ["AS Amount", "CV"];
        let roles = resolve_roles(&cols, &tender_rules());
        assert_eq!(roles.get(Role::Amount), Some("AS Amount"));
        // "CV" alone carries no unit marker and is not the exact name
        assert_eq!(roles.get(Role::Quantity), None);
    }

    #[test]
    fn keyword_match_is_case_insensitive_and_exact_wins() {
        let rule = RoleRule::keyword("Contractor", "contractor");
        assert_eq!(rule.resolve(&["Name of CONTRACTOR", "x"]), Some("Name of CONTRACTOR"));
        assert_eq!(rule.resolve(&["Sub contractor", "Contractor"]), Some("Contractor"));
        assert_eq!(rule.resolve(&["Vendor"]), None);
    }

    #[test]
    fn markers_are_case_sensitive() {
        let rule = RoleRule::markers(&["AS", "L"], Some("AS"), None);
        assert_eq!(rule.resolve(&["as (l)", "Class"]), None);
    }
}
