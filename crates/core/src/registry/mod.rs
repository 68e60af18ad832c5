//! Check registry.
//!
//! The registry answers one question for the pipeline: given a category and
//! an optional id filter, which checks run, and how are they grouped? The
//! answer fixes the run's total work before any stage starts.

use crate::config::error::{ConfigError, ConfigResult};
use ak_protocol::check_models::{Check, CheckCategory};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Checks of one category keyed by group key.
pub type CheckGroups = BTreeMap<String, Vec<Check>>;

/// The unit the registry reports for progress accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkGroup {
    pub category: CheckCategory,
    pub group_key: String,
    pub item_count: u64,
}

/// Restricts a run to a set of check ids. An empty filter admits every check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckFilter {
    ids: BTreeSet<String>,
}

impl CheckFilter {
    /// A filter admitting every check.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a comma-separated id list; blanks are ignored.
    pub fn parse(list: &str) -> Self {
        Self::from_ids(list.split(','))
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        Self { ids }
    }

    pub fn is_all(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn admits(&self, check: &Check) -> bool {
        self.ids.is_empty() || self.ids.contains(&check.id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// All known checks, in load order.
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    checks: Vec<Check>,
}

impl CheckRegistry {
    /// Build a registry, rejecting duplicate ids.
    pub fn new(checks: Vec<Check>) -> ConfigResult<Self> {
        let mut seen = HashSet::new();
        for check in &checks {
            if !seen.insert(check.id.as_str()) {
                return Err(ConfigError::DuplicateCheck {
                    id: check.id.clone(),
                });
            }
        }
        Ok(Self { checks })
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Check> {
        self.checks.iter().find(|check| check.id == id)
    }

    /// Enabled checks of `category` admitted by `filter`, grouped by group key.
    ///
    /// Groups with no admitted checks are not present.
    pub fn enumerate(&self, category: CheckCategory, filter: &CheckFilter) -> CheckGroups {
        let mut groups = CheckGroups::new();
        for check in self
            .checks
            .iter()
            .filter(|check| check.category == category)
            .filter(|check| check.include_in_evaluation && filter.admits(check))
        {
            groups
                .entry(check.group_key().to_string())
                .or_default()
                .push(check.clone());
        }
        groups
    }

    /// Group key to item count for one category.
    pub fn group_counts(
        &self,
        category: CheckCategory,
        filter: &CheckFilter,
    ) -> BTreeMap<String, u64> {
        self.enumerate(category, filter)
            .into_iter()
            .map(|(key, checks)| (key, checks.len() as u64))
            .collect()
    }

    /// The `category -> group key -> item count` view over every category.
    pub fn enumerate_all(
        &self,
        filter: &CheckFilter,
    ) -> BTreeMap<CheckCategory, BTreeMap<String, u64>> {
        CheckCategory::ALL
            .into_iter()
            .map(|category| (category, self.group_counts(category, filter)))
            .collect()
    }

    pub fn work_groups(&self, category: CheckCategory, filter: &CheckFilter) -> Vec<WorkGroup> {
        self.group_counts(category, filter)
            .into_iter()
            .map(|(group_key, item_count)| WorkGroup {
                category,
                group_key,
                item_count,
            })
            .collect()
    }

    /// Filter ids that match no registered check.
    pub fn unknown_ids<'a>(&self, filter: &'a CheckFilter) -> Vec<&'a str> {
        filter.ids().filter(|id| self.get(id).is_none()).collect()
    }
}
