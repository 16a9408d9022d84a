pub mod checker;
pub mod cli;
pub mod config;
pub mod error;
pub mod rules;
pub mod service;

pub use checker::RuleEngine;
pub use config::Config;
pub use error::{Error, LoadError};
pub use rules::{Category, Rule, RuleDatabase, RuleLoader, RuleType};
pub use service::SpellService;

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// Options for a single check. Every field has a neutral default.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Category keys to scan; empty means all.
    pub enabled_categories: HashSet<String>,
    /// Reserved. Accepted and carried, but has no effect on matching.
    pub strict_mode: bool,
    pub ignore_case: bool,
}

impl CheckOptions {
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    pub fn allows(&self, category: &str) -> bool {
        self.enabled_categories.is_empty() || self.enabled_categories.contains(category)
    }
}

/// One located occurrence of a rule's wrong form.
///
/// `start_index`/`end_index` are byte offsets into the checked text and
/// always fall on char boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub rule_id: String,
    pub original: String,
    pub corrected: String,
    pub start_index: usize,
    pub end_index: usize,
    pub category: String,
    pub priority: u8,
    pub description: String,
    pub examples: Vec<String>,
    #[serde(rename = "type")]
    pub kind: RuleType,
}

impl Match {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    pub matches: Vec<Match>,
    pub total_errors: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub processing_time: Duration,
}

impl CheckResult {
    /// Package a resolved match set with its per-category tally.
    pub fn from_matches(matches: Vec<Match>, processing_time: Duration) -> Self {
        let mut category_counts = BTreeMap::new();
        for m in &matches {
            *category_counts.entry(m.category.clone()).or_insert(0) += 1;
        }

        Self {
            total_errors: matches.len(),
            matches,
            category_counts,
            processing_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleStats {
    pub total_rules: usize,
    pub categories: IndexMap<String, usize>,
    pub version: String,
    pub last_updated: String,
}
