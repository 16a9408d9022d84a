pub mod corrector;
pub mod matcher;
pub mod resolver;

use crate::rules::{Rule, RuleDatabase};
use crate::{CheckOptions, CheckResult, Match, RuleStats};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Rule engine over an immutable rule database.
///
/// Holds the rules flattened and ordered by priority (highest first) plus a
/// rule id → category key lookup. Checking only reads this state, so one
/// engine can be shared across threads.
pub struct RuleEngine {
    database: Arc<RuleDatabase>,
    rules: Vec<Rule>,
    rule_categories: HashMap<String, String>,
}

impl RuleEngine {
    pub fn new(database: Arc<RuleDatabase>) -> Self {
        let mut rules = Vec::with_capacity(database.rule_count());
        let mut rule_categories = HashMap::new();

        for (key, category) in &database.categories {
            for rule in &category.rules {
                rules.push(rule.clone());
                rule_categories.insert(rule.id.clone(), key.clone());
            }
        }

        // Stable: equal priorities keep database order
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));

        Self {
            database,
            rules,
            rule_categories,
        }
    }

    pub fn check_text(&self, text: &str, options: &CheckOptions) -> CheckResult {
        let started = Instant::now();
        let mut candidates = Vec::new();

        for rule in &self.rules {
            let Some(category) = self.rule_categories.get(&rule.id) else {
                continue;
            };
            if !options.allows(category) {
                continue;
            }

            candidates.extend(matcher::find_matches(text, rule, category, options));
        }

        let candidate_count = candidates.len();
        let matches = resolver::resolve_overlaps(candidates);
        let result = CheckResult::from_matches(matches, started.elapsed());

        debug!(
            bytes = text.len(),
            candidates = candidate_count,
            matches = result.total_errors,
            elapsed_us = result.processing_time.as_micros() as u64,
            "text checked"
        );

        result
    }

    pub fn apply_corrections(&self, text: &str, matches: &[Match]) -> String {
        corrector::apply_corrections(text, matches)
    }

    pub fn stats(&self) -> RuleStats {
        let categories: IndexMap<String, usize> = self
            .database
            .categories
            .iter()
            .map(|(key, category)| (key.clone(), category.rules.len()))
            .collect();

        RuleStats {
            total_rules: self.rules.len(),
            categories,
            version: self.database.version.clone(),
            last_updated: self.database.last_updated.clone(),
        }
    }

    /// Rules of one category straight from the database; empty if unknown.
    pub fn rules_by_category(&self, category: &str) -> &[Rule] {
        self.database
            .category(category)
            .map(|c| c.rules.as_slice())
            .unwrap_or(&[])
    }

    pub fn database(&self) -> &RuleDatabase {
        &self.database
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const RULES: &str = r#"{
        "version": "2.0.0",
        "lastUpdated": "2024-05-10",
        "totalRules": 3,
        "categories": {
            "it_terms": {
                "name": "IT terminology",
                "description": "IT loanwords",
                "rules": [
                    {"id": "it_db", "wrong": ["데이타베이스"], "correct": "데이터베이스", "type": "foreign", "priority": 5},
                    {"id": "it_api_server", "wrong": ["API서버"], "correct": "API 서버", "type": "spacing", "priority": 3},
                    {"id": "it_api", "wrong": ["API"], "correct": "에이피아이", "type": "terminology", "priority": 3},
                    {"id": "it_cpp", "wrong": ["C++"], "correct": "C++ 언어", "type": "terminology", "priority": 1}
                ]
            },
            "punctuation": {
                "name": "Punctuation",
                "description": "Marks",
                "rules": [
                    {"id": "p_ellipsis", "wrong": ["..."], "correct": "…", "type": "punctuation", "priority": 2}
                ]
            },
            "spacing": {
                "name": "Spacing",
                "description": "Word spacing",
                "rules": [
                    {"id": "sp_db", "wrong": ["데이타베이스를"], "correct": "데이터베이스를", "type": "spacing", "priority": 4}
                ]
            }
        }
    }"#;

    fn engine() -> RuleEngine {
        let db = RuleDatabase::from_slice(RULES.as_bytes(), "test").unwrap();
        RuleEngine::new(Arc::new(db))
    }

    #[test]
    fn test_rules_flattened_by_priority() {
        let engine = engine();
        let priorities: Vec<u8> = engine.rules.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![5, 4, 3, 3, 2, 1]);

        // Equal priorities keep database order
        assert_eq!(engine.rules[2].id, "it_api_server");
        assert_eq!(engine.rules[3].id, "it_api");
        assert_eq!(engine.rule_categories["p_ellipsis"], "punctuation");
    }

    #[test]
    fn test_database_correction() {
        let engine = engine();
        let text = "데이타베이스 사용";
        let result = engine.check_text(text, &CheckOptions::default());

        assert_eq!(result.total_errors, 1);
        let m = &result.matches[0];
        assert_eq!((m.start_index, m.end_index), (0, "데이타베이스".len()));
        assert_eq!(engine.apply_corrections(text, &result.matches), "데이터베이스 사용");
    }

    #[test]
    fn test_priority_decides_overlap() {
        let engine = engine();
        let result = engine.check_text("데이타베이스를 쓴다", &CheckOptions::default());

        assert_eq!(result.total_errors, 1);
        assert_eq!(result.matches[0].rule_id, "it_db");
    }

    #[test]
    fn test_longer_span_wins_at_equal_priority() {
        let engine = engine();
        let result = engine.check_text("API서버 구성", &CheckOptions::default());

        assert_eq!(result.total_errors, 1);
        assert_eq!(result.matches[0].rule_id, "it_api_server");
        assert_eq!(result.matches[0].end_index, "API서버".len());
    }

    #[test]
    fn test_category_filter() {
        let engine = engine();
        let text = "데이타베이스... 그리고 C++";

        let all = engine.check_text(text, &CheckOptions::default());
        assert_eq!(all.category_counts.len(), 2);

        let options = CheckOptions::default().with_categories(["it_terms"]);
        let filtered = engine.check_text(text, &options);
        assert_eq!(filtered.total_errors, 2);
        assert!(filtered.matches.iter().all(|m| m.category == "it_terms"));
        assert_eq!(filtered.category_counts.keys().collect::<Vec<_>>(), vec!["it_terms"]);
    }

    #[test]
    fn test_unknown_category_yields_nothing() {
        let engine = engine();
        let options = CheckOptions::default().with_categories(["no_such_category"]);
        let result = engine.check_text("데이타베이스...", &options);
        assert_eq!(result.total_errors, 0);
    }

    #[test]
    fn test_empty_text() {
        let engine = engine();
        let result = engine.check_text("", &CheckOptions::default());

        assert!(result.matches.is_empty());
        assert_eq!(result.total_errors, 0);
        assert!(result.category_counts.is_empty());
        assert!(result.processing_time < Duration::from_secs(1));
    }

    #[test]
    fn test_strict_mode_is_inert() {
        let engine = engine();
        let text = "API서버와 데이타베이스...";
        let relaxed = engine.check_text(text, &CheckOptions::default());
        let strict = engine.check_text(text, &CheckOptions::default().strict_mode(true));
        assert_eq!(relaxed.matches, strict.matches);
    }

    #[test]
    fn test_corrections_do_not_reflag() {
        let engine = engine();
        let text = "데이타베이스... C++";
        let first = engine.check_text(text, &CheckOptions::default());
        let fixed = engine.apply_corrections(text, &first.matches);
        let second = engine.check_text(&fixed, &CheckOptions::default());

        // "C++ 언어" still contains "C++"; every other correction is clean
        let reflagged: Vec<_> = second.matches.iter().map(|m| m.rule_id.as_str()).collect();
        assert_eq!(reflagged, vec!["it_cpp"]);
    }

    #[test]
    fn test_stats() {
        let engine = engine();
        let stats = engine.stats();

        assert_eq!(stats.total_rules, 6);
        assert_eq!(stats.version, "2.0.0");
        assert_eq!(stats.last_updated, "2024-05-10");
        assert_eq!(stats.categories["it_terms"], 4);
        assert_eq!(stats.categories.keys().next().unwrap(), "it_terms");
    }

    #[test]
    fn test_rules_by_category() {
        let engine = engine();
        assert_eq!(engine.rules_by_category("punctuation").len(), 1);
        assert!(engine.rules_by_category("missing").is_empty());
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || engine.check_text("데이타베이스", &CheckOptions::default()).total_errors)
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
