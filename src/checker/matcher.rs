use crate::rules::Rule;
use crate::{CheckOptions, Match};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

/// Scan `text` for every wrong form of `rule`.
///
/// Patterns are literal: regex metacharacters are escaped before compiling.
/// A pattern that fails to compile is logged and skipped.
pub fn find_matches(text: &str, rule: &Rule, category: &str, options: &CheckOptions) -> Vec<Match> {
    let mut matches = Vec::new();

    for pattern in &rule.wrong {
        if pattern.is_empty() {
            debug!(rule = %rule.id, "skipping empty pattern");
            continue;
        }

        let regex = match compile_literal(pattern, options.ignore_case) {
            Ok(re) => re,
            Err(e) => {
                warn!(rule = %rule.id, pattern = %pattern, error = %e, "invalid rule pattern");
                continue;
            }
        };

        for found in regex.find_iter(text) {
            if !passes_context(rule, text, found.start(), found.end()) {
                continue;
            }

            matches.push(Match {
                rule_id: rule.id.clone(),
                original: found.as_str().to_string(),
                corrected: rule.correct.clone(),
                start_index: found.start(),
                end_index: found.end(),
                category: category.to_string(),
                priority: rule.priority,
                description: rule.description.clone(),
                examples: rule.examples.clone(),
                kind: rule.kind,
            });
        }
    }

    matches
}

fn compile_literal(pattern: &str, ignore_case: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(pattern))
        .case_insensitive(ignore_case)
        .build()
}

/// Hook for `context_rules`. Always accepts: context rules are not evaluated yet.
fn passes_context(_rule: &Rule, _text: &str, _start: usize, _end: usize) -> bool {
    true
}
